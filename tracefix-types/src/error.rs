//! Error types shared by every tracefix crate.
//!
//! Every variant is fatal: the run stops at the first error and nothing is retried.
//! Messages carry the offending path or pattern so the user can act on them.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    /// Patterns could not be resolved or the packages could not be read.
    #[error("failed to load packages: {message}")]
    Load { message: String },

    /// A source file is not in the supported Go subset.
    #[error("failed to parse {path}:{line}:{column}: {message}")]
    Parse {
        path: Utf8PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// An exclusion pattern is not a valid regular expression.
    #[error("invalid exclude pattern: {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    /// The printer met a qualified identifier whose package has no known name.
    #[error("package {path} was not found")]
    UnresolvedImport { path: String },

    /// Writing a transformed file failed.
    #[error("failed to save file {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be read or parsed.
    #[error("invalid configuration {path}: {message}")]
    Config { path: Utf8PathBuf, message: String },
}

impl TraceError {
    pub fn load(message: impl Into<String>) -> Self {
        TraceError::Load {
            message: message.into(),
        }
    }

    /// Configuration mistakes the user can fix without touching sources.
    pub fn is_user_error(&self) -> bool {
        matches!(self, TraceError::Pattern { .. } | TraceError::Config { .. })
    }

    /// Recommended process exit code.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
