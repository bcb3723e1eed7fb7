//! Shared types for the tracefix workspace.
//!
//! # Design constraints
//! - The syntax tree is owned and plain: edits are index-based `Vec` operations.
//! - Decorations travel with nodes; nothing here drops them.

pub mod dst;
pub mod error;
pub mod package;
pub mod report;
pub mod resolve;

pub use error::TraceError;
pub use package::{Package, SourceFile};
pub use resolve::{ImportResolver, SimpleResolver};

/// Tag markers recognized in leading comments.
pub mod tags {
    pub const SKIP: &str = "trace:skip";
    pub const ENABLE: &str = "trace:enable";
}
