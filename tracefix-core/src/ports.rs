//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;
use tracefix_types::{Package, TraceError};

/// Source of parsed packages.
pub trait PackageSource {
    fn load_packages(&self) -> Result<Vec<Package>, TraceError>;
}

/// Durable file writes. The pipeline wraps failures into [`TraceError::Write`].
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> std::io::Result<()>;
}
