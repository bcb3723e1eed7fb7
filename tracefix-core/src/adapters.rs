//! Default filesystem-backed and in-memory port implementations.

use crate::ports::{PackageSource, WritePort};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracefix_types::{Package, TraceError};
use tracing::debug;

/// Loads packages from disk via `tracefix_syntax::load_packages`.
#[derive(Debug, Clone)]
pub struct FsPackageSource {
    pub root: Utf8PathBuf,
    pub patterns: Vec<String>,
}

impl FsPackageSource {
    pub fn new(root: Utf8PathBuf, patterns: Vec<String>) -> Self {
        Self { root, patterns }
    }
}

impl PackageSource for FsPackageSource {
    fn load_packages(&self) -> Result<Vec<Package>, TraceError> {
        if self.patterns.is_empty() {
            return Err(TraceError::load("no package patterns given"));
        }
        tracefix_syntax::load_packages(&self.root, &self.patterns)
    }
}

/// Pre-parsed packages, sorted by directory like the filesystem loader.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPackageSource {
    packages: Vec<Package>,
}

impl InMemoryPackageSource {
    pub fn new(mut packages: Vec<Package>) -> Self {
        packages.sort_by(|a, b| a.dir.cmp(&b.dir));
        Self { packages }
    }
}

impl PackageSource for InMemoryPackageSource {
    fn load_packages(&self) -> Result<Vec<Package>, TraceError> {
        Ok(self.packages.clone())
    }
}

/// Filesystem writes. Files are replaced in place; parent directories must exist.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> std::io::Result<()> {
        fs_err::write(path, contents)
    }
}

/// Collects writes in memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryWritePort {
    files: Mutex<BTreeMap<Utf8PathBuf, Vec<u8>>>,
}

impl InMemoryWritePort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, keyed by path.
    pub fn files(&self) -> BTreeMap<Utf8PathBuf, Vec<u8>> {
        match self.files.lock() {
            Ok(files) => files.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contents(&self, path: &Utf8Path) -> Option<String> {
        self.files()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl WritePort for InMemoryWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> std::io::Result<()> {
        debug!(path = %path, bytes = contents.len(), "captured write");
        let mut files = self
            .files
            .lock()
            .map_err(|_| std::io::Error::other("write port lock poisoned"))?;
        files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}
