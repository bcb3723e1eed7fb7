use crate::dst::File;
use camino::Utf8PathBuf;

/// A loaded Go package: every non-test file of one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub dir: Utf8PathBuf,
    pub files: Vec<SourceFile>,
}

impl Package {
    /// Path used for exclusion matching: `<dir>/<name>`.
    pub fn match_path(&self) -> Utf8PathBuf {
        self.dir.join(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: Utf8PathBuf,
    pub syntax: File,
}

