use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Direction the mutate hook moved a function body in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Insert,
    Remove,
}

/// A file whose rendered bytes changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: Utf8PathBuf,
    #[serde(skip)]
    pub before: String,
    #[serde(skip)]
    pub after: String,
}

/// Counters and changed files for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub packages: u64,
    pub packages_excluded: u64,
    pub files: u64,
    pub functions_included: u64,
    pub functions_skipped: u64,
    pub changed: Vec<ChangedFile>,
}
