//! Import-name resolution for the printer.

use crate::dst::{File, assumed_name};
use crate::error::TraceError;
use std::collections::BTreeMap;

/// Maps an import path to the identifier that qualifies it in source.
pub trait ImportResolver {
    fn resolve_package(&self, import_path: &str) -> Result<String, TraceError>;
}

/// Resolver backed by a path → name table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleResolver(BTreeMap<String, String>);

impl SimpleResolver {
    /// Builds a resolver for the imports of `file`.
    ///
    /// An explicit alias wins over a hint, and a hint wins over the assumed name. Hints also
    /// name packages the file does not import yet.
    pub fn for_file(file: &File, hints: &BTreeMap<String, String>) -> Self {
        let mut r = hints.clone();
        for spec in file.import_specs() {
            match spec.name.as_deref() {
                Some("_") | Some(".") => {}
                Some(alias) => {
                    r.insert(spec.path.clone(), alias.to_string());
                }
                None => {
                    r.entry(spec.path.clone())
                        .or_insert_with(|| assumed_name(&spec.path));
                }
            }
        }
        SimpleResolver(r)
    }

    pub fn get(&self, import_path: &str) -> Option<&str> {
        self.0.get(import_path).map(String::as_str)
    }

    pub fn insert(&mut self, path: impl Into<String>, name: impl Into<String>) {
        self.0.insert(path.into(), name.into());
    }
}

impl ImportResolver for SimpleResolver {
    fn resolve_package(&self, import_path: &str) -> Result<String, TraceError> {
        self.0
            .get(import_path)
            .cloned()
            .ok_or_else(|| TraceError::UnresolvedImport {
                path: import_path.to_string(),
            })
    }
}
