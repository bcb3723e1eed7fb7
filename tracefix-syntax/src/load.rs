//! Package loader: resolves patterns to directories and parses their non-test Go files.

use crate::parse::parse_file;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use tracefix_types::{Package, SourceFile, TraceError};
use tracing::debug;
use walkdir::WalkDir;

/// Loads the packages named by `patterns`, resolved against `root`.
///
/// A pattern is a directory (`.`, `pkg/foo`), a recursive pattern (`./...`, `pkg/...`) or a
/// glob over directories (`pkg/*`). Packages come back sorted by directory, each once.
pub fn load_packages(root: &Utf8Path, patterns: &[String]) -> Result<Vec<Package>, TraceError> {
    let mut dirs = BTreeSet::new();
    for pattern in patterns {
        for dir in expand(root, pattern)? {
            dirs.insert(dir);
        }
    }

    let mut packages = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if let Some(pkg) = load_dir(&dir)? {
            packages.push(pkg);
        }
    }
    Ok(packages)
}

fn expand(root: &Utf8Path, pattern: &str) -> Result<Vec<Utf8PathBuf>, TraceError> {
    if let Some(base) = recursive_base(pattern) {
        let base = clean(root, base);
        if !base.is_dir() {
            return Err(TraceError::load(format!("directory not found: {base}")));
        }
        return walk(&base);
    }

    if pattern.contains(['*', '?', '[']) {
        let full = clean(root, pattern);
        let matches = glob::glob(full.as_str())
            .map_err(|e| TraceError::load(format!("invalid pattern {pattern:?}: {e}")))?;
        let mut out = Vec::new();
        for entry in matches {
            let path = entry.map_err(|e| TraceError::load(e.to_string()))?;
            let path = Utf8PathBuf::from_path_buf(path)
                .map_err(|p| TraceError::load(format!("non-UTF-8 path: {}", p.display())))?;
            let ignored = path.file_name().is_some_and(|n| is_ignored_dir(n.as_ref()));
            if path.is_dir() && !ignored && has_go_files(&path)? {
                out.push(path);
            }
        }
        return Ok(out);
    }

    let dir = clean(root, pattern);
    if !dir.is_dir() {
        return Err(TraceError::load(format!("directory not found: {dir}")));
    }
    if !has_go_files(&dir)? {
        return Err(TraceError::load(format!("no Go files in {dir}")));
    }
    Ok(vec![dir])
}

fn recursive_base(pattern: &str) -> Option<&str> {
    if pattern == "..." {
        return Some(".");
    }
    pattern.strip_suffix("/...")
}

/// Joins `rel` onto `root`, dropping `.` components.
fn clean(root: &Utf8Path, rel: &str) -> Utf8PathBuf {
    let mut out = root.to_path_buf();
    for part in Utf8Path::new(rel).components() {
        match part {
            camino::Utf8Component::CurDir => {}
            camino::Utf8Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

fn walk(base: &Utf8Path) -> Result<Vec<Utf8PathBuf>, TraceError> {
    let mut out = Vec::new();
    let walker = WalkDir::new(base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !is_ignored_dir(e.file_name()));
    for entry in walker {
        let entry = entry.map_err(|e| TraceError::load(e.to_string()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = Utf8Path::from_path(entry.path())
            .ok_or_else(|| TraceError::load(format!("non-UTF-8 path: {}", entry.path().display())))?;
        if has_go_files(path)? {
            out.push(path.to_path_buf());
        }
    }
    Ok(out)
}

fn is_ignored_dir(name: &std::ffi::OsStr) -> bool {
    let name = name.to_string_lossy();
    name == "vendor" || name == "testdata" || name.starts_with('.') || name.starts_with('_')
}

fn is_source(name: &str) -> bool {
    name.ends_with(".go") && !name.ends_with("_test.go")
}

fn source_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, TraceError> {
    let entries = dir
        .read_dir_utf8()
        .map_err(|e| TraceError::load(format!("failed to read {dir}: {e}")))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| TraceError::load(format!("failed to read {dir}: {e}")))?;
        let is_file = entry.file_type().is_ok_and(|t| t.is_file());
        if is_file && is_source(entry.file_name()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn has_go_files(dir: &Utf8Path) -> Result<bool, TraceError> {
    Ok(!source_files(dir)?.is_empty())
}

fn load_dir(dir: &Utf8Path) -> Result<Option<Package>, TraceError> {
    let paths = source_files(dir)?;
    let mut name: Option<String> = None;
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let src = fs_err::read_to_string(&path).map_err(|e| TraceError::load(e.to_string()))?;
        let syntax = parse_file(&path, &src)?;
        match &name {
            None => name = Some(syntax.package.clone()),
            Some(n) if *n != syntax.package => {
                return Err(TraceError::load(format!(
                    "found packages {n} and {} in {dir}",
                    syntax.package
                )));
            }
            Some(_) => {}
        }
        files.push(SourceFile { path, syntax });
    }

    let Some(name) = name else {
        return Ok(None);
    };
    debug!(dir = %dir, package = %name, files = files.len(), "loaded package");
    Ok(Some(Package {
        name,
        dir: dir.to_path_buf(),
        files,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursive_base_forms() {
        assert_eq!(recursive_base("./..."), Some("."));
        assert_eq!(recursive_base("..."), Some("."));
        assert_eq!(recursive_base("pkg/..."), Some("pkg"));
        assert_eq!(recursive_base("pkg"), None);
    }

    #[test]
    fn clean_drops_cur_dir() {
        let root = Utf8Path::new("/work");
        assert_eq!(clean(root, "."), Utf8PathBuf::from("/work"));
        assert_eq!(clean(root, "./a/b"), Utf8PathBuf::from("/work/a/b"));
        assert_eq!(clean(root, "a/../c"), Utf8PathBuf::from("/work/c"));
    }

    #[test]
    fn test_files_are_not_sources() {
        assert!(is_source("main.go"));
        assert!(!is_source("main_test.go"));
        assert!(!is_source("README.md"));
    }
}
