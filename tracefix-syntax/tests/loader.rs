//! Package loading from a temporary directory tree.

use camino::Utf8Path;
use fs_err as fs;
use tempfile::TempDir;
use tracefix_syntax::load_packages;
use tracefix_types::TraceError;

fn write(root: &Utf8Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn tree() -> (TempDir, camino::Utf8PathBuf) {
    let td = tempfile::tempdir().expect("tempdir");
    let root = Utf8Path::from_path(td.path()).unwrap().to_path_buf();
    write(&root, "main.go", "package main\n\nfunc main() {}\n");
    write(&root, "main_test.go", "package main\n\nfunc TestX(t *testing.T) {}\n");
    write(&root, "svc/svc.go", "package svc\n\nfunc A() {}\n");
    write(&root, "svc/more.go", "package svc\n\nfunc B() {}\n");
    write(&root, "svc/testdata/x.go", "package fixture\n");
    write(&root, "vendor/dep/dep.go", "package dep\n");
    write(&root, ".hidden/h.go", "package hidden\n");
    write(&root, "_skip/s.go", "package skip\n");
    write(&root, "docs/README.md", "docs\n");
    (td, root)
}

#[test]
fn single_directory_excludes_test_files() {
    let (_td, root) = tree();
    let pkgs = load_packages(&root, &[".".to_string()]).unwrap();
    assert_eq!(pkgs.len(), 1);
    assert_eq!(pkgs[0].name, "main");
    assert_eq!(pkgs[0].dir, root);
    assert_eq!(pkgs[0].files.len(), 1);
    assert!(pkgs[0].files[0].path.ends_with("main.go"));
}

#[test]
fn recursive_pattern_skips_vendor_testdata_and_hidden() {
    let (_td, root) = tree();
    let pkgs = load_packages(&root, &["./...".to_string()]).unwrap();
    let names: Vec<_> = pkgs.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["main", "svc"]);

    let svc = &pkgs[1];
    let files: Vec<_> = svc.files.iter().map(|f| f.path.file_name().unwrap()).collect();
    assert_eq!(files, vec!["more.go", "svc.go"]);
    assert_eq!(svc.match_path(), root.join("svc").join("svc"));
}

#[test]
fn duplicate_patterns_load_once() {
    let (_td, root) = tree();
    let pkgs = load_packages(&root, &["svc".to_string(), "./svc".to_string(), "*".to_string()])
        .unwrap();
    let names: Vec<_> = pkgs.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["svc"]);
}

#[test]
fn mixed_package_names_fail() {
    let (_td, root) = tree();
    write(&root, "svc/other.go", "package other\n");
    let err = load_packages(&root, &["svc".to_string()]).unwrap_err();
    assert!(matches!(err, TraceError::Load { .. }));
    assert!(err.to_string().contains("found packages"));
}

#[test]
fn missing_directory_fails() {
    let (_td, root) = tree();
    let err = load_packages(&root, &["nope".to_string()]).unwrap_err();
    assert!(err.to_string().contains("directory not found"));
}

#[test]
fn directory_without_go_files_fails() {
    let (_td, root) = tree();
    let err = load_packages(&root, &["docs".to_string()]).unwrap_err();
    assert!(err.to_string().contains("no Go files"));
}

#[test]
fn parse_errors_propagate() {
    let (_td, root) = tree();
    write(&root, "bad/bad.go", "package bad\n\nfunc F() {\n");
    let err = load_packages(&root, &["bad".to_string()]).unwrap_err();
    assert!(matches!(err, TraceError::Parse { .. }));
}
