//! Full runs against a temporary Go module on disk.

use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tracefix_core::adapters::{FsPackageSource, FsWritePort, InMemoryWritePort};
use tracefix_core::{RunSettings, TraceError, run};

const SVC: &str = r#"package svc

import (
	"context"
	"fmt"
)

// Get returns the value.
func (s *Store) Get(ctx context.Context, key string) (string, error) {
	v, ok := s.items[key]
	if !ok {
		return "", fmt.Errorf("missing %q", key)
	}
	return v, nil
}

func helper(n int) int { return n * 2 }
"#;

const SVC_TRACED: &str = r#"package svc

import (
	"context"
	"fmt"

	"github.com/opentracing/opentracing-go"
)

// Get returns the value.
func (s *Store) Get(ctx context.Context, key string) (string, error) {
	span, ctx := opentracing.StartSpanFromContext(ctx, "Get")
	defer span.Finish()

	v, ok := s.items[key]
	if !ok {
		return "", fmt.Errorf("missing %q", key)
	}
	return v, nil
}

func helper(n int) int { return n * 2 }
"#;

const MAIN: &str = r#"package main

import "context"

func run(ctx context.Context) {}
"#;

fn module() -> (TempDir, Utf8PathBuf) {
    let td = tempfile::tempdir().expect("tempdir");
    let root = Utf8Path::from_path(td.path()).unwrap().to_path_buf();
    for (rel, contents) in [
        ("go.mod", "module example.com/app\n\ngo 1.21\n"),
        ("svc/svc.go", SVC),
        ("svc/store.go", "package svc\n\ntype Store struct {\n\titems map[string]string\n}\n"),
        ("cmd/app/main.go", MAIN),
        ("vendor/dep/dep.go", MAIN),
    ] {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
    }
    (td, root)
}

fn settings(root: &Utf8Path) -> RunSettings {
    RunSettings {
        root: root.to_path_buf(),
        ..RunSettings::default()
    }
}

#[test]
fn instruments_module_and_is_stable_on_rerun() {
    let (_td, root) = module();
    let source = FsPackageSource::new(root.clone(), vec!["./...".to_string()]);

    let outcome = run(&settings(&root), &source, &FsWritePort).unwrap();
    assert_eq!(outcome.summary.changed.len(), 1);
    assert_eq!(fs::read_to_string(root.join("svc/svc.go")).unwrap(), SVC_TRACED);
    assert_eq!(fs::read_to_string(root.join("cmd/app/main.go")).unwrap(), MAIN);
    assert_eq!(fs::read_to_string(root.join("vendor/dep/dep.go")).unwrap(), MAIN);
    assert_eq!(outcome.summary.packages_excluded, 1);

    let again = run(&settings(&root), &source, &FsWritePort).unwrap();
    assert!(again.summary.changed.is_empty());
    assert!(again.patch.is_empty());
}

#[test]
fn dry_run_leaves_disk_alone() {
    let (_td, root) = module();
    let source = FsPackageSource::new(root.clone(), vec!["svc".to_string()]);
    let writer = InMemoryWritePort::new();

    let outcome = run(&settings(&root), &source, &writer).unwrap();
    assert_eq!(fs::read_to_string(root.join("svc/svc.go")).unwrap(), SVC);
    assert_eq!(
        writer.contents(&root.join("svc/svc.go")).as_deref(),
        Some(SVC_TRACED)
    );
    assert!(outcome.patch.contains("+\tspan, ctx := opentracing.StartSpanFromContext(ctx, \"Get\")\n"));
    assert!(outcome.patch.starts_with("diff --git a/svc/svc.go b/svc/svc.go\n"));
}

#[test]
fn missing_directory_is_a_load_error() {
    let (_td, root) = module();
    let source = FsPackageSource::new(root.clone(), vec!["nope".to_string()]);
    let err = run(&settings(&root), &source, &FsWritePort).unwrap_err();
    assert!(matches!(err, TraceError::Load { .. }), "{err}");
}

#[test]
fn parse_error_stops_before_writing() {
    let (_td, root) = module();
    fs::write(root.join("svc/broken.go"), "package svc\n\nfunc Broken(ctx context.Context) {\n").unwrap();
    let source = FsPackageSource::new(root.clone(), vec!["./...".to_string()]);
    let err = run(&settings(&root), &source, &FsWritePort).unwrap_err();
    assert!(matches!(err, TraceError::Parse { .. }), "{err}");
    assert_eq!(fs::read_to_string(root.join("svc/svc.go")).unwrap(), SVC);
}
