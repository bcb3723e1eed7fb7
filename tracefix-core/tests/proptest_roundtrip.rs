//! Idempotence and invertibility of whole-file runs over generated packages.

use camino::Utf8PathBuf;
use proptest::prelude::*;
use std::collections::BTreeMap;
use tracefix_core::adapters::InMemoryWritePort;
use tracefix_core::{Settings, SpanHook, process_packages};
use tracefix_syntax::parse_file;
use tracefix_types::{Package, SourceFile};

/// Body lines, indented as gofmt writes them inside a function.
const STMTS: &[&str] = &[
    "\tx := 1",
    "\twork(ctx)",
    "\tif err := load(ctx); err != nil {\n\t\treturn\n\t}",
    "\t// note",
    "\tdefer cleanup()",
    "\tif ctx == nil {\n\t\treturn\n\t} else if err := ctx.Err(); err != nil {\n\t\treturn\n\t}",
    "outer:\n\tfor i := 0; i < 3; i++ {\n\t\tif i > 1 {\n\t\t\tbreak outer\n\t\t}\n\t}",
    "\tswitch v := next(ctx); v {\n\tcase 1:\n\t\treturn\n\t}",
    "\tgoto next\nnext:\n\twork(ctx)",
    "\trun(func() { a(); b() })",
];

fn func_src(name: &str, body: &[usize]) -> String {
    if body.is_empty() {
        return format!("func {name}(ctx context.Context) {{}}\n");
    }
    let mut out = format!("func {name}(ctx context.Context) {{\n");
    for &i in body {
        out.push_str(STMTS[i]);
        out.push('\n');
    }
    // A trailing comment needs a statement to belong to.
    if body.last() == Some(&3) {
        out.push_str("\twork(ctx)\n");
    }
    out.push_str("}\n");
    out
}

fn file_src(funcs: &[(String, Vec<usize>)]) -> String {
    let mut out = String::from("package svc\n\nimport \"context\"\n");
    for (name, body) in funcs {
        out.push('\n');
        out.push_str(&func_src(name, body));
    }
    out
}

/// Transforms `src` once and returns the resulting text.
fn pass(src: &str, settings: Settings) -> String {
    let path = Utf8PathBuf::from("/work/svc/svc.go");
    let syntax = parse_file(&path, src).unwrap();
    let pkg = Package {
        name: "svc".to_string(),
        dir: "/work/svc".into(),
        files: vec![SourceFile { path, syntax }],
    };
    let hook = SpanHook::default();
    let summary = process_packages(
        &settings.parse().unwrap(),
        vec![pkg],
        &hook,
        &hook.pattern().hints(),
        &InMemoryWritePort::new(),
    )
    .unwrap();
    summary
        .changed
        .into_iter()
        .next()
        .map(|c| c.after)
        .unwrap_or_else(|| src.to_string())
}

fn insert(src: &str) -> String {
    pass(src, Settings::default())
}

fn remove(src: &str) -> String {
    pass(
        src,
        Settings {
            methods: true,
            ..Settings::default()
        },
    )
}

fn funcs() -> impl Strategy<Value = Vec<(String, Vec<usize>)>> {
    prop::collection::btree_map(
        "[A-Z][a-z]{0,6}",
        prop::collection::vec(0..STMTS.len(), 0..4),
        1..4,
    )
    .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #[test]
    fn insert_is_idempotent(funcs in funcs()) {
        let once = insert(&file_src(&funcs));
        let twice = insert(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn remove_inverts_insert(funcs in funcs()) {
        let src = file_src(&funcs);
        let traced = insert(&src);
        prop_assert!(traced.contains("opentracing.StartSpanFromContext"));
        prop_assert_eq!(remove(&traced), src.clone());
        prop_assert_eq!(remove(&src), src);
    }

    #[test]
    fn every_function_carries_its_own_name(funcs in funcs()) {
        let traced = insert(&file_src(&funcs));
        for (name, _) in &funcs {
            let call = format!("opentracing.StartSpanFromContext(ctx, {name:?})");
            prop_assert!(traced.contains(&call), "missing {}", call);
        }
    }
}

#[test]
fn hints_are_not_needed_for_unaliased_imports() {
    let src = file_src(&[("Foo".to_string(), vec![1])]);
    let traced = insert(&src);
    let path = Utf8PathBuf::from("/work/svc/svc.go");
    let syntax = parse_file(&path, &traced).unwrap();
    let resolver = tracefix_types::SimpleResolver::for_file(&syntax, &BTreeMap::new());
    assert_eq!(
        tracefix_syntax::render(&syntax, &resolver).unwrap(),
        traced
    );
}
