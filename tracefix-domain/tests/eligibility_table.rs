//! Eligibility decisions over whole parsed files, one verdict per function in source order.

use camino::Utf8Path;
use pretty_assertions::assert_eq;
use tracefix_domain::{Candidate, Settings, TypeTags, decide};

const FUNC: &str = "package main\n\nfunc Foo() {}\n";

const METHOD: &str = "package main\n\ntype Foo struct{}\n\nfunc (f *Foo) Foo() {}\n";

const UNEXPORTED: &str = "package main\n\nfunc foo() {}\n";

const SKIPPED_FUNC_AND_METHOD: &str = r#"package main

//trace:skip
func Foo() {}

type Bar struct{}

//trace:skip
func (b *Bar) Foo() {}
"#;

const EXPLICIT_INCLUDE_METHOD: &str = r#"package main

//trace:skip
type Foo struct{}

func (f *Foo) A() {}

//trace:enable
func (f *Foo) B() {}
"#;

const ENABLED_TYPE: &str = r#"package main

// Svc is traced.
//trace:enable
type Svc struct{}

func (s Svc) A() {}

//trace:skip
func (s *Svc) B() {}

func C() {}
"#;

fn skips(src: &str, settings: Settings) -> Vec<bool> {
    let file = tracefix_syntax::parse_file(Utf8Path::new("sample.go"), src).unwrap();
    let settings = settings.parse().unwrap();
    let types = TypeTags::scan(&settings, file.types());
    file.funcs()
        .map(|f| decide(&settings, &Candidate::from_func(f), &types).should_skip())
        .collect()
}

fn with(tagged: bool, exported: bool, methods: bool) -> Settings {
    Settings {
        exclude: Vec::new(),
        tagged,
        exported,
        methods,
    }
}

#[test]
fn default_calls_funcs() {
    assert_eq!(skips(FUNC, Settings::default()), vec![false]);
}

#[test]
fn default_calls_methods() {
    assert_eq!(skips(METHOD, Settings::default()), vec![false]);
}

#[test]
fn default_calls_unexported_funcs() {
    assert_eq!(skips(UNEXPORTED, Settings::default()), vec![false]);
}

#[test]
fn default_skips_tagged_funcs_and_methods() {
    assert_eq!(skips(SKIPPED_FUNC_AND_METHOD, Settings::default()), vec![true, true]);
}

#[test]
fn methods_policy_skips_funcs() {
    assert_eq!(skips(FUNC, with(false, false, true)), vec![true]);
    assert_eq!(skips(METHOD, with(false, false, true)), vec![false]);
}

#[test]
fn exported_policy_skips_unexported_funcs() {
    assert_eq!(skips(UNEXPORTED, with(false, true, false)), vec![true]);
    assert_eq!(skips(FUNC, with(false, true, false)), vec![false]);
}

#[test]
fn explicit_include_preempts_skipped_type() {
    assert_eq!(skips(EXPLICIT_INCLUDE_METHOD, Settings::default()), vec![true, false]);
}

#[test]
fn explicit_include_preempts_untagged_parent() {
    assert_eq!(skips(EXPLICIT_INCLUDE_METHOD, with(true, false, false)), vec![true, false]);
}

#[test]
fn enabled_type_propagates_under_tagged() {
    assert_eq!(skips(ENABLED_TYPE, with(true, false, false)), vec![false, true, true]);
}

#[test]
fn settings_deserialize_from_toml() {
    let s: Settings = toml::from_str("exclude = ['/gen/']\ntagged = true\n").unwrap();
    assert_eq!(s.exclude, vec!["/gen/"]);
    assert!(s.tagged);
    assert!(!s.methods);
}
