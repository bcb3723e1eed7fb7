//! Eligibility rules: which declarations get the span prologue and which lose it.
//!
//! This crate decides *whether* a function is instrumented. *How* the body is edited lives in
//! `tracefix-edit`.

mod eligibility;
mod settings;
mod tags;

pub use eligibility::{Candidate, TypeTags, Verdict, decide};
pub use settings::{DEFAULT_EXCLUDE, ResolvedSettings, Settings};
pub use tags::Tag;
