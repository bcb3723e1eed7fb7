//! Embeddable core library for tracefix.
//!
//! Provides a clap-free, I/O-abstracted entry point for instrumenting Go packages.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`PackageSource`](ports::PackageSource) - load and parse packages
//! - [`WritePort`](ports::WritePort) - persist transformed files
//!
//! The [`adapters`] module provides filesystem-backed and in-memory implementations.
//!
//! # Entry points
//!
//! - [`run`](pipeline::run) - load, transform and write
//! - [`process_packages`](pipeline::process_packages) - transform already loaded packages
//! - [`render_patch`](preview::render_patch) - unified diff of a run's changes

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod preview;
pub mod settings;

pub use pipeline::{RunOutcome, process_packages, run};
pub use preview::render_patch;
pub use settings::RunSettings;

// Re-exported so embedders don't need the leaf crates directly.
pub use tracefix_domain::Settings;
pub use tracefix_edit::{Mutator, SpanHook, SpanPattern};
pub use tracefix_types::report::{ChangedFile, Direction, RunSummary};
pub use tracefix_types::{Package, TraceError};
