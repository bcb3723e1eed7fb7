//! Edits applied to parsed Go files.
//!
//! Responsibilities:
//! - Locate, synthesize, insert and remove the span prologue in a function body.
//! - Keep import blocks consistent with the generated references.
//!
//! Whether a function is edited is decided by `tracefix-domain`.

pub mod imports;
mod hook;
mod span;

pub use hook::{MutateOutcome, Mutator};
pub use span::{Mode, Slots, SpanHook, SpanPattern, apply, locate, synthesize};
