use std::collections::BTreeSet;
use tracefix_types::dst::FuncDecl;
use tracefix_types::report::Direction;

/// Result of one mutate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutateOutcome {
    pub direction: Direction,
    /// Import paths the rewritten body now references. Empty in the remove direction.
    pub imports: BTreeSet<String>,
    /// Whether the body was modified.
    pub changed: bool,
}

impl MutateOutcome {
    pub fn untouched(direction: Direction) -> Self {
        Self {
            direction,
            imports: BTreeSet::new(),
            changed: false,
        }
    }
}

/// Rewrites a function body in place.
///
/// Called once per function declaration with the eligibility verdict. Implementations must be
/// idempotent: calling twice with the same `should_skip` leaves the second call a no-op.
pub trait Mutator {
    fn mutate(&self, func: &mut FuncDecl, should_skip: bool) -> MutateOutcome;

    /// Import paths this mutator may introduce; the engine reconciles exactly these.
    fn managed_imports(&self) -> Vec<String>;
}
