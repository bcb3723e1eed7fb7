//! The span prologue:
//!
//! ```go
//! span, ctx := opentracing.StartSpanFromContext(ctx, "Foo")
//! defer span.Finish()
//! ```

use crate::hook::{MutateOutcome, Mutator};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracefix_types::dst::{
    AssignStmt, AssignTok, BLANK, Block, CallExpr, Decorations, DeferStmt, Expr, FuncDecl, Space,
    Stmt,
};
use tracefix_types::report::Direction;
use tracing::debug;

/// Index of the matched entry and cleanup statements.
pub type Slots = [Option<usize>; 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Insert,
    Remove,
}

/// The tracing API the prologue calls into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanPattern {
    pub import_path: String,
    /// Name the package is referred to by when the file does not alias it.
    pub package_name: String,
    /// Function called with `(ctx, "<name>")` returning `(span, ctx)`.
    pub entry: String,
    /// Method deferred on the span.
    pub finish: String,
}

impl Default for SpanPattern {
    fn default() -> Self {
        Self {
            import_path: "github.com/opentracing/opentracing-go".to_string(),
            package_name: "opentracing".to_string(),
            entry: "StartSpanFromContext".to_string(),
            finish: "Finish".to_string(),
        }
    }
}

impl SpanPattern {
    /// Resolver hint naming the tracing package.
    pub fn hints(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(self.import_path.clone(), self.package_name.clone())])
    }

    fn is_entry_call(&self, expr: &Expr) -> bool {
        let Expr::Call(call) = expr else {
            return false;
        };
        match call.fun.as_ref() {
            Expr::Ident(id) => {
                id.path.as_deref() == Some(self.import_path.as_str()) && id.name == self.entry
            }
            Expr::Selector { x, sel } => {
                sel == &self.entry
                    && x.as_ident().is_some_and(|id| id.is_plain(&self.package_name))
            }
            _ => false,
        }
    }

    fn is_entry(&self, stmt: &Stmt) -> bool {
        let Stmt::Assign(a) = stmt else {
            return false;
        };
        a.tok == AssignTok::Define
            && a.lhs.len() == 2
            && a.rhs.len() == 1
            && a.lhs[0].as_ident().is_some_and(|id| id.is_plain("span"))
            && a.lhs[1].as_ident().is_some_and(|id| id.is_plain("ctx"))
            && self.is_entry_call(&a.rhs[0])
    }

    fn is_cleanup(&self, stmt: &Stmt) -> bool {
        let Stmt::Defer(d) = stmt else {
            return false;
        };
        match d.call.fun.as_ref() {
            Expr::Selector { x, sel } => {
                sel == &self.finish && x.as_ident().is_some_and(|id| id.is_plain("span"))
            }
            _ => false,
        }
    }
}

/// Finds the first entry and the first cleanup statement of `body`.
pub fn locate(pattern: &SpanPattern, body: &Block) -> Slots {
    let mut slots = [None, None];
    for (i, stmt) in body.stmts.iter().enumerate() {
        if slots[0].is_none() && pattern.is_entry(stmt) {
            slots[0] = Some(i);
        } else if slots[1].is_none() && pattern.is_cleanup(stmt) {
            slots[1] = Some(i);
        }
    }
    slots
}

/// A fresh prologue for the function named `name`.
pub fn synthesize(pattern: &SpanPattern, name: &str) -> [Stmt; 2] {
    let entry = Stmt::Assign(AssignStmt {
        lhs: vec![Expr::ident("span"), Expr::ident("ctx")],
        tok: AssignTok::Define,
        rhs: vec![Expr::Call(CallExpr::new(
            Expr::qualified(&pattern.import_path, &pattern.entry),
            vec![Expr::ident("ctx"), Expr::string_lit(name)],
        ))],
        decs: Decorations::default(),
    });
    let cleanup = Stmt::Defer(DeferStmt {
        call: CallExpr::new(
            Expr::Selector {
                x: Box::new(Expr::ident("span")),
                sel: pattern.finish.clone(),
            },
            Vec::new(),
        ),
        decs: Decorations::default(),
    });
    [entry, cleanup]
}

/// Matched `(slot, index)` pairs in ascending index order.
fn matched(slots: Slots) -> Vec<(usize, usize)> {
    let mut out: Vec<_> = slots
        .iter()
        .enumerate()
        .filter_map(|(slot, idx)| idx.map(|i| (slot, i)))
        .collect();
    out.sort_by_key(|&(_, i)| i);
    out
}

/// Inserts `fresh` at the top of `body` or removes the matched statements.
pub fn apply(body: &mut Block, slots: Slots, fresh: [Stmt; 2], mode: Mode) {
    let matched = matched(slots);
    match mode {
        Mode::Insert => insert(body, &matched, fresh),
        Mode::Remove => remove(body, &matched),
    }
}

fn insert(body: &mut Block, matched: &[(usize, usize)], mut fresh: [Stmt; 2]) {
    let user_stmts_remain = body.stmts.len() > matched.len();

    // Keep a comment after the brace from attaching to the generated code.
    if user_stmts_remain
        && body.lbrace.first().is_some_and(|t| t == BLANK)
        && body.lbrace.last().is_some_and(|t| t != BLANK)
    {
        body.lbrace.push(BLANK.to_string());
    }

    for (offset, &(slot, idx)) in matched.iter().enumerate() {
        let at = idx - offset;
        let decs = Decorations::transplant(body.stmts[at].decs(), fresh[slot].decs());
        *fresh[slot].decs_mut() = decs;
        if at > 0 {
            let prev = body.stmts[at - 1].decs_mut();
            if prev.after.is_empty_line() {
                prev.after = Space::NewLine;
            }
        }
        body.stmts.remove(at);
    }

    if !body.stmts.is_empty() {
        fresh[1].decs_mut().after = Space::EmptyLine;
    }
    fresh[0].decs_mut().before = Space::NewLine;
    body.stmts.splice(0..0, fresh);
    body.inline = false;
}

fn remove(body: &mut Block, matched: &[(usize, usize)]) {
    if matched.is_empty() {
        return;
    }
    let mut orphaned: Vec<String> = Vec::new();
    for (offset, &(_, idx)) in matched.iter().enumerate() {
        let removed = body.stmts.remove(idx - offset);
        let decs = removed.decs();
        orphaned.extend(decs.start.iter().cloned());
        orphaned.extend(decs.end.iter().cloned());
    }
    // Comments of removed statements move to the next statement, or before the brace.
    orphaned.retain(|t| t != BLANK);

    match body.stmts.first_mut() {
        Some(first) => {
            let decs = first.decs_mut();
            decs.before = Space::NewLine;
            if !orphaned.is_empty() {
                orphaned.append(&mut decs.start);
                decs.start = orphaned;
            }
        }
        None => {
            body.rbrace.splice(0..0, orphaned);
            if body.lbrace.is_empty() && body.rbrace.is_empty() {
                body.inline = true;
            }
        }
    }
}

/// The default mutator: maintains the span prologue at the top of every function taking a
/// leading `context.Context`.
#[derive(Debug, Clone, Default)]
pub struct SpanHook {
    pattern: SpanPattern,
}

impl SpanHook {
    pub fn new(pattern: SpanPattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &SpanPattern {
        &self.pattern
    }
}

impl Mutator for SpanHook {
    fn mutate(&self, func: &mut FuncDecl, should_skip: bool) -> MutateOutcome {
        let direction = if should_skip {
            Direction::Remove
        } else {
            Direction::Insert
        };
        if func.first_param_type() != Some("context.Context") {
            return MutateOutcome::untouched(direction);
        }
        let name = func.name.clone();
        let Some(body) = func.body.as_mut() else {
            return MutateOutcome::untouched(direction);
        };

        let before = body.clone();
        let slots = locate(&self.pattern, body);
        let mode = if should_skip { Mode::Remove } else { Mode::Insert };
        apply(body, slots, synthesize(&self.pattern, &name), mode);
        let changed = *body != before;
        if changed {
            debug!(func = %name, ?direction, "rewrote prologue");
        }

        let imports = match direction {
            Direction::Insert => BTreeSet::from([self.pattern.import_path.clone()]),
            Direction::Remove => BTreeSet::new(),
        };
        MutateOutcome {
            direction,
            imports,
            changed,
        }
    }

    fn managed_imports(&self) -> Vec<String> {
        vec![self.pattern.import_path.clone()]
    }
}
