//! Import block maintenance.

use regex::Regex;
use tracefix_types::dst::{
    CallExpr, Decl, Decorations, Expr, File, ImportDecl, ImportSpec, Space, Stmt, assumed_name,
};
use tracefix_types::{ImportResolver, SimpleResolver};
use tracing::debug;

/// Adds `path` to the file's imports unless it is already imported or `name` is already bound.
///
/// The new import spec joins the first import block that is not a cgo preamble, before the first
/// dotted path sorting after it. Without such a block a new one is created after the cgo block
/// (or first in the file). Returns whether the file changed.
pub fn ensure(file: &mut File, path: &str, name: &str) -> bool {
    if file.imports_path(path) {
        return false;
    }
    if file
        .import_specs()
        .any(|s| s.binding().as_deref() == Some(name))
    {
        debug!(path, name, "name already bound, not importing");
        return false;
    }

    let mut index = 0;
    for (i, decl) in file.decls.iter_mut().enumerate() {
        let Some(block) = decl.as_import_mut() else {
            continue;
        };
        if block.is_cgo() {
            index = i + 1;
            continue;
        }
        insert_spec(block, path);
        debug!(path, "added import");
        return true;
    }

    let block = ImportDecl {
        specs: vec![ImportSpec::new(path)],
        lparen: false,
        rparen: Vec::new(),
        decs: Decorations {
            before: Space::EmptyLine,
            after: Space::EmptyLine,
            ..Decorations::default()
        },
    };
    file.decls.insert(index, Decl::Import(block));
    debug!(path, "added import block");
    true
}

fn insert_spec(block: &mut ImportDecl, path: &str) {
    let mut spec = ImportSpec::new(path);
    let at = block
        .specs
        .iter()
        .position(|s| s.path.contains('.') && path <= s.path.as_str());
    match at {
        Some(j) => {
            spec.decs.before = block.specs[j].decs.before;
            block.specs[j].decs.before = Space::NewLine;
            block.specs.insert(j, spec);
        }
        None => {
            // Third-party paths start their own group after the standard library.
            let after_stdlib = block.specs.last().is_some_and(|s| !s.path.contains('.'));
            if path.contains('.') && after_stdlib {
                spec.decs.before = Space::EmptyLine;
            }
            block.specs.push(spec);
        }
    }
}

/// Removes the binding imports of `path`. Blank and dot imports stay.
///
/// An emptied block is dropped; a parenthesized block left with one undecorated import spec is
/// written on one line. Returns whether the file changed.
pub fn remove(file: &mut File, path: &str) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < file.decls.len() {
        let Some(block) = file.decls[i].as_import_mut() else {
            i += 1;
            continue;
        };
        let Some(j) = block
            .specs
            .iter()
            .position(|s| s.path == path && s.binding().is_some())
        else {
            i += 1;
            continue;
        };

        let removed = block.specs.remove(j);
        changed = true;
        let mut comments = removed.decs.start;
        comments.extend(removed.decs.end);
        match block.specs.get_mut(j) {
            Some(next) => {
                if j == 0 || removed.decs.before.is_empty_line() {
                    next.decs.before = removed.decs.before;
                }
                if !comments.is_empty() {
                    comments.append(&mut next.decs.start);
                    next.decs.start = comments;
                }
            }
            None => {
                block.rparen.splice(0..0, comments);
            }
        }

        if block.specs.is_empty() {
            let decl = file.decls.remove(i);
            if let Some(next) = file.decls.get_mut(i) {
                let mut start = decl.decs().start.clone();
                let next = next.decs_mut();
                start.append(&mut next.start);
                next.start = start;
            }
            continue;
        }
        if block.specs.len() == 1 && block.rparen.is_empty() && block.specs[0].decs.is_bare() {
            block.lparen = false;
            block.specs[0].decs.before = Space::None;
        }
    }
    if changed {
        debug!(path, "removed import");
    }
    changed
}

/// Whether the file refers to the package imported from `path`.
///
/// Structured code is checked by import path. Verbatim text is checked for `name.` where `name`
/// is the identifier the file binds the package to.
pub fn is_referenced(file: &File, path: &str) -> bool {
    if references_path(file, path) {
        return true;
    }
    let names: Vec<String> = file
        .import_specs()
        .filter(|s| s.path == path)
        .filter_map(|s| s.binding())
        .collect();
    names.iter().any(|name| text_mentions(file, name))
}

/// Qualified references to `path` in structured statements.
pub fn references_path(file: &File, path: &str) -> bool {
    let mut found = Vec::new();
    for func in file.funcs() {
        let Some(body) = &func.body else {
            continue;
        };
        for stmt in &body.stmts {
            stmt.qualified_paths(&mut found);
        }
    }
    found.iter().any(|p| *p == path)
}

fn text_mentions(file: &File, name: &str) -> bool {
    let Ok(re) = Regex::new(&format!(r"\b{}\s*\.", regex::escape(name))) else {
        return true;
    };
    file.decls.iter().any(|decl| match decl {
        Decl::Import(_) => false,
        Decl::Type(t) => re.is_match(&t.text),
        Decl::Other(o) => re.is_match(&o.text),
        Decl::Func(f) => {
            re.is_match(&f.header)
                || f.body.as_ref().is_some_and(|b| {
                    b.stmts.iter().any(|s| match s {
                        Stmt::Raw(r) => re.is_match(&r.text),
                        Stmt::Assign(a) => {
                            a.lhs.iter().chain(a.rhs.iter()).any(|e| selects(e, name))
                        }
                        Stmt::Defer(d) => call_selects(&d.call, name),
                    })
                })
        }
    })
}

/// `name.X` written as a plain selector.
fn selects(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Selector { x, .. } => {
            x.as_ident().is_some_and(|id| id.is_plain(name)) || selects(x, name)
        }
        Expr::Call(call) => call_selects(call, name),
        Expr::Ident(_) | Expr::Lit(_) => false,
    }
}

fn call_selects(call: &CallExpr, name: &str) -> bool {
    selects(&call.fun, name) || call.args.iter().any(|a| selects(a, name))
}

/// Brings the imports of `managed` paths in line with the file's references: unreferenced
/// imports are removed, referenced but missing ones are added. Other imports are untouched.
pub fn reconcile(file: &mut File, managed: &[String], resolver: &SimpleResolver) -> bool {
    let mut changed = false;
    for path in managed {
        let imported = file
            .import_specs()
            .any(|s| s.path == *path && s.binding().is_some());
        if imported {
            if !is_referenced(file, path) {
                changed |= remove(file, path);
            }
        } else if references_path(file, path) {
            let name = resolver
                .resolve_package(path)
                .unwrap_or_else(|_| assumed_name(path));
            changed |= ensure(file, path, &name);
        }
    }
    changed
}
