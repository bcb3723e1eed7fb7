//! Printer for the decorated syntax tree.
//!
//! For gofmt-formatted input `render(parse(src)) == src`. Structured statements print in
//! gofmt's canonical spacing; qualified identifiers go through the [`ImportResolver`].

use tracefix_types::dst::{
    BLANK, Block, CallExpr, Decl, Decorations, Expr, File, FuncDecl, ImportDecl, ImportSpec,
    Space, Stmt,
};
use tracefix_types::{ImportResolver, TraceError};

pub fn render(file: &File, resolver: &dyn ImportResolver) -> Result<String, TraceError> {
    let mut out = String::new();
    push_run(&mut out, &file.decs.start, "");
    out.push_str("package ");
    out.push_str(&file.package);
    push_end(&mut out, &file.decs);
    out.push('\n');

    let mut prev_after = Space::None;
    for decl in &file.decls {
        let decs = decl.decs();
        if prev_after.is_empty_line() || decs.before.is_empty_line() {
            out.push('\n');
        }
        push_run(&mut out, &decs.start, "");
        match decl {
            Decl::Import(d) => import_text(&mut out, d),
            Decl::Type(d) => out.push_str(&d.text),
            Decl::Func(d) => func_text(&mut out, d, resolver)?,
            Decl::Other(d) => out.push_str(&d.text),
        }
        push_end(&mut out, decs);
        out.push('\n');
        prev_after = decs.after;
    }

    push_run(&mut out, &file.trailing, "");
    Ok(out)
}

/// Own-line comment run: every comment on its own line, [`BLANK`] as an empty line.
fn push_run(out: &mut String, run: &[String], indent: &str) {
    for tok in run {
        if tok == BLANK {
            out.push('\n');
        } else {
            out.push_str(indent);
            out.push_str(tok);
            out.push('\n');
        }
    }
}

fn push_end(out: &mut String, decs: &Decorations) {
    for c in &decs.end {
        out.push(' ');
        out.push_str(c);
    }
}

fn import_text(out: &mut String, d: &ImportDecl) {
    out.push_str("import ");
    if !d.lparen && d.specs.len() == 1 {
        spec_text(out, &d.specs[0]);
        return;
    }
    if d.specs.is_empty() && d.rparen.is_empty() {
        out.push_str("()");
        return;
    }
    out.push('(');
    for spec in &d.specs {
        out.push('\n');
        if spec.decs.before.is_empty_line() {
            out.push('\n');
        }
        push_run(out, &spec.decs.start, "\t");
        out.push('\t');
        spec_text(out, spec);
        push_end(out, &spec.decs);
    }
    out.push('\n');
    push_run(out, &d.rparen, "\t");
    out.push(')');
}

fn spec_text(out: &mut String, spec: &ImportSpec) {
    if let Some(name) = &spec.name {
        out.push_str(name);
        out.push(' ');
    }
    out.push('"');
    out.push_str(&spec.path);
    out.push('"');
}

fn func_text(out: &mut String, d: &FuncDecl, resolver: &dyn ImportResolver) -> Result<(), TraceError> {
    out.push_str(&d.header);
    if let Some(body) = &d.body {
        out.push(' ');
        block_text(out, body, resolver)?;
    }
    Ok(())
}

fn block_text(out: &mut String, b: &Block, resolver: &dyn ImportResolver) -> Result<(), TraceError> {
    let undecorated = b.lbrace.is_empty() && b.rbrace.is_empty();
    let flat = b.stmts.iter().all(|s| {
        let decs = s.decs();
        decs.is_bare() && !decs.before.is_empty_line() && !decs.after.is_empty_line()
    });
    if b.inline && undecorated && flat {
        if b.stmts.is_empty() {
            out.push_str("{}");
            return Ok(());
        }
        out.push_str("{ ");
        for (i, stmt) in b.stmts.iter().enumerate() {
            if i > 0 {
                out.push_str("; ");
            }
            out.push_str(&stmt_text(stmt, resolver)?);
        }
        out.push_str(" }");
        return Ok(());
    }

    out.push('{');
    for tok in &b.lbrace {
        if tok == BLANK {
            out.push('\n');
        } else {
            out.push_str(if out.ends_with('\n') { "\t" } else { " " });
            out.push_str(tok);
        }
    }

    // An own-line comment after the brace stays detached from the first statement.
    let detached = b.lbrace.first().is_some_and(|t| t == BLANK)
        && b.lbrace.last().is_some_and(|t| t != BLANK);
    let mut prev_after = Space::None;
    for (i, stmt) in b.stmts.iter().enumerate() {
        let decs = stmt.decs();
        out.push('\n');
        if prev_after.is_empty_line() || decs.before.is_empty_line() || (i == 0 && detached) {
            out.push('\n');
        }
        push_run(out, &decs.start, "\t");
        if !is_labeled(stmt) {
            out.push('\t');
        }
        out.push_str(&stmt_text(stmt, resolver)?);
        push_end(out, decs);
        prev_after = decs.after;
    }

    out.push('\n');
    push_run(out, &b.rbrace, "\t");
    out.push('}');
    Ok(())
}

/// `label:` sits one indentation level left of the statements around it.
fn is_labeled(stmt: &Stmt) -> bool {
    let Stmt::Raw(raw) = stmt else {
        return false;
    };
    let rest = raw
        .text
        .trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
    rest.len() < raw.text.len() && rest.starts_with(':') && !rest.starts_with(":=")
}

/// Source text of a statement without its decorations.
pub fn stmt_text(stmt: &Stmt, resolver: &dyn ImportResolver) -> Result<String, TraceError> {
    let mut out = String::new();
    match stmt {
        Stmt::Assign(s) => {
            expr_list(&mut out, &s.lhs, resolver)?;
            out.push(' ');
            out.push_str(s.tok.as_str());
            out.push(' ');
            expr_list(&mut out, &s.rhs, resolver)?;
        }
        Stmt::Defer(s) => {
            out.push_str("defer ");
            call_text(&mut out, &s.call, resolver)?;
        }
        Stmt::Raw(s) => out.push_str(&s.text),
    }
    Ok(out)
}

fn expr_list(out: &mut String, exprs: &[Expr], resolver: &dyn ImportResolver) -> Result<(), TraceError> {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        expr_text(out, e, resolver)?;
    }
    Ok(())
}

fn expr_text(out: &mut String, expr: &Expr, resolver: &dyn ImportResolver) -> Result<(), TraceError> {
    match expr {
        Expr::Ident(id) => {
            if let Some(path) = &id.path {
                out.push_str(&resolver.resolve_package(path)?);
                out.push('.');
            }
            out.push_str(&id.name);
        }
        Expr::Selector { x, sel } => {
            expr_text(out, x, resolver)?;
            out.push('.');
            out.push_str(sel);
        }
        Expr::Call(call) => call_text(out, call, resolver)?,
        Expr::Lit(lit) => out.push_str(lit),
    }
    Ok(())
}

fn call_text(out: &mut String, call: &CallExpr, resolver: &dyn ImportResolver) -> Result<(), TraceError> {
    expr_text(out, &call.fun, resolver)?;
    out.push('(');
    expr_list(out, &call.args, resolver)?;
    out.push(')');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracefix_types::SimpleResolver;
    use tracefix_types::dst::{AssignStmt, AssignTok, DeferStmt, RawStmt};

    const OT: &str = "github.com/opentracing/opentracing-go";

    fn span_start() -> Stmt {
        Stmt::Assign(AssignStmt {
            lhs: vec![Expr::ident("span"), Expr::ident("ctx")],
            tok: AssignTok::Define,
            rhs: vec![Expr::Call(CallExpr::new(
                Expr::qualified(OT, "StartSpanFromContext"),
                vec![Expr::ident("ctx"), Expr::string_lit("Foo")],
            ))],
            decs: Decorations::default(),
        })
    }

    #[test]
    fn qualified_identifiers_use_resolved_name() {
        let mut r = SimpleResolver::default();
        r.insert(OT, "ot");
        assert_eq!(
            stmt_text(&span_start(), &r).unwrap(),
            "span, ctx := ot.StartSpanFromContext(ctx, \"Foo\")"
        );
    }

    #[test]
    fn unresolved_qualifier_is_an_error() {
        let err = stmt_text(&span_start(), &SimpleResolver::default()).unwrap_err();
        assert!(matches!(err, TraceError::UnresolvedImport { path } if path == OT));
    }

    #[test]
    fn defer_statement() {
        let stmt = Stmt::Defer(DeferStmt {
            call: CallExpr::new(
                Expr::Selector {
                    x: Box::new(Expr::ident("span")),
                    sel: "Finish".to_string(),
                },
                vec![],
            ),
            decs: Decorations::default(),
        });
        assert_eq!(
            stmt_text(&stmt, &SimpleResolver::default()).unwrap(),
            "defer span.Finish()"
        );
    }

    fn raw(text: &str) -> Stmt {
        Stmt::Raw(RawStmt {
            text: text.to_string(),
            decs: Decorations::default(),
        })
    }

    #[test]
    fn inline_block_joins_bare_statements() {
        let mut block = Block {
            inline: true,
            ..Block::default()
        };
        let mut out = String::new();
        block_text(&mut out, &block, &SimpleResolver::default()).unwrap();
        assert_eq!(out, "{}");

        block.stmts = vec![raw("a()"), raw("b()")];
        let mut out = String::new();
        block_text(&mut out, &block, &SimpleResolver::default()).unwrap();
        assert_eq!(out, "{ a(); b() }");
    }

    #[test]
    fn inline_block_expands_when_spaced_or_not_inline() {
        let mut r = SimpleResolver::default();
        r.insert(OT, "opentracing");
        let mut first = span_start();
        first.decs_mut().after = Space::EmptyLine;
        let block = Block {
            stmts: vec![first, raw("work()")],
            inline: true,
            ..Block::default()
        };
        let mut out = String::new();
        block_text(&mut out, &block, &r).unwrap();
        assert!(out.starts_with("{\n\tspan, ctx := "));
        assert!(out.ends_with("\n\n\twork()\n}"));

        let block = Block {
            stmts: vec![raw("a()"), raw("b()")],
            ..Block::default()
        };
        let mut out = String::new();
        block_text(&mut out, &block, &r).unwrap();
        assert_eq!(out, "{\n\ta()\n\tb()\n}");
    }

    #[test]
    fn labels_are_outdented() {
        let block = Block {
            stmts: vec![
                raw("goto next"),
                raw("next:\n\tx := 1"),
                raw("x := 2"),
            ],
            ..Block::default()
        };
        let mut out = String::new();
        block_text(&mut out, &block, &SimpleResolver::default()).unwrap();
        assert_eq!(out, "{\n\tgoto next\nnext:\n\tx := 1\n\tx := 2\n}");
        assert!(!is_labeled(&raw("x := 2")));
        assert!(!is_labeled(&raw(":x")));
    }

    #[test]
    fn grouped_import_with_one_spec_keeps_parens() {
        let d = ImportDecl {
            specs: vec![ImportSpec::new("context")],
            lparen: true,
            ..ImportDecl::default()
        };
        let mut out = String::new();
        import_text(&mut out, &d);
        assert_eq!(out, "import (\n\t\"context\"\n)");

        let single = ImportDecl {
            lparen: false,
            ..d
        };
        let mut out = String::new();
        import_text(&mut out, &single);
        assert_eq!(out, "import \"context\"");
    }
}
