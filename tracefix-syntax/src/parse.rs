//! Decoration-preserving parser for the Go subset tracefix rewrites.
//!
//! The concrete syntax tree comes from tree-sitter-go. Declarations are taken apart down to
//! function bodies, where every statement node becomes one [`Stmt`]: single-line assignments
//! and `defer` calls in canonical form are structured, everything else is kept verbatim.
//! Comments and blank lines between nodes become [`Decorations`].

use crate::print;
use camino::Utf8Path;
use std::collections::BTreeMap;
use tracefix_types::dst::{
    AssignStmt, AssignTok, BLANK, Block, CallExpr, Decl, Decorations, DeferStmt, Expr, Field,
    File, FuncDecl, Ident, ImportDecl, ImportSpec, RawDecl, RawStmt, Receiver, RecvType, Space,
    Stmt, TypeDecl,
};
use tracefix_types::{SimpleResolver, TraceError};
use tree_sitter::{Node, Parser, Point};

/// Parses `src`; `path` is only used in error messages.
pub fn parse_file(path: &Utf8Path, src: &str) -> Result<File, TraceError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| error_at(path, Point::default(), e.to_string()))?;
    let tree = parser
        .parse(src, None)
        .ok_or_else(|| error_at(path, Point::default(), "parse cancelled".to_string()))?;

    let root = tree.root_node();
    if let Some(bad) = first_error(root) {
        let message = if bad.is_missing() {
            format!("expected '{}'", bad.kind())
        } else {
            "syntax error".to_string()
        };
        return Err(error_at(path, bad.start_position(), message));
    }

    let mut builder = Builder {
        src,
        bindings: BTreeMap::new(),
    };
    builder
        .file(root)
        .map_err(|e| error_at(path, e.at, e.message))
}

fn error_at(path: &Utf8Path, at: Point, message: String) -> TraceError {
    TraceError::Parse {
        path: path.to_path_buf(),
        line: at.row + 1,
        column: at.column + 1,
        message,
    }
}

/// First `ERROR` or missing node in source order.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

#[derive(Debug)]
struct SyntaxError {
    at: Point,
    message: String,
}

impl SyntaxError {
    fn at(node: Node<'_>, message: impl Into<String>) -> Self {
        Self {
            at: node.start_position(),
            message: message.into(),
        }
    }
}

type PResult<T> = Result<T, SyntaxError>;

/// Comments and spacing collected ahead of a node.
#[derive(Debug, Default)]
struct Leading {
    before: Space,
    start: Vec<String>,
}

impl Leading {
    /// Comment run form used for trailing comments of a file, block or import group.
    fn into_run(self) -> Vec<String> {
        if self.start.is_empty() {
            return Vec::new();
        }
        let mut run = Vec::new();
        if self.before.is_empty_line() {
            run.push(BLANK.to_string());
        }
        run.extend(self.start);
        while run.last().is_some_and(|t| t == BLANK) {
            run.pop();
        }
        run
    }
}

#[derive(Debug, Clone, Copy)]
enum Piece<'a, 't> {
    Node(Node<'t>),
    Comment(&'a str),
    Newline,
}

/// The named children of one container with the line breaks between them.
///
/// Decorations only depend on where comments sit relative to line breaks, so the text
/// between children is reduced to its newlines.
struct Pieces<'a, 't> {
    items: Vec<Piece<'a, 't>>,
    pos: usize,
}

impl<'a, 't> Pieces<'a, 't> {
    /// Pieces of `children`, all of which lie in the byte range `from..to` of `src`.
    fn new(src: &'a str, children: &[Node<'t>], from: usize, to: usize) -> Self {
        let mut items = Vec::new();
        let mut at = from;
        for &node in children {
            push_newlines(&mut items, src.get(at..node.start_byte()).unwrap_or(""));
            if node.kind() == "comment" {
                let text = node.utf8_text(src.as_bytes()).unwrap_or("");
                items.push(Piece::Comment(text.trim_end_matches('\r')));
            } else {
                items.push(Piece::Node(node));
            }
            at = node.end_byte();
        }
        push_newlines(&mut items, src.get(at..to).unwrap_or(""));
        Self { items, pos: 0 }
    }

    fn peek(&self) -> Option<Piece<'a, 't>> {
        self.items.get(self.pos).copied()
    }

    fn node(&self) -> Option<Node<'t>> {
        match self.peek() {
            Some(Piece::Node(node)) => Some(node),
            _ => None,
        }
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_newline(&mut self) {
        if matches!(self.peek(), Some(Piece::Newline)) {
            self.bump();
        }
    }

    /// Collects blank lines and own-line comments up to the next node.
    fn leading(&mut self) -> Leading {
        let mut out = Leading::default();
        let mut blank = false;
        loop {
            match self.peek() {
                Some(Piece::Newline) => {
                    blank = true;
                    self.bump();
                }
                Some(Piece::Comment(text)) => {
                    if out.start.is_empty() {
                        out.before = if blank { Space::EmptyLine } else { Space::NewLine };
                    } else if blank {
                        out.start.push(BLANK.to_string());
                    }
                    out.start.push(text.to_string());
                    blank = false;
                    self.bump();
                    self.skip_newline();
                }
                _ => break,
            }
        }
        if out.start.is_empty() {
            out.before = if blank { Space::EmptyLine } else { Space::NewLine };
        } else if blank {
            out.start.push(BLANK.to_string());
        }
        out
    }

    /// Comments on the same line after a node.
    fn line_end_comments(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(Piece::Comment(text)) = self.peek() {
            out.push(text.to_string());
            self.bump();
        }
        out
    }
}

fn push_newlines(items: &mut Vec<Piece<'_, '_>>, gap: &str) {
    let n = gap.matches('\n').count();
    items.extend(std::iter::repeat_n(Piece::Newline, n));
}

struct Builder<'a> {
    src: &'a str,
    /// Package names bound by the imports seen so far.
    bindings: BTreeMap<String, String>,
}

impl<'a> Builder<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.src.as_bytes()).unwrap_or("")
    }

    fn file(&mut self, root: Node<'_>) -> PResult<File> {
        let children = named_children(root);
        let mut pieces = Pieces::new(self.src, &children, 0, self.src.len());

        let lead = pieces.leading();
        let Some(clause) = pieces.node().filter(|n| n.kind() == "package_clause") else {
            return Err(SyntaxError::at(pieces.node().unwrap_or(root), "expected 'package'"));
        };
        pieces.bump();
        let name = named_children(clause)
            .into_iter()
            .find(|n| n.kind() == "package_identifier")
            .ok_or_else(|| SyntaxError::at(clause, "expected package name"))?;

        let mut file = File {
            package: self.text(name).to_string(),
            ..File::default()
        };
        let mut start = lead.start;
        if !start.is_empty() && lead.before.is_empty_line() {
            start.insert(0, BLANK.to_string());
        }
        file.decs.start = start;
        file.decs.end = pieces.line_end_comments();
        pieces.skip_newline();

        loop {
            let lead = pieces.leading();
            let Some(node) = pieces.node() else {
                file.trailing = lead.into_run();
                break;
            };
            pieces.bump();
            let mut decl = self.decl(node)?;
            let decs = decl.decs_mut();
            decs.before = lead.before;
            decs.start = lead.start;
            decs.end = pieces.line_end_comments();
            pieces.skip_newline();
            file.decls.push(decl);
        }
        Ok(file)
    }

    fn decl(&mut self, node: Node<'_>) -> PResult<Decl> {
        Ok(match node.kind() {
            "import_declaration" => Decl::Import(self.import_decl(node)?),
            "type_declaration" => Decl::Type(self.type_decl(node)),
            "function_declaration" | "method_declaration" => Decl::Func(self.func_decl(node)?),
            _ => Decl::Other(RawDecl {
                text: self.text(node).to_string(),
                decs: Decorations::default(),
            }),
        })
    }

    fn import_decl(&mut self, node: Node<'_>) -> PResult<ImportDecl> {
        let mut decl = ImportDecl::default();
        let children = named_children(node);

        if let Some(&list) = children.iter().find(|n| n.kind() == "import_spec_list") {
            decl.lparen = true;
            let inner = named_children(list);
            // Inside the parentheses.
            let mut pieces =
                Pieces::new(self.src, &inner, list.start_byte() + 1, list.end_byte() - 1);
            let mut pending = pieces.line_end_comments();
            pieces.skip_newline();
            loop {
                let lead = pieces.leading();
                let Some(node) = pieces.node() else {
                    decl.rparen = lead.into_run();
                    break;
                };
                pieces.bump();
                let mut spec = self.import_spec(node)?;
                spec.decs.before = lead.before;
                spec.decs.start = std::mem::take(&mut pending);
                spec.decs.start.extend(lead.start);
                spec.decs.end = pieces.line_end_comments();
                pieces.skip_newline();
                decl.specs.push(spec);
            }
            return Ok(decl);
        }

        let spec = children
            .into_iter()
            .find(|n| n.kind() == "import_spec")
            .ok_or_else(|| SyntaxError::at(node, "expected import spec"))?;
        decl.specs.push(self.import_spec(spec)?);
        Ok(decl)
    }

    fn import_spec(&mut self, node: Node<'_>) -> PResult<ImportSpec> {
        let lit = node
            .child_by_field_name("path")
            .ok_or_else(|| SyntaxError::at(node, "expected import path"))?;
        let raw = self.text(lit);
        let spec = ImportSpec {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string()),
            path: raw
                .get(1..raw.len().saturating_sub(1))
                .unwrap_or("")
                .to_string(),
            decs: Decorations::default(),
        };
        if let Some(binding) = spec.binding() {
            self.bindings.insert(binding, spec.path.clone());
        }
        Ok(spec)
    }

    fn type_decl(&self, node: Node<'_>) -> TypeDecl {
        let name = named_children(node)
            .into_iter()
            .find(|n| matches!(n.kind(), "type_spec" | "type_alias"))
            .and_then(|spec| spec.child_by_field_name("name"))
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        TypeDecl {
            name,
            text: self.text(node).to_string(),
            decs: Decorations::default(),
        }
    }

    fn func_decl(&self, node: Node<'_>) -> PResult<FuncDecl> {
        let name = node
            .child_by_field_name("name")
            .ok_or_else(|| SyntaxError::at(node, "expected function name"))?;
        let body = node.child_by_field_name("body");
        let header_end = body.map_or(node.end_byte(), |b| b.start_byte());
        let header = self
            .src
            .get(node.start_byte()..header_end)
            .unwrap_or("")
            .trim_end();

        Ok(FuncDecl {
            name: self.text(name).to_string(),
            recv: node
                .child_by_field_name("receiver")
                .map(|r| self.receiver(r)),
            params: node
                .child_by_field_name("parameters")
                .map(|p| self.params(p))
                .unwrap_or_default(),
            header: header.to_string(),
            body: body.map(|b| self.block(b)),
            decs: Decorations::default(),
        })
    }

    fn receiver(&self, list: Node<'_>) -> Receiver {
        let decl = named_children(list)
            .into_iter()
            .find(|n| n.kind() == "parameter_declaration");
        let name = decl
            .and_then(|d| d.child_by_field_name("name"))
            .map(|n| self.text(n).to_string());
        let ty = match decl.and_then(|d| d.child_by_field_name("type")) {
            Some(t) if t.kind() == "type_identifier" => RecvType::Value(self.text(t).to_string()),
            Some(t) if t.kind() == "pointer_type" => {
                let inner: Vec<_> = named_children(t)
                    .into_iter()
                    .filter(|n| n.kind() != "comment")
                    .collect();
                match inner.as_slice() {
                    [id] if id.kind() == "type_identifier" => {
                        RecvType::Pointer(self.text(*id).to_string())
                    }
                    _ => RecvType::Unresolved(self.text(t).to_string()),
                }
            }
            Some(t) => RecvType::Unresolved(self.text(t).to_string()),
            None => RecvType::Unresolved(
                self.text(list).trim_matches(['(', ')']).trim().to_string(),
            ),
        };
        Receiver { name, ty }
    }

    fn params(&self, list: Node<'_>) -> Vec<Field> {
        named_children(list)
            .into_iter()
            .filter_map(|p| {
                let ty = self.text(p.child_by_field_name("type")?);
                let ty = match p.kind() {
                    "parameter_declaration" => ty.to_string(),
                    "variadic_parameter_declaration" => format!("...{ty}"),
                    _ => return None,
                };
                let mut cursor = p.walk();
                let names = p
                    .children_by_field_name("name", &mut cursor)
                    .map(|n| self.text(n).to_string())
                    .collect();
                Some(Field { names, ty })
            })
            .collect()
    }

    fn block(&self, node: Node<'_>) -> Block {
        let mut children = Vec::new();
        for child in named_children(node) {
            if child.kind() == "statement_list" {
                children.extend(named_children(child));
            } else {
                children.push(child);
            }
        }
        children.retain(|n| n.kind() != "empty_statement");

        let mut block = Block {
            inline: node.start_position().row == node.end_position().row,
            ..Block::default()
        };
        // Between the braces.
        let mut pieces = Pieces::new(
            self.src,
            &children,
            node.start_byte() + 1,
            node.end_byte().saturating_sub(1),
        );
        if !block.inline {
            block.lbrace = pieces.line_end_comments();
            pieces.skip_newline();
        }

        let mut first = true;
        loop {
            let mut lead = pieces.leading();
            let Some(node) = pieces.node() else {
                block.rbrace = lead.into_run();
                break;
            };
            pieces.bump();
            if first && !block.inline {
                split_lbrace(&mut block.lbrace, &mut lead);
            }
            first = false;

            let mut stmt = self.stmt(node);
            let decs = stmt.decs_mut();
            decs.before = lead.before;
            decs.start = lead.start;
            decs.end = pieces.line_end_comments();
            pieces.skip_newline();
            block.stmts.push(stmt);
        }
        block
    }

    fn stmt(&self, node: Node<'_>) -> Stmt {
        let text = self.text(node);
        if !text.contains('\n')
            && let Some(stmt) = self.simple_stmt(node, text)
        {
            return stmt;
        }
        Stmt::Raw(RawStmt {
            text: text.to_string(),
            decs: Decorations::default(),
        })
    }

    /// Structured form of a canonical single-line assignment or defer call.
    fn simple_stmt(&self, node: Node<'_>, text: &str) -> Option<Stmt> {
        let stmt = match node.kind() {
            "defer_statement" => {
                let children = code_children(node);
                let [call] = children.as_slice() else {
                    return None;
                };
                let Expr::Call(call) = self.expr(*call)? else {
                    return None;
                };
                Stmt::Defer(DeferStmt {
                    call,
                    decs: Decorations::default(),
                })
            }
            "short_var_declaration" | "assignment_statement" => {
                let tok = match node.child_by_field_name("operator").map(|op| self.text(op)) {
                    None if node.kind() == "short_var_declaration" => AssignTok::Define,
                    Some("=") => AssignTok::Assign,
                    _ => return None,
                };
                Stmt::Assign(AssignStmt {
                    lhs: self.expr_list(node.child_by_field_name("left")?)?,
                    tok,
                    rhs: self.expr_list(node.child_by_field_name("right")?)?,
                    decs: Decorations::default(),
                })
            }
            _ => return None,
        };

        // Only accept what prints back identically.
        let canonical = print::stmt_text(&stmt, &SimpleResolver::default()).ok()?;
        if canonical != text {
            return None;
        }
        Some(self.qualify(stmt))
    }

    fn expr_list(&self, node: Node<'_>) -> Option<Vec<Expr>> {
        if node.kind() != "expression_list" {
            return None;
        }
        named_children(node)
            .into_iter()
            .map(|e| self.expr(e))
            .collect()
    }

    fn expr(&self, node: Node<'_>) -> Option<Expr> {
        match node.kind() {
            "identifier" | "nil" | "true" | "false" | "iota" => Some(Expr::ident(self.text(node))),
            "selector_expression" => {
                let x = self.expr(node.child_by_field_name("operand")?)?;
                let sel = node.child_by_field_name("field")?;
                Some(Expr::Selector {
                    x: Box::new(x),
                    sel: self.text(sel).to_string(),
                })
            }
            "call_expression" => {
                if node.child_by_field_name("type_arguments").is_some() {
                    return None;
                }
                let fun = self.expr(node.child_by_field_name("function")?)?;
                let args = named_children(node.child_by_field_name("arguments")?)
                    .into_iter()
                    .map(|a| self.expr(a))
                    .collect::<Option<Vec<_>>>()?;
                Some(Expr::Call(CallExpr::new(fun, args)))
            }
            "interpreted_string_literal" | "raw_string_literal" | "int_literal"
            | "float_literal" | "imaginary_literal" | "rune_literal" => {
                Some(Expr::Lit(self.text(node).to_string()))
            }
            _ => None,
        }
    }

    fn qualify(&self, stmt: Stmt) -> Stmt {
        match stmt {
            Stmt::Assign(mut s) => {
                s.lhs = s.lhs.into_iter().map(|e| self.qualify_expr(e)).collect();
                s.rhs = s.rhs.into_iter().map(|e| self.qualify_expr(e)).collect();
                Stmt::Assign(s)
            }
            Stmt::Defer(mut s) => {
                s.call = self.qualify_call(s.call);
                Stmt::Defer(s)
            }
            raw => raw,
        }
    }

    fn qualify_call(&self, call: CallExpr) -> CallExpr {
        CallExpr {
            fun: Box::new(self.qualify_expr(*call.fun)),
            args: call.args.into_iter().map(|e| self.qualify_expr(e)).collect(),
        }
    }

    /// `pkg.Name` where `pkg` is bound by an import becomes a qualified identifier.
    fn qualify_expr(&self, expr: Expr) -> Expr {
        match expr {
            Expr::Selector { x, sel } => {
                if let Expr::Ident(Ident { name, path: None }) = x.as_ref()
                    && let Some(path) = self.bindings.get(name)
                {
                    return Expr::qualified(path.clone(), sel);
                }
                Expr::Selector {
                    x: Box::new(self.qualify_expr(*x)),
                    sel,
                }
            }
            Expr::Call(call) => Expr::Call(self.qualify_call(call)),
            other => other,
        }
    }
}

/// Named children that are not comments.
fn code_children(node: Node<'_>) -> Vec<Node<'_>> {
    named_children(node)
        .into_iter()
        .filter(|n| n.kind() != "comment")
        .collect()
}

/// Comments before the first statement that are separated from it by a blank line
/// belong to the opening brace.
fn split_lbrace(lbrace: &mut Vec<String>, lead: &mut Leading) {
    let Some(k) = lead.start.iter().rposition(|t| t == BLANK) else {
        return;
    };
    let rest = lead.start.split_off(k + 1);
    lead.start.pop();
    let moved = std::mem::replace(&mut lead.start, rest);

    lbrace.push(BLANK.to_string());
    if lead.before.is_empty_line() {
        lbrace.push(BLANK.to_string());
    }
    let mut prev_comment = false;
    for t in moved {
        if t == BLANK {
            lbrace.push(BLANK.to_string());
            lbrace.push(BLANK.to_string());
            prev_comment = false;
        } else {
            if prev_comment {
                lbrace.push(BLANK.to_string());
            }
            lbrace.push(t);
            prev_comment = true;
        }
    }
    lead.before = Space::EmptyLine;
}
