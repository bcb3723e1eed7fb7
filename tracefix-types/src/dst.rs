//! Decorated syntax tree for the Go subset tracefix rewrites.
//!
//! Every node that can be moved, inserted or deleted carries [`Decorations`]: the space
//! before and after it plus the comment tokens attached to its leading and trailing edge.
//! Text the tool never edits (type bodies, signatures, unrecognized statements) is kept
//! verbatim so the printer can reproduce it byte for byte.

/// Line spacing attached to the edge of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Space {
    #[default]
    None,
    NewLine,
    EmptyLine,
}

impl Space {
    pub fn is_empty_line(self) -> bool {
        matches!(self, Space::EmptyLine)
    }
}

/// Token marking a blank line inside a comment run.
pub const BLANK: &str = "\n";

/// Comment and whitespace attached to a node.
///
/// `start` holds own-line comments printed above the node, `end` holds comments printed on
/// the same line after it. A [`BLANK`] token inside either list stands for a blank line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decorations {
    pub before: Space,
    pub start: Vec<String>,
    pub end: Vec<String>,
    pub after: Space,
}

impl Decorations {
    pub fn is_bare(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }

    /// Copies `source` onto `target`: spaces are replaced, comment tokens appended.
    pub fn transplant(source: &Decorations, target: &Decorations) -> Decorations {
        let mut start = target.start.clone();
        start.extend(source.start.iter().cloned());
        let mut end = target.end.clone();
        end.extend(source.end.iter().cloned());
        Decorations {
            before: source.before,
            start,
            end,
            after: source.after,
        }
    }
}

/// A parsed source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    pub package: String,
    /// Decorations of the package clause (build directives, license headers).
    pub decs: Decorations,
    pub decls: Vec<Decl>,
    /// Comment run after the last declaration.
    pub trailing: Vec<String>,
}

impl File {
    pub fn import_specs(&self) -> impl Iterator<Item = &ImportSpec> {
        self.decls.iter().filter_map(Decl::as_import).flat_map(|d| d.specs.iter())
    }

    pub fn imports_path(&self, path: &str) -> bool {
        self.import_specs().any(|s| s.path == path)
    }

    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(Decl::as_func)
    }

    pub fn funcs_mut(&mut self) -> impl Iterator<Item = &mut FuncDecl> {
        self.decls.iter_mut().filter_map(Decl::as_func_mut)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Type(t) => Some(t),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Import(ImportDecl),
    Type(TypeDecl),
    Func(FuncDecl),
    Other(RawDecl),
}

impl Decl {
    pub fn decs(&self) -> &Decorations {
        match self {
            Decl::Import(d) => &d.decs,
            Decl::Type(d) => &d.decs,
            Decl::Func(d) => &d.decs,
            Decl::Other(d) => &d.decs,
        }
    }

    pub fn decs_mut(&mut self) -> &mut Decorations {
        match self {
            Decl::Import(d) => &mut d.decs,
            Decl::Type(d) => &mut d.decs,
            Decl::Func(d) => &mut d.decs,
            Decl::Other(d) => &mut d.decs,
        }
    }

    pub fn as_import(&self) -> Option<&ImportDecl> {
        match self {
            Decl::Import(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_import_mut(&mut self) -> Option<&mut ImportDecl> {
        match self {
            Decl::Import(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&FuncDecl> {
        match self {
            Decl::Func(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_func_mut(&mut self) -> Option<&mut FuncDecl> {
        match self {
            Decl::Func(d) => Some(d),
            _ => None,
        }
    }
}

/// `import "x"` or `import ( ... )`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDecl {
    pub specs: Vec<ImportSpec>,
    /// Whether the block is written with parentheses.
    pub lparen: bool,
    /// Comment run before the closing parenthesis.
    pub rparen: Vec<String>,
    pub decs: Decorations,
}

impl ImportDecl {
    /// A single-spec block importing the cgo pseudo-package.
    pub fn is_cgo(&self) -> bool {
        self.specs.len() == 1 && self.specs[0].path == "C"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit binding (`name "path"`), including `_` and `.`.
    pub name: Option<String>,
    /// Unquoted import path.
    pub path: String,
    pub decs: Decorations,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            name: None,
            path: path.into(),
            decs: Decorations::default(),
        }
    }

    /// The identifier this spec binds in the file, if any.
    pub fn binding(&self) -> Option<String> {
        match self.name.as_deref() {
            Some("_") | Some(".") => None,
            Some(name) => Some(name.to_string()),
            None => Some(assumed_name(&self.path)),
        }
    }
}

/// Package name assumed from an import path when no alias is given.
///
/// Last path element, skipping a `vN` major-version suffix, with a `go-` prefix trimmed and
/// cut at the first rune that cannot appear in an identifier.
pub fn assumed_name(path: &str) -> String {
    let mut parts = path.rsplit('/');
    let mut base = parts.next().unwrap_or(path);
    if let Some(rest) = base.strip_prefix('v')
        && !rest.is_empty()
        && rest.chars().all(|c| c.is_ascii_digit())
        && let Some(parent) = parts.next()
    {
        base = parent;
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    base.chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// `type Name ...` or a grouped `type ( ... )` block, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDecl {
    /// Name of the first spec.
    pub name: String,
    pub text: String,
    pub decs: Decorations,
}

/// Any other top-level declaration (`var`, `const`, ...), kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDecl {
    pub text: String,
    pub decs: Decorations,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuncDecl {
    pub name: String,
    pub recv: Option<Receiver>,
    pub params: Vec<Field>,
    /// Source text from `func` up to, not including, the body.
    pub header: String,
    /// `None` for declarations without a body.
    pub body: Option<Block>,
    pub decs: Decorations,
}

impl FuncDecl {
    pub fn first_param_type(&self) -> Option<&str> {
        self.params.first().map(|f| f.ty.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub name: Option<String>,
    pub ty: RecvType,
}

impl Receiver {
    pub fn type_name(&self) -> Option<&str> {
        match &self.ty {
            RecvType::Pointer(name) | RecvType::Value(name) => Some(name),
            RecvType::Unresolved(_) => None,
        }
    }
}

/// Receiver type shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecvType {
    /// `*T`
    Pointer(String),
    /// `T`
    Value(String),
    /// Anything that is not a plain (pointer to) type name, e.g. `*T[K]`.
    Unresolved(String),
}

/// One parameter group: `a, b int` or an unnamed `int`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub names: Vec<String>,
    pub ty: String,
}

/// A function body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Tokens after the opening brace; [`BLANK`] tokens are line breaks.
    pub lbrace: Vec<String>,
    /// Comment run before the closing brace.
    pub rbrace: Vec<String>,
    /// Written on one line (`{ a(); b() }`); honoured while its statements stay undecorated.
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Assign(AssignStmt),
    Defer(DeferStmt),
    Raw(RawStmt),
}

impl Stmt {
    pub fn decs(&self) -> &Decorations {
        match self {
            Stmt::Assign(s) => &s.decs,
            Stmt::Defer(s) => &s.decs,
            Stmt::Raw(s) => &s.decs,
        }
    }

    pub fn decs_mut(&mut self) -> &mut Decorations {
        match self {
            Stmt::Assign(s) => &mut s.decs,
            Stmt::Defer(s) => &mut s.decs,
            Stmt::Raw(s) => &mut s.decs,
        }
    }

    /// Import paths referenced through qualified identifiers.
    pub fn qualified_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Stmt::Assign(s) => {
                for e in s.lhs.iter().chain(s.rhs.iter()) {
                    e.qualified_paths(out);
                }
            }
            Stmt::Defer(s) => s.call.qualified_paths(out),
            Stmt::Raw(_) => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignTok {
    /// `:=`
    Define,
    /// `=`
    Assign,
}

impl AssignTok {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignTok::Define => ":=",
            AssignTok::Assign => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub tok: AssignTok,
    pub rhs: Vec<Expr>,
    pub decs: Decorations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferStmt {
    pub call: CallExpr,
    pub decs: Decorations,
}

/// A statement kept as source text. Continuation lines keep their original indentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStmt {
    pub text: String,
    pub decs: Decorations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(Ident),
    Selector { x: Box<Expr>, sel: String },
    Call(CallExpr),
    /// Basic literal, verbatim (`"Foo"`, `42`).
    Lit(String),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(Ident::new(name))
    }

    pub fn qualified(path: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Ident(Ident {
            name: name.into(),
            path: Some(path.into()),
        })
    }

    pub fn string_lit(value: &str) -> Self {
        Expr::Lit(format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")))
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(i) => Some(i),
            _ => None,
        }
    }

    pub fn qualified_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Ident(Ident {
                path: Some(path), ..
            }) => out.push(path),
            Expr::Ident(_) | Expr::Lit(_) => {}
            Expr::Selector { x, .. } => x.qualified_paths(out),
            Expr::Call(call) => call.qualified_paths(out),
        }
    }
}

/// An identifier; `path` is set when it is qualified by an imported package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub path: Option<String>,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }

    pub fn is_plain(&self, name: &str) -> bool {
        self.path.is_none() && self.name == name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub fun: Box<Expr>,
    pub args: Vec<Expr>,
}

impl CallExpr {
    pub fn new(fun: Expr, args: Vec<Expr>) -> Self {
        Self {
            fun: Box::new(fun),
            args,
        }
    }

    pub fn qualified_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        self.fun.qualified_paths(out);
        for arg in &self.args {
            arg.qualified_paths(out);
        }
    }
}

/// Go's exported-name rule: the first rune is an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transplant_replaces_spaces_and_appends_comments() {
        let source = Decorations {
            before: Space::EmptyLine,
            start: vec!["// old".to_string()],
            end: vec!["// trailing".to_string()],
            after: Space::NewLine,
        };
        let target = Decorations {
            before: Space::NewLine,
            start: vec!["// new".to_string()],
            end: vec![],
            after: Space::None,
        };

        let out = Decorations::transplant(&source, &target);
        assert_eq!(out.before, Space::EmptyLine);
        assert_eq!(out.after, Space::NewLine);
        assert_eq!(out.start, vec!["// new", "// old"]);
        assert_eq!(out.end, vec!["// trailing"]);
        // Pure: neither input changes.
        assert_eq!(target.start, vec!["// new"]);
    }

    #[test]
    fn assumed_name_follows_goimports_rules() {
        assert_eq!(assumed_name("context"), "context");
        assert_eq!(assumed_name("github.com/opentracing/opentracing-go"), "opentracing");
        assert_eq!(assumed_name("github.com/go-chi/chi/v5"), "chi");
        assert_eq!(assumed_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(assumed_name("github.com/mattn/go-sqlite3"), "sqlite3");
        assert_eq!(assumed_name("example.com/v2"), "example");
    }

    #[test]
    fn binding_ignores_blank_and_dot_imports() {
        let mut spec = ImportSpec::new("github.com/lib/pq");
        assert_eq!(spec.binding().as_deref(), Some("pq"));
        spec.name = Some("_".to_string());
        assert_eq!(spec.binding(), None);
        spec.name = Some("db".to_string());
        assert_eq!(spec.binding().as_deref(), Some("db"));
    }

    #[test]
    fn exported_names_start_upper_case() {
        assert!(is_exported("Foo"));
        assert!(!is_exported("foo"));
        assert!(!is_exported("_Foo"));
        assert!(!is_exported(""));
    }

    #[test]
    fn receiver_type_name_only_for_simple_shapes() {
        let ptr = Receiver {
            name: Some("f".to_string()),
            ty: RecvType::Pointer("Foo".to_string()),
        };
        let generic = Receiver {
            name: Some("f".to_string()),
            ty: RecvType::Unresolved("*Foo[T]".to_string()),
        };
        assert_eq!(ptr.type_name(), Some("Foo"));
        assert_eq!(generic.type_name(), None);
    }
}
