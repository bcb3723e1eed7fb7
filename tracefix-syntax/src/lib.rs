//! Go source handling for tracefix.
//!
//! - [`parse`] builds the decorated tree from tree-sitter-go's concrete syntax tree.
//! - [`print`] renders a tree back to source.
//! - [`load`] turns package patterns into parsed [`Package`](tracefix_types::Package)s.

pub mod load;
pub mod parse;
pub mod print;

pub use load::load_packages;
pub use parse::parse_file;
pub use print::{render, stmt_text};
