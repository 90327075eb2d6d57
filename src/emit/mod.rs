//! Textual outputs of a check run
//!
//! - [`source`]: declarations re-emitted in header layout
//! - [`tree`]: indented declaration tree with positions
//! - [`symbols`]: resolved types, fields and folded values

pub mod source;
pub mod symbols;
pub mod tree;

pub use source::{emit_source, format_expr};
pub use symbols::emit_symbols;
pub use tree::emit_tree;
