//! Declaration source parser
//!
//! This module transforms source text into a declaration tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser struct, error recovery and the [`parse::parse`] entry point
//! - [`declarations`]: namespaces, structs, members and types
//! - [`expressions`]: initializer expressions
//! - [`ast`]: declaration tree definitions
//!
//! # Supported Language
//!
//! - `namespace`/`module` blocks, nested to any depth
//! - `typedef struct Name { ... } Alias;`, `struct Name { ... };`, `struct Name;`
//! - Fields of primitive or (qualified) struct type, fixed-size arrays,
//!   constant initializers and `[...]`/`{...}` list initializers
//! - `#` directive lines are skipped
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one rule per precedence level for
//! initializer expressions. Type names are not resolved here; see
//! [`crate::semantic`].

pub mod ast;
pub mod declarations;
pub mod expressions;
pub mod lexer;
pub mod parse;
