//! # Introduction
//!
//! declcheck parses a small C-like declaration language (namespaces,
//! `typedef struct` declarations, typed fields with constant initializers
//! and fixed-size arrays), builds a symbol table of qualified type names,
//! folds every initializer under its declared type and reports all
//! problems it finds in one run.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → Declaration tree → Analyzer → Symbol table
//!                                    ↓                         ↓
//!                               emit::source              emit::symbols
//! ```
//!
//! 1. [`parser`] tokenises the source and builds the tree, recovering from
//!    syntax errors at member and definition boundaries.
//! 2. [`semantic`] declares every namespace and type, resolves field types
//!    innermost scope first, evaluates initializers and rejects types that
//!    contain themselves by value.
//! 3. [`emit`] re-emits the declarations, dumps the tree, or summarises the
//!    resolved symbols.
//! 4. [`pipeline::check`] runs all of the above and returns a
//!    [`pipeline::CheckOutput`].
//!
//! ```
//! use declcheck::{check, CheckOptions};
//!
//! let output = check("struct S { short x = 2 + 5 * 2 / 3; };", &CheckOptions::default());
//! assert!(!output.has_errors());
//! ```

pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod semantic;

pub use config::CheckOptions;
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use pipeline::{check, check_bytes, CheckOutput};
