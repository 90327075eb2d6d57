//! Semantic analysis of parsed declarations
//!
//! - [`symbols`]: namespace scope tree and type declarations
//! - [`eval`]: constant folding of initializers under their declared type
//! - [`analyzer`]: the declare / resolve / containment passes
//! - [`types`], [`value`]: primitive type classes and folded values
//! - [`errors`]: [`SemanticError`](errors::SemanticError)

pub mod analyzer;
pub mod errors;
pub mod eval;
pub mod symbols;
pub mod types;
pub mod value;

pub use analyzer::{analyze, Analysis};
pub use errors::SemanticError;
pub use eval::{evaluate, Evaluator};
pub use symbols::{FieldType, QualifiedName, ResolvedField, ScopeId, SymbolTable, TypeDeclaration};
pub use value::Value;
