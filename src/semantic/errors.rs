//! Semantic error types
//!
//! [`SemanticError`] covers everything the symbol table and the evaluator
//! can reject. None of these stop analysis: the analyzer converts each one
//! into a [`Diagnostic`] attached to the offending field or declaration and
//! moves on to the next sibling.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::parser::ast::SourceLocation;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    /// Type reference that matches nothing visible from its scope
    #[error("unresolved type name \"{name}\" in scope \"{scope}\"")]
    UnresolvedName {
        name: String,
        scope: String,
        location: SourceLocation,
    },

    /// Type referenced before its declaration while forward references are disabled
    #[error("type \"{name}\" is used before its declaration")]
    UsedBeforeDeclaration {
        name: String,
        declared_at: SourceLocation,
        location: SourceLocation,
    },

    /// Name already taken in the same scope
    #[error("The identifier \"{name}\" is already defined in scope \"{scope}\".")]
    DuplicateName {
        name: String,
        scope: String,
        previous: SourceLocation,
        location: SourceLocation,
    },

    #[error("{message}")]
    TypeMismatch {
        message: String,
        location: SourceLocation,
    },

    #[error("{message}")]
    Structural {
        message: String,
        location: SourceLocation,
    },

    /// Folded constant outside the range of its declared type
    #[error("value {value} is out of range for type {ty}")]
    OutOfRange {
        value: String,
        ty: String,
        location: SourceLocation,
    },

    /// Integer arithmetic left the evaluation domain
    #[error("integer overflow in {operation}")]
    IntegerOverflow {
        operation: String,
        location: SourceLocation,
    },

    #[error("{message}")]
    ArraySize {
        message: String,
        location: SourceLocation,
    },

    #[error("invalid literal {literal}: {reason}")]
    InvalidLiteral {
        literal: String,
        reason: String,
        location: SourceLocation,
    },

    #[error("division by zero in {operation}")]
    DivisionByZero {
        operation: String,
        location: SourceLocation,
    },
}

impl SemanticError {
    pub fn location(&self) -> SourceLocation {
        match self {
            SemanticError::UnresolvedName { location, .. }
            | SemanticError::UsedBeforeDeclaration { location, .. }
            | SemanticError::DuplicateName { location, .. }
            | SemanticError::TypeMismatch { location, .. }
            | SemanticError::Structural { location, .. }
            | SemanticError::OutOfRange { location, .. }
            | SemanticError::IntegerOverflow { location, .. }
            | SemanticError::ArraySize { location, .. }
            | SemanticError::InvalidLiteral { location, .. }
            | SemanticError::DivisionByZero { location, .. } => *location,
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            SemanticError::UnresolvedName { .. } | SemanticError::UsedBeforeDeclaration { .. } => {
                DiagnosticKind::UnresolvedName
            }
            SemanticError::DuplicateName { .. } => DiagnosticKind::DuplicateName,
            SemanticError::TypeMismatch { .. } => DiagnosticKind::TypeMismatch,
            SemanticError::Structural { .. } => DiagnosticKind::Structural,
            SemanticError::OutOfRange { .. } | SemanticError::IntegerOverflow { .. } => {
                DiagnosticKind::OutOfRange
            }
            SemanticError::ArraySize { .. } => DiagnosticKind::ArraySize,
            SemanticError::InvalidLiteral { .. } => DiagnosticKind::InvalidLiteral,
            SemanticError::DivisionByZero { .. } => DiagnosticKind::DivisionByZero,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.kind(), self.to_string(), self.location());
        match self {
            SemanticError::DuplicateName { name, previous, .. } => {
                diag.with_related(format!("previous declaration of \"{name}\""), *previous)
            }
            SemanticError::UsedBeforeDeclaration { name, declared_at, .. } => {
                diag.with_related(format!("\"{name}\" is declared here"), *declared_at)
            }
            _ => diag,
        }
    }

    pub(crate) fn type_mismatch(message: impl Into<String>, location: SourceLocation) -> Self {
        SemanticError::TypeMismatch {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn structural(message: impl Into<String>, location: SourceLocation) -> Self {
        SemanticError::Structural {
            message: message.into(),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_carries_previous_location() {
        let err = SemanticError::DuplicateName {
            name: "x".into(),
            scope: "C".into(),
            previous: SourceLocation::new(2, 8),
            location: SourceLocation::new(3, 8),
        };
        let diag = err.to_diagnostic();

        assert_eq!(diag.kind, DiagnosticKind::DuplicateName);
        assert_eq!(
            diag.message,
            "The identifier \"x\" is already defined in scope \"C\"."
        );
        assert_eq!(diag.location, SourceLocation::new(3, 8));
        assert_eq!(diag.related[0].location, SourceLocation::new(2, 8));
    }

    #[test]
    fn test_overflow_reports_as_out_of_range() {
        let err = SemanticError::IntegerOverflow {
            operation: "1 << 200".into(),
            location: SourceLocation::new(1, 1),
        };
        assert_eq!(err.kind(), DiagnosticKind::OutOfRange);
    }
}
