//! Structured diagnostics
//!
//! Every pass reports problems as [`Diagnostic`] values instead of aborting,
//! so a single run surfaces as many problems as possible. Diagnostics are
//! serializable for `--format json`.

use crate::parser::ast::SourceLocation;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Diagnostic taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed token
    Lex,
    /// Grammar violation
    Syntax,
    /// Type reference not found
    UnresolvedName,
    /// Redeclaration in the same scope
    DuplicateName,
    /// Initializer incompatible with the declared type
    TypeMismatch,
    /// Type that cannot be instantiated (infinite or incomplete)
    Structural,
    /// Constant does not fit the declared type
    OutOfRange,
    /// Bad array dimension or too many elements
    ArraySize,
    /// Literal text that cannot be decoded
    InvalidLiteral,
    DivisionByZero,
    /// Empty input
    Input,
    /// Literal precision is narrowed by the declared type
    PrecisionLoss,
}

impl DiagnosticKind {
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::Lex => "LexError",
            DiagnosticKind::Syntax => "SyntaxError",
            DiagnosticKind::UnresolvedName => "UnresolvedNameError",
            DiagnosticKind::DuplicateName => "DuplicateNameError",
            DiagnosticKind::TypeMismatch => "TypeMismatchError",
            DiagnosticKind::Structural => "StructuralError",
            DiagnosticKind::OutOfRange => "OutOfRangeError",
            DiagnosticKind::ArraySize => "ArraySizeError",
            DiagnosticKind::InvalidLiteral => "InvalidLiteralError",
            DiagnosticKind::DivisionByZero => "DivisionByZeroError",
            DiagnosticKind::Input => "InputError",
            DiagnosticKind::PrecisionLoss => "PrecisionLoss",
        }
    }
}

/// A secondary location attached to a diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Related {
    pub message: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: SourceLocation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<Related>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            location,
            related: Vec::new(),
        }
    }

    pub fn warning(
        kind: DiagnosticKind,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            location,
            related: Vec::new(),
        }
    }

    pub fn with_related(mut self, message: impl Into<String>, location: SourceLocation) -> Self {
        self.related.push(Related {
            message: message.into(),
            location,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Line {}:{}] {} ({}): {}",
            self.location.line,
            self.location.column,
            self.severity,
            self.kind.name(),
            self.message
        )?;
        for related in &self.related {
            write!(
                f,
                "\n    [Line {}:{}] note: {}",
                related.location.line, related.location.column, related.message
            )?;
        }
        Ok(())
    }
}

/// Sort by position, keeping the emission order of diagnostics at the same
/// position.
pub fn sort_by_location(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|d| d.location);
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_related_locations() {
        let diag = Diagnostic::error(
            DiagnosticKind::DuplicateName,
            "the identifier \"x\" is already defined in scope \"C\"",
            SourceLocation::new(4, 9),
        )
        .with_related("previous declaration of \"x\"", SourceLocation::new(3, 9));

        let text = diag.to_string();
        assert!(text.starts_with("[Line 4:9] error (DuplicateNameError)"));
        assert!(text.contains("[Line 3:9] note: previous declaration"));
    }

    #[test]
    fn sorting_is_stable_per_location() {
        let mut diags = vec![
            Diagnostic::error(DiagnosticKind::Syntax, "b", SourceLocation::new(2, 1)),
            Diagnostic::error(DiagnosticKind::Syntax, "a", SourceLocation::new(1, 5)),
            Diagnostic::warning(DiagnosticKind::PrecisionLoss, "c", SourceLocation::new(2, 1)),
        ];
        sort_by_location(&mut diags);

        let messages: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
        assert!(has_errors(&diags));
    }

    #[test]
    fn json_shape() {
        let diag = Diagnostic::warning(
            DiagnosticKind::PrecisionLoss,
            "narrowed",
            SourceLocation::new(1, 2),
        );
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["kind"], "precision_loss");
        assert_eq!(json["location"]["line"], 1);
        assert!(json.get("related").is_none());
    }
}
