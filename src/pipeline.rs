//! End-to-end check of one source text
//!
//! ```text
//! source → lexer → parser → declaration tree → analyzer → symbol table
//! ```
//!
//! Diagnostics from every stage are merged, sorted by position and then
//! adjusted according to [`CheckOptions`].

use crate::config::CheckOptions;
use crate::diagnostics::{self, Diagnostic, DiagnosticKind, Severity};
use crate::parser::ast::{SourceLocation, TranslationUnit};
use crate::parser::parse::parse;
use crate::semantic::{analyze, SymbolTable};

/// Everything a check run produces
#[derive(Debug, Clone)]
pub struct CheckOutput {
    pub unit: TranslationUnit,
    pub symbols: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckOutput {
    pub fn has_errors(&self) -> bool {
        diagnostics::has_errors(&self.diagnostics)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Result for input that could not be read or decoded: one `Input`
    /// diagnostic, an empty tree and an empty symbol table.
    pub fn unreadable(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            unit: TranslationUnit::new(),
            symbols: SymbolTable::new(),
            diagnostics: vec![Diagnostic::error(DiagnosticKind::Input, message, location)],
        }
    }
}

/// Check raw bytes; input that is not UTF-8 is reported at the first
/// invalid byte instead of being parsed.
pub fn check_bytes(bytes: &[u8], options: &CheckOptions) -> CheckOutput {
    match std::str::from_utf8(bytes) {
        Ok(source) => check(source, options),
        Err(err) => {
            let valid = String::from_utf8_lossy(&bytes[..err.valid_up_to()]);
            let line = valid.matches('\n').count() + 1;
            let column = valid.rsplit('\n').next().map_or(0, |tail| tail.chars().count()) + 1;
            tracing::debug!(target: "pipeline", error = %err, "input rejected");
            CheckOutput::unreadable(
                "input is not valid UTF-8",
                SourceLocation::new(line, column),
            )
        }
    }
}

pub fn check(source: &str, options: &CheckOptions) -> CheckOutput {
    let parsed = parse(source);
    tracing::debug!(
        target: "pipeline",
        stage = "parse",
        declarations = parsed.unit.decls.len(),
        diagnostics = parsed.diagnostics.len()
    );

    let analysis = analyze(&parsed.unit, options);

    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(analysis.diagnostics);

    if options.warnings_as_errors {
        for diag in &mut diagnostics {
            diag.severity = Severity::Error;
        }
    }
    diagnostics::sort_by_location(&mut diagnostics);
    if let Some(max) = options.max_diagnostics {
        diagnostics.truncate(max);
    }

    tracing::debug!(
        target: "pipeline",
        stage = "check",
        types = analysis.symbols.type_count(),
        diagnostics = diagnostics.len()
    );

    CheckOutput {
        unit: parsed.unit,
        symbols: analysis.symbols,
        diagnostics,
    }
}
