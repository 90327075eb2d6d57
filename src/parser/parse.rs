//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, error recovery, and the main parse
//! entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: namespaces, struct/typedef declarations, members, types
//! - `expressions`: initializer expressions with precedence climbing
//!
//! # Error Recovery
//!
//! A syntax error abandons only the member or definition being parsed. The
//! error is recorded as a [`Diagnostic`] and the parser resynchronises at
//! the next `;` or `}` before continuing with the following sibling, so one
//! run reports every independent problem.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, LexError, Lexer, Token, TokenKind};
use thiserror::Error;

/// Deepest namespace or expression nesting accepted before the parser gives up
/// on a construct.
pub(crate) const MAX_NESTING: usize = 256;

/// Parser error type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Parse error at line {}, column {}: {message}", location.line, location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl ParseError {
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(DiagnosticKind::Syntax, self.message.clone(), self.location)
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.kind.to_string(),
            location: err.location,
        }
    }
}

/// Result of parsing one source text
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub unit: TranslationUnit,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lex and parse `source`, collecting lexical and syntax diagnostics.
pub fn parse(source: &str) -> ParseOutput {
    let mut parser = Parser::new(source);
    let unit = parser.parse_unit();
    ParseOutput {
        unit,
        diagnostics: parser.into_diagnostics(),
    }
}

/// Recursive descent parser for the declaration language
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) depth: usize,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Parser {
    /// Lex `source` and prepare to parse it.
    ///
    /// Lexical errors do not stop tokenization; each becomes a diagnostic and
    /// the offending input is dropped from the token stream.
    pub fn new(source: &str) -> Self {
        let mut tokens = Vec::new();
        let mut diagnostics = Vec::new();

        for item in Lexer::new(source) {
            match item {
                Ok(token) => tokens.push(token),
                Err(err) => {
                    tracing::trace!(target: "parser", error = %err, "lex error");
                    diagnostics.push(Diagnostic::error(
                        DiagnosticKind::Lex,
                        err.kind.to_string(),
                        err.location,
                    ));
                }
            }
        }

        let mut parser = Self::from_tokens(tokens);
        parser.diagnostics = diagnostics;
        parser
    }

    /// Build a parser over an already lexed token sequence.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let location = tokens.last().map(|t| t.location).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                location,
            });
        }
        Self {
            tokens,
            position: 0,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parse the entire input (top-level definitions)
    pub fn parse_unit(&mut self) -> TranslationUnit {
        let mut unit = TranslationUnit::new();

        if self.is_at_end() && self.diagnostics.is_empty() {
            self.diagnostics.push(Diagnostic::error(
                DiagnosticKind::Input,
                "input contains no declarations",
                self.current_location(),
            ));
            return unit;
        }

        unit.decls = self.parse_definitions(false);
        tracing::debug!(
            target: "parser",
            top_level = unit.decls.len(),
            diagnostics = self.diagnostics.len(),
            "parsed translation unit"
        );
        unit
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    // ===== Error recovery =====

    pub(crate) fn report(&mut self, err: ParseError) {
        tracing::trace!(target: "parser", error = %err, "syntax error");
        self.diagnostics.push(err.to_diagnostic());
    }

    /// Skip the rest of a broken member that started at token `member_start`:
    /// stop after the next `;`, or before a `}` that closes the enclosing
    /// body.
    ///
    /// Braces the member already opened (a `{...}` list cut short by the
    /// error) are closed first.
    pub(crate) fn synchronize_member(&mut self, member_start: usize) {
        let mut depth = self.tokens[member_start.min(self.position)..self.position]
            .iter()
            .fold(0usize, |depth, token| match token.kind {
                TokenKind::LBrace => depth + 1,
                TokenKind::RBrace => depth.saturating_sub(1),
                _ => depth,
            });

        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                }
                TokenKind::Semicolon => {
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip the rest of a broken definition.
    ///
    /// Brace groups are skipped whole. Recovery stops after a `;` or before
    /// a definition keyword or enclosing `}` at the outer level.
    pub(crate) fn synchronize_definition(&mut self) {
        let mut depth = 0usize;

        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                }
                TokenKind::Semicolon => {
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                _ if depth == 0 && self.at_definition_start() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    pub(crate) fn at_definition_start(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Keyword(
                Keyword::Namespace | Keyword::Module | Keyword::Typedef | Keyword::Struct
            )
        )
    }

    /// Guard recursive rules against pathological nesting
    pub(crate) fn enter_nested(&mut self, what: &str) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(
                format!("{what} nested more than {MAX_NESTING} levels deep"),
                self.current_location(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ===== Helper methods =====

    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn match_keyword(&mut self, kw: Keyword) -> bool {
        self.match_kind(TokenKind::Keyword(kw))
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub(crate) fn peek(&self) -> &Token {
        // `from_tokens` guarantees a trailing Eof and `advance` never moves past it
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind, message: &str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(
                format!("{}, found {}", message, self.peek()),
                self.current_location(),
            ))
        }
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(TokenKind::LBrace, &format!("Expected '{{' {ctx}"))
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(TokenKind::RBrace, &format!("Expected '}}' {ctx}"))
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(TokenKind::Semicolon, &format!("Expected ';' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<(String, SourceLocation), ParseError> {
        if self.check(TokenKind::Ident) {
            let token = self.advance();
            Ok((token.lexeme.clone(), token.location))
        } else {
            Err(ParseError::new(
                format!("Expected identifier {ctx}, found {}", self.peek()),
                self.current_location(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(diags: &[Diagnostic]) -> Vec<DiagnosticKind> {
        diags.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_parse_nested_namespaces() {
        let out = parse("namespace A { namespace B { struct S { short x; }; } }");

        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.unit.decls.len(), 1);
        match &out.unit.decls[0] {
            Decl::Namespace(a) => {
                assert_eq!(a.name, "A");
                match &a.decls[0] {
                    Decl::Namespace(b) => {
                        assert_eq!(b.name, "B");
                        assert!(matches!(&b.decls[0], Decl::Struct(s) if s.name == "S"));
                    }
                    _ => panic!("Expected namespace B"),
                }
            }
            _ => panic!("Expected namespace A"),
        }
    }

    #[test]
    fn test_empty_input_is_single_diagnostic() {
        let out = parse("  // nothing here\n");

        assert!(out.unit.is_empty());
        assert_eq!(kinds(&out.diagnostics), vec![DiagnosticKind::Input]);
    }

    #[test]
    fn test_recovers_after_bad_member() {
        let source = "struct S {\n short = 1;\n short ok = 2;\n long 5;\n};\nstruct T { int y; };";
        let out = parse(source);

        assert_eq!(
            kinds(&out.diagnostics),
            vec![DiagnosticKind::Syntax, DiagnosticKind::Syntax]
        );
        assert_eq!(out.diagnostics[0].location.line, 2);
        assert_eq!(out.diagnostics[1].location.line, 4);
        assert_eq!(out.unit.decls.len(), 2);
        match &out.unit.decls[0] {
            Decl::Struct(s) => {
                assert_eq!(s.fields.len(), 1);
                assert_eq!(s.fields[0].name, "ok");
            }
            _ => panic!("Expected struct"),
        }
    }

    #[test]
    fn test_recovers_inside_brace_list() {
        let source = "struct S {\n short a[2] = {1 2};\n short b = 3;\n};\nstruct T { int y; };";
        let out = parse(source);

        assert_eq!(kinds(&out.diagnostics), vec![DiagnosticKind::Syntax]);
        assert_eq!(out.diagnostics[0].location.line, 2);
        assert_eq!(out.unit.decls.len(), 2);
        match &out.unit.decls[0] {
            Decl::Struct(s) => {
                let names: Vec<_> = s.fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["b"]);
            }
            _ => panic!("Expected struct"),
        }
        assert!(matches!(&out.unit.decls[1], Decl::Struct(t) if t.name == "T"));
    }

    #[test]
    fn test_recovers_after_bad_definition() {
        let source = "namespace { struct X { int a; }; }\nstruct Y { int b; };";
        let out = parse(source);

        assert_eq!(kinds(&out.diagnostics), vec![DiagnosticKind::Syntax]);
        assert_eq!(out.unit.decls.len(), 1);
        assert!(matches!(&out.unit.decls[0], Decl::Struct(s) if s.name == "Y"));
    }

    #[test]
    fn test_lex_errors_do_not_stop_parsing() {
        let out = parse("struct S { short a = 1 $; short b = 2; };");

        assert_eq!(kinds(&out.diagnostics), vec![DiagnosticKind::Lex]);
        match &out.unit.decls[0] {
            Decl::Struct(s) => assert_eq!(s.fields.len(), 2),
            _ => panic!("Expected struct"),
        }
    }

    #[test]
    fn test_stray_close_brace_at_top_level() {
        let out = parse("} struct S { int a; };");

        assert_eq!(kinds(&out.diagnostics), vec![DiagnosticKind::Syntax]);
        assert_eq!(out.unit.decls.len(), 1);
    }

    #[test]
    fn test_from_tokens_appends_eof() {
        let tokens = Lexer::new("struct S;").tokenize().unwrap();
        let without_eof = tokens[..tokens.len() - 1].to_vec();

        let mut parser = Parser::from_tokens(without_eof);
        let unit = parser.parse_unit();
        assert!(parser.diagnostics().is_empty());
        assert_eq!(unit.decls.len(), 1);
    }

    #[test]
    fn test_deep_nesting_is_rejected_not_overflowed() {
        let mut source = String::new();
        for i in 0..(MAX_NESTING + 10) {
            source.push_str(&format!("namespace N{i} {{ "));
        }
        for _ in 0..(MAX_NESTING + 10) {
            source.push_str("} ");
        }
        let out = parse(&source);
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.message.contains("nested more than")));
    }
}
