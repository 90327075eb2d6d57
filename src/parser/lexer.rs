//! Lexer (tokenizer) for declaration sources
//!
//! Converts raw source text into a lazy [`Token`] stream consumed by the
//! parser. [`Lexer`] is an [`Iterator`]; [`Lexer::tokenize`] collects it.
//! Preprocessor lines (`#include`, `#pragma`, ...) are skipped rather than
//! parsed.
//!
//! Numeric literals are classified but not evaluated: the suffix (`f`, `d`,
//! `l`) is kept as a precision hint on the token. String and char literals
//! keep their raw escaped text, quotes included.

use super::ast::{FloatSuffix, SourceLocation};
use std::fmt;
use thiserror::Error;

/// Reserved words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Namespace,
    Module,
    Typedef,
    Struct,
    Short,
    Int,
    Long,
    Unsigned,
    Float,
    Double,
    Char,
    String,
    Bool,
    Boolean,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    True,
    False,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Keyword> {
        let kw = match ident {
            "namespace" => Keyword::Namespace,
            "module" => Keyword::Module,
            "typedef" => Keyword::Typedef,
            "struct" => Keyword::Struct,
            "short" => Keyword::Short,
            "int" => Keyword::Int,
            "long" => Keyword::Long,
            "unsigned" => Keyword::Unsigned,
            "float" => Keyword::Float,
            "double" => Keyword::Double,
            "char" => Keyword::Char,
            "string" => Keyword::String,
            "bool" => Keyword::Bool,
            "boolean" => Keyword::Boolean,
            "int16" => Keyword::Int16,
            "uint16" => Keyword::UInt16,
            "int32" => Keyword::Int32,
            "uint32" => Keyword::UInt32,
            "int64" => Keyword::Int64,
            "uint64" => Keyword::UInt64,
            "true" | "TRUE" => Keyword::True,
            "false" | "FALSE" => Keyword::False,
            _ => return None,
        };
        Some(kw)
    }

    /// Keywords that can start a primitive type
    pub fn starts_type(&self) -> bool {
        !matches!(
            self,
            Keyword::Namespace
                | Keyword::Module
                | Keyword::Typedef
                | Keyword::Struct
                | Keyword::True
                | Keyword::False
        )
    }
}

/// Token categories.
///
/// The text of identifiers and literals lives in [`Token::lexeme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Keyword(Keyword),

    // Literals
    Integer,
    Float(FloatSuffix),
    Char,
    String,

    // Operators
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    Tilde,   // ~
    Amp,     // &
    Pipe,    // |
    Caret,   // ^
    LtLt,    // <<
    GtGt,    // >>
    Eq,      // =

    // Punctuation
    ColonColon, // ::
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]
    Semicolon,  // ;
    Comma,      // ,

    Eof,
}

/// A classified slice of the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: SourceLocation,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            location,
        }
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident => write!(f, "identifier '{}'", self.lexeme),
            TokenKind::Keyword(_) => write!(f, "'{}'", self.lexeme),
            TokenKind::Integer => write!(f, "integer literal {}", self.lexeme),
            TokenKind::Float(_) => write!(f, "floating literal {}", self.lexeme),
            TokenKind::Char => write!(f, "char literal {}", self.lexeme),
            TokenKind::String => write!(f, "string literal {}", self.lexeme),
            TokenKind::Eof => write!(f, "end of file"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}

/// Why a piece of input could not be tokenized
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated character literal")]
    UnterminatedChar,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("invalid numeric literal '{0}'")]
    InvalidNumber(String),
}

/// Lexer error with the position of the offending input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Lexer error at line {}, column {}: {kind}", location.line, location.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub location: SourceLocation,
}

/// Lexer for declaration sources
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Tokenize the entire input, stopping at the first error.
    ///
    /// The returned vector always ends with an [`TokenKind::Eof`] token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        for token in &mut self {
            tokens.push(token?);
        }
        Ok(tokens)
    }

    /// Produce the next token, or the end-of-file token once input is exhausted
    fn scan(&mut self) -> Result<Token, LexError> {
        loop {
            self.skip_whitespace_and_comments()?;

            // Directive lines are skipped whole
            if self.peek() == Some('#') {
                self.skip_line();
                continue;
            }
            break;
        }

        if self.is_at_end() {
            return Ok(Token::new(TokenKind::Eof, "", self.current_location()));
        }

        self.next_token()
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = match self.advance() {
            Some(ch) => ch,
            None => return Ok(Token::new(TokenKind::Eof, "", loc)),
        };

        let single =
            |kind: TokenKind| -> Result<Token, LexError> { Ok(Token::new(kind, ch.to_string(), loc)) };

        match ch {
            '"' => self.quoted_literal('"', loc),
            '\'' => self.quoted_literal('\'', loc),
            '0'..='9' => self.number_literal(ch, loc),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(ch, loc)
            }
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.identifier_or_keyword(ch, loc)),

            '+' => single(TokenKind::Plus),
            '-' => single(TokenKind::Minus),
            '*' => single(TokenKind::Star),
            '/' => single(TokenKind::Slash),
            '%' => single(TokenKind::Percent),
            '~' => single(TokenKind::Tilde),
            '&' => single(TokenKind::Amp),
            '|' => single(TokenKind::Pipe),
            '^' => single(TokenKind::Caret),
            '=' => single(TokenKind::Eq),
            '(' => single(TokenKind::LParen),
            ')' => single(TokenKind::RParen),
            '{' => single(TokenKind::LBrace),
            '}' => single(TokenKind::RBrace),
            '[' => single(TokenKind::LBracket),
            ']' => single(TokenKind::RBracket),
            ';' => single(TokenKind::Semicolon),
            ',' => single(TokenKind::Comma),
            '<' if self.peek() == Some('<') => {
                self.advance();
                Ok(Token::new(TokenKind::LtLt, "<<", loc))
            }
            '>' if self.peek() == Some('>') => {
                self.advance();
                Ok(Token::new(TokenKind::GtGt, ">>", loc))
            }
            ':' if self.peek() == Some(':') => {
                self.advance();
                Ok(Token::new(TokenKind::ColonColon, "::", loc))
            }

            _ => Err(LexError {
                kind: LexErrorKind::UnexpectedChar(ch),
                location: loc,
            }),
        }
    }

    /// Scan a string or char literal, keeping quotes and escapes verbatim.
    ///
    /// Literals may not span lines; hitting a newline or the end of input
    /// reports an unterminated literal.
    fn quoted_literal(&mut self, quote: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut raw = String::new();
        raw.push(quote);

        let unterminated = || LexError {
            kind: if quote == '"' {
                LexErrorKind::UnterminatedString
            } else {
                LexErrorKind::UnterminatedChar
            },
            location: loc,
        };

        loop {
            match self.peek() {
                None | Some('\n') => return Err(unterminated()),
                Some('\\') => {
                    raw.push('\\');
                    self.advance();
                    match self.peek() {
                        None | Some('\n') => return Err(unterminated()),
                        Some(escaped) => {
                            raw.push(escaped);
                            self.advance();
                        }
                    }
                }
                Some(ch) => {
                    raw.push(ch);
                    self.advance();
                    if ch == quote {
                        break;
                    }
                }
            }
        }

        let kind = if quote == '"' {
            TokenKind::String
        } else {
            TokenKind::Char
        };
        Ok(Token::new(kind, raw, loc))
    }

    /// Parse a numeric literal: decimal or hex integer, or a float with an
    /// optional fraction, exponent and precision suffix.
    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut text = String::new();
        text.push(first);

        // Hexadecimal integer
        if first == '0' && matches!(self.peek(), Some('x') | Some('X')) {
            text.push(self.advance().unwrap_or('x'));
            let digits_start = text.len();
            while let Some(ch) = self.peek().filter(|c| c.is_ascii_hexdigit()) {
                text.push(ch);
                self.advance();
            }
            if text.len() == digits_start {
                return Err(self.invalid_number(text, loc));
            }
            return self.finish_number(text, TokenKind::Integer, loc);
        }

        let mut is_float = first == '.';
        self.take_digits(&mut text);

        if !is_float
            && self.peek() == Some('.')
            && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            text.push('.');
            self.advance();
            self.take_digits(&mut text);
        }

        // Exponent
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_ahead(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    if let Some(ch) = self.advance() {
                        text.push(ch);
                    }
                }
                self.take_digits(&mut text);
            }
        }

        let suffix = match self.peek() {
            Some('f') | Some('F') => Some(FloatSuffix::F),
            Some('d') | Some('D') => Some(FloatSuffix::D),
            Some('l') | Some('L') if is_float => Some(FloatSuffix::L),
            _ => None,
        };

        let kind = match suffix {
            Some(suffix) => {
                if let Some(ch) = self.advance() {
                    text.push(ch);
                }
                TokenKind::Float(suffix)
            }
            None if is_float => TokenKind::Float(FloatSuffix::None),
            None => TokenKind::Integer,
        };

        self.finish_number(text, kind, loc)
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.peek().filter(|c| c.is_ascii_digit()) {
            text.push(ch);
            self.advance();
        }
    }

    /// Reject literals glued to identifier characters (`12abc`, `1.5ff`)
    fn finish_number(
        &mut self,
        mut text: String,
        kind: TokenKind,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        if self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
            while let Some(ch) = self
                .peek()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
            {
                text.push(ch);
                self.advance();
            }
            return Err(self.invalid_number(text, loc));
        }
        Ok(Token::new(kind, text, loc))
    }

    fn invalid_number(&self, text: String, loc: SourceLocation) -> LexError {
        LexError {
            kind: LexErrorKind::InvalidNumber(text),
            location: loc,
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match Keyword::from_ident(&ident) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident,
        };
        Token::new(kind, ident, loc)
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip to just past the next newline
    fn skip_line(&mut self) {
        while let Some(ch) = self.advance() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            kind: LexErrorKind::UnterminatedComment,
            location: start_loc,
        })
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexError>;

    /// Yields tokens up to and including a single `Eof`, then `None`.
    ///
    /// Errors do not end the stream: the offending input has already been
    /// consumed, so the caller may keep pulling tokens to recover.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.scan();
        if let Ok(Token {
            kind: TokenKind::Eof,
            ..
        }) = &result
        {
            self.finished = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = Lexer::new("namespace A { short x = 1; }").tokenize().unwrap();

        assert!(tokens[0].is_keyword(Keyword::Namespace));
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].lexeme, "A");
        assert_eq!(tokens[2].kind, TokenKind::LBrace);
        assert!(tokens[3].is_keyword(Keyword::Short));
        assert_eq!(tokens[4].lexeme, "x");
        assert_eq!(tokens[5].kind, TokenKind::Eq);
        assert_eq!(tokens[6].kind, TokenKind::Integer);
        assert_eq!(tokens[7].kind, TokenKind::Semicolon);
        assert_eq!(tokens[8].kind, TokenKind::RBrace);
        assert_eq!(tokens[9].kind, TokenKind::Eof);
        assert_eq!(tokens.len(), 10);
    }

    #[test]
    fn test_float_suffixes_are_hints() {
        let tokens = Lexer::new("10.901f 23.234d 12.5 1e3 7f 2.0L").tokenize().unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Float(FloatSuffix::F));
        assert_eq!(tokens[0].lexeme, "10.901f");
        assert_eq!(tokens[1].kind, TokenKind::Float(FloatSuffix::D));
        assert_eq!(tokens[2].kind, TokenKind::Float(FloatSuffix::None));
        assert_eq!(tokens[3].kind, TokenKind::Float(FloatSuffix::None));
        assert_eq!(tokens[4].kind, TokenKind::Float(FloatSuffix::F));
        assert_eq!(tokens[5].kind, TokenKind::Float(FloatSuffix::L));
    }

    #[test]
    fn test_hex_and_operators() {
        assert_eq!(
            kinds("0xFF << 2 >> 1 | ~3 ^ 4 & 5"),
            vec![
                TokenKind::Integer,
                TokenKind::LtLt,
                TokenKind::Integer,
                TokenKind::GtGt,
                TokenKind::Integer,
                TokenKind::Pipe,
                TokenKind::Tilde,
                TokenKind::Integer,
                TokenKind::Caret,
                TokenKind::Integer,
                TokenKind::Amp,
                TokenKind::Integer,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_scoped_name() {
        assert_eq!(
            kinds("A::innerModule::internal"),
            vec![
                TokenKind::Ident,
                TokenKind::ColonColon,
                TokenKind::Ident,
                TokenKind::ColonColon,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_literals_keep_raw_text() {
        let tokens = Lexer::new(r#""a\"b" '\n'"#).tokenize().unwrap();

        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, r#""a\"b""#);
        assert_eq!(tokens[1].kind, TokenKind::Char);
        assert_eq!(tokens[1].lexeme, r"'\n'");
    }

    #[test]
    fn test_comments_and_directives() {
        let tokens = Lexer::new("#include <x.idl>\nint /* block\n */ y; // tail")
            .tokenize()
            .unwrap();

        assert!(tokens[0].is_keyword(Keyword::Int));
        assert_eq!(tokens[1].lexeme, "y");
        assert_eq!(tokens[1].location, SourceLocation::new(3, 5));
        assert_eq!(tokens[2].kind, TokenKind::Semicolon);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_unterminated_string_reports_position() {
        let err = Lexer::new("short c = \"abc\n;").tokenize().unwrap_err();

        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.location, SourceLocation::new(1, 11));
    }

    #[test]
    fn test_unterminated_char() {
        let err = Lexer::new("'a").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedChar);
    }

    #[test]
    fn test_unexpected_symbol_then_recovers() {
        let mut lexer = Lexer::new("a @ b");

        assert_eq!(lexer.next().unwrap().unwrap().lexeme, "a");
        let err = lexer.next().unwrap().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedChar('@'));
        assert_eq!(err.location, SourceLocation::new(1, 3));
        assert_eq!(lexer.next().unwrap().unwrap().lexeme, "b");
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::Eof);
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_single_colon_is_rejected() {
        let err = Lexer::new("A:B").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedChar(':'));
    }

    #[test]
    fn test_malformed_numbers() {
        let err = Lexer::new("12abc").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidNumber("12abc".to_string()));

        let err = Lexer::new("0x;").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidNumber("0x".to_string()));
    }

    #[test]
    fn test_unterminated_comment_ends_stream() {
        let mut lexer = Lexer::new("int /* never closed");
        assert!(lexer.next().unwrap().is_ok());
        let err = lexer.next().unwrap().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::Eof);
        assert!(lexer.next().is_none());
    }
}
