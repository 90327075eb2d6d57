//! Declaration parsing implementation
//!
//! This module handles namespaces, struct declarations and their members:
//!
//! - Namespaces: `namespace Name { ... }` (or `module Name { ... };`)
//! - Typedef structs: `typedef struct Name { ... } Alias;`
//! - Plain structs and forward declarations: `struct Name { ... };`, `struct Name;`
//! - Members: `type a, b[4] = [1, 2], c = 3 * 2;`
//! - Types: primitive spellings or scoped names (`A::inner::T`, `::T`)
//!
//! # Grammar
//!
//! ```text
//! definition  ::= namespace | type_decl
//! namespace   ::= ("namespace" | "module") IDENT "{" definition* "}" ";"?
//! type_decl   ::= "typedef" "struct" IDENT struct_body IDENT? ";"
//!               | "struct" IDENT (struct_body)? ";"
//! member      ::= type_spec declarator ("," declarator)* ";"
//! declarator  ::= IDENT ("[" INTEGER "]")? ("=" initializer)?
//! initializer ::= expr | ("[" | "{") expr_list? ("]" | "}")
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, TokenKind};
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse definitions until end of input, or until the `}` closing the
    /// enclosing namespace when `nested` is set.
    pub(crate) fn parse_definitions(&mut self, nested: bool) -> Vec<Decl> {
        let mut decls = Vec::new();

        while !self.is_at_end() {
            if self.check(TokenKind::RBrace) {
                if nested {
                    break;
                }
                let err = ParseError::new("Unexpected '}' with no open namespace", self.current_location());
                self.report(err);
                self.advance();
                continue;
            }

            let start = self.position;
            match self.parse_definition() {
                Ok(decl) => decls.push(decl),
                Err(err) => {
                    self.report(err);
                    if self.position == start {
                        self.advance();
                    }
                    self.synchronize_definition();
                }
            }
        }

        decls
    }

    /// Parse one namespace or type declaration
    pub(crate) fn parse_definition(&mut self) -> Result<Decl, ParseError> {
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Namespace | Keyword::Module) => {
                self.enter_nested("namespaces")?;
                let result = self.parse_namespace();
                self.leave_nested();
                result.map(Decl::Namespace)
            }
            TokenKind::Keyword(Keyword::Typedef) => self.parse_typedef().map(Decl::Struct),
            TokenKind::Keyword(Keyword::Struct) => self.parse_struct().map(Decl::Struct),
            _ => Err(ParseError::new(
                format!(
                    "Expected 'namespace', 'typedef' or 'struct', found {}",
                    self.peek()
                ),
                self.current_location(),
            )),
        }
    }

    /// Parse namespace: (namespace | module) Name { definitions } [;]
    fn parse_namespace(&mut self) -> Result<NamespaceDecl, ParseError> {
        let keyword = self.advance().lexeme.clone();
        let loc = self.previous_location();

        let (name, _) = self.expect_identifier(&format!("after '{keyword}'"))?;
        self.expect_lbrace(&format!("after namespace name '{name}'"))?;

        let decls = self.parse_definitions(true);

        self.expect_rbrace(&format!("to close namespace '{name}'"))?;
        self.match_kind(TokenKind::Semicolon);

        Ok(NamespaceDecl {
            name,
            decls,
            location: loc,
        })
    }

    /// Parse typedef: typedef struct Name { members } [Alias] ;
    fn parse_typedef(&mut self) -> Result<StructDecl, ParseError> {
        self.advance(); // consume 'typedef'
        let loc = self.previous_location();

        self.expect_token(
            TokenKind::Keyword(Keyword::Struct),
            "Expected 'struct' after 'typedef'",
        )?;
        let (name, _) = self.expect_identifier("after 'typedef struct'")?;
        let fields = self.parse_struct_body(&name)?;

        let alias = if self.check(TokenKind::Ident) {
            Some(self.advance().lexeme.clone())
        } else {
            None
        };
        self.expect_semicolon("after typedef")?;

        Ok(StructDecl {
            name,
            alias,
            form: StructForm::Typedef,
            fields,
            location: loc,
        })
    }

    /// Parse struct definition `struct Name { members };` or forward
    /// declaration `struct Name;`
    fn parse_struct(&mut self) -> Result<StructDecl, ParseError> {
        self.advance(); // consume 'struct'
        let loc = self.previous_location();

        let (name, _) = self.expect_identifier("after 'struct'")?;

        if self.match_kind(TokenKind::Semicolon) {
            return Ok(StructDecl {
                name,
                alias: None,
                form: StructForm::Forward,
                fields: Vec::new(),
                location: loc,
            });
        }

        let fields = self.parse_struct_body(&name)?;
        self.expect_semicolon("after struct definition")?;

        Ok(StructDecl {
            name,
            alias: None,
            form: StructForm::Plain,
            fields,
            location: loc,
        })
    }

    /// Parse `{ member* }`, recovering member by member
    fn parse_struct_body(&mut self, name: &str) -> Result<Vec<FieldDecl>, ParseError> {
        self.expect_lbrace(&format!("after struct name '{name}'"))?;

        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let start = self.position;
            if let Err(err) = self.parse_member(&mut fields) {
                self.report(err);
                self.synchronize_member(start);
            }
        }

        self.expect_rbrace(&format!("to close struct '{name}'"))?;
        Ok(fields)
    }

    /// Parse one member line; every declarator becomes its own field.
    ///
    /// Declarators parsed before an error are kept.
    fn parse_member(&mut self, fields: &mut Vec<FieldDecl>) -> Result<(), ParseError> {
        let ty = self.parse_type_spec()?;

        loop {
            let field = self.parse_declarator(&ty)?;
            fields.push(field);

            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.expect_semicolon("after struct member")
    }

    /// Parse type: primitive spelling or scoped name
    pub(crate) fn parse_type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        match self.peek_kind() {
            TokenKind::Keyword(kw) if kw.starts_type() => {
                self.advance();
                Ok(TypeSpec::Primitive(self.parse_primitive(kw)?))
            }
            TokenKind::Ident | TokenKind::ColonColon => Ok(TypeSpec::Named(self.parse_scoped_name()?)),
            _ => Err(ParseError::new(
                format!("Expected type, found {}", self.peek()),
                self.current_location(),
            )),
        }
    }

    /// Finish a primitive type whose first keyword was already consumed.
    ///
    /// Multi-word spellings (`unsigned long long`, `long double`) are
    /// accepted, and a trailing `int` after `short`/`long` is allowed.
    fn parse_primitive(&mut self, first: Keyword) -> Result<PrimitiveType, ParseError> {
        let ty = match first {
            Keyword::Short => {
                self.match_keyword(Keyword::Int);
                PrimitiveType::Short
            }
            Keyword::Int => PrimitiveType::Int,
            Keyword::Long => {
                if self.match_keyword(Keyword::Long) {
                    self.match_keyword(Keyword::Int);
                    PrimitiveType::LongLong
                } else if self.match_keyword(Keyword::Double) {
                    PrimitiveType::LongDouble
                } else {
                    self.match_keyword(Keyword::Int);
                    PrimitiveType::Long
                }
            }
            Keyword::Unsigned => {
                if self.match_keyword(Keyword::Short) {
                    self.match_keyword(Keyword::Int);
                    PrimitiveType::UnsignedShort
                } else if self.match_keyword(Keyword::Long) {
                    if self.match_keyword(Keyword::Long) {
                        self.match_keyword(Keyword::Int);
                        PrimitiveType::UnsignedLongLong
                    } else {
                        self.match_keyword(Keyword::Int);
                        PrimitiveType::UnsignedLong
                    }
                } else {
                    self.match_keyword(Keyword::Int);
                    PrimitiveType::UnsignedInt
                }
            }
            Keyword::Float => PrimitiveType::Float,
            Keyword::Double => PrimitiveType::Double,
            Keyword::Char => PrimitiveType::Char,
            Keyword::String => PrimitiveType::String,
            Keyword::Bool | Keyword::Boolean => PrimitiveType::Bool,
            Keyword::Int16 => PrimitiveType::Int16,
            Keyword::UInt16 => PrimitiveType::UInt16,
            Keyword::Int32 => PrimitiveType::Int32,
            Keyword::UInt32 => PrimitiveType::UInt32,
            Keyword::Int64 => PrimitiveType::Int64,
            Keyword::UInt64 => PrimitiveType::UInt64,
            other => {
                return Err(ParseError::new(
                    format!("'{other:?}' is not a type"),
                    self.previous_location(),
                ))
            }
        };
        Ok(ty)
    }

    /// Parse `[::] IDENT (:: IDENT)*`
    pub(crate) fn parse_scoped_name(&mut self) -> Result<ScopedName, ParseError> {
        let loc = self.current_location();
        let absolute = self.match_kind(TokenKind::ColonColon);

        let mut segments = vec![self.expect_identifier("in type name")?.0];
        while self.match_kind(TokenKind::ColonColon) {
            segments.push(self.expect_identifier("after '::'")?.0);
        }

        Ok(ScopedName {
            segments,
            absolute,
            location: loc,
        })
    }

    /// Parse declarator: name [ [N] ] [ = initializer ]
    fn parse_declarator(&mut self, ty: &TypeSpec) -> Result<FieldDecl, ParseError> {
        let (name, loc) = self.expect_identifier("for field name")?;

        let array_len = if self.match_kind(TokenKind::LBracket) {
            let len = self.parse_array_dimension()?;
            self.expect_token(TokenKind::RBracket, "Expected ']' after array size")?;
            Some(len)
        } else {
            None
        };

        let init = if self.match_kind(TokenKind::Eq) {
            Some(self.parse_initializer()?)
        } else {
            None
        };

        Ok(FieldDecl {
            ty: ty.clone(),
            name,
            array_len,
            init,
            location: loc,
        })
    }

    /// Array dimensions must be integer literals; zero is left for the
    /// analyzer to reject.
    fn parse_array_dimension(&mut self) -> Result<u64, ParseError> {
        let loc = self.current_location();
        if !self.check(TokenKind::Integer) {
            return Err(ParseError::new(
                format!("Array size must be an integer literal, found {}", self.peek()),
                loc,
            ));
        }

        let text = self.advance().lexeme.clone();
        parse_integer_literal(&text)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| ParseError::new(format!("Array size {text} is too large"), loc))
    }

    /// Parse a scalar expression or a `[...]` / `{...}` element list
    fn parse_initializer(&mut self) -> Result<Initializer, ParseError> {
        let close = match self.peek_kind() {
            TokenKind::LBracket => TokenKind::RBracket,
            TokenKind::LBrace => TokenKind::RBrace,
            _ => return Ok(Initializer::Expr(self.parse_expression()?)),
        };
        self.advance();
        let loc = self.previous_location();

        let mut elements = Vec::new();
        while !self.check(close) {
            elements.push(self.parse_expression()?);
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        let closing = if close == TokenKind::RBracket { "']'" } else { "'}'" };
        self.expect_token(close, &format!("Expected {closing} after initializer list"))?;

        Ok(Initializer::List {
            elements,
            location: loc,
        })
    }
}
