//! Expression parsing implementation
//!
//! This module handles parsing of initializer expressions using one
//! recursive descent rule per precedence level.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, characters, strings, `true`/`false`
//! - Binary operators: `|`, `^`, `&`, `<<`, `>>`, `+`, `-`, `*`, `/`, `%`
//! - Unary operators: `+`, `-`, `~`
//! - Parenthesized subexpressions
//!
//! # Precedence
//!
//! From loosest to tightest: `|`, `^`, `&`, shifts, additive,
//! multiplicative, unary. All binary operators are left-associative.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, TokenKind};
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_bitwise_or()
    }

    /// Build a left-associative chain for one precedence level
    fn parse_binary_level(
        &mut self,
        operators: &[(TokenKind, BinOp)],
        next: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = next(self)?;

        loop {
            let loc = self.current_location();
            let kind = self.peek_kind();
            let op = match operators.iter().find(|(k, _)| *k == kind) {
                Some((_, op)) => *op,
                None => break,
            };
            self.advance();

            let right = Box::new(next(self)?);
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse bitwise OR (|)
    fn parse_bitwise_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[(TokenKind::Pipe, BinOp::BitOr)], Self::parse_bitwise_xor)
    }

    /// Parse bitwise XOR (^)
    fn parse_bitwise_xor(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[(TokenKind::Caret, BinOp::BitXor)], Self::parse_bitwise_and)
    }

    /// Parse bitwise AND (&)
    fn parse_bitwise_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[(TokenKind::Amp, BinOp::BitAnd)], Self::parse_shift)
    }

    /// Parse shift (<< >>)
    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[(TokenKind::LtLt, BinOp::Shl), (TokenKind::GtGt, BinOp::Shr)],
            Self::parse_additive,
        )
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[(TokenKind::Plus, BinOp::Add), (TokenKind::Minus, BinOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[
                (TokenKind::Star, BinOp::Mul),
                (TokenKind::Slash, BinOp::Div),
                (TokenKind::Percent, BinOp::Mod),
            ],
            Self::parse_unary,
        )
    }

    /// Parse unary: + - ~
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.current_location();
        let op = match self.peek_kind() {
            TokenKind::Plus => UnOp::Plus,
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Tilde => UnOp::BitNot,
            _ => return self.parse_primary(),
        };
        self.advance();

        self.enter_nested("unary operators")?;
        let operand = self.parse_unary();
        self.leave_nested();

        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
            location: loc,
        })
    }

    /// Parse primary: literals and parenthesized expressions
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.current_location();

        let kind = match self.peek_kind() {
            TokenKind::Integer => LiteralKind::Integer,
            TokenKind::Float(suffix) => LiteralKind::Float(suffix),
            TokenKind::Char => LiteralKind::Char,
            TokenKind::String => LiteralKind::String,
            TokenKind::Keyword(Keyword::True | Keyword::False) => LiteralKind::Bool,
            TokenKind::LParen => {
                self.advance();
                self.enter_nested("parentheses")?;
                let inner = self.parse_expression();
                self.leave_nested();
                let inner = inner?;
                self.expect_token(TokenKind::RParen, "Expected ')' after expression")?;
                return Ok(inner);
            }
            TokenKind::Ident => {
                return Err(ParseError::new(
                    format!(
                        "Initializers must be constant; identifier '{}' cannot be used here",
                        self.peek().lexeme
                    ),
                    loc,
                ))
            }
            _ => {
                return Err(ParseError::new(
                    format!("Expected expression, found {}", self.peek()),
                    loc,
                ))
            }
        };

        let text = self.advance().lexeme.clone();
        Ok(Expr::Literal(Literal { kind, text }, loc))
    }
}
