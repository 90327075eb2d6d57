//! Constant folding of field initializers
//!
//! Initializers are folded under the field's declared type:
//!
//! - Integral fields accept integer literals only. Arithmetic runs in `i128`
//!   with truncating division, then the result is checked against the
//!   declared width.
//! - Floating fields accept integer and floating literals. Subexpressions
//!   made only of integer literals fold in the integral domain first (so
//!   `7 / 2` is `3`, and `1 << 4` is allowed); anything touching a floating
//!   literal uses IEEE arithmetic with `%` as `fmod`. Bitwise operators on a
//!   floating operand are a type mismatch.
//! - `char`, `string` and `bool` fields accept exactly one literal of their
//!   own kind. Quoted literals are unescaped here, not in the lexer.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::parser::ast::*;
use crate::semantic::errors::SemanticError;
use crate::semantic::types::TypeClass;
use crate::semantic::value::Value;

/// Fold `expr` under `ty` with range checks enabled.
pub fn evaluate(expr: &Expr, ty: PrimitiveType) -> Result<Value, SemanticError> {
    Evaluator::new().evaluate(expr, ty)
}

/// Initializer evaluator.
///
/// Carries the range-check switch and collects warnings (precision loss)
/// that do not reject the initializer.
#[derive(Debug)]
pub struct Evaluator {
    range_checks: bool,
    warnings: Vec<Diagnostic>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            range_checks: true,
            warnings: Vec::new(),
        }
    }

    pub fn with_range_checks(mut self, enabled: bool) -> Self {
        self.range_checks = enabled;
        self
    }

    /// Drain warnings produced since the last call
    pub fn take_warnings(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.warnings)
    }

    /// Evaluate a field initializer, checking list shape against `array_len`.
    ///
    /// Arrays need a list with at most `array_len` elements; scalars need a
    /// single expression.
    pub fn evaluate_initializer(
        &mut self,
        init: &Initializer,
        ty: PrimitiveType,
        array_len: Option<u64>,
    ) -> Result<Value, SemanticError> {
        match (init, array_len) {
            (Initializer::List { elements, location }, Some(len)) => {
                if elements.len() as u64 > len {
                    return Err(SemanticError::ArraySize {
                        message: format!(
                            "initializer has {} elements but the array holds {}",
                            elements.len(),
                            len
                        ),
                        location: *location,
                    });
                }
                elements
                    .iter()
                    .map(|element| self.evaluate(element, ty))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            (Initializer::Expr(expr), Some(_)) => Err(SemanticError::type_mismatch(
                format!("array of {} requires a list initializer", ty),
                expr.location(),
            )),
            (Initializer::List { location, .. }, None) => Err(SemanticError::type_mismatch(
                format!("list initializer used for a scalar field of type {}", ty),
                *location,
            )),
            (Initializer::Expr(expr), None) => self.evaluate(expr, ty),
        }
    }

    /// Evaluate a scalar expression under the declared type
    pub fn evaluate(&mut self, expr: &Expr, ty: PrimitiveType) -> Result<Value, SemanticError> {
        match TypeClass::of(ty) {
            TypeClass::Integral { .. } => {
                let value = self.fold_integral(expr, ty)?;
                self.check_integral_range(value, ty, expr.location())?;
                Ok(Value::Int(value))
            }
            TypeClass::Floating { single } => {
                let value = self.fold_floating(expr, ty, single)?;
                self.check_floating_range(value, ty, single, expr.location())?;
                if single {
                    Ok(Value::Single(value as f32))
                } else {
                    Ok(Value::Float(value))
                }
            }
            TypeClass::Char => match expr {
                Expr::Literal(lit, loc) if lit.kind == LiteralKind::Char => {
                    decode_char(&lit.text, *loc).map(Value::Char)
                }
                _ => Err(mismatch(expr, ty)),
            },
            TypeClass::String => match expr {
                Expr::Literal(lit, loc) if lit.kind == LiteralKind::String => {
                    decode_string(&lit.text, *loc).map(Value::Str)
                }
                _ => Err(mismatch(expr, ty)),
            },
            TypeClass::Bool => match expr {
                Expr::Literal(lit, _) if lit.kind == LiteralKind::Bool => {
                    Ok(Value::Bool(lit.text.eq_ignore_ascii_case("true")))
                }
                _ => Err(mismatch(expr, ty)),
            },
        }
    }

    fn fold_integral(&self, expr: &Expr, ty: PrimitiveType) -> Result<i128, SemanticError> {
        match expr {
            Expr::Literal(lit, loc) => match lit.kind {
                LiteralKind::Integer => integer_literal(&lit.text, *loc),
                LiteralKind::Float(_) => Err(SemanticError::type_mismatch(
                    format!(
                        "floating literal {} cannot initialize integral type {}",
                        lit.text, ty
                    ),
                    *loc,
                )),
                _ => Err(mismatch(expr, ty)),
            },
            Expr::Unary {
                op,
                operand,
                location,
            } => {
                let value = self.fold_integral(operand, ty)?;
                match op {
                    UnOp::Plus => Ok(value),
                    UnOp::Neg => value
                        .checked_neg()
                        .ok_or_else(|| SemanticError::IntegerOverflow {
                            operation: format!("-{}", value),
                            location: *location,
                        }),
                    UnOp::BitNot => Ok(!value),
                }
            }
            Expr::Binary {
                op,
                left,
                right,
                location,
            } => {
                let a = self.fold_integral(left, ty)?;
                let b = self.fold_integral(right, ty)?;
                integral_binary(*op, a, b, *location)
            }
        }
    }

    fn fold_floating(
        &mut self,
        expr: &Expr,
        ty: PrimitiveType,
        single: bool,
    ) -> Result<f64, SemanticError> {
        if is_integer_only(expr) {
            return self.fold_integral(expr, ty).map(|v| v as f64);
        }

        match expr {
            Expr::Literal(lit, loc) => match lit.kind {
                LiteralKind::Float(suffix) => {
                    if single && matches!(suffix, FloatSuffix::D | FloatSuffix::L) {
                        self.warnings.push(Diagnostic::warning(
                            DiagnosticKind::PrecisionLoss,
                            format!("literal {} is narrowed to single precision", lit.text),
                            *loc,
                        ));
                    }
                    float_literal(&lit.text, *loc)
                }
                // Integer leaves take the early return above
                _ => Err(mismatch(expr, ty)),
            },
            Expr::Unary {
                op,
                operand,
                location,
            } => match op {
                UnOp::Plus => self.fold_floating(operand, ty, single),
                UnOp::Neg => Ok(-self.fold_floating(operand, ty, single)?),
                UnOp::BitNot => Err(SemanticError::type_mismatch(
                    "bitwise '~' cannot be applied to a floating operand",
                    *location,
                )),
            },
            Expr::Binary {
                op,
                left,
                right,
                location,
            } => {
                if op.is_bitwise() {
                    return Err(SemanticError::type_mismatch(
                        format!(
                            "bitwise '{}' cannot be applied to a floating operand",
                            op.symbol()
                        ),
                        *location,
                    ));
                }

                let a = self.fold_floating(left, ty, single)?;
                let b = self.fold_floating(right, ty, single)?;
                match op {
                    BinOp::Add => Ok(a + b),
                    BinOp::Sub => Ok(a - b),
                    BinOp::Mul => Ok(a * b),
                    BinOp::Div | BinOp::Mod if b == 0.0 => Err(SemanticError::DivisionByZero {
                        operation: format!("{} {} {}", a, op.symbol(), b),
                        location: *location,
                    }),
                    BinOp::Div => Ok(a / b),
                    BinOp::Mod => Ok(a % b),
                    _ => Err(SemanticError::type_mismatch(
                        format!("operator '{}' is not defined for floating operands", op.symbol()),
                        *location,
                    )),
                }
            }
        }
    }

    fn check_integral_range(
        &self,
        value: i128,
        ty: PrimitiveType,
        location: SourceLocation,
    ) -> Result<(), SemanticError> {
        if !self.range_checks {
            return Ok(());
        }
        match TypeClass::of(ty).integral_bounds() {
            Some((min, max)) if value < min || value > max => Err(SemanticError::OutOfRange {
                value: value.to_string(),
                ty: ty.to_string(),
                location,
            }),
            _ => Ok(()),
        }
    }

    fn check_floating_range(
        &self,
        value: f64,
        ty: PrimitiveType,
        single: bool,
        location: SourceLocation,
    ) -> Result<(), SemanticError> {
        if !self.range_checks {
            return Ok(());
        }
        let fits = value.is_finite() && (!single || value.abs() <= f32::MAX as f64);
        if fits {
            Ok(())
        } else {
            Err(SemanticError::OutOfRange {
                value: value.to_string(),
                ty: ty.to_string(),
                location,
            })
        }
    }
}

fn integral_binary(op: BinOp, a: i128, b: i128, location: SourceLocation) -> Result<i128, SemanticError> {
    let operation = || format!("{} {} {}", a, op.symbol(), b);
    let overflow = || SemanticError::IntegerOverflow {
        operation: operation(),
        location,
    };

    match op {
        BinOp::Add => a.checked_add(b).ok_or_else(overflow),
        BinOp::Sub => a.checked_sub(b).ok_or_else(overflow),
        BinOp::Mul => a.checked_mul(b).ok_or_else(overflow),
        BinOp::Div | BinOp::Mod if b == 0 => Err(SemanticError::DivisionByZero {
            operation: operation(),
            location,
        }),
        BinOp::Div => a.checked_div(b).ok_or_else(overflow),
        BinOp::Mod => a.checked_rem(b).ok_or_else(overflow),
        BinOp::BitAnd => Ok(a & b),
        BinOp::BitOr => Ok(a | b),
        BinOp::BitXor => Ok(a ^ b),
        BinOp::Shl => {
            let shift = u32::try_from(b).ok().filter(|s| *s < 128).ok_or_else(overflow)?;
            let shifted = a << shift;
            if shifted >> shift == a {
                Ok(shifted)
            } else {
                Err(overflow())
            }
        }
        BinOp::Shr => {
            let shift = u32::try_from(b).ok().filter(|s| *s < 128).ok_or_else(overflow)?;
            Ok(a >> shift)
        }
    }
}

/// True when every leaf is an integer literal
fn is_integer_only(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(lit, _) => lit.kind == LiteralKind::Integer,
        Expr::Unary { operand, .. } => is_integer_only(operand),
        Expr::Binary { left, right, .. } => is_integer_only(left) && is_integer_only(right),
    }
}

fn mismatch(expr: &Expr, ty: PrimitiveType) -> SemanticError {
    let what = match expr {
        Expr::Literal(lit, _) => match lit.kind {
            LiteralKind::Integer => format!("integer literal {}", lit.text),
            LiteralKind::Float(_) => format!("floating literal {}", lit.text),
            LiteralKind::Char => format!("char literal {}", lit.text),
            LiteralKind::String => format!("string literal {}", lit.text),
            LiteralKind::Bool => format!("boolean literal {}", lit.text),
        },
        _ => "an expression".to_string(),
    };
    SemanticError::type_mismatch(
        format!("cannot initialize a field of type {} with {}", ty, what),
        expr.location(),
    )
}

fn integer_literal(text: &str, location: SourceLocation) -> Result<i128, SemanticError> {
    parse_integer_literal(text)
        .and_then(|v| i128::try_from(v).ok())
        .ok_or_else(|| SemanticError::IntegerOverflow {
            operation: format!("literal {}", text),
            location,
        })
}

fn float_literal(text: &str, location: SourceLocation) -> Result<f64, SemanticError> {
    let digits = text.trim_end_matches(&['f', 'F', 'd', 'D', 'l', 'L'][..]);
    digits
        .parse::<f64>()
        .map_err(|err| SemanticError::InvalidLiteral {
            literal: text.to_string(),
            reason: err.to_string(),
            location,
        })
}

fn decode_char(text: &str, location: SourceLocation) -> Result<char, SemanticError> {
    let decoded = unescape(strip_quotes(text), text, location)?;
    let mut chars = decoded.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(SemanticError::InvalidLiteral {
            literal: text.to_string(),
            reason: "character literal must contain exactly one character".to_string(),
            location,
        }),
    }
}

fn decode_string(text: &str, location: SourceLocation) -> Result<String, SemanticError> {
    unescape(strip_quotes(text), text, location)
}

fn strip_quotes(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

/// Decode `\n \t \r \0 \\ \' \" \xHH`
fn unescape(body: &str, literal: &str, location: SourceLocation) -> Result<String, SemanticError> {
    let invalid = |reason: String| SemanticError::InvalidLiteral {
        literal: literal.to_string(),
        reason,
        location,
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let escaped = chars
            .next()
            .ok_or_else(|| invalid("dangling backslash".to_string()))?;
        let decoded = match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'x' => {
                let mut code = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            code = code * 16 + d;
                            digits += 1;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return Err(invalid("\\x escape needs hex digits".to_string()));
                }
                char::from_u32(code).ok_or_else(|| invalid(format!("invalid code point {code:#x}")))?
            }
            other => return Err(invalid(format!("unknown escape sequence '\\{}'", other))),
        };
        out.push(decoded);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;

    fn expr(source: &str) -> Expr {
        Parser::new(source).parse_expression().unwrap()
    }

    fn eval(source: &str, ty: PrimitiveType) -> Result<Value, SemanticError> {
        evaluate(&expr(source), ty)
    }

    #[test]
    fn test_integer_precedence_and_truncation() {
        assert_eq!(eval("2 + 5 * 2 / 3", PrimitiveType::Short), Ok(Value::Int(5)));
        assert_eq!(eval("-7 / 2", PrimitiveType::Int), Ok(Value::Int(-3)));
        assert_eq!(eval("-7 % 2", PrimitiveType::Int), Ok(Value::Int(-1)));
    }

    #[test]
    fn test_float_fmod() {
        match eval("1.2 * 3.0 - 2.0 % 1.0", PrimitiveType::Float) {
            Ok(Value::Single(v)) => assert!((v - 3.6).abs() < 1e-6, "{v}"),
            other => panic!("Expected float, got {:?}", other),
        }
        match eval("5.5 % 2", PrimitiveType::Double) {
            Ok(Value::Float(v)) => assert!((v - 1.5).abs() < 1e-12),
            other => panic!("Expected double, got {:?}", other),
        }
    }

    #[test]
    fn test_bitwise_not_on_float_is_mismatch() {
        let err = eval("~2.0", PrimitiveType::Float).unwrap_err();
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));

        let err = eval("1.5 & 1", PrimitiveType::Double).unwrap_err();
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn test_integer_subexpressions_in_float_context() {
        assert_eq!(eval("7 / 2", PrimitiveType::Double), Ok(Value::Float(3.0)));
        assert_eq!(eval("1 << 4", PrimitiveType::Float), Ok(Value::Single(16.0)));
        assert_eq!(eval("~0 + 0.5", PrimitiveType::Double), Ok(Value::Float(-0.5)));
    }

    #[test]
    fn test_integer_leaf_beside_float_leaf() {
        assert_eq!(eval("2.5 * 4", PrimitiveType::Double), Ok(Value::Float(10.0)));
        assert_eq!(eval("-3 + 0.5", PrimitiveType::Double), Ok(Value::Float(-2.5)));
    }

    #[test]
    fn test_bitwise_and_shifts() {
        assert_eq!(eval("0xF0 | 0x0F", PrimitiveType::Int), Ok(Value::Int(255)));
        assert_eq!(eval("6 ^ 3 & 1", PrimitiveType::Int), Ok(Value::Int(7)));
        assert_eq!(eval("1 << 10 >> 2", PrimitiveType::Int), Ok(Value::Int(256)));
        assert_eq!(eval("~5", PrimitiveType::Short), Ok(Value::Int(-6)));
    }

    #[test]
    fn test_string_into_short_is_rejected() {
        let err = eval("\"a\"", PrimitiveType::Short).unwrap_err();
        match err {
            SemanticError::TypeMismatch { message, .. } => {
                assert!(message.contains("string literal \"a\""), "{message}")
            }
            other => panic!("Expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_range_checks() {
        let err = eval("100000", PrimitiveType::Short).unwrap_err();
        assert!(matches!(err, SemanticError::OutOfRange { .. }));
        assert!(eval("-1", PrimitiveType::UnsignedInt).is_err());
        assert_eq!(eval("65535", PrimitiveType::UnsignedShort), Ok(Value::Int(65535)));

        let mut lenient = Evaluator::new().with_range_checks(false);
        assert_eq!(
            lenient.evaluate(&expr("100000"), PrimitiveType::Short),
            Ok(Value::Int(100000))
        );
    }

    #[test]
    fn test_float_literal_in_integral_context() {
        let err = eval("2.5", PrimitiveType::Long).unwrap_err();
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            eval("1 / (2 - 2)", PrimitiveType::Int),
            Err(SemanticError::DivisionByZero { .. })
        ));
        assert!(matches!(
            eval("1.0 % 0.0", PrimitiveType::Double),
            Err(SemanticError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_shift_overflow() {
        assert!(matches!(
            eval("1 << 200", PrimitiveType::LongLong),
            Err(SemanticError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn test_precision_loss_warning() {
        let mut evaluator = Evaluator::new();
        let value = evaluator.evaluate(&expr("23.234d"), PrimitiveType::Float).unwrap();
        assert!(matches!(value, Value::Single(_)));

        let warnings = evaluator.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, DiagnosticKind::PrecisionLoss);
        assert!(!warnings[0].is_error());

        evaluator.evaluate(&expr("23.234d"), PrimitiveType::Double).unwrap();
        assert!(evaluator.take_warnings().is_empty());
    }

    #[test]
    fn test_float_overflow_for_single() {
        assert!(matches!(
            eval("1e300", PrimitiveType::Float),
            Err(SemanticError::OutOfRange { .. })
        ));
        assert!(eval("1e300", PrimitiveType::Double).is_ok());
    }

    #[test]
    fn test_char_string_bool() {
        assert_eq!(eval("'a'", PrimitiveType::Char), Ok(Value::Char('a')));
        assert_eq!(eval(r"'\n'", PrimitiveType::Char), Ok(Value::Char('\n')));
        assert_eq!(eval(r"'\x41'", PrimitiveType::Char), Ok(Value::Char('A')));
        assert_eq!(
            eval(r#""a\"b\tc""#, PrimitiveType::String),
            Ok(Value::Str("a\"b\tc".to_string()))
        );
        assert_eq!(eval("TRUE", PrimitiveType::Bool), Ok(Value::Bool(true)));
        assert_eq!(eval("false", PrimitiveType::Bool), Ok(Value::Bool(false)));

        assert!(matches!(
            eval("'ab'", PrimitiveType::Char),
            Err(SemanticError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            eval(r"'\q'", PrimitiveType::Char),
            Err(SemanticError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            eval("1", PrimitiveType::Bool),
            Err(SemanticError::TypeMismatch { .. })
        ));
        assert!(matches!(
            eval("\"a\" + \"b\"", PrimitiveType::String),
            Err(SemanticError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_array_initializers() {
        let mut evaluator = Evaluator::new();
        let list = Initializer::List {
            elements: vec![expr("1"), expr("2 * 3")],
            location: SourceLocation::new(1, 1),
        };

        assert_eq!(
            evaluator.evaluate_initializer(&list, PrimitiveType::Short, Some(4)),
            Ok(Value::Array(vec![Value::Int(1), Value::Int(6)]))
        );
        assert!(matches!(
            evaluator.evaluate_initializer(&list, PrimitiveType::Short, Some(1)),
            Err(SemanticError::ArraySize { .. })
        ));
        assert!(matches!(
            evaluator.evaluate_initializer(&list, PrimitiveType::Short, None),
            Err(SemanticError::TypeMismatch { .. })
        ));
        assert!(matches!(
            evaluator.evaluate_initializer(&Initializer::Expr(expr("1")), PrimitiveType::Short, Some(2)),
            Err(SemanticError::TypeMismatch { .. })
        ));
    }
}
