//! Primitive type classes and value ranges
//!
//! Every [`PrimitiveType`] spelling maps onto a [`TypeClass`] that decides
//! how initializers are folded and which range they must fit. Widths:
//!
//! | spelling                          | class              |
//! |-----------------------------------|--------------------|
//! | `short`, `int16`                  | signed 16-bit      |
//! | `int`, `long`, `int32`            | signed 32-bit      |
//! | `long long`, `int64`              | signed 64-bit      |
//! | `unsigned ...`, `uintN`           | unsigned, same width |
//! | `float`                           | IEEE single        |
//! | `double`, `long double`           | IEEE double        |

use crate::parser::ast::PrimitiveType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Integral { bits: u32, signed: bool },
    Floating { single: bool },
    Char,
    String,
    Bool,
}

impl TypeClass {
    pub fn of(ty: PrimitiveType) -> TypeClass {
        use PrimitiveType::*;

        match ty {
            Short | Int16 => TypeClass::Integral { bits: 16, signed: true },
            UnsignedShort | UInt16 => TypeClass::Integral { bits: 16, signed: false },
            Int | Long | Int32 => TypeClass::Integral { bits: 32, signed: true },
            UnsignedInt | UnsignedLong | UInt32 => TypeClass::Integral { bits: 32, signed: false },
            LongLong | Int64 => TypeClass::Integral { bits: 64, signed: true },
            UnsignedLongLong | UInt64 => TypeClass::Integral { bits: 64, signed: false },
            Float => TypeClass::Floating { single: true },
            Double | LongDouble => TypeClass::Floating { single: false },
            Char => TypeClass::Char,
            String => TypeClass::String,
            Bool => TypeClass::Bool,
        }
    }

    /// Inclusive bounds of an integral class
    pub fn integral_bounds(&self) -> Option<(i128, i128)> {
        match *self {
            TypeClass::Integral { bits, signed: true } => {
                let max = (1i128 << (bits - 1)) - 1;
                Some((-max - 1, max))
            }
            TypeClass::Integral { bits, signed: false } => Some((0, (1i128 << bits) - 1)),
            _ => None,
        }
    }
}
