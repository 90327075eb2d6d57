//! Folded initializer values
//!
//! [`Value`] holds the result of evaluating an initializer under its
//! declared field type. Integers are kept at full `i128` precision so range
//! checks happen after folding; `float` fields fold to [`Value::Single`].

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i128),
    Single(f32),
    Float(f64),
    Char(char),
    Str(String),
    Bool(bool),
    Array(Vec<Value>),
}

impl Value {
    /// Get the integer value, returns None if not an Int
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Floating value widened to f64, returns None for non-floating values
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Single(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Single(v) => write!(f, "{:?}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}
