//! The runtime value model shared by the loader and the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A runtime value: integer, boolean, or text.
///
/// Arithmetic and comparison instructions operate on integers, string
/// instructions on text, and logical instructions read truthiness and write
/// 0/1 integers so their results can feed numeric branching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A signed integer.
    Int(i64),
    /// A boolean.
    Bool(bool),
    /// A text string.
    Text(String),
}

impl Value {
    /// Whether this value counts as true in a boolean context.
    ///
    /// True iff it is a nonzero integer, a nonempty string, or `true`.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::Text(s) => !s.is_empty(),
        }
    }

    /// The name of this value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Bool(_) => "boolean",
            Value::Text(_) => "text",
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}
