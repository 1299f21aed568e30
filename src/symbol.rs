// CLASSIFICATION: COMMUNITY
// Filename: symbol.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Preprocessor symbol values.

use std::fmt;

/// Value given to a `#define`. Everything except [`SymbolValue::Default`]
/// reaches the engine as text.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolValue {
    /// Engine default (`1`).
    Default,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl SymbolValue {
    /// Textual form handed to the engine, or `None` for the engine default.
    pub fn to_text(&self) -> Option<String> {
        match self {
            SymbolValue::Default => None,
            SymbolValue::Text(s) => Some(s.clone()),
            SymbolValue::Integer(i) => Some(i.to_string()),
            // Debug keeps the fraction (`42.0`) so the macro stays a float.
            SymbolValue::Float(f) => Some(format!("{f:?}")),
            SymbolValue::Boolean(b) => Some(if *b { "1" } else { "0" }.to_string()),
        }
    }
}

impl fmt::Display for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("<default>"),
        }
    }
}

impl From<()> for SymbolValue {
    fn from(_: ()) -> Self {
        SymbolValue::Default
    }
}

impl From<&str> for SymbolValue {
    fn from(v: &str) -> Self {
        SymbolValue::Text(v.to_string())
    }
}

impl From<String> for SymbolValue {
    fn from(v: String) -> Self {
        SymbolValue::Text(v)
    }
}

impl From<&String> for SymbolValue {
    fn from(v: &String) -> Self {
        SymbolValue::Text(v.clone())
    }
}

impl From<bool> for SymbolValue {
    fn from(v: bool) -> Self {
        SymbolValue::Boolean(v)
    }
}

impl From<f32> for SymbolValue {
    fn from(v: f32) -> Self {
        SymbolValue::Float(f64::from(v))
    }
}

impl From<f64> for SymbolValue {
    fn from(v: f64) -> Self {
        SymbolValue::Float(v)
    }
}

macro_rules! integer_symbol {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SymbolValue {
                fn from(v: $t) -> Self {
                    SymbolValue::Integer(i64::from(v))
                }
            }
        )*
    };
}

integer_symbol!(i8, i16, i32, i64, u8, u16, u32);

// Wider than `i64`; rendered directly so no value is truncated.
macro_rules! wide_integer_symbol {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SymbolValue {
                fn from(v: $t) -> Self {
                    SymbolValue::Text(v.to_string())
                }
            }
        )*
    };
}

wide_integer_symbol!(u64, usize, isize, i128, u128);

impl<T: Into<SymbolValue>> From<Option<T>> for SymbolValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SymbolValue::Default, Into::into)
    }
}
