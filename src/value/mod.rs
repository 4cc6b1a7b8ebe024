// Dynamically-typed value model.
//
// `Value` is the closed set of kinds the codec understands:
//
// - `Nil`, `Boolean`, `Integer`, `Real` — scalars
// - `String`   — raw byte string, no encoding assumed
// - `Table`    — hybrid array/map aggregate (see `table`)
// - `Code`     — opaque executable chunk routed through `CodeHooks`
// - `Userdata` — host handle that exists in a value graph but can never be
//                written to the wire

pub mod code;
pub mod table;

use std::fmt;

pub use code::{Code, CodeHooks, HookError, OpaqueCode};
pub use table::{Table, TableError};

/// A host value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    Table(Table),
    Code(Code),
    Userdata(Userdata),
}

/// Opaque host handle. Only its identity travels inside the value model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Userdata(pub u64);

impl Value {
    /// Host-facing type name, as reported in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Real(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
            Value::Code(_) => "function",
            Value::Userdata(_) => "userdata",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Integer view. Reals with an exact integer value convert too.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::Integer(i) => Some(i),
            Value::Real(f) => exact_integer(f),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match *self {
            Value::Integer(i) => Some(i as f64),
            Value::Real(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// String view when the bytes are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|s| std::str::from_utf8(s).ok())
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_code(&self) -> Option<&Code> {
        match self {
            Value::Code(c) => Some(c),
            _ => None,
        }
    }
}

/// Returns `f` as an `i64` when it has no fractional part and fits.
pub fn exact_integer(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or above it does not fit.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r:?}"),
            Value::String(s) => f.write_str(&String::from_utf8_lossy(s)),
            Value::Table(t) => write!(f, "table(array={}, map={})", t.len(), t.map_len()),
            Value::Code(c) => write!(f, "function({} bytes)", c.len()),
            Value::Userdata(u) => write!(f, "userdata({:#x})", u.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into_bytes())
    }
}

impl From<&[u8]> for Value {
    fn from(s: &[u8]) -> Self {
        Value::String(s.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(s: Vec<u8>) -> Self {
        Value::String(s)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<Code> for Value {
    fn from(c: Code) -> Self {
        Value::Code(c)
    }
}

impl From<Userdata> for Value {
    fn from(u: Userdata) -> Self {
        Value::Userdata(u)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
