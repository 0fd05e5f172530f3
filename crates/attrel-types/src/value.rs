//! Runtime values of the expression language.

use std::fmt;

use crate::datetime::{DateTime, Zone};
use crate::decimal::Decimal;
use crate::number::format_f64;

/// A value produced while evaluating an expression.
///
/// Every value has a canonical string projection ([`Value::render`]); the
/// result of a top-level block is always that projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Decimal(Decimal),
    DateTime(DateTime),
}

/// The variant of a [`Value`], used for dispatch and coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Str,
    Bool,
    Int64,
    Float64,
    Decimal,
    DateTime,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Str => "string",
            Kind::Bool => "boolean",
            Kind::Int64 => "integer",
            Kind::Float64 => "float",
            Kind::Decimal => "decimal",
            Kind::DateTime => "date",
        }
    }

    /// Whether every value of kind `self` can be coerced to `target`
    /// regardless of content.
    ///
    /// Strings are only *possibly* convertible (their text decides), so
    /// `Str` is reported as convertible to the parseable kinds.
    pub fn may_coerce_to(self, target: Kind) -> bool {
        use Kind::*;
        match (self, target) {
            (a, b) if a == b => true,
            (_, Str) => true,
            (Str, Decimal | Int64 | Float64 | Bool) => true,
            (Int64, Decimal | Float64 | DateTime) => true,
            (Float64, Decimal) => true,
            (Decimal, Int64 | Float64) => true,
            (DateTime, Int64) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Str(_) => Kind::Str,
            Value::Bool(_) => Kind::Bool,
            Value::Int64(_) => Kind::Int64,
            Value::Float64(_) => Kind::Float64,
            Value::Decimal(_) => Kind::Decimal,
            Value::DateTime(_) => Kind::DateTime,
        }
    }

    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    /// Convert to `kind`, or `None` when this value has no such reading.
    ///
    /// `default_zone` is used only when a zone-less date renders as text.
    pub fn coerce(&self, kind: Kind, default_zone: Zone) -> Option<Value> {
        if self.kind() == kind {
            return Some(self.clone());
        }
        if kind == Kind::Str {
            return Some(Value::Str(self.render(default_zone)));
        }
        match (self, kind) {
            (Value::Str(s), Kind::Decimal) => Decimal::parse(s.trim()).ok().map(Value::Decimal),
            (Value::Str(s), Kind::Int64) => s.trim().parse().ok().map(Value::Int64),
            (Value::Str(s), Kind::Float64) => s.trim().parse().ok().map(Value::Float64),
            (Value::Str(s), Kind::Bool) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if s.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            (Value::Int64(n), Kind::Decimal) => Some(Value::Decimal(Decimal::from_i64(*n))),
            (Value::Int64(n), Kind::Float64) => Some(Value::Float64(*n as f64)),
            (Value::Int64(n), Kind::DateTime) => Some(Value::DateTime(DateTime::new(*n))),
            (Value::Float64(x), Kind::Decimal) => Decimal::from_f64(*x).ok().map(Value::Decimal),
            (Value::Decimal(d), Kind::Int64) => Some(Value::Int64(d.to_i64_wrapping())),
            (Value::Decimal(d), Kind::Float64) => Some(Value::Float64(d.to_f64())),
            (Value::DateTime(dt), Kind::Int64) => Some(Value::Int64(dt.millis())),
            _ => None,
        }
    }

    /// Canonical string projection.
    pub fn render(&self, default_zone: Zone) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int64(n) => n.to_string(),
            Value::Float64(x) => format_f64(*x),
            Value::Decimal(d) => d.to_string(),
            Value::DateTime(dt) => dt.render(default_zone),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}
