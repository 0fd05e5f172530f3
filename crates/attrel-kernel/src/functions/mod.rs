//! Function registry for attrel.
//!
//! Every `name(args)` in an expression resolves to a [`FunctionDef`]: an
//! entry keyed by name, receiver kind and arity. Overloads of one name are
//! separate entries, so `divide(x)` and `divide(x, scale)` are distinct.
//!
//! # Resolution
//!
//! ```text
//! candidates = entries with (name, arity, has-receiver)
//! 1. exact receiver kind
//! 2. receiver declared Any
//! 3. first entry, in registration order, whose receiver the value coerces to
//! ```
//!
//! Registration order therefore matters: integer and float entries come
//! before decimal ones, so a string attribute `"5"` calling `plus` is
//! read as an integer.

mod convert;
mod date;
mod decimal;
mod number;

use std::fmt;
use std::sync::LazyLock;

use attrel_types::{DateTime, Decimal, Kind, RoundingMode, Value, Zone};

use crate::config::EngineConfig;
use crate::interpreter::EvalError;

/// Declared kind of a receiver or argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Passed through unchanged.
    Any,
    /// Coerced to this kind.
    Kind(Kind),
    /// Integer if the value reads as one, float otherwise.
    Number,
    /// Rounding mode name. Unknown names are the function's business.
    Mode,
    /// Zone id. Unknown ids fall back to the stored or default zone.
    Zone,
}

impl Param {
    /// Whether a value of `kind` may be accepted, judged without its content.
    pub fn may_accept(self, kind: Kind) -> bool {
        match self {
            Param::Any | Param::Mode | Param::Zone => true,
            Param::Kind(target) => kind.may_coerce_to(target),
            Param::Number => kind != Kind::Bool,
        }
    }

    /// Convert `value` to what this parameter declares.
    pub fn coerce(self, value: &Value, default_zone: Zone) -> Option<Value> {
        match self {
            Param::Any => Some(value.clone()),
            Param::Kind(kind) => value.coerce(kind, default_zone),
            Param::Mode | Param::Zone => value.coerce(Kind::Str, default_zone),
            Param::Number => match value {
                Value::Int64(_) | Value::Float64(_) => Some(value.clone()),
                Value::Decimal(_) => value.coerce(Kind::Float64, default_zone),
                Value::DateTime(_) => value.coerce(Kind::Int64, default_zone),
                Value::Str(_) => value
                    .coerce(Kind::Int64, default_zone)
                    .or_else(|| value.coerce(Kind::Float64, default_zone)),
                Value::Bool(_) => None,
            },
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Any => f.write_str("any"),
            Param::Kind(kind) => write!(f, "{kind}"),
            Param::Number => f.write_str("number"),
            Param::Mode => f.write_str("rounding mode"),
            Param::Zone => f.write_str("zone id"),
        }
    }
}

/// Implementation of one registry entry.
pub type FunctionImpl = fn(&Invocation<'_>) -> Result<Value, EvalError>;

/// One overload of a function.
#[derive(Debug, Clone, Copy)]
pub struct FunctionDef {
    pub name: &'static str,
    /// `None` for standalone functions such as `now()`.
    pub receiver: Option<Param>,
    pub params: &'static [Param],
    /// Result kind, when it does not depend on the operands.
    pub returns: Option<Kind>,
    /// One-line description for help output.
    pub summary: &'static str,
    pub func: FunctionImpl,
}

impl FunctionDef {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// `name(p1, p2)` with the declared parameter kinds.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        match self.receiver {
            Some(receiver) => format!("{receiver}:{}({params})", self.name),
            None => format!("{}({params})", self.name),
        }
    }
}

/// A resolved call with its receiver and arguments already coerced.
pub struct Invocation<'a> {
    pub def: &'a FunctionDef,
    pub receiver: Option<Value>,
    pub args: Vec<Value>,
    pub config: &'a EngineConfig,
}

impl<'a> Invocation<'a> {
    fn subject(&self) -> Result<&Value, EvalError> {
        self.receiver
            .as_ref()
            .ok_or_else(|| EvalError::MissingSubject(self.def.name.to_string()))
    }

    pub fn arg(&self, index: usize) -> Result<&Value, EvalError> {
        self.args.get(index).ok_or(EvalError::WrongArity {
            name: self.def.name.to_string(),
            arity: index,
        })
    }

    /// Receiver as whatever it is.
    pub fn value(&self) -> Result<&Value, EvalError> {
        self.subject()
    }

    pub fn decimal_receiver(&self) -> Result<&Decimal, EvalError> {
        as_decimal(self.subject()?)
    }

    pub fn date_receiver(&self) -> Result<DateTime, EvalError> {
        match self.subject()? {
            Value::DateTime(dt) => Ok(*dt),
            other => Err(EvalError::type_error("date", other)),
        }
    }

    pub fn str_receiver(&self) -> Result<&str, EvalError> {
        as_str(self.subject()?)
    }

    pub fn decimal(&self, index: usize) -> Result<&Decimal, EvalError> {
        as_decimal(self.arg(index)?)
    }

    pub fn int(&self, index: usize) -> Result<i64, EvalError> {
        match self.arg(index)? {
            Value::Int64(n) => Ok(*n),
            other => Err(EvalError::type_error("integer", other)),
        }
    }

    pub fn str(&self, index: usize) -> Result<&str, EvalError> {
        as_str(self.arg(index)?)
    }

    pub fn date(&self, index: usize) -> Result<DateTime, EvalError> {
        match self.arg(index)? {
            Value::DateTime(dt) => Ok(*dt),
            other => Err(EvalError::type_error("date", other)),
        }
    }

    /// A scale argument: non-negative and within `u32`.
    pub fn scale(&self, index: usize) -> Result<u32, EvalError> {
        let scale = self.int(index)?;
        u32::try_from(scale).map_err(|_| EvalError::InvalidArgument(format!("invalid scale {scale}")))
    }

    /// Rounding mode named by argument `index`, or `None` if unknown.
    pub fn mode(&self, index: usize) -> Result<Option<RoundingMode>, EvalError> {
        let name = self.str(index)?;
        let mode = RoundingMode::from_name(name);
        if mode.is_none() {
            tracing::debug!(mode = name, function = self.def.name, "unknown rounding mode");
        }
        Ok(mode)
    }

    /// Zone named by argument `index`, if present. An id that names no
    /// zone resolves to GMT.
    pub fn zone_arg(&self, index: usize) -> Option<Zone> {
        let id = match self.args.get(index)? {
            Value::Str(id) => id,
            _ => return None,
        };
        Some(Zone::parse(id).unwrap_or_else(|| {
            tracing::debug!(zone = %id, function = self.def.name, "unknown zone id, using GMT");
            Zone::utc()
        }))
    }

    /// Zone for a calendar read of `date`: the argument at `index`, then the
    /// zone stored on the value, then the configured default.
    pub fn zone_for(&self, date: &DateTime, index: usize) -> Zone {
        self.zone_arg(index)
            .unwrap_or_else(|| date.zone_or(self.config.default_zone))
    }
}

fn as_decimal(value: &Value) -> Result<&Decimal, EvalError> {
    match value {
        Value::Decimal(d) => Ok(d),
        other => Err(EvalError::type_error("decimal", other)),
    }
}

fn as_str(value: &Value) -> Result<&str, EvalError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(EvalError::type_error("string", other)),
    }
}

/// Why a call could not be matched to an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// No entry has this name.
    UnknownFunction,
    /// The name exists, but not with this arity.
    WrongArity,
    /// Receiver-taking function used without a subject.
    MissingSubject,
    /// Standalone function chained after a subject.
    UnexpectedSubject,
    /// No overload accepts a receiver of this kind.
    NoMatch(Kind),
}

/// Table of every callable function.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: Vec<FunctionDef>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in function.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    pub fn register(&mut self, def: FunctionDef) {
        self.functions.push(def);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f.name == name)
    }

    /// All entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionDef> {
        self.functions.iter()
    }

    /// Entries named `name` taking `arity` arguments, with or without a receiver.
    pub fn candidates<'r, 'n>(
        &'r self,
        name: &'n str,
        arity: usize,
        chained: bool,
    ) -> impl Iterator<Item = &'r FunctionDef> + use<'r, 'n> {
        self.functions
            .iter()
            .filter(move |f| f.name == name && f.arity() == arity && f.receiver.is_some() == chained)
    }

    /// Whether any entry fits `name` with `arity` arguments, chained after a
    /// subject or standalone, regardless of receiver kind.
    pub fn check_shape(&self, name: &str, arity: usize, chained: bool) -> Result<(), Unresolved> {
        if self.candidates(name, arity, chained).next().is_some() {
            return Ok(());
        }
        if !self.contains(name) {
            return Err(Unresolved::UnknownFunction);
        }
        if self.candidates(name, arity, !chained).next().is_some() {
            return Err(if chained {
                Unresolved::UnexpectedSubject
            } else {
                Unresolved::MissingSubject
            });
        }
        Err(Unresolved::WrongArity)
    }

    /// Standalone function `name` with `arity` arguments.
    pub fn resolve_standalone(&self, name: &str, arity: usize) -> Result<&FunctionDef, Unresolved> {
        self.check_shape(name, arity, false)?;
        self.candidates(name, arity, false)
            .next()
            .ok_or(Unresolved::WrongArity)
    }

    /// Best entry for a receiver whose kind is known before evaluation.
    ///
    /// Content-dependent choices (a string that may read as an integer or a
    /// float) pick the first entry that could accept the kind.
    pub fn resolve_kind(
        &self,
        name: &str,
        receiver: Kind,
        arity: usize,
    ) -> Result<&FunctionDef, Unresolved> {
        self.check_shape(name, arity, true)?;
        self.find_exact(name, receiver, arity)
            .or_else(|| {
                self.candidates(name, arity, true)
                    .find(|f| f.receiver.is_some_and(|p| p.may_accept(receiver)))
            })
            .ok_or(Unresolved::NoMatch(receiver))
    }

    /// Entry for a receiver value, along with the receiver coerced to the
    /// entry's declared kind.
    pub fn resolve_value(
        &self,
        name: &str,
        receiver: &Value,
        arity: usize,
        default_zone: Zone,
    ) -> Result<(&FunctionDef, Value), Unresolved> {
        self.check_shape(name, arity, true)?;
        if let Some(def) = self.find_exact(name, receiver.kind(), arity) {
            return Ok((def, receiver.clone()));
        }
        self.candidates(name, arity, true)
            .find_map(|def| {
                def.receiver
                    .and_then(|p| p.coerce(receiver, default_zone))
                    .map(|coerced| (def, coerced))
            })
            .ok_or(Unresolved::NoMatch(receiver.kind()))
    }

    /// Exact receiver kind first, then an entry declared `Any`.
    fn find_exact(&self, name: &str, kind: Kind, arity: usize) -> Option<&FunctionDef> {
        self.candidates(name, arity, true)
            .find(|f| f.receiver == Some(Param::Kind(kind)))
            .or_else(|| {
                self.candidates(name, arity, true)
                    .find(|f| f.receiver == Some(Param::Any))
            })
    }
}

/// Register every built-in function. Order is significant, see the
/// module docs.
pub fn register_builtins(registry: &mut FunctionRegistry) {
    number::register(registry);
    decimal::register(registry);
    date::register(registry);
    convert::register(registry);
}

static REGISTRY: LazyLock<FunctionRegistry> = LazyLock::new(FunctionRegistry::with_builtins);

/// The process-wide registry of built-in functions.
pub fn registry() -> &'static FunctionRegistry {
    &REGISTRY
}
