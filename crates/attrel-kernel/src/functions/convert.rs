//! Conversions between value kinds, plus the standalone functions.

use attrel_types::{DateTime, Kind, Value};

use super::{FunctionDef, FunctionRegistry, Invocation, Param};
use crate::interpreter::EvalError;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(FunctionDef {
        name: "literal",
        receiver: None,
        params: &[Param::Any],
        returns: None,
        summary: "The argument itself, as a chain subject",
        func: literal,
    });
    registry.register(FunctionDef {
        name: "now",
        receiver: None,
        params: &[],
        returns: Some(Kind::DateTime),
        summary: "The current instant",
        func: now,
    });
    registry.register(FunctionDef {
        name: "toString",
        receiver: Some(Param::Any),
        params: &[],
        returns: Some(Kind::Str),
        summary: "Canonical text of the subject",
        func: to_string,
    });

    // receivers tried in this order when the subject is a string
    for receiver in [Kind::Int64, Kind::Decimal, Kind::Float64] {
        registry.register(FunctionDef {
            name: "toNumber",
            receiver: Some(Param::Kind(receiver)),
            params: &[],
            returns: Some(Kind::Int64),
            summary: "Whole number, truncated toward zero",
            func: to_number,
        });
    }

    registry.register(FunctionDef {
        name: "toDecimal",
        receiver: Some(Param::Kind(Kind::Float64)),
        params: &[],
        returns: Some(Kind::Float64),
        summary: "Floating-point number",
        func: identity,
    });
    registry.register(FunctionDef {
        name: "equals",
        receiver: Some(Param::Any),
        params: &[Param::Any],
        returns: Some(Kind::Bool),
        summary: "Same canonical text",
        func: equals,
    });
}

fn literal(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    inv.arg(0).cloned()
}

fn now(_inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::DateTime(DateTime::new(chrono::Utc::now().timestamp_millis())))
}

fn to_string(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Str(inv.value()?.render(inv.config.default_zone)))
}

fn to_number(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    match inv.value()? {
        Value::Int64(n) => Ok(Value::Int64(*n)),
        Value::Decimal(d) => Ok(Value::Int64(d.to_i64_wrapping())),
        // saturating, NaN becomes 0
        Value::Float64(x) => Ok(Value::Int64(x.trunc() as i64)),
        other => Err(EvalError::type_error("number", other)),
    }
}

fn identity(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    inv.value().cloned()
}

fn equals(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let zone = inv.config.default_zone;
    Ok(Value::Bool(inv.value()?.render(zone) == inv.arg(0)?.render(zone)))
}
