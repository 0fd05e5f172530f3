//! Integer and float arithmetic.
//!
//! Integer arithmetic wraps on overflow. Any float operand makes the result
//! a float. Division or modulo by zero fails the block.

use std::cmp::Ordering;

use attrel_types::{Kind, Value};

use super::{FunctionDef, FunctionRegistry, Invocation, Param};
use crate::interpreter::EvalError;

const NUMBER: &[Param] = &[Param::Number];

pub(super) fn register(registry: &mut FunctionRegistry) {
    for receiver in [Kind::Int64, Kind::Float64] {
        let receiver = Some(Param::Kind(receiver));
        let arithmetic: [(&'static str, &'static str, super::FunctionImpl); 5] = [
            ("plus", "Add a number", plus),
            ("minus", "Subtract a number", minus),
            ("multiply", "Multiply by a number", multiply),
            ("divide", "Divide by a number; integer division truncates", divide),
            ("mod", "Remainder after division", modulo),
        ];
        for (name, summary, func) in arithmetic {
            registry.register(FunctionDef {
                name,
                receiver,
                params: NUMBER,
                returns: None,
                summary,
                func,
            });
        }

        let comparisons: [(&'static str, &'static str, super::FunctionImpl); 5] = [
            ("gt", "Greater than", gt),
            ("ge", "Greater than or equal", ge),
            ("lt", "Less than", lt),
            ("le", "Less than or equal", le),
            ("equals", "Numerically equal", equals),
        ];
        for (name, summary, func) in comparisons {
            registry.register(FunctionDef {
                name,
                receiver,
                params: NUMBER,
                returns: Some(Kind::Bool),
                summary,
                func,
            });
        }
    }
}

/// Operands as a pair of integers, or else a pair of floats.
enum Operands {
    Int(i64, i64),
    Float(f64, f64),
}

fn operands(inv: &Invocation<'_>) -> Result<Operands, EvalError> {
    let lhs = inv.value()?;
    let rhs = inv.arg(0)?;
    match (lhs, rhs) {
        (Value::Int64(a), Value::Int64(b)) => Ok(Operands::Int(*a, *b)),
        _ => Ok(Operands::Float(as_f64(lhs)?, as_f64(rhs)?)),
    }
}

fn as_f64(value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Int64(n) => Ok(*n as f64),
        Value::Float64(x) => Ok(*x),
        other => Err(EvalError::type_error("number", other)),
    }
}

fn plus(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(match operands(inv)? {
        Operands::Int(a, b) => Value::Int64(a.wrapping_add(b)),
        Operands::Float(a, b) => Value::Float64(a + b),
    })
}

fn minus(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(match operands(inv)? {
        Operands::Int(a, b) => Value::Int64(a.wrapping_sub(b)),
        Operands::Float(a, b) => Value::Float64(a - b),
    })
}

fn multiply(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(match operands(inv)? {
        Operands::Int(a, b) => Value::Int64(a.wrapping_mul(b)),
        Operands::Float(a, b) => Value::Float64(a * b),
    })
}

fn divide(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    match operands(inv)? {
        Operands::Int(_, 0) => Err(EvalError::DivisionByZero),
        Operands::Int(a, b) => Ok(Value::Int64(a.wrapping_div(b))),
        Operands::Float(_, b) if b == 0.0 => Err(EvalError::DivisionByZero),
        Operands::Float(a, b) => Ok(Value::Float64(a / b)),
    }
}

fn modulo(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    match operands(inv)? {
        Operands::Int(_, 0) => Err(EvalError::DivisionByZero),
        Operands::Int(a, b) => Ok(Value::Int64(a.wrapping_rem(b))),
        Operands::Float(_, b) if b == 0.0 => Err(EvalError::DivisionByZero),
        Operands::Float(a, b) => Ok(Value::Float64(a % b)),
    }
}

/// `None` when either side is NaN.
fn compare(inv: &Invocation<'_>) -> Result<Option<Ordering>, EvalError> {
    Ok(match operands(inv)? {
        Operands::Int(a, b) => Some(a.cmp(&b)),
        Operands::Float(a, b) => a.partial_cmp(&b),
    })
}

fn gt(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(compare(inv)?.is_some_and(Ordering::is_gt)))
}

fn ge(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(compare(inv)?.is_some_and(Ordering::is_ge)))
}

fn lt(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(compare(inv)?.is_some_and(Ordering::is_lt)))
}

fn le(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(compare(inv)?.is_some_and(Ordering::is_le)))
}

fn equals(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(compare(inv)?.is_some_and(Ordering::is_eq)))
}
