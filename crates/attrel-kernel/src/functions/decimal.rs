//! Arbitrary-precision decimal functions.
//!
//! Operands coerce to [`Decimal`]: strings parse exactly, integer literals
//! are exact, and float literals go through their shortest `f64` rendering
//! first, so `equals(3.14159265358979358)` compares against
//! `3.141592653589793`.

use std::cmp::Ordering;

use attrel_types::{Decimal, Kind, RoundingMode, Value, format_f32};

use super::{FunctionDef, FunctionRegistry, FunctionImpl, Invocation, Param};
use crate::interpreter::EvalError;

const DECIMAL: Param = Param::Kind(Kind::Decimal);
const INT: Param = Param::Kind(Kind::Int64);

fn def(
    name: &'static str,
    params: &'static [Param],
    returns: Kind,
    summary: &'static str,
    func: FunctionImpl,
) -> FunctionDef {
    FunctionDef {
        name,
        receiver: Some(DECIMAL),
        params,
        returns: Some(returns),
        summary,
        func,
    }
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(FunctionDef {
        name: "toBigDecimal",
        receiver: Some(Param::Any),
        params: &[],
        returns: Some(Kind::Decimal),
        summary: "Parse the subject as an exact decimal",
        func: to_big_decimal,
    });

    let defs = [
        def("plus", &[DECIMAL], Kind::Decimal, "Exact sum", plus),
        def("minus", &[DECIMAL], Kind::Decimal, "Exact difference", minus),
        def("multiply", &[DECIMAL], Kind::Decimal, "Exact product", multiply),
        def(
            "divide",
            &[DECIMAL],
            Kind::Decimal,
            "Quotient at the subject's scale, rounded HALF_UP",
            divide,
        ),
        def(
            "divide",
            &[DECIMAL, INT],
            Kind::Decimal,
            "Quotient at a fixed scale, rounded HALF_UP",
            divide_scaled,
        ),
        def(
            "divide",
            &[DECIMAL, INT, Param::Mode],
            Kind::Decimal,
            "Quotient at a fixed scale with a rounding mode",
            divide_rounded,
        ),
        def(
            "setScale",
            &[INT],
            Kind::Decimal,
            "Change the scale; fails if digits would be lost",
            set_scale,
        ),
        def(
            "setScale",
            &[INT, Param::Mode],
            Kind::Decimal,
            "Change the scale with a rounding mode",
            set_scale_rounded,
        ),
        def("negate", &[], Kind::Decimal, "Flip the sign", negate),
        def("abs", &[], Kind::Decimal, "Absolute value", abs),
        def("pow", &[INT], Kind::Decimal, "Raise to an integer power", pow),
        def("powOfTen", &[INT], Kind::Decimal, "Multiply by 10^n", move_right),
        def("moveRight", &[INT], Kind::Decimal, "Move the decimal point right", move_right),
        def("moveLeft", &[INT], Kind::Decimal, "Move the decimal point left", move_left),
        def("toPercent", &[], Kind::Str, "Render times 100 with a % suffix", to_percent),
        def("min", &[DECIMAL], Kind::Decimal, "Smaller of the two", min),
        def("max", &[DECIMAL], Kind::Decimal, "Larger of the two", max),
        def("compareTo", &[DECIMAL], Kind::Int64, "-1, 0 or 1", compare_to),
        def("equals", &[DECIMAL], Kind::Bool, "Same value and same scale", equals),
        def("lt", &[DECIMAL], Kind::Bool, "Less than", lt),
        def("le", &[DECIMAL], Kind::Bool, "Less than or equal", le),
        def("gt", &[DECIMAL], Kind::Bool, "Greater than", gt),
        def("ge", &[DECIMAL], Kind::Bool, "Greater than or equal", ge),
        def("floatValue", &[], Kind::Str, "Nearest 32-bit float", float_value),
        def("doubleValue", &[], Kind::Float64, "Nearest 64-bit float", double_value),
        def("intValue", &[], Kind::Int64, "Truncated, wrapped to 32 bits", int_value),
        def("longValue", &[], Kind::Int64, "Truncated, wrapped to 64 bits", long_value),
        def("shortValue", &[], Kind::Int64, "Truncated, wrapped to 16 bits", short_value),
    ];
    for def in defs {
        registry.register(def);
    }
}

fn to_big_decimal(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    match inv.value()? {
        Value::Str(text) => Ok(Value::Decimal(Decimal::parse(text)?)),
        Value::Float64(x) => Ok(Value::Decimal(Decimal::from_f64(*x)?)),
        other => other
            .coerce(Kind::Decimal, inv.config.default_zone)
            .ok_or_else(|| EvalError::type_error("decimal", other)),
    }
}

fn plus(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(inv.decimal_receiver()?.add(inv.decimal(0)?).into())
}

fn minus(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(inv.decimal_receiver()?.sub(inv.decimal(0)?).into())
}

fn multiply(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(inv.decimal_receiver()?.mul(inv.decimal(0)?)?.into())
}

fn divide(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let dividend = inv.decimal_receiver()?;
    let quotient = dividend.divide(inv.decimal(0)?, dividend.scale(), RoundingMode::HalfUp)?;
    Ok(quotient.into())
}

fn divide_scaled(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let quotient = inv
        .decimal_receiver()?
        .divide(inv.decimal(0)?, inv.scale(1)?, RoundingMode::HalfUp)?;
    Ok(quotient.into())
}

fn divide_rounded(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let mode = inv.mode(2)?.unwrap_or(RoundingMode::HalfUp);
    let quotient = inv
        .decimal_receiver()?
        .divide(inv.decimal(0)?, inv.scale(1)?, mode)?;
    Ok(quotient.into())
}

fn set_scale(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let scaled = inv
        .decimal_receiver()?
        .with_scale(inv.scale(0)?, RoundingMode::Unnecessary)?;
    Ok(scaled.into())
}

fn set_scale_rounded(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    // an unknown mode name behaves like setScale(scale)
    let mode = inv.mode(1)?.unwrap_or(RoundingMode::Unnecessary);
    Ok(inv.decimal_receiver()?.with_scale(inv.scale(0)?, mode)?.into())
}

fn negate(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(inv.decimal_receiver()?.negate().into())
}

fn abs(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(inv.decimal_receiver()?.abs().into())
}

fn pow(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(inv.decimal_receiver()?.pow(inv.int(0)?)?.into())
}

fn move_right(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(inv.decimal_receiver()?.move_point_right(inv.int(0)?)?.into())
}

fn move_left(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(inv.decimal_receiver()?.move_point_left(inv.int(0)?)?.into())
}

fn to_percent(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let percent = inv.decimal_receiver()?.move_point_right(2)?;
    Ok(Value::Str(format!("{percent}%")))
}

fn ordering(inv: &Invocation<'_>) -> Result<Ordering, EvalError> {
    Ok(inv.decimal_receiver()?.cmp_value(inv.decimal(0)?))
}

fn min(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let (lhs, rhs) = (inv.decimal_receiver()?, inv.decimal(0)?);
    let smaller = if lhs.cmp_value(rhs).is_le() { lhs } else { rhs };
    Ok(smaller.clone().into())
}

fn max(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let (lhs, rhs) = (inv.decimal_receiver()?, inv.decimal(0)?);
    let larger = if lhs.cmp_value(rhs).is_ge() { lhs } else { rhs };
    Ok(larger.clone().into())
}

fn compare_to(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Int64(ordering(inv)? as i64))
}

fn equals(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(inv.decimal_receiver()? == inv.decimal(0)?))
}

fn lt(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(ordering(inv)?.is_lt()))
}

fn le(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(ordering(inv)?.is_le()))
}

fn gt(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(ordering(inv)?.is_gt()))
}

fn ge(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(ordering(inv)?.is_ge()))
}

/// There is no 32-bit float value, so the result is its rendering.
fn float_value(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Str(format_f32(inv.decimal_receiver()?.to_f32())))
}

fn double_value(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Float64(inv.decimal_receiver()?.to_f64()))
}

fn int_value(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let wide = inv.decimal_receiver()?.to_i64_wrapping();
    Ok(Value::Int64(i64::from(wide as i32)))
}

fn long_value(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Int64(inv.decimal_receiver()?.to_i64_wrapping()))
}

fn short_value(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let wide = inv.decimal_receiver()?.to_i64_wrapping();
    Ok(Value::Int64(i64::from(wide as i16)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use attrel_types::DecimalError;

    fn dec(text: &str) -> Value {
        Value::Decimal(Decimal::parse(text).expect("decimal"))
    }

    fn call(name: &str, receiver: Value, args: Vec<Value>) -> Result<Value, EvalError> {
        let config = EngineConfig::default();
        let registry = super::super::registry();
        let def = registry
            .resolve_kind(name, receiver.kind(), args.len())
            .expect("resolves");
        let args = def
            .params
            .iter()
            .zip(&args)
            .map(|(p, a)| p.coerce(a, config.default_zone).expect("coerces"))
            .collect();
        (def.func)(&Invocation {
            def,
            receiver: Some(receiver),
            args,
            config: &config,
        })
    }

    #[test]
    fn scales_propagate() {
        assert_eq!(call("plus", dec("1.5"), vec![dec("0.25")]), Ok(dec("1.75")));
        assert_eq!(call("multiply", dec("1.5"), vec![dec("0.25")]), Ok(dec("0.375")));
        assert_eq!(call("minus", dec("1.50"), vec![Value::Int64(1)]), Ok(dec("0.50")));
    }

    #[test]
    fn divide_keeps_receiver_scale() {
        assert_eq!(call("divide", dec("3.14"), vec![Value::Float64(2.0)]), Ok(dec("1.57")));
        assert_eq!(
            call("divide", dec("3.14"), vec![Value::Float64(2.0), Value::Int64(1)]),
            Ok(dec("1.6"))
        );
    }

    #[test]
    fn unknown_modes_fall_back() {
        assert_eq!(
            call("divide", dec("1"), vec![dec("3"), Value::Int64(2), Value::str("sideways")]),
            Ok(dec("0.33"))
        );
        assert_eq!(
            call("setScale", dec("1.25"), vec![Value::Int64(1), Value::str("sideways")]),
            Err(EvalError::Decimal(DecimalError::RoundingNecessary))
        );
        assert_eq!(
            call("setScale", dec("1.25"), vec![Value::Int64(1), Value::str("half_even")]),
            Ok(dec("1.2"))
        );
    }

    #[test]
    fn equality_is_scale_sensitive() {
        assert_eq!(call("equals", dec("2.0"), vec![dec("2.00")]), Ok(Value::Bool(false)));
        assert_eq!(call("compareTo", dec("2.0"), vec![dec("2.00")]), Ok(Value::Int64(0)));
    }

    #[test]
    fn ties_return_receiver() {
        assert_eq!(call("min", dec("2.0"), vec![dec("2.00")]), Ok(dec("2.0")));
        assert_eq!(call("max", dec("2.0"), vec![dec("2.00")]), Ok(dec("2.0")));
    }

    #[test]
    fn percent_drops_two_digits_of_scale() {
        assert_eq!(call("toPercent", dec("0.31416"), vec![]), Ok(Value::str("31.416%")));
        assert_eq!(call("toPercent", dec("0.5"), vec![]), Ok(Value::str("50%")));
    }

    #[test]
    fn narrowing_wraps() {
        assert_eq!(call("intValue", dec("2147483648.9"), vec![]), Ok(Value::Int64(-2147483648)));
        assert_eq!(call("shortValue", dec("-32769"), vec![]), Ok(Value::Int64(32767)));
        assert_eq!(call("longValue", dec("-3.99"), vec![]), Ok(Value::Int64(-3)));
    }

    #[test]
    fn float_value_renders_single_precision() {
        assert_eq!(
            call("floatValue", dec("0.3141592653589793"), vec![]),
            Ok(Value::str("0.31415927"))
        );
    }

    #[test]
    fn negative_scale_argument_fails() {
        assert!(matches!(
            call("setScale", dec("1"), vec![Value::Int64(-1)]),
            Err(EvalError::InvalidArgument(_))
        ));
    }
}
