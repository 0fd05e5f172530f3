//! Expression evaluation for attrel.
//!
//! The evaluator walks an expression bottom-up: a call's receiver is
//! evaluated once, then its arguments left to right, then the registry
//! picks the overload and the receiver and arguments are coerced to the
//! kinds it declares.

use attrel_types::{DateError, DecimalError, Kind, Value};

use crate::ast::{Expr, Template, TemplatePart};
use crate::config::EngineConfig;
use crate::functions::{self, FunctionDef, FunctionRegistry, Invocation, Unresolved};

use super::context::Context;

/// Errors that can occur while evaluating a block.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unknown function {name}")]
    UnknownFunction { name: String },
    #[error("{name} does not take {arity} argument(s)")]
    WrongArity { name: String, arity: usize },
    #[error("{0} needs a subject")]
    MissingSubject(String),
    #[error("{0} does not take a subject")]
    UnexpectedSubject(String),
    #[error("{name} cannot be applied to a {kind} value")]
    NoMatch { name: String, kind: Kind },
    #[error("{function}: cannot convert {value:?} to {expected}")]
    Coercion {
        function: String,
        expected: String,
        value: String,
    },
    #[error("type error: expected {expected}, got {got}")]
    TypeError { expected: &'static str, got: Kind },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error(transparent)]
    Decimal(#[from] DecimalError),
    #[error(transparent)]
    Date(#[from] DateError),
}

impl EvalError {
    pub fn type_error(expected: &'static str, got: &Value) -> Self {
        EvalError::TypeError {
            expected,
            got: got.kind(),
        }
    }

    pub(crate) fn unresolved(name: &str, arity: usize, reason: Unresolved) -> Self {
        let name = name.to_string();
        match reason {
            Unresolved::UnknownFunction => EvalError::UnknownFunction { name },
            Unresolved::WrongArity => EvalError::WrongArity { name, arity },
            Unresolved::MissingSubject => EvalError::MissingSubject(name),
            Unresolved::UnexpectedSubject => EvalError::UnexpectedSubject(name),
            Unresolved::NoMatch(kind) => EvalError::NoMatch { name, kind },
        }
    }
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Expression evaluator.
///
/// Holds everything one evaluation reads; it never mutates any of it.
pub struct Evaluator<'a> {
    ctx: Context<'a>,
    config: &'a EngineConfig,
    registry: &'a FunctionRegistry,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over the built-in functions.
    pub fn new(ctx: &Context<'a>, config: &'a EngineConfig) -> Self {
        Self {
            ctx: *ctx,
            config,
            registry: functions::registry(),
        }
    }

    /// Use a different function table.
    pub fn with_registry(mut self, registry: &'a FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Render a template. A block that fails renders as `""`.
    pub fn render(&self, template: &Template) -> String {
        let mut out = String::new();
        for part in &template.parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Block { expr, span } => match self.eval(expr) {
                    Ok(value) => out.push_str(&value.render(self.config.default_zone)),
                    Err(error) => {
                        tracing::debug!(%error, ?span, "block evaluated to empty string");
                    }
                },
            }
        }
        out
    }

    /// Evaluate an expression to a value.
    pub fn eval(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::AttributeRef(name) => Ok(self.eval_attribute(name)),
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Embedded(inner) => self.eval(inner),
            Expr::Template(template) => Ok(Value::Str(self.render(template))),
            Expr::Call {
                receiver,
                name,
                args,
                ..
            } => self.eval_call(receiver, name, args),
            Expr::Function { name, args, .. } => self.eval_function(name, args),
        }
    }

    /// Missing attributes read as the empty string.
    fn eval_attribute(&self, name: &str) -> Value {
        Value::Str(self.ctx.lookup(name).unwrap_or_default())
    }

    fn eval_call(&self, receiver: &Expr, name: &str, args: &[Expr]) -> EvalResult<Value> {
        let subject = self.eval(receiver)?;
        let args = self.eval_args(args)?;
        let (def, subject) = self
            .registry
            .resolve_value(name, &subject, args.len(), self.config.default_zone)
            .map_err(|reason| EvalError::unresolved(name, args.len(), reason))?;
        self.invoke(def, Some(subject), args)
    }

    fn eval_function(&self, name: &str, args: &[Expr]) -> EvalResult<Value> {
        let args = self.eval_args(args)?;
        let def = self
            .registry
            .resolve_standalone(name, args.len())
            .map_err(|reason| EvalError::unresolved(name, args.len(), reason))?;
        self.invoke(def, None, args)
    }

    fn eval_args(&self, args: &[Expr]) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn invoke(
        &self,
        def: &FunctionDef,
        receiver: Option<Value>,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        let zone = self.config.default_zone;
        let args = def
            .params
            .iter()
            .zip(&args)
            .map(|(param, arg)| {
                param.coerce(arg, zone).ok_or_else(|| EvalError::Coercion {
                    function: def.name.to_string(),
                    expected: param.to_string(),
                    value: arg.render(zone),
                })
            })
            .collect::<EvalResult<Vec<_>>>()?;
        (def.func)(&Invocation {
            def,
            receiver,
            args,
            config: self.config,
        })
    }
}

impl Template {
    /// Render against `ctx`. Never fails: a block whose evaluation fails
    /// renders as `""`.
    pub fn evaluate(&self, ctx: &Context<'_>, config: &EngineConfig) -> String {
        Evaluator::new(ctx, config).render(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use attrel_types::Zone;
    use std::collections::HashMap;

    fn config() -> EngineConfig {
        EngineConfig::default().with_default_zone(Zone::utc())
    }

    fn eval_block(source: &str, attrs: &HashMap<String, String>) -> EvalResult<Value> {
        let template = parse(source).expect("parses");
        let config = config();
        let ctx = Context::new(attrs);
        let evaluator = Evaluator::new(&ctx, &config);
        match &template.parts[..] {
            [TemplatePart::Block { expr, .. }] => evaluator.eval(expr),
            other => panic!("expected one block, got {other:?}"),
        }
    }

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn attribute_values_are_strings() {
        let attrs = attrs(&[("n", "42")]);
        assert_eq!(eval_block("${n}", &attrs), Ok(Value::str("42")));
        assert_eq!(eval_block("${missing}", &attrs), Ok(Value::str("")));
    }

    #[test]
    fn calls_chain_left_to_right() {
        let attrs = attrs(&[("n", "1.5")]);
        assert_eq!(
            eval_block("${n:toBigDecimal():plus(1):multiply(2)}", &attrs)
                .map(|v| v.render(Zone::utc())),
            Ok("5.0".to_string())
        );
    }

    #[test]
    fn uncoercible_argument() {
        let attrs = attrs(&[("n", "1.5")]);
        assert!(matches!(
            eval_block("${n:toBigDecimal():plus(${missing})}", &attrs),
            Err(EvalError::Coercion { .. })
        ));
    }

    #[test]
    fn unknown_function_at_runtime() {
        assert_eq!(
            eval_block("${n:frobnicate()}", &HashMap::new()),
            Err(EvalError::UnknownFunction {
                name: "frobnicate".to_string()
            })
        );
    }

    #[test]
    fn failed_block_renders_empty() {
        let template = parse("a${x:toBigDecimal()}b${y}c").expect("parses");
        let attrs = attrs(&[("x", "not a number"), ("y", "Y")]);
        let out = template.evaluate(&Context::new(&attrs), &config());
        assert_eq!(out, "abYc");
    }

    #[test]
    fn string_template_argument_contains_its_own_failures() {
        let template = parse("${a:equals('${b:toBigDecimal()}')}").expect("parses");
        let attrs = attrs(&[("a", ""), ("b", "oops")]);
        assert_eq!(template.evaluate(&Context::new(&attrs), &config()), "true");
    }
}
