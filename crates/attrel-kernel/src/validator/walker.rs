//! AST walker for pre-evaluation validation.
//!
//! Infers the kind of each expression where it does not depend on
//! attribute contents, and checks every call against the registry.

use attrel_types::{Kind, RoundingMode, Value, Zone};

use crate::ast::{Expr, Span as AstSpan, Template};
use crate::functions::{FunctionDef, FunctionRegistry, Param, Unresolved};

use super::issue::{IssueCode, ValidationIssue};

const MODE_NAMES: &str = "UP, DOWN, CEILING, FLOOR, HALF_UP, HALF_DOWN, HALF_EVEN, UNNECESSARY";

/// AST validator that checks calls before evaluation.
pub struct Validator<'a> {
    registry: &'a FunctionRegistry,
    issues: Vec<ValidationIssue>,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Self {
            registry,
            issues: Vec::new(),
        }
    }

    /// Validate a template and return all issues found.
    pub fn validate(mut self, template: &Template) -> Vec<ValidationIssue> {
        self.validate_template(template);
        self.issues
    }

    fn validate_template(&mut self, template: &Template) {
        for expr in template.blocks() {
            self.validate_expr(expr);
        }
    }

    /// Validate an expression, returning its kind when known statically.
    fn validate_expr(&mut self, expr: &Expr) -> Option<Kind> {
        match expr {
            // attribute values are always strings
            Expr::AttributeRef(_) => Some(Kind::Str),
            Expr::Literal(value) => Some(value.kind()),
            Expr::Embedded(inner) => self.validate_expr(inner),
            Expr::Template(template) => {
                self.validate_template(template);
                Some(Kind::Str)
            }
            Expr::Call {
                receiver,
                name,
                args,
                span,
            } => {
                let receiver = self.validate_expr(receiver);
                self.validate_call(receiver, name, args, span)
            }
            Expr::Function { name, args, span } => self.validate_function(name, args, span),
        }
    }

    fn validate_call(
        &mut self,
        receiver: Option<Kind>,
        name: &str,
        args: &[Expr],
        span: &AstSpan,
    ) -> Option<Kind> {
        let kinds: Vec<Option<Kind>> = args.iter().map(|a| self.validate_expr(a)).collect();

        let registry = self.registry;
        let Some(receiver) = receiver else {
            // kind depends on attribute contents: only the shape is checkable
            if let Err(reason) = registry.check_shape(name, args.len(), true) {
                self.report(reason, name, args.len(), span);
            }
            self.check_literal_names(registry.candidates(name, args.len(), true), args, span);
            return None;
        };

        match registry.resolve_kind(name, receiver, args.len()) {
            Ok(def) => {
                self.check_args(def, args, &kinds, span);
                def.returns
            }
            Err(reason) => {
                self.report(reason, name, args.len(), span);
                None
            }
        }
    }

    fn validate_function(&mut self, name: &str, args: &[Expr], span: &AstSpan) -> Option<Kind> {
        let kinds: Vec<Option<Kind>> = args.iter().map(|a| self.validate_expr(a)).collect();
        match self.registry.resolve_standalone(name, args.len()) {
            Ok(def) => {
                self.check_args(def, args, &kinds, span);
                // literal(x) is whatever x is
                def.returns.or_else(|| match (def.name, kinds.first()) {
                    ("literal", Some(kind)) => *kind,
                    _ => None,
                })
            }
            Err(reason) => {
                self.report(reason, name, args.len(), span);
                None
            }
        }
    }

    fn check_args(&mut self, def: &FunctionDef, args: &[Expr], kinds: &[Option<Kind>], span: &AstSpan) {
        for (index, (param, kind)) in def.params.iter().zip(kinds).enumerate() {
            if let Some(kind) = kind
                && !param.may_accept(*kind)
            {
                self.issues.push(
                    ValidationIssue::new(
                        IssueCode::IncompatibleArgument,
                        format!(
                            "argument {} of {} must be {param}, found {kind}",
                            index + 1,
                            def.name
                        ),
                    )
                    .with_span(span),
                );
            }
        }
        self.check_literal_names(std::iter::once(def), args, span);
    }

    /// Warn about rounding modes and zones spelled as literals that name nothing.
    fn check_literal_names<'d>(
        &mut self,
        defs: impl Iterator<Item = &'d FunctionDef>,
        args: &[Expr],
        span: &AstSpan,
    ) {
        let mut declared: Vec<(usize, Param)> = Vec::new();
        for def in defs {
            for (index, param) in def.params.iter().enumerate() {
                if matches!(param, Param::Mode | Param::Zone) && !declared.contains(&(index, *param)) {
                    declared.push((index, *param));
                }
            }
        }

        for (index, param) in declared {
            let Some(Expr::Literal(Value::Str(text))) = args.get(index) else {
                continue;
            };
            let issue = match param {
                Param::Mode if RoundingMode::from_name(text).is_none() => ValidationIssue::new(
                    IssueCode::UnknownRoundingMode,
                    format!("unknown rounding mode '{text}'"),
                )
                .with_suggestion(format!("expected one of {MODE_NAMES}")),
                Param::Zone if Zone::parse(text).is_none() => ValidationIssue::new(
                    IssueCode::UnknownZone,
                    format!("unknown zone '{text}', GMT is used"),
                )
                .with_suggestion("use an IANA name such as Asia/Shanghai or an offset such as GMT+8"),
                _ => continue,
            };
            self.issues.push(issue.with_span(span));
        }
    }

    fn report(&mut self, reason: Unresolved, name: &str, arity: usize, span: &AstSpan) {
        let issue = match reason {
            Unresolved::UnknownFunction => {
                ValidationIssue::new(IssueCode::UnknownFunction, format!("unknown function '{name}'"))
            }
            Unresolved::WrongArity => {
                let arities = self.arities(name);
                ValidationIssue::new(
                    IssueCode::WrongArity,
                    format!("{name} does not take {arity} argument(s)"),
                )
                .with_suggestion(format!("{name} takes {arities} argument(s)"))
            }
            Unresolved::MissingSubject => ValidationIssue::new(
                IssueCode::MissingSubject,
                format!("{name} needs a subject, as in ${{attr:{name}(...)}}"),
            ),
            Unresolved::UnexpectedSubject => ValidationIssue::new(
                IssueCode::UnexpectedSubject,
                format!("{name} starts a chain and cannot follow ':'"),
            ),
            Unresolved::NoMatch(kind) => ValidationIssue::new(
                IssueCode::IncompatibleReceiver,
                format!("{name} cannot be applied to a {kind} value"),
            ),
        };
        self.issues.push(issue.with_span(span));
    }

    /// Distinct arities `name` is registered with, as "1, 2 or 3".
    fn arities(&self, name: &str) -> String {
        let mut arities: Vec<usize> = self
            .registry
            .iter()
            .filter(|f| f.name == name)
            .map(FunctionDef::arity)
            .collect();
        arities.sort_unstable();
        arities.dedup();
        let mut words: Vec<String> = arities.iter().map(ToString::to_string).collect();
        match words.pop() {
            Some(last) if !words.is_empty() => format!("{} or {last}", words.join(", ")),
            Some(last) => last,
            None => String::new(),
        }
    }
}
