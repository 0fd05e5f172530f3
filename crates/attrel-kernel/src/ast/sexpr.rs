//! S-expression formatter for the AST.
//!
//! Spans are left out so the output only reflects structure. Used by the
//! REPL's `/ast` command and by parser tests.

use attrel_types::{Value, format_f64};

use super::types::{Expr, Template, TemplatePart};

/// Format a template as an S-expression.
pub fn format_template(template: &Template) -> String {
    let mut out = String::from("(template");
    for part in &template.parts {
        out.push(' ');
        match part {
            TemplatePart::Text(text) => out.push_str(&format!("(text {text:?})")),
            TemplatePart::Block { expr, .. } => out.push_str(&format_expr(expr)),
        }
    }
    out.push(')');
    out
}

/// Format an expression as an S-expression.
pub fn format_expr(expr: &Expr) -> String {
    match expr {
        Expr::AttributeRef(name) => format!("(attr {name})"),
        Expr::Literal(value) => format_literal(value),
        Expr::Call {
            receiver,
            name,
            args,
            ..
        } => {
            let mut parts = vec![format!("(call {name}"), format_expr(receiver)];
            parts.extend(args.iter().map(format_expr));
            format!("{})", parts.join(" "))
        }
        Expr::Function { name, args, .. } => {
            let mut parts = vec![format!("(fn {name}")];
            parts.extend(args.iter().map(format_expr));
            format!("{})", parts.join(" "))
        }
        Expr::Embedded(inner) => format!("(embed {})", format_expr(inner)),
        Expr::Template(template) => format_template(template),
    }
}

fn format_literal(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("(lit string {s:?})"),
        Value::Bool(b) => format!("(lit boolean {b})"),
        Value::Int64(n) => format!("(lit integer {n})"),
        Value::Float64(x) => format!("(lit float {})", format_f64(*x)),
        Value::Decimal(d) => format!("(lit decimal {d})"),
        Value::DateTime(dt) => format!("(lit date {})", dt.millis()),
    }
}
