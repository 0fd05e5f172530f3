//! Pre-evaluation validation.
//!
//! Parsing accepts any well-formed call; this pass checks each one against
//! the function registry. Errors reject the template. Warnings flag
//! literals that will silently fall back to a default at runtime.

mod issue;
mod walker;

pub use issue::{IssueCode, Severity, Span, ValidationIssue};
pub use walker::Validator;

use crate::ast::Template;
use crate::functions;
use crate::parser::ParseError;

/// Validate `template` against the built-in functions.
pub fn validate(template: &Template) -> Vec<ValidationIssue> {
    Validator::new(functions::registry()).validate(template)
}

/// Validate, logging warnings and returning errors as parse errors.
pub fn check(source: &str, template: &Template) -> Result<(), Vec<ParseError>> {
    let mut errors = Vec::new();
    for issue in validate(template) {
        if issue.is_error() {
            let span = issue.span.unwrap_or_default();
            errors.push(ParseError::new(span.start..span.end, issue.to_string()));
        } else {
            tracing::warn!("{}", issue.format(source));
        }
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
