//! Output formatting for the REPL and the one-shot CLI.
//!
//! - **Interactive** → empty results are made visible
//! - **Piped** → the rendered text exactly, so output can be captured

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context as _, Result, bail};

use attrel_kernel::ExpressionError;
use attrel_kernel::functions::FunctionRegistry;
use attrel_kernel::validator::Span;

/// Who reads the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContext {
    Interactive,
    Piped,
}

/// Detect the output context based on terminal state.
pub fn detect_context() -> OutputContext {
    if std::io::stdout().is_terminal() {
        OutputContext::Interactive
    } else {
        OutputContext::Piped
    }
}

/// Format a rendered template for display.
pub fn format_output(rendered: &str, context: OutputContext) -> String {
    match context {
        OutputContext::Interactive if rendered.is_empty() => "(empty)".to_string(),
        _ => rendered.to_string(),
    }
}

/// Describe every error in `error`, each with its location and a caret
/// under the offending text of `source`.
pub fn format_error(source: &str, error: &ExpressionError) -> String {
    let mut output = String::new();
    for (i, err) in error.errors.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        let span = Span::new(err.span.start, err.span.end);
        output.push_str(&format!("{}: {}", span.format_location(source), err.message));
        if let Some(excerpt) = span.excerpt(source) {
            output.push('\n');
            output.push_str(&excerpt);
        }
    }
    output
}

/// Attributes as a pretty JSON object.
pub fn format_attributes(attributes: &BTreeMap<String, String>) -> Result<String> {
    serde_json::to_string_pretty(attributes).context("Failed to render attributes")
}

/// Parse a JSON object into attributes. Strings are taken as-is; any
/// other value is stored as its JSON text.
pub fn parse_attributes_json(text: &str) -> Result<BTreeMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(text).context("Invalid JSON")?;
    let serde_json::Value::Object(object) = value else {
        bail!("expected a JSON object of attribute names to values");
    };
    Ok(object
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}

/// Read attributes from a JSON object file.
pub fn read_attributes_json(path: &Path) -> Result<BTreeMap<String, String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read attributes: {}", path.display()))?;
    parse_attributes_json(&text).with_context(|| format!("In {}", path.display()))
}

/// List functions as aligned `signature  summary` rows, optionally only
/// those whose name contains `filter` (case-insensitive).
pub fn format_functions(registry: &FunctionRegistry, filter: Option<&str>) -> String {
    let filter = filter.map(str::to_ascii_lowercase);
    let rows: Vec<(String, &str)> = registry
        .iter()
        .filter(|f| {
            filter
                .as_deref()
                .is_none_or(|needle| f.name.to_ascii_lowercase().contains(needle))
        })
        .map(|f| (f.signature(), f.summary))
        .collect();

    if rows.is_empty() {
        return "(no matching functions)".to_string();
    }

    let width = rows.iter().map(|(sig, _)| sig.len()).max().unwrap_or(0);
    let mut output = String::new();
    for (signature, summary) in rows {
        output.push_str(&format!("{signature:<width$}  {summary}\n"));
    }
    output.trim_end().to_string()
}
