//! attrel-kernel: the attribute expression engine.
//!
//! This crate provides:
//!
//! - **Lexer**: Splits templates into text and `${...}` block tokens using logos
//! - **Parser**: Builds the expression tree from tokens using chumsky
//! - **AST**: Templates, expressions, and an s-expression printer
//! - **Validator**: Checks every call against the function registry before evaluation
//! - **Functions**: The registry plus decimal, calendar, number and conversion libraries
//! - **Interpreter**: Attribute contexts and the evaluator
//! - **Engine**: Compile-once evaluation with a bounded template cache
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! let attrs = HashMap::from([
//!     ("pi".to_string(), "3.14159".to_string()),
//!     ("n".to_string(), "2".to_string()),
//! ]);
//! let out = attrel_kernel::evaluate_expressions(
//!     "pi/n = ${pi:toBigDecimal():divide(${n}, 3, 'half_up')}",
//!     &attrs,
//!     None,
//! )
//! .unwrap();
//! assert_eq!(out, "pi/n = 1.571");
//! ```

pub mod ast;
pub mod config;
pub mod engine;
pub mod functions;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod validator;

use std::collections::HashMap;
use std::sync::LazyLock;

pub use ast::Template;
pub use attrel_types as types;
pub use config::EngineConfig;
pub use engine::{Engine, ExpressionCache, ExpressionError, compile};
pub use interpreter::{Attributes, Context, EvalError};
pub use parser::ParseError;

static DEFAULT_ENGINE: LazyLock<Engine> = LazyLock::new(|| Engine::new(EngineConfig::from_env()));

/// The process-wide engine used by [`evaluate_expressions`].
pub fn default_engine() -> &'static Engine {
    &DEFAULT_ENGINE
}

/// Resolve every `${...}` block in `text` against `attributes`.
///
/// Missing attributes read as `""`, and a block whose evaluation fails
/// renders as `""`. `decorator`, when given, post-processes each attribute
/// value found. Only malformed text is an error.
pub fn evaluate_expressions(
    text: &str,
    attributes: &HashMap<String, String>,
    decorator: Option<&dyn Fn(&str) -> String>,
) -> Result<String, ExpressionError> {
    let mut ctx = Context::new(attributes);
    if let Some(decorator) = decorator {
        ctx = ctx.with_decorator(decorator);
    }
    DEFAULT_ENGINE.evaluate(text, &ctx)
}
