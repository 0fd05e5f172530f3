//! Interpreter module for attrel.
//!
//! This module evaluates parsed templates against a set of attributes.
//!
//! # Architecture
//!
//! - **Context**: Read-only attribute lookup with an optional fallback map
//!   and value decorator
//! - **Evaluator**: Reduces expressions to values, dispatching calls
//!   through the function registry
//!
//! Failures inside a `${...}` block never escape it: the block renders as
//! the empty string and the rest of the template is unaffected.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use attrel_kernel::interpreter::Context;
//! use attrel_kernel::{EngineConfig, parser};
//!
//! let attrs = HashMap::from([("n".to_string(), "3.14".to_string())]);
//! let template = parser::parse("${n:toBigDecimal():multiply(2)}").unwrap();
//! let out = template.evaluate(&Context::new(&attrs), &EngineConfig::default());
//! assert_eq!(out, "6.28");
//! ```

mod context;
mod eval;

pub use context::{Attributes, Context};
pub use eval::{EvalError, EvalResult, Evaluator};
