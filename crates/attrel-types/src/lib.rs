//! Pure data types for attrel: values, decimals, dates and zones.
//!
//! This crate is a leaf dependency with no parser and no evaluator. Hosts
//! that only need to construct or inspect values can depend on it without
//! pulling in the lexer and parser stack of attrel-kernel.

pub mod datetime;
pub mod decimal;
pub mod number;
pub mod pattern;
pub mod value;

// Flat re-exports for convenience
pub use datetime::*;
pub use decimal::*;
pub use number::*;
pub use pattern::*;
pub use value::*;
