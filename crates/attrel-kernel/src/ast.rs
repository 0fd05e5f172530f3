//! Abstract syntax tree for attribute expressions.

pub mod sexpr;
mod types;

pub use types::*;
