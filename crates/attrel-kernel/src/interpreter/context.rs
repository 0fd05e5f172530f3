//! Attribute lookup for evaluation.
//!
//! A context is borrowed for one evaluation and never mutated by it:
//! - a primary attribute map
//! - an optional fallback map consulted when the primary has no entry
//! - an optional decorator applied to every value found

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Anything that maps attribute names to string values.
pub trait Attributes {
    fn get_attribute(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> Attributes for HashMap<String, String, S> {
    fn get_attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Attributes for BTreeMap<String, String> {
    fn get_attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

static NO_ATTRIBUTES: BTreeMap<String, String> = BTreeMap::new();

/// The attributes one evaluation reads.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    primary: &'a dyn Attributes,
    fallback: Option<&'a dyn Attributes>,
    decorator: Option<&'a dyn Fn(&str) -> String>,
}

impl<'a> Context<'a> {
    pub fn new(primary: &'a dyn Attributes) -> Self {
        Self {
            primary,
            fallback: None,
            decorator: None,
        }
    }

    /// A context with no attributes at all.
    pub fn empty() -> Context<'static> {
        Context::new(&NO_ATTRIBUTES)
    }

    /// Consult `fallback` for names the primary map lacks.
    pub fn with_fallback(mut self, fallback: &'a dyn Attributes) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Post-process every attribute value found.
    pub fn with_decorator(mut self, decorator: &'a dyn Fn(&str) -> String) -> Self {
        self.decorator = Some(decorator);
        self
    }

    /// Value of `name`, or `None` if neither map has it.
    ///
    /// The decorator only sees values that exist.
    pub fn lookup(&self, name: &str) -> Option<String> {
        let raw = self
            .primary
            .get_attribute(name)
            .or_else(|| self.fallback.and_then(|f| f.get_attribute(name)))?;
        Some(match self.decorator {
            Some(decorate) => decorate(raw),
            None => raw.to_string(),
        })
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("fallback", &self.fallback.is_some())
            .field("decorator", &self.decorator.is_some())
            .finish_non_exhaustive()
    }
}
