//! The engine: compile once, evaluate many times.
//!
//! ```text
//! text ─► parse ─► validate ─► Arc<Template> (cached) ─► evaluate(ctx) ─► String
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::ast::Template;
use crate::config::EngineConfig;
use crate::interpreter::Context;
use crate::parser::{self, ParseError};
use crate::validator;

/// A template that failed to parse or validate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid expression: {}", describe(.errors))]
pub struct ExpressionError {
    pub errors: Vec<ParseError>,
}

fn describe(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Vec<ParseError>> for ExpressionError {
    fn from(errors: Vec<ParseError>) -> Self {
        Self { errors }
    }
}

/// Parse and validate `text` without caching.
pub fn compile(text: &str, config: &EngineConfig) -> Result<Template, ExpressionError> {
    let template = parser::parse_with_limit(text, config.max_depth)?;
    validator::check(text, &template)?;
    Ok(template)
}

/// Compiled templates keyed by their source text.
///
/// Bounded: once `capacity` entries are held the whole map is dropped and
/// refilled from scratch.
#[derive(Debug)]
pub struct ExpressionCache {
    capacity: usize,
    entries: Mutex<HashMap<String, Arc<Template>>>,
}

impl ExpressionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, text: &str) -> Option<Arc<Template>> {
        self.lock().get(text).cloned()
    }

    pub fn insert(&self, text: &str, template: Arc<Template>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            tracing::debug!(capacity = self.capacity, "expression cache full, clearing");
            entries.clear();
        }
        entries.insert(text.to_string(), template);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panic elsewhere cannot leave the map half-updated, so a poisoned
    // lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Template>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Evaluates expression text against attribute contexts.
///
/// Shareable across threads; compiled templates are cached by text.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    cache: ExpressionCache,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            cache: ExpressionCache::new(config.cache_capacity),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ExpressionCache {
        &self.cache
    }

    /// Parse and validate `text`, reusing an earlier result for the same text.
    pub fn compile(&self, text: &str) -> Result<Arc<Template>, ExpressionError> {
        if let Some(template) = self.cache.get(text) {
            tracing::trace!(input_len = text.len(), "expression cache hit");
            return Ok(template);
        }
        tracing::trace!(input_len = text.len(), "expression cache miss");
        let template = Arc::new(compile(text, &self.config)?);
        self.cache.insert(text, Arc::clone(&template));
        Ok(template)
    }

    /// Compile `text` and render it against `ctx`.
    ///
    /// Only syntax errors fail; a block whose evaluation fails renders as
    /// the empty string.
    #[tracing::instrument(level = "debug", skip(self, text, ctx), fields(input_len = text.len()))]
    pub fn evaluate(&self, text: &str, ctx: &Context<'_>) -> Result<String, ExpressionError> {
        let template = self.compile(text)?;
        Ok(template.evaluate(ctx, &self.config))
    }
}
