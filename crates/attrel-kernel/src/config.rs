//! Engine configuration.

use attrel_types::Zone;

use crate::lexer::DEFAULT_MAX_DEPTH;

/// Default number of compiled templates kept by an [`Engine`](crate::Engine).
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Settings shared by every evaluation an engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Zone used for calendar reads of dates that carry no zone.
    pub default_zone: Zone,
    /// Deepest allowed nesting of blocks and calls.
    pub max_depth: usize,
    /// Compiled templates kept before the cache is flushed.
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_zone: Zone::Local,
            max_depth: DEFAULT_MAX_DEPTH,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `ATTREL_TZ` and `ATTREL_MAX_DEPTH`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(id) = std::env::var("ATTREL_TZ") {
            match Zone::parse(&id) {
                Some(zone) => config.default_zone = zone,
                None => tracing::warn!(zone = %id, "ignoring unknown ATTREL_TZ"),
            }
        }
        if let Ok(depth) = std::env::var("ATTREL_MAX_DEPTH") {
            match depth.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => tracing::warn!(value = %depth, "ignoring invalid ATTREL_MAX_DEPTH"),
            }
        }
        config
    }

    pub fn with_default_zone(mut self, zone: Zone) -> Self {
        self.default_zone = zone;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}
