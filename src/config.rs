//! Runtime configuration
//!
//! Configuration can be built in code or loaded from JSON; missing fields
//! take their defaults.
//!
//! ```
//! use hermes_napi::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_json(r#"{ "gc": { "gc_threshold": 64 } }"#).unwrap();
//! assert_eq!(config.gc.gc_threshold, 64);
//! assert_eq!(config.name, "N-API");
//! ```

use serde::Deserialize;
use thiserror::Error;

/// Default number of allocations between automatic collections
pub const DEFAULT_GC_THRESHOLD: usize = 256;

/// Default cap on live heap objects
pub const DEFAULT_MAX_HEAP_OBJECTS: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("max_heap_objects must be non-zero")]
    ZeroHeapLimit,

    #[error("gc_threshold ({threshold}) exceeds max_heap_objects ({limit})")]
    ThresholdAboveLimit { threshold: usize, limit: usize },
}

/// Garbage collector tuning
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GcConfig {
    /// Allocations between automatic collections (0 = only collect on demand)
    pub gc_threshold: usize,
    /// Allocation fails with `MemoryError` once this many objects are live
    pub max_heap_objects: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            gc_threshold: DEFAULT_GC_THRESHOLD,
            max_heap_objects: DEFAULT_MAX_HEAP_OBJECTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Name reported in log events
    pub name: String,
    pub gc: GcConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "N-API".to_string(),
            gc: GcConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gc.max_heap_objects == 0 {
            return Err(ConfigError::ZeroHeapLimit);
        }
        if self.gc.gc_threshold > self.gc.max_heap_objects {
            return Err(ConfigError::ThresholdAboveLimit {
                threshold: self.gc.gc_threshold,
                limit: self.gc.max_heap_objects,
            });
        }
        Ok(())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_gc_threshold(mut self, threshold: usize) -> Self {
        self.gc.gc_threshold = threshold;
        self
    }

    pub fn with_max_heap_objects(mut self, limit: usize) -> Self {
        self.gc.max_heap_objects = limit;
        self
    }
}
