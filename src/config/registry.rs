//! Configuration registry.
//!
//! An explicit, immutable-after-init object: populated during application
//! bootstrap, then passed by reference (typically behind `Arc`) to every
//! consumer. There is deliberately no global instance.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::ConfigError;

use super::builtin;
use super::entity::EntityConfig;

/// Registry of entity configurations, keyed by `entity_type`.
pub struct ConfigRegistry {
    configs: Vec<EntityConfig>,
    index: HashMap<String, usize>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self {
            configs: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in character and location
    /// configurations.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        // Built-ins are constructed in code and known valid.
        for config in [builtin::character(), builtin::location()] {
            if let Err(err) = registry.register(config) {
                warn!("failed to register built-in configuration: {err}");
            }
        }
        registry
    }

    /// Validate and store a configuration. Registering the same
    /// `entity_type` twice overwrites the earlier entry in place (the
    /// registration order is preserved) and logs a warning.
    pub fn register(&mut self, config: EntityConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let key = config.entity_type.clone();
        match self.index.get(&key) {
            Some(&slot) => {
                warn!(entity_type = %key, "overwriting existing entity configuration");
                self.configs[slot] = config;
            }
            None => {
                debug!(entity_type = %key, "registered entity configuration");
                self.index.insert(key, self.configs.len());
                self.configs.push(config);
            }
        }
        Ok(())
    }

    pub fn get(&self, entity_type: &str) -> Option<&EntityConfig> {
        self.index.get(entity_type).map(|&slot| &self.configs[slot])
    }

    /// Like [`get`](Self::get) but unknown types become a `ConfigError`.
    pub fn require(&self, entity_type: &str) -> Result<&EntityConfig, ConfigError> {
        self.get(entity_type)
            .ok_or_else(|| ConfigError::UnknownEntityType(entity_type.to_string()))
    }

    /// All configurations in registration order.
    pub fn get_all(&self) -> impl Iterator<Item = &EntityConfig> {
        self.configs.iter()
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.index.contains_key(entity_type)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}
