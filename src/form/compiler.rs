//! Form compiler: turns an entity configuration into compiled validation
//! rules and a defaults map.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

use crate::config::schema::{FieldPriority, FieldType};
use crate::config::EntityConfig;
use crate::error::{ConfigError, ValidationError};
use crate::value;

/// Compiled validation rule for a single field.
#[derive(Debug)]
pub struct FieldRule {
    pub key: String,
    pub label: String,
    pub field_type: FieldType,
    pub priority: FieldPriority,
    pub required: bool,
    pub max_length: Option<usize>,
    pub options: Option<Vec<String>>,
    pub pattern: Option<Regex>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

impl FieldRule {
    /// Validate one value against this rule.
    pub fn check(&self, val: &Value) -> Result<(), ValidationError> {
        let required_err = || ValidationError::Required {
            field: self.key.clone(),
            label: self.label.clone(),
        };

        match self.field_type {
            FieldType::Text | FieldType::LongText => {
                let text = value::stringify(val);
                if text.is_empty() {
                    if self.required {
                        return Err(required_err());
                    }
                    return Ok(());
                }
                if let Some(max) = self.max_length {
                    if text.chars().count() > max {
                        return Err(ValidationError::TooLong {
                            field: self.key.clone(),
                            label: self.label.clone(),
                            max,
                        });
                    }
                }
                if let Some(pattern) = &self.pattern {
                    if !pattern.is_match(&text) {
                        return Err(ValidationError::PatternMismatch {
                            field: self.key.clone(),
                            label: self.label.clone(),
                        });
                    }
                }
                Ok(())
            }
            FieldType::Select => {
                let text = value::stringify(val);
                if text.is_empty() {
                    if self.required {
                        return Err(required_err());
                    }
                    return Ok(());
                }
                if let Some(options) = &self.options {
                    if !options.iter().any(|o| o == &text) {
                        return Err(ValidationError::NotAnOption {
                            field: self.key.clone(),
                            label: self.label.clone(),
                        });
                    }
                }
                Ok(())
            }
            FieldType::Number => {
                let n = match value::try_number(val) {
                    Some(n) => n,
                    None => {
                        if matches!(val, Value::Null) && !self.required {
                            return Ok(());
                        }
                        if matches!(val, Value::String(s) if s.trim().is_empty()) && !self.required
                        {
                            return Ok(());
                        }
                        return Err(ValidationError::NotANumber {
                            field: self.key.clone(),
                            label: self.label.clone(),
                        });
                    }
                };
                if let Some(min) = self.min {
                    if n < min {
                        return Err(ValidationError::BelowMinimum {
                            field: self.key.clone(),
                            label: self.label.clone(),
                            min,
                        });
                    }
                }
                if let Some(max) = self.max {
                    if n > max {
                        return Err(ValidationError::AboveMaximum {
                            field: self.key.clone(),
                            label: self.label.clone(),
                            max,
                        });
                    }
                }
                Ok(())
            }
            FieldType::List => {
                let count = match val {
                    Value::Array(items) => items
                        .iter()
                        .filter(|item| !value::stringify(item).is_empty())
                        .count(),
                    _ => 0,
                };
                if count == 0 && self.required {
                    return Err(required_err());
                }
                if let Some(min) = self.min_items {
                    if count < min {
                        return Err(ValidationError::TooFewItems {
                            field: self.key.clone(),
                            label: self.label.clone(),
                            min,
                        });
                    }
                }
                if let Some(max) = self.max_items {
                    if count > max {
                        return Err(ValidationError::TooManyItems {
                            field: self.key.clone(),
                            label: self.label.clone(),
                            max,
                        });
                    }
                }
                Ok(())
            }
            FieldType::Boolean => {
                if self.required && matches!(val, Value::Null) {
                    return Err(required_err());
                }
                Ok(())
            }
            FieldType::Date => {
                if self.required && value::stringify(val).is_empty() {
                    return Err(required_err());
                }
                Ok(())
            }
        }
    }
}

/// Compiled validation schema plus defaults for one configuration.
#[derive(Debug)]
pub struct CompiledForm {
    rules: Vec<FieldRule>,
    index: HashMap<String, usize>,
    defaults: HashMap<String, Value>,
}

/// Compiles entity configurations into forms.
pub struct FormCompiler;

impl FormCompiler {
    /// Compile `config` into rules and defaults. When `existing` is given
    /// (edit mode) its values seed the defaults; otherwise every field gets
    /// its type's zero value.
    pub fn compile(
        config: &EntityConfig,
        existing: Option<&HashMap<String, Value>>,
    ) -> Result<CompiledForm, ConfigError> {
        let mut rules = Vec::with_capacity(config.fields.len());
        let mut index = HashMap::new();
        let mut defaults = HashMap::new();

        for field in &config.fields {
            let pattern = match &field.validation.pattern {
                Some(p) => Some(Regex::new(p).map_err(|source| ConfigError::InvalidPattern {
                    field: field.key.clone(),
                    source,
                })?),
                None => None,
            };

            index.insert(field.key.clone(), rules.len());
            rules.push(FieldRule {
                key: field.key.clone(),
                label: field.label.clone(),
                field_type: field.field_type,
                priority: field.priority,
                required: field.required,
                max_length: field.max_length,
                options: field.options.clone(),
                pattern,
                min: field.validation.min,
                max: field.validation.max,
                min_items: field.validation.min_items,
                max_items: field.validation.max_items,
            });

            let default = existing
                .and_then(|entity| entity.get(&field.key))
                .cloned()
                .unwrap_or_else(|| field.field_type.zero_value());
            defaults.insert(field.key.clone(), default);
        }

        Ok(CompiledForm {
            rules,
            index,
            defaults,
        })
    }
}

impl CompiledForm {
    pub fn rule(&self, key: &str) -> Option<&FieldRule> {
        self.index.get(key).map(|&slot| &self.rules[slot])
    }

    /// Rules in field order.
    pub fn rules(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter()
    }

    /// One entry per field key; existing entity values in edit mode, zero
    /// values otherwise.
    pub fn defaults(&self) -> &HashMap<String, Value> {
        &self.defaults
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
