//! Entity configuration: the declarative bundle a whole entity type is
//! driven from. Constructed once at startup (in code or from YAML),
//! validated, registered, and read-only thereafter.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::value;

use super::schema::{FieldPriority, FieldSchema, Section};

/// Prompting, retry and fallback settings for AI generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Prompt with `{context}`, `{entityType}`, `{name}`, `{genre}`,
    /// `{setting}` and `{projectName}` placeholders.
    pub prompt_template: String,
    /// Field keys whose values feed enhancement context.
    pub context_fields: Vec<String>,
    /// Per-field enhancement prompt overrides.
    pub enhancement_rules: Vec<EnhancementRule>,
    /// Field values used when generation exhausts its retries.
    pub fallback_fields: HashMap<String, String>,
    /// Provider attempts before giving up and synthesizing a fallback.
    pub max_retries: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            prompt_template: String::new(),
            context_fields: vec!["name".into(), "description".into()],
            enhancement_rules: Vec::new(),
            fallback_fields: HashMap::new(),
            max_retries: 3,
            temperature: 0.8,
        }
    }
}

/// Prompt template for regenerating one field in context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementRule {
    pub field_key: String,
    /// Supports `{current}`, `{name}`, `{fieldLabel}` and one placeholder
    /// per declared dependency field.
    pub prompt_template: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Which relations this entity type may participate in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelationshipConfig {
    pub allowed_types: Vec<String>,
    pub default_types: Vec<String>,
    pub bidirectional: bool,
    pub strength_levels: Vec<String>,
    pub status_options: Vec<String>,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            allowed_types: vec!["related".into(), "connected".into(), "associated".into()],
            default_types: vec!["related".into()],
            bidirectional: false,
            strength_levels: vec!["weak".into(), "medium".into(), "strong".into()],
            status_options: vec!["active".into(), "inactive".into(), "past".into()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOption {
    pub key: String,
    pub label: String,
    pub direction: SortDirection,
}

/// Kind of structured filter a field supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Exact match against a scalar field.
    Select,
    /// Selected value must appear in the entity's list field.
    Multiselect,
    Boolean,
    /// Numeric containment within [min, max].
    Range,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOption {
    pub key: String,
    pub label: String,
    pub kind: FilterKind,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// Which fields each presentation surface shows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayFields {
    pub card: Vec<String>,
    pub list: Vec<String>,
    pub detail: Vec<String>,
}

/// Listing, search, sort and filter rules for an entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayConfig {
    pub default_sort_field: String,
    pub sort_options: Vec<SortOption>,
    pub filter_options: Vec<FilterOption>,
    pub search_fields: Vec<String>,
    pub display_fields: DisplayFields,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_sort_field: "name".into(),
            sort_options: vec![
                SortOption {
                    key: "name".into(),
                    label: "Name".into(),
                    direction: SortDirection::Asc,
                },
                SortOption {
                    key: "createdAt".into(),
                    label: "Created".into(),
                    direction: SortDirection::Desc,
                },
                SortOption {
                    key: "updatedAt".into(),
                    label: "Modified".into(),
                    direction: SortDirection::Desc,
                },
            ],
            filter_options: Vec::new(),
            search_fields: vec!["name".into(), "description".into()],
            display_fields: DisplayFields {
                card: vec!["name".into(), "description".into()],
                list: vec!["name".into(), "description".into()],
                detail: vec!["name".into(), "description".into()],
            },
        }
    }
}

/// How a new entity may be created in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationMethod {
    Manual,
    Template,
    Ai,
    Upload,
}

/// Condition under which a wizard step is skipped, evaluated against the
/// accumulated form data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkipCondition {
    /// Skip when the field holds exactly this value.
    FieldEquals { field: String, value: Value },
    /// Skip when the field already has a non-empty value.
    FieldPresent { field: String },
    /// Skip when the field is still empty.
    FieldAbsent { field: String },
}

impl SkipCondition {
    pub fn matches(&self, data: &HashMap<String, Value>) -> bool {
        match self {
            Self::FieldEquals { field, value } => {
                data.get(field).map(|v| v == value).unwrap_or(false)
            }
            Self::FieldPresent { field } => {
                data.get(field).map(|v| !value::is_empty(v)).unwrap_or(false)
            }
            Self::FieldAbsent { field } => {
                data.get(field).map(value::is_empty).unwrap_or(true)
            }
        }
    }
}

/// One step of the guided creation flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardStep {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Field keys collected on this step.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Whether advancement is gated on this step's required fields.
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub skip_condition: Option<SkipCondition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WizardConfig {
    pub steps: Vec<WizardStep>,
    pub methods: Vec<CreationMethod>,
}

/// The declarative schema for one entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfig {
    /// Registry key, e.g. `"characters"`.
    pub entity_type: String,
    /// Singular display name, e.g. `"Character"`.
    pub name: String,
    pub plural_name: String,
    #[serde(default)]
    pub description: String,

    pub fields: Vec<FieldSchema>,
    pub sections: Vec<Section>,

    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub relationships: RelationshipConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub wizard: WizardConfig,
}

impl EntityConfig {
    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn fields_with_priority(
        &self,
        priority: FieldPriority,
    ) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(move |f| f.priority == priority)
    }

    pub fn enhancement_rule(&self, field_key: &str) -> Option<&EnhancementRule> {
        self.generation
            .enhancement_rules
            .iter()
            .find(|r| r.field_key == field_key)
    }

    /// Check structural invariants: unique field keys, resolvable section /
    /// rule / fallback / wizard references, select-option pairing, and
    /// compilable validation patterns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.key.as_str()) {
                return Err(ConfigError::DuplicateFieldKey {
                    entity_type: self.entity_type.clone(),
                    key: field.key.clone(),
                });
            }
            let is_select = matches!(field.field_type, super::schema::FieldType::Select);
            match (&field.options, is_select) {
                (None, true) => {
                    return Err(ConfigError::MissingSelectOptions(field.key.clone()));
                }
                (Some(_), false) => {
                    return Err(ConfigError::UnexpectedOptions(field.key.clone()));
                }
                _ => {}
            }
            if let Some(pattern) = &field.validation.pattern {
                regex::Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    field: field.key.clone(),
                    source,
                })?;
            }
        }

        for section in &self.sections {
            for key in &section.fields {
                if !seen.contains(key.as_str()) {
                    return Err(ConfigError::UnknownSectionField {
                        section: section.key.clone(),
                        field: key.clone(),
                    });
                }
            }
        }

        for rule in &self.generation.enhancement_rules {
            if !seen.contains(rule.field_key.as_str()) {
                return Err(ConfigError::UnknownFieldReference {
                    context: "enhancement rule",
                    field: rule.field_key.clone(),
                });
            }
        }
        for key in self.generation.fallback_fields.keys() {
            if !seen.contains(key.as_str()) {
                return Err(ConfigError::UnknownFieldReference {
                    context: "fallback field",
                    field: key.clone(),
                });
            }
        }
        for step in &self.wizard.steps {
            for key in &step.fields {
                if !seen.contains(key.as_str()) {
                    return Err(ConfigError::UnknownFieldReference {
                        context: "wizard step",
                        field: key.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Load and validate a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}
