//! Field schema types: the atomic description of one entity attribute.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The type of a field. Every place a field value is interpreted (validator,
/// cleaner, defaults, sorting) matches exhaustively on this enum, so adding
/// a variant fails the build until it is handled everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    /// Single-line free text.
    Text,
    /// Multi-line free text.
    LongText,
    /// List of short text items.
    List,
    /// One value from a fixed option set.
    Select,
    Number,
    /// ISO date string (YYYY-MM-DD).
    Date,
    Boolean,
}

impl FieldType {
    /// Type-appropriate zero value used for form defaults and for fields the
    /// generation cleaner finds absent.
    pub fn zero_value(self) -> Value {
        match self {
            Self::Text | Self::LongText | Self::Select | Self::Date => {
                Value::String(String::new())
            }
            Self::List => Value::Array(Vec::new()),
            Self::Number => Value::from(0),
            Self::Boolean => Value::Bool(false),
        }
    }

    /// Textual fields default to being searchable and AI-enhanceable.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::LongText)
    }
}

/// How strongly a field contributes to a "complete" entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPriority {
    Essential,
    Important,
    Optional,
}

fn default_priority() -> FieldPriority {
    FieldPriority::Important
}

/// Declarative validation constraints attached to a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldValidation {
    /// Lower bound for number fields.
    pub min: Option<f64>,
    /// Upper bound for number fields.
    pub max: Option<f64>,
    /// Regex the (non-empty) value must match.
    pub pattern: Option<String>,
    /// Minimum item count for list fields.
    pub min_items: Option<usize>,
    /// Maximum item count for list fields.
    pub max_items: Option<usize>,
}

impl FieldValidation {
    pub fn is_default(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.pattern.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
    }
}

/// Description of one attribute within an entity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Unique key within the owning configuration.
    pub key: String,

    /// Human-readable label.
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Section this field belongs to.
    pub section: String,

    #[serde(default = "default_priority")]
    pub priority: FieldPriority,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub placeholder: Option<String>,

    /// Present iff `field_type` is `Select`.
    #[serde(default)]
    pub options: Option<Vec<String>>,

    #[serde(default)]
    pub max_length: Option<usize>,

    /// Whether single-field AI enhancement may target this field.
    #[serde(default)]
    pub ai_enhanceable: bool,

    /// Whether free-text search should consider this field.
    #[serde(default)]
    pub searchable: bool,

    #[serde(default)]
    pub display_in_card: bool,

    #[serde(default)]
    pub display_in_list: bool,

    #[serde(default, skip_serializing_if = "FieldValidation::is_default")]
    pub validation: FieldValidation,
}

impl FieldSchema {
    /// New field with the conventional defaults: `important` priority, and
    /// searchable/enhanceable when textual.
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
        section: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            section: section.into(),
            priority: FieldPriority::Important,
            required: false,
            placeholder: None,
            options: None,
            max_length: None,
            ai_enhanceable: field_type.is_textual(),
            searchable: field_type.is_textual(),
            display_in_card: false,
            display_in_list: false,
            validation: FieldValidation::default(),
        }
    }

    pub fn priority(mut self, priority: FieldPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn enhanceable(mut self, enabled: bool) -> Self {
        self.ai_enhanceable = enabled;
        self
    }

    pub fn searchable(mut self, enabled: bool) -> Self {
        self.searchable = enabled;
        self
    }

    pub fn in_card(mut self) -> Self {
        self.display_in_card = true;
        self
    }

    pub fn in_list(mut self) -> Self {
        self.display_in_list = true;
        self
    }

    pub fn validation(mut self, validation: FieldValidation) -> Self {
        self.validation = validation;
        self
    }
}

/// Named group of fields shown together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Ordered field keys; each must exist in the owning configuration.
    pub fields: Vec<String>,
}

impl Section {
    pub fn new(key: impl Into<String>, label: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            description: String::new(),
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }
}
