//! Error taxonomy for the entity engine.
//!
//! One enum per subsystem, composed into [`EngineError`] at the crate seam.
//! Nothing here is fatal to a host process: validation errors are reported
//! inline and recoverable by edit, store errors preserve form state for a
//! retry, generation errors are internal to the pipeline and degrade to a
//! fallback entity, and enhancement failures keep the original value.

use thiserror::Error;

/// Umbrella error for engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("persistence error: {0}")]
    Store(#[from] StoreError),

    #[error("wizard error: {0}")]
    Wizard(#[from] WizardError),

    /// A create/update/delete was triggered while another one was still in
    /// flight. At most one mutation may run per explicit user action.
    #[error("another mutation is already in flight")]
    MutationInFlight,
}

/// Errors raised while building, loading or looking up entity configurations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no configuration registered for entity type '{0}'")]
    UnknownEntityType(String),

    #[error("duplicate field key '{key}' in '{entity_type}' configuration")]
    DuplicateFieldKey { entity_type: String, key: String },

    #[error("section '{section}' references unknown field '{field}'")]
    UnknownSectionField { section: String, field: String },

    #[error("select field '{0}' declares no options")]
    MissingSelectOptions(String),

    #[error("field '{0}' declares options but is not a select field")]
    UnexpectedOptions(String),

    #[error("{context} references unknown field '{field}'")]
    UnknownFieldReference {
        context: &'static str,
        field: String,
    },

    #[error("invalid validation pattern on field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A field value failed its compiled rule. Reported next to the field and
/// fully recoverable by user edit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{label} is required")]
    Required { field: String, label: String },

    #[error("{label} must be at most {max} characters")]
    TooLong {
        field: String,
        label: String,
        max: usize,
    },

    #[error("{label} does not match the expected format")]
    PatternMismatch { field: String, label: String },

    #[error("{label} must be a number")]
    NotANumber { field: String, label: String },

    #[error("{label} must be at least {min}")]
    BelowMinimum {
        field: String,
        label: String,
        min: f64,
    },

    #[error("{label} must be at most {max}")]
    AboveMaximum {
        field: String,
        label: String,
        max: f64,
    },

    #[error("{label} needs at least {min} items")]
    TooFewItems {
        field: String,
        label: String,
        min: usize,
    },

    #[error("{label} allows at most {max} items")]
    TooManyItems {
        field: String,
        label: String,
        max: usize,
    },

    #[error("{label} must be one of the listed options")]
    NotAnOption { field: String, label: String },

    #[error("unknown field '{field}'")]
    UnknownField { field: String },
}

impl ValidationError {
    /// Key of the field this error is attached to.
    pub fn field(&self) -> &str {
        match self {
            Self::Required { field, .. }
            | Self::TooLong { field, .. }
            | Self::PatternMismatch { field, .. }
            | Self::NotANumber { field, .. }
            | Self::BelowMinimum { field, .. }
            | Self::AboveMaximum { field, .. }
            | Self::TooFewItems { field, .. }
            | Self::TooManyItems { field, .. }
            | Self::NotAnOption { field, .. }
            | Self::UnknownField { field } => field,
        }
    }
}

/// A persistence call failed. Transient; callers keep their state and retry.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {operation}")]
    Status { operation: &'static str, status: u16 },

    #[error("entity '{0}' not found")]
    NotFound(String),

    #[error("failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The store has no server-side search endpoint; the engine falls back
    /// to client-side filtering of the full list.
    #[error("server-side search is not supported by this store")]
    SearchUnsupported,
}

/// Internal to the generation pipeline; retried, never surfaced to callers.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("provider call failed: {0}")]
    Provider(#[source] anyhow::Error),

    #[error("no JSON object found in provider reply")]
    NoJsonObject,

    #[error("provider reply was not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A wizard transition was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("no creation method selected yet")]
    NoMethodSelected,

    #[error("current step is missing required fields: {0:?}")]
    StepIncomplete(Vec<String>),

    #[error("wizard is already complete")]
    AlreadyComplete,
}
