//! Declarative entity configuration: field schemas, sections, generation and
//! display rules, and the registry they are looked up from.

pub mod builtin;
pub mod entity;
pub mod registry;
pub mod schema;

pub use entity::{
    CreationMethod, DisplayConfig, DisplayFields, EnhancementRule, EntityConfig, FilterKind,
    FilterOption, GenerationConfig, RelationshipConfig, SkipCondition, SortDirection, SortOption,
    WizardConfig, WizardStep,
};
pub use registry::ConfigRegistry;
pub use schema::{FieldPriority, FieldSchema, FieldType, FieldValidation, Section};
