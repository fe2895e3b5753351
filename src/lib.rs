//! StoryForge - Configuration-Driven Entity Engine
//!
//! This crate turns declarative entity configurations into working forms,
//! validation, AI generation and lifecycle management for creative-writing
//! projects. One `EntityConfig` describes an entity type once; the engine
//! derives everything else from it.
//!
//! ## Architecture
//! All entity operations flow through the configuration:
//! EntityConfig -> Compiled Form -> Validated Data -> Store / Generation
//!
//! ## Quick Start
//!
//! ```rust
//! use storyforge::config::ConfigRegistry;
//! use storyforge::form::FormCompiler;
//!
//! let registry = ConfigRegistry::with_builtins();
//! let config = registry.require("characters").unwrap();
//! let form = FormCompiler::compile(config, None).unwrap();
//! assert!(form.rule("name").is_some());
//! ```

// Core error handling
pub mod error;

// Declarative configuration and the registry
pub mod config;

// Form compilation, validation and draft state
pub mod form;

// AI generation pipeline
pub mod generation;

// Guided creation state machine
pub mod wizard;

// Entity lifecycle, querying and persistence
pub mod manager;

// Shared JSON value coercions
pub(crate) mod value;

pub use config::{ConfigRegistry, EntityConfig, FieldPriority, FieldSchema, FieldType};
pub use error::{
    ConfigError, EngineError, GenerationError, StoreError, ValidationError, WizardError,
};
pub use form::{CompiledForm, FormCompiler, FormState};
pub use generation::{
    GenerationContext, GenerationPipeline, HttpTextProvider, ProjectContext, ProviderConfig,
    TargetSeed, TextGenerationProvider,
};
pub use manager::{Entity, EntityManager, EntityQuery, EntityStore, FilterValue, HttpEntityStore};
pub use wizard::{Wizard, WizardPhase};

/// Install a default `tracing` subscriber for hosts that have not set one
/// up. Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();
}
