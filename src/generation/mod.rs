//! AI generation pipeline: context assembly, prompt building, the provider
//! seam, retry policy, reply cleaning and the deterministic fallback.

pub mod clean;
pub mod context;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod retry;

pub use clean::{clean_entity, extract_json_object, fallback_entity};
pub use context::{GenerationContext, ProjectContext, TargetSeed};
pub use pipeline::{GenerationPipeline, AI_GENERATED_KEY, GENERATION_PROMPT_KEY};
pub use prompt::{build_enhancement_prompt, build_generation_prompt};
pub use provider::{GenerationParams, HttpTextProvider, ProviderConfig, TextGenerationProvider};
pub use retry::{Attempt, RetryPolicy};
