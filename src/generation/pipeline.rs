//! The generation pipeline: prompt, provider, retries, cleaning, fallback.
//!
//! `generate_entity` is deliberately infallible. A creative-writing session
//! should never surface a provider outage to the author mid-flow; when the
//! retry budget is spent the pipeline hands back the configuration's
//! deterministic fallback entity instead.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::EntityConfig;
use crate::error::GenerationError;

use super::clean::{clean_entity, extract_json_object, fallback_entity};
use super::context::GenerationContext;
use super::prompt::{build_enhancement_prompt, build_generation_prompt};
use super::provider::{GenerationParams, TextGenerationProvider};
use super::retry::{Attempt, RetryPolicy};

/// Marker key set on entities produced by a successful provider call.
pub const AI_GENERATED_KEY: &str = "_aiGenerated";
/// Marker key recording the prompt that produced the entity.
pub const GENERATION_PROMPT_KEY: &str = "_generationPrompt";

pub struct GenerationPipeline {
    provider: Arc<dyn TextGenerationProvider>,
}

impl GenerationPipeline {
    pub fn new(provider: Arc<dyn TextGenerationProvider>) -> Self {
        Self { provider }
    }

    /// Generate a complete entity for `config`. Retries transient failures
    /// with linear backoff and falls back to a deterministic entity once the
    /// configured budget is exhausted; the returned map always contains every
    /// configured field.
    ///
    /// Provenance markers are set only when a provider reply survived
    /// parsing; fallback entities carry neither marker.
    pub async fn generate_entity(
        &self,
        config: &EntityConfig,
        context: &GenerationContext,
        custom_prompt: Option<&str>,
    ) -> HashMap<String, Value> {
        let prompt = build_generation_prompt(config, context, custom_prompt);
        let params = GenerationParams {
            temperature: config.generation.temperature,
            ..GenerationParams::default()
        };
        let policy = RetryPolicy::new(config.generation.max_retries);

        for attempt in 1..=policy.max_attempts {
            debug!(entity_type = %config.entity_type, attempt, "generation attempt");

            match self.attempt(&prompt, params).await {
                Ok(parsed) => {
                    let mut entity = clean_entity(config, &parsed);
                    entity.insert(AI_GENERATED_KEY.to_string(), Value::Bool(true));
                    entity.insert(
                        GENERATION_PROMPT_KEY.to_string(),
                        Value::String(prompt.clone()),
                    );
                    info!(entity_type = %config.entity_type, attempt, "generation succeeded");
                    return entity;
                }
                Err(err) => {
                    warn!(
                        entity_type = %config.entity_type,
                        attempt,
                        error = %err,
                        "generation attempt failed"
                    );
                    match policy.after_failure::<()>(attempt) {
                        Attempt::Retry(delay) => tokio::time::sleep(delay).await,
                        Attempt::Exhausted => break,
                        Attempt::Success(_) => unreachable!(),
                    }
                }
            }
        }

        warn!(entity_type = %config.entity_type, "generation exhausted, using fallback");
        fallback_entity(config, context)
    }

    async fn attempt(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<Value, GenerationError> {
        let reply = self
            .provider
            .generate(prompt, params)
            .await
            .map_err(GenerationError::Provider)?;
        let json = extract_json_object(&reply).ok_or(GenerationError::NoJsonObject)?;
        let parsed = serde_json::from_str(json).map_err(GenerationError::Parse)?;
        Ok(parsed)
    }

    /// Regenerate a single field in the context of the rest of the entity.
    /// Returns the current value unchanged, without calling the provider,
    /// when the field is unknown or not enhanceable; a single provider call
    /// otherwise, degrading to the current value on any failure.
    pub async fn enhance_field(
        &self,
        config: &EntityConfig,
        field_key: &str,
        current: &str,
        entity_data: &HashMap<String, Value>,
        context: &GenerationContext,
    ) -> String {
        let field = match config.field(field_key) {
            Some(field) if field.ai_enhanceable => field,
            _ => {
                debug!(field_key, "field not enhanceable, keeping current value");
                return current.to_string();
            }
        };

        let rule = config.enhancement_rule(field_key);
        let prompt = build_enhancement_prompt(field, rule, current, entity_data, context);
        let params = GenerationParams {
            temperature: config.generation.temperature,
            ..GenerationParams::default()
        };

        match self.provider.generate(&prompt, params).await {
            Ok(reply) => {
                let cleaned = clean_enhanced_text(&reply, field_key);
                if cleaned.is_empty() {
                    current.to_string()
                } else {
                    cleaned
                }
            }
            Err(err) => {
                warn!(field_key, error = %err, "enhancement failed, keeping current value");
                current.to_string()
            }
        }
    }
}

/// Trim a reply down to the enhanced text: strip wrapping quotes and a
/// leading `fieldKey:` echo, both of which providers add despite the
/// prompt's instructions.
fn clean_enhanced_text(reply: &str, field_key: &str) -> String {
    let mut text = reply.trim();

    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        text = &text[1..text.len() - 1];
    }

    let lowered = text.to_lowercase();
    let prefix = format!("{}:", field_key.to_lowercase());
    if lowered.starts_with(&prefix) {
        text = text[prefix.len()..].trim_start();
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin;
    use crate::generation::context::ProjectContext;
    use anyhow::anyhow;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that replays a fixed script of replies.
    struct ScriptedProvider {
        replies: Vec<anyhow::Result<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<anyhow::Result<String>>) -> Self {
            Self {
                replies,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl TextGenerationProvider for ScriptedProvider {
        async fn generate(
            &self,
            _prompt: &str,
            _params: GenerationParams,
        ) -> anyhow::Result<String> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(index) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(err)) => Err(anyhow!(err.to_string())),
                None => Err(anyhow!("script exhausted")),
            }
        }
    }

    fn context() -> GenerationContext {
        GenerationContext::new(ProjectContext::new("p1", "Shattered Realms", "novel"))
    }

    fn fast_config() -> crate::config::EntityConfig {
        // Keep retries but avoid sleeping through real backoff in tests.
        let mut config = builtin::character();
        config.generation.max_retries = 2;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_sets_provenance() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            r#"Here you go: {"name": "Aria", "role": "Protagonist", "age": 27}"#.to_string(),
        )]));
        let pipeline = GenerationPipeline::new(provider.clone());

        let entity = pipeline.generate_entity(&fast_config(), &context(), None).await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(entity["name"], json!("Aria"));
        assert_eq!(entity["age"], json!(27));
        assert_eq!(entity[AI_GENERATED_KEY], json!(true));
        assert!(entity.contains_key(GENERATION_PROMPT_KEY));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_replies_retry_then_succeed() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("no json at all".to_string()),
            Ok(r#"{"name": "Bren"}"#.to_string()),
        ]));
        let pipeline = GenerationPipeline::new(provider.clone());

        let entity = pipeline.generate_entity(&fast_config(), &context(), None).await;
        assert_eq!(provider.calls(), 2);
        assert_eq!(entity["name"], json!("Bren"));
        assert_eq!(entity[AI_GENERATED_KEY], json!(true));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_fallback_after_exact_budget() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(anyhow!("timeout")),
            Err(anyhow!("timeout")),
        ]));
        let pipeline = GenerationPipeline::new(provider.clone());

        let entity = pipeline.generate_entity(&fast_config(), &context(), None).await;
        assert_eq!(provider.calls(), 2);
        assert_eq!(entity["name"], json!("New Character"));
        assert_eq!(entity["role"], json!("Supporting"));
        // Fallback entities carry no provenance markers.
        assert!(!entity.contains_key(AI_GENERATED_KEY));
        assert!(!entity.contains_key(GENERATION_PROMPT_KEY));
    }

    #[tokio::test]
    async fn enhance_skips_provider_for_ineligible_field() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("unused".to_string())]));
        let pipeline = GenerationPipeline::new(provider.clone());
        let config = builtin::character();
        let entity = HashMap::new();

        // `alive` is a boolean and not flagged enhanceable.
        let out = pipeline
            .enhance_field(&config, "alive", "true", &entity, &context())
            .await;
        assert_eq!(out, "true");
        assert_eq!(provider.calls(), 0);

        let out = pipeline
            .enhance_field(&config, "no-such-field", "x", &entity, &context())
            .await;
        assert_eq!(out, "x");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn enhance_strips_quotes_and_field_echo() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "\"personality: Fierce and loyal.\"".to_string(),
        )]));
        let pipeline = GenerationPipeline::new(provider);
        let config = builtin::character();
        let mut entity = HashMap::new();
        entity.insert("name".to_string(), json!("Aria"));

        let out = pipeline
            .enhance_field(&config, "personality", "Loyal.", &entity, &context())
            .await;
        assert_eq!(out, "Fierce and loyal.");
    }

    #[tokio::test]
    async fn enhance_keeps_current_on_provider_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(anyhow!("down"))]));
        let pipeline = GenerationPipeline::new(provider.clone());
        let config = builtin::character();
        let entity = HashMap::new();

        let out = pipeline
            .enhance_field(&config, "personality", "Loyal.", &entity, &context())
            .await;
        assert_eq!(out, "Loyal.");
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn enhanced_text_cleaning() {
        assert_eq!(clean_enhanced_text("  plain text  ", "backstory"), "plain text");
        assert_eq!(clean_enhanced_text("\"quoted\"", "backstory"), "quoted");
        assert_eq!(
            clean_enhanced_text("Backstory: Born at sea.", "backstory"),
            "Born at sea."
        );
        assert_eq!(clean_enhanced_text("\"\"", "backstory"), "");
    }
}
