//! Text-generation provider seam and the HTTP implementation.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tuning parameters for one provider call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_output_tokens: 2048,
        }
    }
}

/// A text-generation backend. The engine assumes replies may wrap the
/// requested JSON in extra prose and defends against that downstream.
#[async_trait]
pub trait TextGenerationProvider: Send + Sync {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String>;
}

/// Configuration for the hosted text-generation API.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: "gemini-1.5-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1/models".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Provider backed by the Gemini `generateContent` REST endpoint.
pub struct HttpTextProvider {
    client: Client,
    config: ProviderConfig,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig")]
    generation_config: RequestGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: RequestContent,
}

impl HttpTextProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(anyhow!("generation provider API key is not configured"));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextGenerationProvider for HttpTextProvider {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: RequestGenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        };

        debug!(model = %self.config.model, "calling generation provider");

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        );
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("failed to send generation request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("provider error {status}: {error_text}"));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .context("failed to parse provider response")?;

        let candidate = reply
            .candidates
            .first()
            .ok_or_else(|| anyhow!("no candidates in provider response"))?;
        let part = candidate
            .content
            .parts
            .first()
            .ok_or_else(|| anyhow!("no parts in provider response"))?;

        Ok(part.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_requires_api_key() {
        let config = ProviderConfig {
            api_key: String::new(),
            ..ProviderConfig::default()
        };
        assert!(HttpTextProvider::new(config).is_err());
    }

    #[test]
    fn request_serializes_with_camel_case_config() {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: "hello".into(),
                }],
            }],
            generation_config: RequestGenerationConfig {
                temperature: 0.5,
                max_output_tokens: 1024,
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"maxOutputTokens\":1024"));
    }
}
