//! Text-generation service abstraction
//!
//! One `generate(prompt, max_tokens) -> text` operation behind a trait,
//! with two interchangeable backends selected at construction time:
//! - Google Gemini (generateContent REST API)
//! - Anthropic Claude (Messages REST API)
//!
//! Construction fails fast when the configured provider has no credentials.
//! Calls carry an explicit deadline; a hung backend fails the request
//! instead of hanging it. Failed calls are logged and re-raised, never
//! retried here.

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Trait for text generation backends
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Render `prompt` into generated text, producing at most `max_tokens`
    /// output tokens.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Configuration {
            message: format!("Failed to create LLM HTTP client: {}", e),
        })
}

fn upstream_error(provider: &str, message: impl Into<String>) -> AppError {
    let message = message.into();
    tracing::error!(provider, error = %message, "Text generation call failed");
    AppError::UpstreamService {
        provider: provider.to_string(),
        message,
    }
}

// ============================================================================
// Gemini
// ============================================================================

/// Client for the Gemini generateContent API
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    base_url: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    pub fn new(api_key: String, model: String, temperature: f32, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            api_key,
            model,
            temperature,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": max_tokens,
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    upstream_error("gemini", "request deadline exceeded")
                } else {
                    upstream_error("gemini", format!("request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(
                "gemini",
                format!("API error {}: {}", status, body),
            ));
        }

        let parsed: GeminiResponse =
            response.json().await.map_err(|e| AppError::MalformedResponse {
                message: format!("gemini response was not decodable: {}", e),
            })?;

        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(upstream_error("gemini", "empty response"));
        }

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Anthropic
// ============================================================================

/// Client for the Anthropic Messages API
pub struct AnthropicGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    base_url: String,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicGenerator {
    pub fn new(api_key: String, model: String, temperature: f32, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            api_key,
            model,
            temperature,
            base_url: "https://api.anthropic.com/v1".to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens,
            temperature: self.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    upstream_error("anthropic", "request deadline exceeded")
                } else {
                    upstream_error("anthropic", format!("request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(
                "anthropic",
                format!("API error {}: {}", status, body),
            ));
        }

        let parsed: AnthropicResponse =
            response.json().await.map_err(|e| AppError::MalformedResponse {
                message: format!("anthropic response was not decodable: {}", e),
            })?;

        let text = parsed
            .content
            .first()
            .map(|b| b.text.clone())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(upstream_error("anthropic", "empty response"));
        }

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Mock
// ============================================================================

/// Mock generator for tests: returns a fixed response and counts calls
pub struct MockGenerator {
    response: String,
    calls: std::sync::atomic::AtomicUsize,
}

impl MockGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of generate calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-generator"
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Create a text generator for the configured provider.
///
/// Fails fast with a configuration error when the selected provider has no
/// API key, so a misconfigured service refuses to start rather than failing
/// on its first generation request.
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>> {
    match config.provider.to_lowercase().as_str() {
        "gemini" => {
            let key = config
                .gemini_api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| AppError::Configuration {
                    message: "GEMINI_API_KEY not set for provider 'gemini'".to_string(),
                })?;

            tracing::info!(model = %config.gemini_model, "Text generator initialized with Gemini");
            Ok(Arc::new(GeminiGenerator::new(
                key,
                config.gemini_model.clone(),
                config.temperature,
                config.timeout_secs,
            )?))
        }
        "anthropic" => {
            let key = config
                .anthropic_api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| AppError::Configuration {
                    message: "ANTHROPIC_API_KEY not set for provider 'anthropic'".to_string(),
                })?;

            tracing::info!(model = %config.claude_model, "Text generator initialized with Claude");
            Ok(Arc::new(AnthropicGenerator::new(
                key,
                config.claude_model.clone(),
                config.temperature,
                config.timeout_secs,
            )?))
        }
        "mock" => Ok(Arc::new(MockGenerator::new(
            "[Mock response - no LLM provider configured]",
        ))),
        other => Err(AppError::Configuration {
            message: format!(
                "Unsupported LLM provider: {}. Use 'gemini' or 'anthropic'",
                other
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(provider: &str, gemini_key: Option<&str>, anthropic_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            gemini_api_key: gemini_key.map(String::from),
            anthropic_api_key: anthropic_key.map(String::from),
            gemini_model: "gemini-2.5-flash".to_string(),
            claude_model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4000,
            temperature: 0.7,
            timeout_secs: 120,
        }
    }

    #[test]
    fn test_missing_key_fails_fast() {
        assert!(create_generator(&config_with("gemini", None, None)).is_err());
        assert!(create_generator(&config_with("anthropic", None, None)).is_err());
        assert!(create_generator(&config_with("gemini", Some(""), None)).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = create_generator(&config_with("palm", Some("k"), None)).err().unwrap();
        assert!(err.to_string().contains("Unsupported LLM provider"));
    }

    #[test]
    fn test_configured_providers_construct() {
        let gemini = create_generator(&config_with("gemini", Some("key"), None)).unwrap();
        assert_eq!(gemini.model_name(), "gemini-2.5-flash");

        let anthropic = create_generator(&config_with("anthropic", None, Some("key"))).unwrap();
        assert_eq!(anthropic.model_name(), "claude-sonnet-4-20250514");
    }

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let generator = MockGenerator::new("hello");
        assert_eq!(generator.call_count(), 0);
        let out = generator.generate("prompt", 100).await.unwrap();
        assert_eq!(out, "hello");
        assert_eq!(generator.call_count(), 1);
    }
}
