//! Text Generation Provider Strategy
//!
//! Defines a common interface for hosted text-generation services so the
//! advice layer can work with any backend without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use llm_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = OpenAiProvider::from_env()?;
//! let completion = provider.complete(&messages, &GenerationOptions::json("gpt-4o-mini")).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;

/// Requested shape of the completion body
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Provider is asked to emit a single JSON object
    JsonObject,
}

/// Configuration for a single generation request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gpt-4o-mini")
    pub model: String,

    /// Sampling temperature (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub response_format: ResponseFormat,
}

const fn default_temperature() -> f32 {
    0.4
}

const fn default_max_tokens() -> u32 {
    2048
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            response_format: ResponseFormat::Text,
        }
    }
}

impl GenerationOptions {
    /// Options asking `model` for a JSON object response
    pub fn json(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            response_format: ResponseFormat::JsonObject,
            ..Default::default()
        }
    }
}

/// Response from a completion request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if reported)
    pub usage: Option<TokenUsage>,

    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// Whether generation stopped because it ran out of tokens
    pub fn is_truncated(&self) -> bool {
        self.finish_reason == Some(FinishReason::Length)
    }
}

/// Token usage statistics
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    /// Map a provider's raw finish reason string
    pub fn parse(raw: &str) -> Self {
        match raw {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => Self::Other,
        }
    }
}

/// Provider metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "OpenAI")
    pub name: String,

    /// Endpoint the provider talks to
    pub endpoint: String,

    /// Default model used when the caller does not override it
    pub default_model: String,
}

/// Strategy trait for text-generation providers
///
/// The advice layer works exclusively through this interface.
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider information
    fn info(&self) -> ProviderInfo;

    /// Check if the provider is reachable and the credential is accepted
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from messages
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 2048);
        assert_eq!(opts.response_format, ResponseFormat::Text);
    }

    #[test]
    fn test_json_options() {
        let opts = GenerationOptions::json("some-model");
        assert_eq!(opts.model, "some-model");
        assert_eq!(opts.response_format, ResponseFormat::JsonObject);
    }

    #[test]
    fn test_finish_reason_parse() {
        assert_eq!(FinishReason::parse("length"), FinishReason::Length);
        assert_eq!(FinishReason::parse("tool_calls"), FinishReason::Other);

        let completion = Completion {
            content: String::new(),
            model: "m".into(),
            usage: None,
            finish_reason: Some(FinishReason::Length),
        };
        assert!(completion.is_truncated());
    }
}
