//! Error Types

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors a text-generation provider can report
#[derive(Error, Debug)]
pub enum LlmError {
    /// Provider returned an error response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable or not responding
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Credential rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Quota exhausted or rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Request exceeded its time bound
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Response arrived but could not be interpreted
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Provider is misconfigured (bad URL, empty key, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::RateLimited(_) | Self::Timeout(_)
        )
    }

    /// Short machine-friendly tag, used in logs and provenance records
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider",
            Self::Unavailable(_) => "unavailable",
            Self::Auth(_) => "auth",
            Self::RateLimited(_) => "rate_limited",
            Self::Timeout(_) => "timeout",
            Self::Malformed(_) | Self::Json(_) => "malformed",
            Self::Config(_) => "config",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The text service encountered an error: {msg}"),
            Self::Unavailable(_) => "The text service is currently unavailable.".into(),
            Self::Auth(_) => "The text service rejected the configured credential.".into(),
            Self::RateLimited(_) => "The text service quota has been exhausted.".into(),
            Self::Timeout(_) => "The text service took too long to respond.".into(),
            Self::Malformed(_) | Self::Json(_) => "The text service returned an unreadable response.".into(),
            Self::Config(msg) => format!("The text service is misconfigured: {msg}"),
        }
    }
}
