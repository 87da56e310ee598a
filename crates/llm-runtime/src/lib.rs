//! # llm-runtime
//!
//! Runtime providers for the advice layer.
//!
//! ## Providers
//!
//! - **OpenAI** (default): chat-completions API, or any compatible gateway
//!   reachable through `OPENAI_BASE_URL`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use llm_runtime::OpenAiProvider;
//!
//! // None when OPENAI_API_KEY is not set
//! let provider = OpenAiProvider::from_env()?;
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use llm_core::{GenerationOptions, LlmError, LlmProvider, Message, Result, Role};
