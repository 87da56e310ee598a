//! # llm-core
//!
//! Provider-agnostic abstraction over hosted text-generation services.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐      ┌─────────────────────┐
//! │  GenerativeAdvisor   │──────│   LlmProvider       │
//! │  (diabetes-risk)     │      │   (Strategy)        │
//! └──────────────────────┘      └─────────────────────┘
//!                                   ▲            ▲
//!                          OpenAiProvider   test doubles
//! ```
//!
//! The `LlmProvider` trait lets the advice layer swap between OpenAI,
//! any OpenAI-compatible gateway, or an in-process double without
//! changing advisor logic.

pub mod error;
pub mod message;
pub mod provider;

pub use error::{LlmError, Result};
pub use message::{Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider, ProviderInfo, ResponseFormat};
