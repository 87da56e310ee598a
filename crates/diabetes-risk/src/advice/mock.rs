//! Mock Text-Generation Provider
//!
//! Scripted in-process provider for tests and offline demos. Built for
//! this crate's tests and, for other crates, behind the `mock` feature.

use async_trait::async_trait;
use llm_core::provider::{Completion, FinishReason, ProviderInfo};
use llm_core::{GenerationOptions, LlmError, LlmProvider, Message, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

type ErrorFactory = Arc<dyn Fn() -> LlmError + Send + Sync>;

enum Script {
    Reply(String),
    Fail(ErrorFactory),
    Hang(Duration),
    Panic,
}

/// Provider that answers every request the same scripted way
pub struct MockLlmProvider {
    script: Script,
    calls: AtomicUsize,
}

impl MockLlmProvider {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answer with `content`
    pub fn replying(content: impl Into<String>) -> Self {
        Self::with_script(Script::Reply(content.into()))
    }

    /// Always fail with the error built by `make`
    pub fn failing(make: impl Fn() -> LlmError + Send + Sync + 'static) -> Self {
        Self::with_script(Script::Fail(Arc::new(make)))
    }

    /// Sleep for `delay` before answering with an empty object
    pub fn hanging(delay: Duration) -> Self {
        Self::with_script(Script::Hang(delay))
    }

    /// Panic inside `complete`
    pub fn panicking() -> Self {
        Self::with_script(Script::Panic)
    }

    /// Number of `complete` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Mock".into(),
            endpoint: "in-process".into(),
            default_model: "mock".into(),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(&self, _messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let content = match &self.script {
            Script::Reply(content) => content.clone(),
            Script::Fail(make) => return Err(make()),
            Script::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                "{}".to_string()
            }
            Script::Panic => panic!("scripted provider panic"),
        };

        Ok(Completion {
            content,
            model: options.model.clone(),
            usage: None,
            finish_reason: Some(FinishReason::Stop),
        })
    }
}
