//! Generative Advisor
//!
//! Thin adapter over an [`LlmProvider`]. The provider is treated as
//! untrusted: the call runs on its own task under a timeout, and every
//! way it can go wrong (error, hang, panic, unusable body) comes back as
//! an [`AdviceFailure`].

use async_trait::async_trait;
use llm_core::{GenerationOptions, LlmProvider, Message};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use super::prompt::{user_prompt, SYSTEM_PROMPT};
use super::{AdviceFailure, Advisor, Recommendations};
use crate::model::RiskAssessment;

pub struct GenerativeAdvisor {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    timeout: Duration,
}

impl GenerativeAdvisor {
    /// Advisor requesting JSON from the provider's default model
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        let model = provider.info().default_model;
        Self::with_options(provider, GenerationOptions::json(model), timeout)
    }

    pub fn with_options(provider: Arc<dyn LlmProvider>, options: GenerationOptions, timeout: Duration) -> Self {
        Self {
            provider,
            options,
            timeout,
        }
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Advisor for GenerativeAdvisor {
    async fn advise(&self, assessment: &RiskAssessment) -> Result<Recommendations, AdviceFailure> {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(user_prompt(assessment)),
        ];
        let provider = Arc::clone(&self.provider);
        let options = self.options.clone();

        let mut task = tokio::spawn(async move { provider.complete(&messages, &options).await });

        let completion = match timeout(self.timeout, &mut task).await {
            Err(_elapsed) => {
                task.abort();
                return Err(AdviceFailure::Timeout(self.timeout));
            }
            Ok(Err(join)) => {
                return Err(AdviceFailure::Unavailable(format!("advice task failed: {join}")));
            }
            Ok(Ok(result)) => result.inspect_err(|e| {
                debug!(
                    kind = e.kind(),
                    retryable = e.is_retryable(),
                    "Provider call failed: {}",
                    e.user_message()
                );
            })?,
        };

        debug!(
            model = %completion.model,
            truncated = completion.is_truncated(),
            chars = completion.content.len(),
            "Received generative advice"
        );

        parse_recommendations(&completion.content)
    }

    fn name(&self) -> &'static str {
        "generative"
    }
}

/// Parse a completion body into recommendations.
///
/// Tolerates a surrounding Markdown code fence; rejects anything that is
/// not the expected object or has a blank summary.
pub(crate) fn parse_recommendations(content: &str) -> Result<Recommendations, AdviceFailure> {
    let body = strip_code_fence(content);
    if body.is_empty() {
        return Err(AdviceFailure::Malformed("empty response".into()));
    }

    let recommendations: Recommendations =
        serde_json::from_str(body).map_err(|e| AdviceFailure::Malformed(e.to_string()))?;

    if recommendations.is_blank() {
        return Err(AdviceFailure::Malformed("response has no summary".into()));
    }
    Ok(recommendations)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::MockLlmProvider;
    use crate::config::ThresholdPolicy;
    use crate::fixtures;
    use crate::risk_model::RiskModel;
    use llm_core::LlmError;

    const VALID: &str = r#"{"summary": "Moderate risk.", "diet": [{"title": "Fibre", "description": "More fibre", "priority": "high"}]}"#;

    fn assessment() -> RiskAssessment {
        RiskModel::new(Arc::new(fixtures::fixed_model()), ThresholdPolicy::default())
            .predict(&fixtures::regression_inputs())
            .unwrap()
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```\n"), "{}");
    }

    #[test]
    fn test_parse_rejects_bad_bodies() {
        assert!(matches!(parse_recommendations(""), Err(AdviceFailure::Malformed(_))));
        assert!(matches!(
            parse_recommendations("Sure! Here are some tips..."),
            Err(AdviceFailure::Malformed(_))
        ));
        assert!(matches!(
            parse_recommendations(r#"{"summary": "  "}"#),
            Err(AdviceFailure::Malformed(_))
        ));
        assert!(parse_recommendations(VALID).is_ok());
    }

    #[tokio::test]
    async fn test_successful_call() {
        let provider = Arc::new(MockLlmProvider::replying(VALID));
        let advisor = GenerativeAdvisor::new(provider.clone(), Duration::from_secs(5));

        let recs = advisor.advise(&assessment()).await.unwrap();
        assert_eq!(recs.summary, "Moderate risk.");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_becomes_timeout() {
        let provider = Arc::new(MockLlmProvider::hanging(Duration::from_secs(3600)));
        let advisor = GenerativeAdvisor::new(provider, Duration::from_secs(15));

        let err = advisor.advise(&assessment()).await.unwrap_err();
        assert_eq!(err, AdviceFailure::Timeout(Duration::from_secs(15)));
    }

    #[tokio::test]
    async fn test_provider_error_is_classified() {
        let provider = Arc::new(MockLlmProvider::failing(|| LlmError::RateLimited("quota exceeded".into())));
        let advisor = GenerativeAdvisor::new(provider, Duration::from_secs(5));

        let err = advisor.advise(&assessment()).await.unwrap_err();
        assert_eq!(err.kind(), "rate_limited");
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let provider = Arc::new(MockLlmProvider::panicking());
        let advisor = GenerativeAdvisor::new(provider, Duration::from_secs(5));

        let err = advisor.advise(&assessment()).await.unwrap_err();
        assert_eq!(err.kind(), "unavailable");
    }
}
