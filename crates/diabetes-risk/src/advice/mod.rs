//! Recommendation Generation
//!
//! ```text
//!                    ┌──────────────────────────┐
//! RiskAssessment ──▶ │   RecommendationPolicy   │ ──▶ AdviceResult
//!                    └────┬────────────────┬────┘
//!                         │ configured?    │ otherwise / on failure
//!                         ▼                ▼
//!                GenerativeAdvisor   RuleBasedAdvisor
//!                (LlmProvider,       (deterministic,
//!                 bounded time)       never fails)
//! ```

mod generative;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod policy;
mod prompt;
mod rules;

pub use generative::GenerativeAdvisor;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockLlmProvider;
pub use policy::{PolicyState, PolicyTrace, RecommendationPolicy};
pub use rules::RuleBasedAdvisor;

use async_trait::async_trait;
use llm_core::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use thiserror::Error;

use crate::model::RiskAssessment;

/// Advisor trait (Strategy pattern)
///
/// The policy only sees this interface; implement it for any source of
/// advice text.
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Produce recommendations for one assessment
    async fn advise(&self, assessment: &RiskAssessment) -> Result<Recommendations, AdviceFailure>;

    /// Advisor name for logs
    fn name(&self) -> &'static str;
}

/// Why an advisor could not produce advice
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdviceFailure {
    #[error("advice service timed out after {0:?}")]
    Timeout(Duration),

    #[error("advice service rejected the credential: {0}")]
    Auth(String),

    #[error("advice service quota or rate limit hit: {0}")]
    RateLimited(String),

    #[error("advice service returned an unusable response: {0}")]
    Malformed(String),

    #[error("advice service unavailable: {0}")]
    Unavailable(String),
}

impl AdviceFailure {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Auth(_) => "auth",
            Self::RateLimited(_) => "rate_limited",
            Self::Malformed(_) => "malformed",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl From<LlmError> for AdviceFailure {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(after) => Self::Timeout(after),
            LlmError::Auth(msg) => Self::Auth(msg),
            LlmError::RateLimited(msg) => Self::RateLimited(msg),
            LlmError::Malformed(msg) => Self::Malformed(msg),
            LlmError::Json(e) => Self::Malformed(e.to_string()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Where the advice text came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceSource {
    Generated,
    Fallback,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[default]
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// A single actionable tip
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

impl Recommendation {
    pub fn new(title: impl Into<String>, description: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
        }
    }
}

/// Structured advice, grouped by category
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub summary: String,

    #[serde(default, alias = "diet_recommendations")]
    pub diet: Vec<Recommendation>,

    #[serde(default, alias = "exercise_recommendations")]
    pub exercise: Vec<Recommendation>,

    #[serde(default, alias = "lifestyle_recommendations")]
    pub lifestyle: Vec<Recommendation>,

    #[serde(default, alias = "medical_advice")]
    pub medical: Vec<Recommendation>,

    #[serde(default)]
    pub warning_signs: Vec<String>,

    #[serde(default)]
    pub positive_factors: Vec<String>,
}

impl Recommendations {
    /// True when there is nothing worth showing
    pub fn is_blank(&self) -> bool {
        self.summary.trim().is_empty()
    }

    /// All tips across categories
    pub fn all(&self) -> impl Iterator<Item = &Recommendation> {
        self.diet
            .iter()
            .chain(&self.exercise)
            .chain(&self.lifestyle)
            .chain(&self.medical)
    }

    /// Plain-text rendering
    pub fn render(&self) -> String {
        let mut out = self.summary.trim().to_string();

        let sections = [
            ("Diet", &self.diet),
            ("Exercise", &self.exercise),
            ("Lifestyle", &self.lifestyle),
            ("Medical", &self.medical),
        ];
        for (heading, tips) in sections {
            if tips.is_empty() {
                continue;
            }
            let _ = write!(out, "\n\n{heading}:");
            for tip in tips {
                let _ = write!(
                    out,
                    "\n- [{}] {}: {}",
                    tip.priority.as_str(),
                    tip.title.trim(),
                    tip.description.trim()
                );
            }
        }

        for (heading, items) in [
            ("Warning signs to watch for", &self.warning_signs),
            ("Positive factors", &self.positive_factors),
        ] {
            if items.is_empty() {
                continue;
            }
            let _ = write!(out, "\n\n{heading}:");
            for item in items {
                let _ = write!(out, "\n- {}", item.trim());
            }
        }

        out
    }
}

/// Advice handed to the presentation layer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdviceResult {
    /// Rendered advice, never empty
    pub text: String,

    pub source: AdviceSource,

    pub recommendations: Recommendations,

    /// Why the generative path was not used, if it was attempted and failed
    pub fallback_reason: Option<String>,

    pub trace: PolicyTrace,
}
