//! Recommendation Policy
//!
//! ```text
//!  Idle ──(generative configured)──▶ AttemptingGenerative ──ok──▶ Done [generated]
//!   │                                        │
//!   │ (no credential)                        │ timeout / auth / quota / malformed
//!   ▼                                        ▼
//!  FallingBack ◀─────────────────────────────┘
//!   │
//!   ▼
//!  Done [fallback]
//! ```
//!
//! One attempt per request, no retries. `generate` never fails.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{AdviceFailure, AdviceResult, AdviceSource, Advisor, GenerativeAdvisor, RuleBasedAdvisor};
use crate::model::RiskAssessment;
use llm_core::LlmProvider;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    Idle,
    AttemptingGenerative,
    FallingBack,
    Done,
}

impl fmt::Display for PolicyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AttemptingGenerative => "attempting_generative",
            Self::FallingBack => "falling_back",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// States visited while producing one piece of advice
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PolicyTrace(Vec<PolicyState>);

impl PolicyTrace {
    fn start() -> Self {
        Self(vec![PolicyState::Idle])
    }

    fn enter(&mut self, state: PolicyState) {
        if let Some(from) = self.0.last() {
            debug!(from = %from, to = %state, "Advice policy transition");
        }
        self.0.push(state);
    }

    pub fn states(&self) -> &[PolicyState] {
        &self.0
    }

    pub fn attempted_generative(&self) -> bool {
        self.0.contains(&PolicyState::AttemptingGenerative)
    }
}

pub struct RecommendationPolicy {
    generative: Option<Arc<dyn Advisor>>,
    fallback: RuleBasedAdvisor,
}

impl RecommendationPolicy {
    pub fn new(generative: Option<Arc<dyn Advisor>>) -> Self {
        Self {
            generative,
            fallback: RuleBasedAdvisor::new(),
        }
    }

    /// Rule-based advice only
    pub fn fallback_only() -> Self {
        Self::new(None)
    }

    /// Generative advice through `provider` when present, bounded by `timeout`
    pub fn from_provider(provider: Option<Arc<dyn LlmProvider>>, timeout: Duration) -> Self {
        let generative = provider.map(|p| Arc::new(GenerativeAdvisor::new(p, timeout)) as Arc<dyn Advisor>);
        Self::new(generative)
    }

    pub fn has_generative(&self) -> bool {
        self.generative.is_some()
    }

    /// Turn an assessment into advice
    pub async fn generate(&self, assessment: &RiskAssessment) -> AdviceResult {
        let mut trace = PolicyTrace::start();

        let failure = match &self.generative {
            Some(advisor) => {
                trace.enter(PolicyState::AttemptingGenerative);
                let outcome = advisor.advise(assessment).await.and_then(|recs| {
                    if recs.is_blank() {
                        Err(AdviceFailure::Malformed("advisor returned blank advice".into()))
                    } else {
                        Ok(recs)
                    }
                });

                match outcome {
                    Ok(recommendations) => {
                        trace.enter(PolicyState::Done);
                        info!(advisor = advisor.name(), label = %assessment.label, "Generated advice");
                        return AdviceResult {
                            text: recommendations.render(),
                            source: AdviceSource::Generated,
                            recommendations,
                            fallback_reason: None,
                            trace,
                        };
                    }
                    Err(failure) => {
                        warn!(
                            advisor = advisor.name(),
                            kind = failure.kind(),
                            error = %failure,
                            "Generative advice failed, falling back to rules"
                        );
                        Some(failure)
                    }
                }
            }
            None => {
                debug!("No generative advisor configured");
                None
            }
        };

        trace.enter(PolicyState::FallingBack);
        let recommendations = self.fallback.recommend(assessment);
        trace.enter(PolicyState::Done);

        AdviceResult {
            text: recommendations.render(),
            source: AdviceSource::Fallback,
            recommendations,
            fallback_reason: failure.map(|f| f.to_string()),
            trace,
        }
    }
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self::fallback_only()
    }
}
