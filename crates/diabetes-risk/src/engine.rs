//! Risk Engine
//!
//! The single entry point for the presentation layer: one raw input
//! mapping in, one assessment plus one piece of advice out.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::advice::{AdviceResult, RecommendationPolicy};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::features::{validate, FeatureVector, RawInputs};
use crate::intake::parse_lab_sheet;
use crate::model::RiskAssessment;
use crate::risk_model::RiskModel;
use llm_core::LlmProvider;

/// Both outputs of one request
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssessmentOutcome {
    pub risk: RiskAssessment,
    pub advice: AdviceResult,
}

/// Shared, read-only engine. Cloning is cheap.
#[derive(Clone)]
pub struct RiskEngine {
    model: Arc<RiskModel>,
    policy: Arc<RecommendationPolicy>,
}

impl RiskEngine {
    pub fn new(model: Arc<RiskModel>, policy: Arc<RecommendationPolicy>) -> Self {
        Self { model, policy }
    }

    /// Wire an engine from configuration.
    ///
    /// A missing or corrupt artifact does not stop start-up; requests then
    /// fail with `ModelUnavailable` until a model is in place.
    pub fn from_config(config: &EngineConfig, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        let model = RiskModel::load(&config.model_path, config.thresholds).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Starting without a risk model");
            RiskModel::unloaded(config.thresholds)
        });
        let policy = RecommendationPolicy::from_provider(provider, config.advice_timeout());

        info!(
            model_loaded = model.is_loaded(),
            generative = policy.has_generative(),
            "Risk engine ready"
        );
        Self::new(Arc::new(model), Arc::new(policy))
    }

    pub fn model(&self) -> &RiskModel {
        &self.model
    }

    pub fn policy(&self) -> &RecommendationPolicy {
        &self.policy
    }

    /// validate → predict → generate
    #[instrument(skip_all)]
    pub async fn assess(&self, raw: &RawInputs) -> Result<AssessmentOutcome> {
        let features = validate(raw)?;
        self.assess_features(&features).await
    }

    /// Score an already-validated vector
    pub async fn assess_features(&self, features: &FeatureVector) -> Result<AssessmentOutcome> {
        let risk = self.model.predict(features)?;
        let advice = self.policy.generate(&risk).await;

        info!(
            probability = risk.probability,
            label = %risk.label,
            source = ?advice.source,
            "Assessment complete"
        );
        Ok(AssessmentOutcome { risk, advice })
    }

    /// Parse a CSV lab sheet, then assess it
    pub async fn assess_lab_sheet(&self, text: &str) -> Result<AssessmentOutcome> {
        let sheet = parse_lab_sheet(text)?;
        let missing = sheet.missing();
        if !missing.is_empty() {
            tracing::warn!(?missing, rows = sheet.rows, "Lab sheet lacks inputs");
        }
        for warning in sheet.warnings() {
            tracing::warn!(%warning, "Unusual lab value");
        }
        self.assess(&sheet.inputs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::{AdviceSource, MockLlmProvider};
    use crate::config::ThresholdPolicy;
    use crate::error::{RiskError, ValidationError};
    use crate::features::Feature;
    use crate::fixtures;
    use crate::model::RiskLabel;
    use llm_core::LlmError;
    use std::time::Duration;

    fn engine(policy: RecommendationPolicy) -> RiskEngine {
        let model = RiskModel::new(Arc::new(fixtures::fixed_model()), ThresholdPolicy::default());
        RiskEngine::new(Arc::new(model), Arc::new(policy))
    }

    #[tokio::test]
    async fn test_low_risk_end_to_end() {
        let outcome = engine(RecommendationPolicy::fallback_only())
            .assess(&fixtures::low_risk_raw())
            .await
            .unwrap();

        assert_eq!(outcome.risk.label, RiskLabel::Low);
        assert!(outcome.risk.findings.is_empty());
        assert_eq!(outcome.advice.source, AdviceSource::Fallback);
        assert!(outcome.advice.text.contains("Prevention"));
    }

    #[tokio::test]
    async fn test_high_risk_end_to_end() {
        let outcome = engine(RecommendationPolicy::fallback_only())
            .assess(&fixtures::high_risk_raw())
            .await
            .unwrap();

        assert_eq!(outcome.risk.label, RiskLabel::High);
        let top: Vec<Feature> = outcome.risk.top_factors(3).collect();
        assert_eq!(top, vec![Feature::Glucose, Feature::Bmi, Feature::Age]);
    }

    #[tokio::test]
    async fn test_validation_error_propagates() {
        let mut raw = fixtures::low_risk_raw();
        raw.insert("glucose", -10);

        let err = engine(RecommendationPolicy::fallback_only())
            .assess(&raw)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RiskError::Validation(ValidationError::OutOfRange { field: "glucose", .. })
        ));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_unloaded_model_is_fatal() {
        let engine = RiskEngine::new(
            Arc::new(RiskModel::unloaded(ThresholdPolicy::default())),
            Arc::new(RecommendationPolicy::fallback_only()),
        );
        let err = engine.assess(&fixtures::low_risk_raw()).await.unwrap_err();
        assert!(matches!(err, RiskError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_advice_failure_never_surfaces() {
        let provider: Arc<dyn LlmProvider> =
            Arc::new(MockLlmProvider::failing(|| LlmError::Unavailable("connection refused".into())));
        let policy = RecommendationPolicy::from_provider(Some(provider), Duration::from_secs(1));

        let outcome = engine(policy).assess(&fixtures::high_risk_raw()).await.unwrap();
        assert_eq!(outcome.advice.source, AdviceSource::Fallback);
        assert!(outcome.advice.fallback_reason.is_some());
    }

    #[tokio::test]
    async fn test_lab_sheet_end_to_end() {
        let sheet = "\
date,glucose,bp,insulin,age,weight,height,pregnancies,skin_thickness,pedigree
2024-05-01,190,72,120,60,103.5,1.65,3,25,0.45
";
        let outcome = engine(RecommendationPolicy::fallback_only())
            .assess_lab_sheet(sheet)
            .await
            .unwrap();
        assert_eq!(outcome.risk.label, RiskLabel::High);
    }

    #[tokio::test]
    async fn test_missing_artifact_starts_unloaded() {
        let config = EngineConfig {
            model_path: std::env::temp_dir().join("diabetes-risk-absent").join("model.json"),
            ..EngineConfig::default()
        };
        let engine = RiskEngine::from_config(&config, None);
        assert!(!engine.model().is_loaded());
        assert!(!engine.policy().has_generative());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_are_independent() {
        let engine = engine(RecommendationPolicy::fallback_only());
        let expected = engine.assess(&fixtures::high_risk_raw()).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    let raw = if i % 2 == 0 {
                        fixtures::high_risk_raw()
                    } else {
                        fixtures::low_risk_raw()
                    };
                    (i, engine.assess(&raw).await.unwrap())
                })
            })
            .collect();

        for handle in handles {
            let (i, outcome) = handle.await.unwrap();
            if i % 2 == 0 {
                assert_eq!(outcome, expected);
            } else {
                assert_eq!(outcome.risk.label, RiskLabel::Low);
            }
        }
    }
}
