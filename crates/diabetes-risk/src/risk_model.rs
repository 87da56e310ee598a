//! Risk Model
//!
//! Wraps a shared [`TrainedModel`] and a [`ThresholdPolicy`]. Prediction
//! is a pure function of the feature vector: no locks, no interior
//! mutability, safe to call from any number of tasks at once.

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::artifact::TrainedModel;
use crate::clinical;
use crate::config::ThresholdPolicy;
use crate::error::{Result, RiskError};
use crate::features::{Feature, FeatureVector};
use crate::model::{ContributingFactor, RiskAssessment};

#[derive(Clone, Debug)]
pub struct RiskModel {
    model: Option<Arc<TrainedModel>>,
    thresholds: ThresholdPolicy,
}

impl RiskModel {
    pub fn new(model: Arc<TrainedModel>, thresholds: ThresholdPolicy) -> Self {
        Self {
            model: Some(model),
            thresholds,
        }
    }

    /// A model that rejects every prediction with `ModelUnavailable`
    pub const fn unloaded(thresholds: ThresholdPolicy) -> Self {
        Self {
            model: None,
            thresholds,
        }
    }

    pub fn load(path: impl AsRef<Path>, thresholds: ThresholdPolicy) -> Result<Self> {
        let model = TrainedModel::load(path)?;
        Ok(Self::new(Arc::new(model), thresholds))
    }

    pub const fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn trained_model(&self) -> Option<&TrainedModel> {
        self.model.as_deref()
    }

    pub const fn thresholds(&self) -> &ThresholdPolicy {
        &self.thresholds
    }

    /// Score a validated feature vector
    pub fn predict(&self, inputs: &FeatureVector) -> Result<RiskAssessment> {
        let model = self
            .model
            .as_deref()
            .ok_or_else(|| RiskError::ModelUnavailable("no trained model has been loaded".into()))?;

        let row = inputs.ordered(model.feature_order());
        let probability = model.forest().predict_proba(&row);
        let label = self.thresholds.classify(probability);
        let contributing_factors = contributing_factors(model, inputs);
        let findings = clinical::findings(inputs, &model.canonical_importances());

        debug!(
            model_id = %model.model_id(),
            probability,
            %label,
            top_factor = %contributing_factors[0].feature,
            findings = findings.len(),
            "Scored feature vector"
        );

        Ok(RiskAssessment {
            probability,
            label,
            contributing_factors,
            findings,
            inputs: *inputs,
        })
    }
}

/// Per-individual attribution: importance × |z-score|, normalised.
///
/// Falls back to the static importances when every input sits exactly on
/// the population mean. Sorted by weight, ties in canonical order.
pub fn contributing_factors(model: &TrainedModel, inputs: &FeatureVector) -> Vec<ContributingFactor> {
    let mut factors: Vec<ContributingFactor> = Feature::ALL
        .iter()
        .map(|&feature| {
            let deviation = model.stats(feature).z_score(inputs.get(feature));
            ContributingFactor {
                feature,
                weight: model.importance(feature) * deviation.abs(),
                deviation,
            }
        })
        .collect();

    let mut total: f64 = factors.iter().map(|f| f.weight).sum();
    if total <= 0.0 {
        for factor in &mut factors {
            factor.weight = model.importance(factor.feature);
        }
        total = factors.iter().map(|f| f.weight).sum();
    }

    #[allow(clippy::cast_precision_loss)]
    let uniform = 1.0 / factors.len() as f64;
    for factor in &mut factors {
        factor.weight = if total > 0.0 { factor.weight / total } else { uniform };
    }

    factors.sort_by(|a, b| b.weight.total_cmp(&a.weight).then(a.feature.cmp(&b.feature)));
    factors
}
