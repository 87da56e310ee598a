//! Trained Model Artifact
//!
//! A fitted forest plus the metadata needed to score with it. Written once
//! by the trainer, loaded once at start, shared read-only afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, RiskError};
use crate::features::{Feature, FEATURE_COUNT};
use crate::forest::{ForestParams, RandomForest};

/// Population statistics of one feature over the training partition
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl FeatureStats {
    /// Smallest standard deviation used for z-scores
    pub const MIN_STD_DEV: f64 = 1e-9;

    pub fn from_values(values: impl Iterator<Item = f64> + Clone) -> Self {
        let mut n = 0_u32;
        let mut sum = 0.0;
        for v in values.clone() {
            n += 1;
            sum += v;
        }
        if n == 0 {
            return Self { mean: 0.0, std_dev: 1.0 };
        }
        let mean = sum / f64::from(n);
        let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / f64::from(n);
        let std_dev = variance.sqrt();
        Self {
            mean,
            std_dev: if std_dev < Self::MIN_STD_DEV { 1.0 } else { std_dev },
        }
    }

    /// Signed z-score of `value`
    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev.max(Self::MIN_STD_DEV)
    }
}

/// Everything about a model except the trees
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,

    /// Column order the forest was fitted on
    pub feature_order: [Feature; FEATURE_COUNT],

    /// Mean decrease in impurity, aligned with `feature_order`
    pub importances: [f64; FEATURE_COUNT],

    /// Training-partition statistics, aligned with `feature_order`
    pub population: [FeatureStats; FEATURE_COUNT],

    pub params: ForestParams,
    pub seed: u64,
    pub training_rows: usize,
    pub validation_rows: usize,

    /// `None` when no rows were held out
    pub validation_accuracy: Option<f64>,
}

/// A fitted classifier with its metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    metadata: ModelMetadata,
    forest: RandomForest,
}

impl TrainedModel {
    /// Assemble a model, checking that metadata and forest agree
    pub fn from_parts(metadata: ModelMetadata, forest: RandomForest) -> Result<Self> {
        let model = Self { metadata, forest };
        model.check().map_err(RiskError::ModelUnavailable)?;
        Ok(model)
    }

    pub const fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub const fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub const fn model_id(&self) -> Uuid {
        self.metadata.model_id
    }

    pub const fn feature_order(&self) -> &[Feature; FEATURE_COUNT] {
        &self.metadata.feature_order
    }

    fn position(&self, feature: Feature) -> usize {
        self.metadata
            .feature_order
            .iter()
            .position(|f| *f == feature)
            .unwrap_or(feature.index())
    }

    pub fn importance(&self, feature: Feature) -> f64 {
        self.metadata.importances[self.position(feature)]
    }

    pub fn stats(&self, feature: Feature) -> FeatureStats {
        self.metadata.population[self.position(feature)]
    }

    /// Importances re-indexed by canonical feature position
    pub fn canonical_importances(&self) -> [f64; FEATURE_COUNT] {
        Feature::ALL.map(|f| self.importance(f))
    }

    fn check(&self) -> std::result::Result<(), String> {
        let meta = &self.metadata;

        let mut seen = [false; FEATURE_COUNT];
        for feature in meta.feature_order {
            if std::mem::replace(&mut seen[feature.index()], true) {
                return Err(format!("feature `{feature}` listed twice in feature order"));
            }
        }

        if meta.importances.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("importances must be finite and non-negative".into());
        }

        for (feature, stats) in meta.feature_order.iter().zip(&meta.population) {
            if !stats.mean.is_finite() || !stats.std_dev.is_finite() || stats.std_dev <= 0.0 {
                return Err(format!("invalid population statistics for `{feature}`"));
            }
        }

        if let Some(acc) = meta.validation_accuracy {
            if !(0.0..=1.0).contains(&acc) {
                return Err(format!("validation accuracy {acc} outside [0, 1]"));
            }
        }

        Ok(())
    }

    /// Read and check an artifact. Any failure is `ModelUnavailable`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| RiskError::ModelUnavailable(format!("cannot read {}: {e}", path.display())))?;
        let model: Self = serde_json::from_slice(&bytes)
            .map_err(|e| RiskError::ModelUnavailable(format!("corrupt artifact {}: {e}", path.display())))?;
        model
            .check()
            .map_err(|e| RiskError::ModelUnavailable(format!("invalid artifact {}: {e}", path.display())))?;

        info!(
            model_id = %model.model_id(),
            trees = model.forest.len(),
            trained_at = %model.metadata.trained_at,
            "Loaded risk model from {}",
            path.display()
        );
        Ok(model)
    }

    /// Write the artifact atomically: a temporary sibling file is written
    /// and then renamed over `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = temp_path(path);
        let json = serde_json::to_vec_pretty(self)?;
        let written = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(model_id = %self.model_id(), "Saved risk model to {}", path.display());
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "model".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}
