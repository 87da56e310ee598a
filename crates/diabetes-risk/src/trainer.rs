//! Offline Model Training
//!
//! ```text
//! Dataset ──▶ stratified seeded split ──┬──▶ training rows ──▶ RandomForest::fit
//!                                       │                       │
//!                                       └──▶ validation rows ◀──┘ accuracy
//! ```
//!
//! Training either yields a complete [`TrainedModel`] or an error; an
//! artifact is only written after training succeeded.

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::artifact::{FeatureStats, ModelMetadata, TrainedModel};
use crate::config::TrainerConfig;
use crate::dataset::Dataset;
use crate::error::{Result, RiskError, TrainingError};
use crate::features::{Feature, FEATURE_COUNT};
use crate::forest::{DecisionTree, RandomForest, Row};

/// Summary of a training run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainingReport {
    pub model_id: Uuid,
    pub training_rows: usize,
    pub validation_rows: usize,
    pub validation_accuracy: Option<f64>,

    /// Most important first
    pub importances: Vec<(Feature, f64)>,

    /// Deepest tree in the fitted forest
    pub max_tree_depth: usize,

    pub elapsed_ms: u128,
}

#[derive(Clone, Debug, Default)]
pub struct ModelTrainer {
    config: TrainerConfig,
}

impl ModelTrainer {
    pub const fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit a model on `dataset`
    pub fn train(&self, dataset: &Dataset) -> std::result::Result<(TrainedModel, TrainingReport), TrainingError> {
        let started = Instant::now();
        self.config
            .validate()
            .map_err(|e| TrainingError::InvalidConfig(e.to_string()))?;

        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        let positives = dataset.positives();
        if positives == 0 || positives == dataset.len() {
            return Err(TrainingError::SingleClass {
                outcome: u8::from(positives > 0),
                rows: dataset.len(),
            });
        }

        let (train_idx, valid_idx) = self.split(dataset);
        let records = dataset.records();
        let rows: Vec<Row> = train_idx.iter().map(|&i| records[i].features).collect();
        let labels: Vec<bool> = train_idx.iter().map(|&i| records[i].outcome).collect();

        let population: [FeatureStats; FEATURE_COUNT] =
            std::array::from_fn(|col| FeatureStats::from_values(rows.iter().map(move |r| r[col])));

        let (forest, importances) = RandomForest::fit(&rows, &labels, &self.config.forest, self.config.seed);

        let validation_accuracy = (!valid_idx.is_empty()).then(|| {
            let correct = valid_idx
                .iter()
                .filter(|&&i| forest.predict(&records[i].features) == records[i].outcome)
                .count();
            #[allow(clippy::cast_precision_loss)]
            let accuracy = correct as f64 / valid_idx.len() as f64;
            accuracy
        });

        let metadata = ModelMetadata {
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            feature_order: Feature::ALL,
            importances,
            population,
            params: self.config.forest.clone(),
            seed: self.config.seed,
            training_rows: train_idx.len(),
            validation_rows: valid_idx.len(),
            validation_accuracy,
        };

        let model = TrainedModel::from_parts(metadata, forest)
            .map_err(|e| TrainingError::InvalidConfig(e.to_string()))?;

        let mut ranked: Vec<(Feature, f64)> = Feature::ALL.iter().map(|&f| (f, model.importance(f))).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let report = TrainingReport {
            model_id: model.model_id(),
            training_rows: train_idx.len(),
            validation_rows: valid_idx.len(),
            validation_accuracy,
            importances: ranked,
            max_tree_depth: model.forest().trees().iter().map(DecisionTree::depth).max().unwrap_or(0),
            elapsed_ms: started.elapsed().as_millis(),
        };

        info!(
            model_id = %report.model_id,
            training_rows = report.training_rows,
            validation_rows = report.validation_rows,
            accuracy = ?report.validation_accuracy,
            trees = model.forest().len(),
            max_tree_depth = report.max_tree_depth,
            elapsed_ms = report.elapsed_ms,
            "Trained risk model"
        );

        Ok((model, report))
    }

    /// Train, then write the artifact to `path`
    pub fn train_and_persist(&self, dataset: &Dataset, path: impl AsRef<Path>) -> Result<TrainingReport> {
        let (model, report) = self.train(dataset).map_err(RiskError::Training)?;
        model.save(path)?;
        Ok(report)
    }

    /// Stratified split: each class is shuffled with the configured seed
    /// and `floor(count × fraction)` of it is held out.
    fn split(&self, dataset: &Dataset) -> (Vec<usize>, Vec<usize>) {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut train = Vec::with_capacity(dataset.len());
        let mut valid = Vec::new();

        for outcome in [false, true] {
            let mut class: Vec<usize> = dataset
                .records()
                .iter()
                .enumerate()
                .filter(|(_, r)| r.outcome == outcome)
                .map(|(i, _)| i)
                .collect();
            class.shuffle(&mut rng);

            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss
            )]
            let held_out = (class.len() as f64 * self.config.validation_fraction).floor() as usize;
            valid.extend_from_slice(&class[..held_out]);
            train.extend_from_slice(&class[held_out..]);
        }

        train.sort_unstable();
        valid.sort_unstable();
        (train, valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{synthetic_cohort, LabeledRecord, COHORT_SIZE};
    use crate::config::ThresholdPolicy;
    use crate::fixtures;
    use crate::forest::ForestParams;
    use crate::model::RiskLabel;
    use crate::risk_model::RiskModel;
    use std::sync::Arc;

    fn quick_trainer() -> ModelTrainer {
        ModelTrainer::new(TrainerConfig {
            forest: ForestParams {
                n_trees: 25,
                ..ForestParams::default()
            },
            ..TrainerConfig::default()
        })
    }

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("diabetes-risk-trainer-{}", Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_training_is_reproducible() {
        let cohort = synthetic_cohort(300, 42);
        let trainer = quick_trainer();

        let (a, report_a) = trainer.train(&cohort).unwrap();
        let (b, report_b) = trainer.train(&cohort).unwrap();

        assert_eq!(a.forest(), b.forest());
        assert_eq!(a.metadata().importances, b.metadata().importances);
        assert_eq!(report_a.validation_accuracy, report_b.validation_accuracy);
        assert_ne!(a.model_id(), b.model_id());
    }

    #[test]
    fn test_accuracy_well_above_chance() {
        let cohort = synthetic_cohort(COHORT_SIZE, 42);
        let (model, report) = quick_trainer().train(&cohort).unwrap();

        let accuracy = report.validation_accuracy.unwrap();
        assert!(accuracy > 0.8, "validation accuracy {accuracy}");
        assert_eq!(report.training_rows + report.validation_rows, COHORT_SIZE);

        let total: f64 = model.metadata().importances.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(report.importances.len(), FEATURE_COUNT);
        assert!(report.max_tree_depth > 0);
        assert!(report.max_tree_depth <= ForestParams::default().max_depth);
    }

    #[test]
    fn test_trained_model_scenarios() {
        let (model, _) = ModelTrainer::default()
            .train(&synthetic_cohort(COHORT_SIZE, 42))
            .unwrap();
        let risk = RiskModel::new(Arc::new(model), ThresholdPolicy::default());

        let low = risk.predict(&fixtures::low_risk_inputs()).unwrap();
        assert_eq!(low.label, RiskLabel::Low, "p = {}", low.probability);
        assert!(!low.has_findings());

        let high = risk.predict(&fixtures::high_risk_inputs()).unwrap();
        assert_eq!(high.label, RiskLabel::High, "p = {}", high.probability);

        let rank = |feature: Feature| high.top_factors(FEATURE_COUNT).position(|f| f == feature).unwrap();
        assert!(rank(Feature::Glucose) < rank(Feature::Age));
        assert!(rank(Feature::Bmi) < rank(Feature::Age));
    }

    #[test]
    fn test_split_is_stratified() {
        let cohort = synthetic_cohort(100, 1);
        let (train, valid) = ModelTrainer::default().split(&cohort);

        let positives = cohort.positives();
        let negatives = cohort.len() - positives;
        let held_positive = valid.iter().filter(|&&i| cohort.records()[i].outcome).count();

        assert_eq!(held_positive, positives / 5);
        assert_eq!(valid.len() - held_positive, negatives / 5);
        assert_eq!(train.len() + valid.len(), cohort.len());
    }

    #[test]
    fn test_empty_dataset() {
        let err = quick_trainer().train(&Dataset::default()).unwrap_err();
        assert!(matches!(err, TrainingError::EmptyDataset));
    }

    #[test]
    fn test_single_class() {
        let dataset: Dataset = synthetic_cohort(50, 3)
            .records()
            .iter()
            .filter(|r| !r.outcome)
            .cloned()
            .collect();
        let err = quick_trainer().train(&dataset).unwrap_err();
        assert!(matches!(err, TrainingError::SingleClass { outcome: 0, .. }));
    }

    #[test]
    fn test_invalid_config() {
        let trainer = ModelTrainer::new(TrainerConfig {
            validation_fraction: 1.5,
            ..TrainerConfig::default()
        });
        let err = trainer.train(&synthetic_cohort(50, 3)).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidConfig(_)));
    }

    #[test]
    fn test_no_validation_rows() {
        let trainer = ModelTrainer::new(TrainerConfig {
            validation_fraction: 0.0,
            forest: ForestParams {
                n_trees: 5,
                ..ForestParams::default()
            },
            ..TrainerConfig::default()
        });
        let (_, report) = trainer.train(&synthetic_cohort(60, 3)).unwrap();
        assert_eq!(report.validation_rows, 0);
        assert!(report.validation_accuracy.is_none());
    }

    #[test]
    fn test_persist_writes_loadable_artifact() {
        let path = scratch_path("model.json");
        let report = quick_trainer()
            .train_and_persist(&synthetic_cohort(200, 42), &path)
            .unwrap();

        let loaded = TrainedModel::load(&path).unwrap();
        assert_eq!(loaded.model_id(), report.model_id);
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_failed_training_leaves_no_artifact() {
        let path = scratch_path("model.json");
        let dataset = Dataset::new(vec![LabeledRecord {
            features: [1.0; FEATURE_COUNT],
            outcome: true,
        }]);

        let err = quick_trainer().train_and_persist(&dataset, &path).unwrap_err();
        assert!(matches!(err, RiskError::Training(TrainingError::SingleClass { .. })));
        assert!(!path.exists());
        assert!(path.parent().is_none_or(|dir| !dir.exists()));
    }
}
