//! # diabetes-risk
//!
//! Diabetes risk scoring engine with a recommendation policy.
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────┐  validate  ┌───────────────┐  predict  ┌────────────────┐
//! │ RawInputs  │──────────▶│ FeatureVector │─────────▶│ RiskAssessment │
//! │ (form/CSV) │            └───────────────┘           └───────┬────────┘
//! └────────────┘                                                │ generate
//!                                                               ▼
//!                                   ┌───────────────────────────────────────┐
//!                                   │ RecommendationPolicy                  │
//!                                   │  GenerativeAdvisor ─ fails ─▶ Rules   │
//!                                   └──────────────────┬────────────────────┘
//!                                                      ▼
//!                                                AdviceResult
//! ```
//!
//! ## Scoring
//!
//! A bagged forest of CART trees, trained offline by [`ModelTrainer`] and
//! loaded once as a read-only [`TrainedModel`]. Labels come from a
//! [`ThresholdPolicy`]:
//!
//! | probability      | tiered (default) | binary (cutoff 0.5) |
//! |------------------|------------------|---------------------|
//! | p < 0.30         | low              | negative            |
//! | 0.30 ≤ p ≤ 0.60  | moderate         | negative / positive |
//! | p > 0.60         | high             | positive            |
//!
//! This is a screening aid, not a diagnostic tool.

pub mod advice;
pub mod artifact;
pub mod clinical;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod features;
pub mod forest;
pub mod intake;
pub mod model;
pub mod risk_model;
pub mod trainer;

#[cfg(test)]
mod fixtures;

pub use advice::{
    AdviceFailure, AdviceResult, AdviceSource, Advisor, GenerativeAdvisor, RecommendationPolicy,
    Recommendations, RuleBasedAdvisor,
};
pub use artifact::TrainedModel;
pub use config::{EngineConfig, ThresholdPolicy, TrainerConfig};
pub use dataset::Dataset;
pub use engine::{AssessmentOutcome, RiskEngine};
pub use error::{IntakeError, Result, RiskError, TrainingError, ValidationError};
pub use features::{validate, Feature, FeatureVector, RawInputs, RawValue};
pub use intake::{parse_lab_sheet, LabSheet};
pub use model::{ClinicalFinding, ContributingFactor, RiskAssessment, RiskLabel};
pub use risk_model::RiskModel;
pub use trainer::{ModelTrainer, TrainingReport};
