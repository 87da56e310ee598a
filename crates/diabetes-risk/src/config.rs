//! Engine and Trainer Configuration
//!
//! Every knob has a default and can be overridden from the environment:
//!
//! | variable                  | default                     |
//! |---------------------------|-----------------------------|
//! | `RISK_MODERATE_THRESHOLD` | `0.30`                      |
//! | `RISK_HIGH_THRESHOLD`     | `0.60`                      |
//! | `RISK_BINARY_CUTOFF`      | unset (tiered policy)       |
//! | `ADVICE_TIMEOUT_SECS`     | `15`                        |
//! | `RISK_MODEL_PATH`         | `models/diabetes-risk.json` |
//! | `RISK_TRAINING_SEED`      | `42`                        |
//! | `RISK_VALIDATION_FRACTION`| `0.2`                       |
//! | `RISK_FOREST_TREES`       | `100`                       |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, RiskError};
use crate::forest::ForestParams;
use crate::model::RiskLabel;

pub const DEFAULT_MODERATE_THRESHOLD: f64 = 0.30;
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.60;
pub const DEFAULT_BINARY_CUTOFF: f64 = 0.5;
pub const DEFAULT_ADVICE_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MODEL_PATH: &str = "models/diabetes-risk.json";
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_VALIDATION_FRACTION: f64 = 0.2;

// ============================================================================
// Threshold Policy
// ============================================================================

/// Mapping from probability to [`RiskLabel`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// `p < moderate` low, `moderate <= p <= high` moderate, `p > high` high
    Tiered { moderate: f64, high: f64 },

    /// `p >= cutoff` positive, otherwise negative
    Binary { cutoff: f64 },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::Tiered {
            moderate: DEFAULT_MODERATE_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl ThresholdPolicy {
    pub fn tiered(moderate: f64, high: f64) -> Result<Self> {
        let policy = Self::Tiered { moderate, high };
        policy.validate()?;
        Ok(policy)
    }

    pub fn binary(cutoff: f64) -> Result<Self> {
        let policy = Self::Binary { cutoff };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        match *self {
            Self::Tiered { moderate, high } => {
                if !in_unit(moderate) || !in_unit(high) || moderate > high {
                    return Err(RiskError::Config(format!(
                        "tiered thresholds must satisfy 0 <= moderate ({moderate}) <= high ({high}) <= 1"
                    )));
                }
            }
            Self::Binary { cutoff } => {
                if !in_unit(cutoff) {
                    return Err(RiskError::Config(format!("binary cutoff {cutoff} outside [0, 1]")));
                }
            }
        }
        Ok(())
    }

    pub fn classify(&self, probability: f64) -> RiskLabel {
        match *self {
            Self::Tiered { moderate, high } => {
                if probability < moderate {
                    RiskLabel::Low
                } else if probability <= high {
                    RiskLabel::Moderate
                } else {
                    RiskLabel::High
                }
            }
            Self::Binary { cutoff } => {
                if probability >= cutoff {
                    RiskLabel::Positive
                } else {
                    RiskLabel::Negative
                }
            }
        }
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(cutoff) = parse_var(lookup, "RISK_BINARY_CUTOFF")? {
            return Self::binary(cutoff);
        }
        let moderate = parse_var(lookup, "RISK_MODERATE_THRESHOLD")?.unwrap_or(DEFAULT_MODERATE_THRESHOLD);
        let high = parse_var(lookup, "RISK_HIGH_THRESHOLD")?.unwrap_or(DEFAULT_HIGH_THRESHOLD);
        Self::tiered(moderate, high)
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Runtime configuration of the scoring engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: ThresholdPolicy,

    /// Upper bound on one generative advice call
    pub advice_timeout_secs: u64,

    /// Where the trained artifact lives
    pub model_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdPolicy::default(),
            advice_timeout_secs: DEFAULT_ADVICE_TIMEOUT_SECS,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self {
            thresholds: ThresholdPolicy::from_lookup(&lookup)?,
            ..Self::default()
        };
        if let Some(secs) = parse_var(&lookup, "ADVICE_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(RiskError::Config("ADVICE_TIMEOUT_SECS must be positive".into()));
            }
            config.advice_timeout_secs = secs;
        }
        if let Some(path) = non_empty(&lookup, "RISK_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        Ok(config)
    }

    pub const fn advice_timeout(&self) -> Duration {
        Duration::from_secs(self.advice_timeout_secs)
    }
}

// ============================================================================
// Trainer
// ============================================================================

/// Offline training configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub forest: ForestParams,

    /// Seeds the split shuffle and every tree
    pub seed: u64,

    /// Share of each class held out for validation, in [0, 1)
    pub validation_fraction: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            seed: DEFAULT_SEED,
            validation_fraction: DEFAULT_VALIDATION_FRACTION,
        }
    }
}

impl TrainerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(seed) = parse_var(&lookup, "RISK_TRAINING_SEED")? {
            config.seed = seed;
        }
        if let Some(fraction) = parse_var(&lookup, "RISK_VALIDATION_FRACTION")? {
            config.validation_fraction = fraction;
        }
        if let Some(trees) = parse_var(&lookup, "RISK_FOREST_TREES")? {
            config.forest.n_trees = trees;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.forest.validate().map_err(RiskError::Config)?;
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(RiskError::Config(format!(
                "validation fraction {} outside [0, 1)",
                self.validation_fraction
            )));
        }
        Ok(())
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    non_empty(lookup, key)
        .map(|raw| {
            raw.parse()
                .map_err(|_| RiskError::Config(format!("{key}: cannot parse {raw:?}")))
        })
        .transpose()
}
