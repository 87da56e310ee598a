//! Domain Models
//!
//! Output types of the scoring engine. Everything here is an immutable
//! value owned by the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::features::{Feature, FeatureVector};

/// Discrete risk category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    // Tiered policy
    Low,
    Moderate,
    High,

    // Binary policy
    Negative,
    Positive,
}

impl RiskLabel {
    /// Whether the label calls for medical follow-up
    pub const fn is_elevated(self) -> bool {
        matches!(self, Self::Moderate | Self::High | Self::Positive)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Negative => "negative",
            Self::Positive => "positive",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feature's share of an individual's score
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub feature: Feature,

    /// Normalised share in [0, 1]; all factors of an assessment sum to 1
    pub weight: f64,

    /// Signed z-score of the input against the training population
    pub deviation: f64,
}

/// How far past a clinical cut-off an input sits
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Moderate,
    High,
}

/// An input above a population-typical clinical cut-off
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFinding {
    pub feature: Feature,
    pub value: f64,
    pub severity: Severity,

    /// Short description, e.g. "Elevated glucose"
    pub title: String,

    /// Reference range shown to the user, e.g. "70-100 mg/dL (fasting)"
    pub normal_range: String,
}

/// Result of scoring one feature vector
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Positive-class probability in [0, 1]
    pub probability: f64,

    pub label: RiskLabel,

    /// Most influential first
    pub contributing_factors: Vec<ContributingFactor>,

    /// Inputs past a clinical cut-off, most important feature first
    pub findings: Vec<ClinicalFinding>,

    /// The validated inputs that were scored
    pub inputs: FeatureVector,
}

impl RiskAssessment {
    /// Probability as a percentage with one decimal
    pub fn percent(&self) -> f64 {
        (self.probability * 1000.0).round() / 10.0
    }

    /// The `n` most influential features
    pub fn top_factors(&self, n: usize) -> impl Iterator<Item = Feature> + '_ {
        self.contributing_factors.iter().take(n).map(|f| f.feature)
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_elevation() {
        assert!(!RiskLabel::Low.is_elevated());
        assert!(RiskLabel::Moderate.is_elevated());
        assert!(RiskLabel::High.is_elevated());
        assert!(!RiskLabel::Negative.is_elevated());
        assert!(RiskLabel::Positive.is_elevated());
    }

    #[test]
    fn test_label_serde() {
        assert_eq!(serde_json::to_string(&RiskLabel::Moderate).unwrap(), "\"moderate\"");
        let label: RiskLabel = serde_json::from_str("\"positive\"").unwrap();
        assert_eq!(label, RiskLabel::Positive);
        assert_eq!(RiskLabel::High.to_string(), "high");
    }

    #[test]
    fn test_percent_rounding() {
        let inputs = FeatureVector::from_values(30, 22.0, 90.0, 70.0, 80.0, 0.3, 0, 20.0).unwrap();
        let assessment = RiskAssessment {
            probability: 0.12345,
            label: RiskLabel::Low,
            contributing_factors: Vec::new(),
            findings: Vec::new(),
            inputs,
        };
        assert!((assessment.percent() - 12.3).abs() < 1e-9);
        assert!(!assessment.has_findings());
    }
}
