//! Clinical Cut-offs
//!
//! Flags inputs that sit above population-typical reference values. This
//! is independent of the model: a finding says "this number is high",
//! the contributing factors say "this number moved the score".

use crate::features::{Feature, FeatureVector, FEATURE_COUNT};
use crate::model::{ClinicalFinding, Severity};

/// One tier of a cut-off: values strictly above `above` trigger it
struct Tier {
    above: f64,
    severity: Severity,
    title: &'static str,
    normal_range: &'static str,
}

/// Tiers per feature, most severe first
fn tiers(feature: Feature) -> &'static [Tier] {
    match feature {
        Feature::Glucose => &[
            Tier {
                above: 140.0,
                severity: Severity::High,
                title: "High glucose level",
                normal_range: "70-140 mg/dL",
            },
            Tier {
                above: 100.0,
                severity: Severity::Moderate,
                title: "Elevated glucose level",
                normal_range: "70-100 mg/dL (fasting)",
            },
        ],
        Feature::Bmi => &[
            Tier {
                above: 30.0,
                severity: Severity::High,
                title: "Obesity (high BMI)",
                normal_range: "18.5-24.9",
            },
            Tier {
                above: 25.0,
                severity: Severity::Moderate,
                title: "Overweight (elevated BMI)",
                normal_range: "18.5-24.9",
            },
        ],
        Feature::DiastolicBp => &[Tier {
            above: 90.0,
            severity: Severity::High,
            title: "High blood pressure",
            normal_range: "60-80 mmHg (diastolic)",
        }],
        Feature::Age => &[Tier {
            above: 45.0,
            severity: Severity::Moderate,
            title: "Age factor",
            normal_range: "risk increases after 45",
        }],
        Feature::Pedigree => &[
            Tier {
                above: 0.8,
                severity: Severity::High,
                title: "Strong family history",
                normal_range: "< 0.5",
            },
            Tier {
                above: 0.5,
                severity: Severity::Moderate,
                title: "Family history present",
                normal_range: "< 0.5",
            },
        ],
        Feature::Insulin => &[Tier {
            above: 166.0,
            severity: Severity::Moderate,
            title: "High insulin level",
            normal_range: "16-166 µU/mL",
        }],
        Feature::Pregnancies | Feature::SkinThickness => &[],
    }
}

/// Evaluate every cut-off against `inputs`.
///
/// Findings are ordered by `importances` (indexed by canonical feature
/// position), highest first, ties in canonical order.
pub fn findings(inputs: &FeatureVector, importances: &[f64; FEATURE_COUNT]) -> Vec<ClinicalFinding> {
    let mut found: Vec<ClinicalFinding> = Feature::ALL
        .iter()
        .filter_map(|&feature| {
            let value = inputs.get(feature);
            tiers(feature)
                .iter()
                .find(|tier| value > tier.above)
                .map(|tier| ClinicalFinding {
                    feature,
                    value,
                    severity: tier.severity,
                    title: tier.title.to_string(),
                    normal_range: tier.normal_range.to_string(),
                })
        })
        .collect();

    found.sort_by(|a, b| {
        importances[b.feature.index()]
            .total_cmp(&importances[a.feature.index()])
            .then(a.feature.cmp(&b.feature))
    });
    found
}
