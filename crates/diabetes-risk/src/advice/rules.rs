//! Rule-Based Advisor
//!
//! Deterministic advice from fixed templates, keyed by the risk label and
//! by which inputs crossed a clinical cut-off. Always produces a
//! non-empty result.

use async_trait::async_trait;

use super::{AdviceFailure, Advisor, Priority, Recommendation, Recommendations};
use crate::features::Feature;
use crate::model::{ClinicalFinding, RiskAssessment, RiskLabel, Severity};

const WARNING_SIGNS: [&str; 5] = [
    "Increased thirst and frequent urination",
    "Unexplained weight loss",
    "Fatigue and weakness",
    "Blurred vision",
    "Slow-healing cuts or frequent infections",
];

#[derive(Clone, Copy, Debug, Default)]
pub struct RuleBasedAdvisor;

impl RuleBasedAdvisor {
    pub const fn new() -> Self {
        Self
    }

    /// Build advice for `assessment`
    pub fn recommend(&self, assessment: &RiskAssessment) -> Recommendations {
        let label = assessment.label;
        let inputs = &assessment.inputs;

        let mut recs = Recommendations {
            summary: summary(label),
            warning_signs: WARNING_SIGNS.iter().map(|s| (*s).to_string()).collect(),
            ..Recommendations::default()
        };

        // Targeted tips lead their category
        for finding in &assessment.findings {
            let (category, tip) = targeted_tip(finding);
            match category {
                Category::Diet => recs.diet.push(tip),
                Category::Exercise => recs.exercise.push(tip),
                Category::Lifestyle => recs.lifestyle.push(tip),
                Category::Medical => recs.medical.push(tip),
            }
        }

        if inputs.bmi() > 25.0 {
            recs.diet.push(Recommendation::new(
                "Calorie Control",
                "Aim to reduce daily caloric intake by 500 calories to achieve gradual weight loss of 1-2 pounds per week.",
                Priority::High,
            ));
        }
        recs.diet.extend([
            Recommendation::new(
                "Increase Fiber Intake",
                "Consume 25-30 grams of fiber daily from vegetables, whole grains, and legumes to help control blood sugar.",
                Priority::High,
            ),
            Recommendation::new(
                "Choose Complex Carbohydrates",
                "Replace refined carbs with whole grains like brown rice, quinoa, and whole wheat bread.",
                Priority::Medium,
            ),
            Recommendation::new(
                "Limit Sugary Beverages",
                "Replace sodas and fruit juices with water, unsweetened tea, or sparkling water with lemon.",
                Priority::High,
            ),
        ]);

        recs.exercise.extend([
            Recommendation::new(
                "Regular Aerobic Exercise",
                "Aim for 150 minutes of moderate-intensity exercise per week, such as brisk walking, swimming, or cycling.",
                Priority::High,
            ),
            Recommendation::new(
                "Strength Training",
                "Include resistance exercises 2-3 times per week to improve insulin sensitivity and build muscle mass.",
                Priority::Medium,
            ),
            Recommendation::new(
                "Daily Movement",
                "Take short walks after meals (10-15 minutes) to help regulate post-meal blood sugar levels.",
                Priority::Medium,
            ),
        ]);

        if !label.is_elevated() {
            recs.lifestyle.push(Recommendation::new(
                "Stay on a Prevention Track",
                "Your result points to low risk. Keep up the habits that support it and repeat this check once a year as part of routine prevention.",
                Priority::Medium,
            ));
        }
        recs.lifestyle.extend([
            Recommendation::new(
                "Quality Sleep",
                "Aim for 7-9 hours of quality sleep per night. Poor sleep can affect insulin sensitivity.",
                Priority::High,
            ),
            Recommendation::new(
                "Stress Management",
                "Practice stress-reduction techniques like meditation, deep breathing, or yoga, as stress can elevate blood sugar.",
                Priority::Medium,
            ),
            Recommendation::new(
                "Regular Monitoring",
                "Keep track of your weight, blood pressure, and if possible, blood glucose levels regularly.",
                Priority::Medium,
            ),
        ]);

        if label.is_elevated() {
            recs.medical.extend([
                Recommendation::new(
                    "Schedule a Doctor's Appointment",
                    "Consult with a healthcare provider for a comprehensive diabetes screening and personalized medical advice.",
                    Priority::High,
                ),
                Recommendation::new(
                    "Request HbA1c Test",
                    "Ask your doctor about an HbA1c test, which shows average blood sugar levels over the past 2-3 months.",
                    Priority::High,
                ),
            ]);
        } else {
            recs.medical.push(Recommendation::new(
                "Annual Health Check-up",
                "Schedule an annual physical examination including blood glucose and lipid panel tests.",
                Priority::Medium,
            ));
        }
        recs.medical.push(Recommendation::new(
            "Know Your Numbers",
            "Keep track of key health metrics: blood pressure (< 120/80 mmHg), fasting glucose (< 100 mg/dL), and BMI (18.5-24.9).",
            Priority::Medium,
        ));

        if inputs.bmi() < 25.0 {
            recs.positive_factors.push("Healthy BMI range".into());
        }
        if inputs.glucose() < 100.0 {
            recs.positive_factors.push("Normal fasting glucose level".into());
        }
        if inputs.age() < 45 {
            recs.positive_factors.push("Age is a protective factor".into());
        }
        if inputs.diastolic_bp() < 80.0 {
            recs.positive_factors.push("Healthy blood pressure".into());
        }

        recs
    }
}

#[async_trait]
impl Advisor for RuleBasedAdvisor {
    async fn advise(&self, assessment: &RiskAssessment) -> Result<Recommendations, AdviceFailure> {
        Ok(self.recommend(assessment))
    }

    fn name(&self) -> &'static str {
        "rule_based"
    }
}

fn summary(label: RiskLabel) -> String {
    let level = match label {
        RiskLabel::Low | RiskLabel::Negative => "low",
        RiskLabel::Moderate => "moderate",
        RiskLabel::High => "high",
        RiskLabel::Positive => "elevated",
    };
    let follow_up = match label {
        RiskLabel::High | RiskLabel::Positive => {
            "It's important to take immediate action to reduce your risk factors and consult with a healthcare provider."
        }
        RiskLabel::Moderate => "With some lifestyle modifications, you can significantly reduce your risk.",
        RiskLabel::Low | RiskLabel::Negative => "Continue maintaining your healthy habits to keep your risk low.",
    };
    format!("Based on your health profile, you have a {level} risk of developing diabetes. {follow_up}")
}

enum Category {
    Diet,
    Exercise,
    Lifestyle,
    Medical,
}

fn targeted_tip(finding: &ClinicalFinding) -> (Category, Recommendation) {
    let priority = match finding.severity {
        Severity::High => Priority::High,
        Severity::Moderate => Priority::Medium,
    };
    let value = finding.value;

    match finding.feature {
        Feature::Glucose => (
            Category::Diet,
            Recommendation::new(
                "Manage Blood Sugar",
                format!(
                    "Your glucose reading of {value} mg/dL is above the {} reference. Spread carbohydrates evenly across meals and pair them with protein or healthy fats.",
                    finding.normal_range
                ),
                priority,
            ),
        ),
        Feature::Bmi => (
            Category::Exercise,
            Recommendation::new(
                "Weight Management",
                format!(
                    "A BMI of {value:.1} is above the healthy 18.5-24.9 range. Losing 5-7% of body weight lowers diabetes risk substantially."
                ),
                priority,
            ),
        ),
        Feature::DiastolicBp => (
            Category::Lifestyle,
            Recommendation::new(
                "Blood Pressure Control",
                format!(
                    "A diastolic pressure of {value} mmHg is above the 60-80 mmHg range. Keep sodium under 2,300 mg a day and have it rechecked."
                ),
                priority,
            ),
        ),
        Feature::Insulin => (
            Category::Medical,
            Recommendation::new(
                "Discuss Insulin Levels",
                format!(
                    "An insulin level of {value} µU/mL can indicate insulin resistance. Ask your doctor whether further testing is appropriate."
                ),
                priority,
            ),
        ),
        Feature::Pedigree => (
            Category::Medical,
            Recommendation::new(
                "Family History Screening",
                "A family history of diabetes raises your baseline risk. Get screened regularly even when you feel well.",
                priority,
            ),
        ),
        Feature::Age => (
            Category::Medical,
            Recommendation::new(
                "Age-Appropriate Screening",
                "Risk rises after 45. Have your blood glucose checked at least every 3 years.",
                priority,
            ),
        ),
        Feature::Pregnancies | Feature::SkinThickness => (
            Category::Lifestyle,
            Recommendation::new(
                finding.title.clone(),
                format!("This measurement is outside the {} reference range.", finding.normal_range),
                priority,
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdPolicy;
    use crate::features::FeatureVector;
    use crate::fixtures;
    use crate::risk_model::RiskModel;
    use std::sync::Arc;

    fn assess(inputs: &FeatureVector) -> RiskAssessment {
        RiskModel::new(Arc::new(fixtures::fixed_model()), ThresholdPolicy::default())
            .predict(inputs)
            .unwrap()
    }

    #[test]
    fn test_low_risk_prevention_advice() {
        let assessment = assess(&fixtures::low_risk_inputs());
        let recs = RuleBasedAdvisor::new().recommend(&assessment);
        let text = recs.render();

        assert!(recs.summary.contains("low risk"));
        assert!(text.contains("Prevention"));
        assert!(!text.contains("Manage Blood Sugar"));
        assert!(!text.contains("Weight Management"));
        assert!(!text.contains("Calorie Control"));
        assert!(!text.contains("Doctor's Appointment"));
        assert!(text.contains("Annual Health Check-up"));
        assert_eq!(
            recs.positive_factors,
            vec![
                "Healthy BMI range",
                "Normal fasting glucose level",
                "Age is a protective factor",
                "Healthy blood pressure",
            ]
        );
    }

    #[test]
    fn test_high_risk_targeted_advice() {
        let assessment = assess(&fixtures::high_risk_inputs());
        let recs = RuleBasedAdvisor::new().recommend(&assessment);

        assert!(recs.summary.contains("high risk"));
        assert_eq!(recs.diet[0].title, "Manage Blood Sugar");
        assert_eq!(recs.diet[0].priority, Priority::High);
        assert_eq!(recs.exercise[0].title, "Weight Management");
        assert!(recs.diet.iter().any(|r| r.title == "Calorie Control"));
        assert!(recs.medical.iter().any(|r| r.title == "Request HbA1c Test"));
        assert!(recs.medical.iter().any(|r| r.title == "Age-Appropriate Screening"));
        assert!(recs.positive_factors.iter().all(|f| f != "Healthy BMI range"));
    }

    #[test]
    fn test_every_label_has_text() {
        let advisor = RuleBasedAdvisor::new();
        let mut assessment = assess(&fixtures::regression_inputs());
        for label in [
            RiskLabel::Low,
            RiskLabel::Moderate,
            RiskLabel::High,
            RiskLabel::Negative,
            RiskLabel::Positive,
        ] {
            assessment.label = label;
            let recs = advisor.recommend(&assessment);
            assert!(!recs.is_blank());
            assert!(!recs.render().trim().is_empty());
            assert_eq!(recs.warning_signs.len(), WARNING_SIGNS.len());
        }
    }

    #[test]
    fn test_deterministic() {
        let assessment = assess(&fixtures::regression_inputs());
        let advisor = RuleBasedAdvisor::new();
        assert_eq!(advisor.recommend(&assessment), advisor.recommend(&assessment));
    }
}
