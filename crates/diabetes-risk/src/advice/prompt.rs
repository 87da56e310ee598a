//! Prompts for the generative advisor

use std::fmt::Write as _;

use crate::features::Feature;
use crate::model::RiskAssessment;

/// Factors listed in the prompt
const PROMPT_FACTORS: usize = 5;

pub const SYSTEM_PROMPT: &str = "You are a knowledgeable health advisor specializing in diabetes \
prevention and metabolic health. Provide evidence-based, personalized recommendations. \
Always remind users to consult healthcare professionals for medical decisions. \
Respond with a single JSON object and nothing else.";

const RESPONSE_SHAPE: &str = r#"{
  "summary": "2-3 sentences on overall status and main concerns",
  "diet": [{"title": "...", "description": "...", "priority": "high|medium|low"}],
  "exercise": [{"title": "...", "description": "...", "priority": "high|medium|low"}],
  "lifestyle": [{"title": "...", "description": "...", "priority": "high|medium|low"}],
  "medical": [{"title": "...", "description": "...", "priority": "high|medium|low"}],
  "warning_signs": ["symptom to watch for"],
  "positive_factors": ["healthy indicator, if any"]
}"#;

/// User prompt carrying the assessment as context
pub fn user_prompt(assessment: &RiskAssessment) -> String {
    let inputs = &assessment.inputs;
    let mut prompt = String::from(
        "Based on the following health assessment, provide detailed, actionable recommendations \
         for diabetes prevention and management.\n\n",
    );

    prompt.push_str("Patient profile:\n");
    for feature in Feature::ALL {
        let value = format!("{} {}", inputs.get(feature), feature.unit());
        let _ = writeln!(prompt, "- {}: {}", feature.label(), value.trim_end());
    }

    let _ = write!(
        prompt,
        "\nRisk assessment:\n- Risk level: {}\n- Probability of diabetes: {}%\n",
        assessment.label,
        assessment.percent()
    );

    prompt.push_str("\nMost influential factors (share of score, deviation from population mean):\n");
    for factor in assessment.contributing_factors.iter().take(PROMPT_FACTORS) {
        let _ = writeln!(
            prompt,
            "- {}: {:.0}% share, {:+.1} SD",
            factor.feature.label(),
            factor.weight * 100.0,
            factor.deviation
        );
    }

    prompt.push_str("\nClinical findings:\n");
    if !assessment.has_findings() {
        prompt.push_str("- None identified\n");
    }
    for finding in &assessment.findings {
        let _ = writeln!(
            prompt,
            "- {} ({}; reference {})",
            finding.title, finding.value, finding.normal_range
        );
    }

    let _ = write!(
        prompt,
        "\nRespond with JSON in exactly this shape:\n{RESPONSE_SHAPE}\n\n\
         Provide 3-4 recommendations per category. Be specific and actionable, and address \
         the individual's specific risk factors."
    );
    prompt
}
