//! Lab-Sheet Intake
//!
//! Turns a CSV export from a lab portal or a home monitoring app into
//! [`RawInputs`]. Headers are matched loosely through an alias table and
//! the most recent (last) row wins. Nothing is defaulted: a measurement
//! the sheet does not carry stays absent and validation reports it.

use serde::Serialize;

use crate::error::IntakeError;
use crate::features::{Feature, RawInputs, RawValue, HEIGHT_CM, WEIGHT_KG};

/// Example sheet accepted by [`parse_lab_sheet`]
pub const SAMPLE_TEMPLATE: &str = "\
date,glucose,blood_pressure,insulin,age,weight,height,pregnancies,skin_thickness,pedigree
2024-01-15,105,72,85,42,75,168,1,22,0.35
2024-02-15,102,70,80,42,74,168,1,22,0.35
2024-03-15,98,68,78,42,73,168,1,22,0.35";

/// Heights at or below this are taken to be in metres
const METRES_CUTOFF: f64 = 3.0;

/// Input key and the header aliases that map to it
const ALIASES: &[(&str, &[&str])] = &[
    ("glucose", &["glucose", "blood_glucose", "fasting_glucose", "blood glucose", "fasting glucose", "glu", "bg"]),
    ("diastolic_bp", &["diastolic_bp", "blood_pressure", "blood pressure", "bp_diastolic", "diastolic", "bp"]),
    ("insulin", &["insulin", "insulin_level", "insulin level", "serum_insulin", "serum insulin"]),
    ("age", &["age", "patient_age", "patient age"]),
    (WEIGHT_KG, &["weight_kg", "weight", "body_weight", "body weight", "wt"]),
    (HEIGHT_CM, &["height_cm", "height", "body_height", "body height", "ht"]),
    ("skin_thickness", &["skin_thickness", "skinfold", "skinfold_thickness", "skin thickness", "triceps"]),
    ("pregnancies", &["pregnancies", "pregnancy", "num_pregnancies", "pregnancy_count"]),
    ("pedigree", &["pedigree", "diabetes_pedigree", "diabetespedigreefunction", "family_history_score", "dpf"]),
];

/// Aliases shorter than this only match a header exactly
const MIN_SUBSTRING_ALIAS: usize = 4;

/// Result of reading one sheet
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabSheet {
    /// Values taken from the last row, keyed by input name
    pub inputs: RawInputs,

    /// Normalised headers as found in the sheet
    pub columns: Vec<String>,

    /// Number of data rows read
    pub rows: usize,
}

impl LabSheet {
    /// Input keys the sheet did not provide
    pub fn missing(&self) -> Vec<&'static str> {
        ALIASES
            .iter()
            .map(|(key, _)| *key)
            .filter(|key| !self.inputs.contains(key))
            .collect()
    }

    /// Soft plausibility notes for values that parse but look unusual
    pub fn warnings(&self) -> Vec<String> {
        let number = |key: &str| match self.inputs.get(key) {
            Some(RawValue::Number(v)) => Some(*v),
            _ => None,
        };

        let mut warnings = Vec::new();
        if let Some(v) = number(Feature::Glucose.key()).filter(|v| !(50.0..=500.0).contains(v)) {
            warnings.push(format!(
                "Glucose value ({v} mg/dL) seems unusual. Normal fasting range is 70-100 mg/dL."
            ));
        }
        if let Some(v) = number(Feature::DiastolicBp.key()).filter(|v| !(40.0..=150.0).contains(v)) {
            warnings.push(format!(
                "Blood pressure ({v} mmHg) seems unusual. Normal diastolic range is 60-80 mmHg."
            ));
        }
        if let Some(v) = number(Feature::Insulin.key()).filter(|v| *v > 600.0) {
            warnings.push(format!(
                "Insulin level ({v} µU/mL) seems unusual. Normal fasting range is 2-25 µU/mL."
            ));
        }
        warnings
    }
}

/// Parse a CSV lab sheet
pub fn parse_lab_sheet(text: &str) -> Result<LabSheet, IntakeError> {
    if text.trim().is_empty() {
        return Err(IntakeError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_lowercase).collect();

    let mut last = None;
    let mut rows = 0;
    for record in reader.records() {
        last = Some(record?);
        rows += 1;
    }
    let last = last.ok_or(IntakeError::NoRows)?;

    let mut inputs = RawInputs::new();
    for (key, aliases) in ALIASES {
        let Some(pos) = resolve(&columns, aliases) else {
            continue;
        };
        let Some(cell) = last.get(pos).filter(|c| !c.is_empty()) else {
            continue;
        };

        let value = match cell.parse::<f64>() {
            Ok(v) if *key == HEIGHT_CM && v <= METRES_CUTOFF => RawValue::Number(v * 100.0),
            Ok(v) => RawValue::Number(v),
            Err(_) => RawValue::Text(cell.to_string()),
        };
        inputs.insert(*key, value);
    }

    Ok(LabSheet { inputs, columns, rows })
}

/// Column position for the first alias that matches: exact first, then
/// headers containing a long-enough alias (e.g. "fasting glucose (mg/dl)")
fn resolve(columns: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|&alias| columns.iter().position(|c| c == alias))
        .or_else(|| {
            aliases
                .iter()
                .filter(|alias| alias.len() >= MIN_SUBSTRING_ALIAS)
                .find_map(|&alias| columns.iter().position(|c| c.contains(alias)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::validate;

    #[test]
    fn test_template_validates() {
        let sheet = parse_lab_sheet(SAMPLE_TEMPLATE).unwrap();
        assert_eq!(sheet.rows, 3);
        assert!(sheet.missing().is_empty());

        let fv = validate(&sheet.inputs).unwrap();
        // Last row wins
        assert!((fv.glucose() - 98.0).abs() < 1e-9);
        assert!((fv.bmi() - 73.0 / (1.68 * 1.68)).abs() < 1e-9);
    }

    #[test]
    fn test_aliases_and_case() {
        let text = "Patient Age, Fasting Glucose (mg/dL), BP, Serum Insulin, Wt, Ht\n50, 130, 85, 140, 90, 1.80\n";
        let sheet = parse_lab_sheet(text).unwrap();

        assert_eq!(sheet.inputs.get("age"), Some(&RawValue::Number(50.0)));
        assert_eq!(sheet.inputs.get("glucose"), Some(&RawValue::Number(130.0)));
        assert_eq!(sheet.inputs.get("diastolic_bp"), Some(&RawValue::Number(85.0)));
        assert_eq!(sheet.inputs.get("insulin"), Some(&RawValue::Number(140.0)));
        assert_eq!(sheet.inputs.get(WEIGHT_KG), Some(&RawValue::Number(90.0)));
    }

    #[test]
    fn test_height_in_metres_converted() {
        let sheet = parse_lab_sheet("height,weight\n1.75,70\n").unwrap();
        match sheet.inputs.get(HEIGHT_CM) {
            Some(RawValue::Number(cm)) => assert!((cm - 175.0).abs() < 1e-9),
            other => panic!("unexpected height: {other:?}"),
        }
    }

    #[test]
    fn test_missing_columns_stay_absent() {
        let sheet = parse_lab_sheet("glucose\n120\n").unwrap();
        assert!(!sheet.inputs.contains("age"));
        assert!(sheet.missing().contains(&"age"));
        assert!(validate(&sheet.inputs).is_err());
    }

    #[test]
    fn test_non_numeric_cell_kept_as_text() {
        let sheet = parse_lab_sheet("glucose,age\npending,40\n").unwrap();
        assert_eq!(sheet.inputs.get("glucose"), Some(&RawValue::Text("pending".into())));
    }

    #[test]
    fn test_empty_and_header_only() {
        assert!(matches!(parse_lab_sheet("  \n"), Err(IntakeError::Empty)));
        assert!(matches!(parse_lab_sheet("glucose,age\n"), Err(IntakeError::NoRows)));
    }

    #[test]
    fn test_warnings() {
        let sheet = parse_lab_sheet("glucose,bp\n520,70\n").unwrap();
        let warnings = sheet.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Glucose"));
    }
}
