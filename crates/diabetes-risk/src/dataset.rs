//! Labeled Training Data
//!
//! Loads CSV datasets with the eight feature columns plus a binary
//! `outcome`, and generates the synthetic reference cohort used when no
//! dataset is on disk.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::TrainingError;
use crate::features::{Feature, FEATURE_COUNT};
use crate::forest::Row;

/// Size of the reference cohort
pub const COHORT_SIZE: usize = 768;

/// Share of positive cases in the reference cohort
pub const COHORT_POSITIVE_SHARE: f64 = 0.35;

/// One labeled example, features in canonical order
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledRecord {
    pub features: Row,
    pub outcome: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    records: Vec<LabeledRecord>,
}

impl Dataset {
    pub fn new(records: Vec<LabeledRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[LabeledRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.records.iter().filter(|r| r.outcome).count()
    }

    pub fn push(&mut self, record: LabeledRecord) {
        self.records.push(record);
    }

    /// Load from a CSV file
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, TrainingError> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Load CSV with a header row.
    ///
    /// Feature columns may use canonical keys or Pima dataset names; extra
    /// columns are ignored. Row numbers in errors count data rows from 1.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TrainingError> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = csv.headers()?.clone();
        let mut positions = [None; FEATURE_COUNT];
        let mut outcome_pos = None;
        for (pos, header) in headers.iter().enumerate() {
            if header.eq_ignore_ascii_case("outcome") {
                outcome_pos = Some(pos);
            } else if let Some(feature) = Feature::from_key(header) {
                positions[feature.index()] = Some(pos);
            }
        }

        let mut columns = [0; FEATURE_COUNT];
        for feature in Feature::ALL {
            columns[feature.index()] = positions[feature.index()]
                .ok_or_else(|| TrainingError::MissingColumn(feature.key().to_string()))?;
        }
        let outcome_pos = outcome_pos.ok_or_else(|| TrainingError::MissingColumn("outcome".into()))?;

        let mut records = Vec::new();
        for (idx, result) in csv.records().enumerate() {
            let record = result?;
            let row = idx + 1;

            let mut features = [0.0; FEATURE_COUNT];
            for feature in Feature::ALL {
                let raw = record.get(columns[feature.index()]).unwrap_or_default();
                features[feature.index()] = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| TrainingError::NonNumeric {
                        row,
                        column: headers.get(columns[feature.index()]).unwrap_or_default().to_string(),
                        value: raw.to_string(),
                    })?;
            }

            let raw = record.get(outcome_pos).unwrap_or_default();
            let outcome = match raw.parse::<f64>() {
                Ok(v) if v == 0.0 => false,
                Ok(v) if v == 1.0 => true,
                _ => {
                    return Err(TrainingError::InvalidOutcome {
                        row,
                        value: raw.to_string(),
                    });
                }
            };

            records.push(LabeledRecord { features, outcome });
        }

        Ok(Self { records })
    }
}

impl FromIterator<LabeledRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = LabeledRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ============================================================================
// Synthetic Cohort
// ============================================================================

/// Generate `n` records drawn from class-conditional distributions
/// resembling the Pima cohort, `COHORT_POSITIVE_SHARE` of them positive.
///
/// Fully determined by `(n, seed)`.
pub fn synthetic_cohort(n: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let positives = (n as f64 * COHORT_POSITIVE_SHARE) as usize;

    let mut records: Vec<LabeledRecord> = (0..n)
        .map(|i| {
            let outcome = i >= n - positives;
            let features = if outcome {
                positive_case(&mut rng)
            } else {
                negative_case(&mut rng)
            };
            LabeledRecord { features, outcome }
        })
        .collect();

    records.shuffle(&mut rng);
    Dataset::new(records)
}

fn negative_case(rng: &mut StdRng) -> Row {
    let mut row = [0.0; FEATURE_COUNT];
    row[Feature::Pregnancies.index()] = f64::from(rng.gen_range(0..6_u32));
    row[Feature::Glucose.index()] = normal(rng, 100.0, 15.0).clamp(70.0, 140.0);
    row[Feature::DiastolicBp.index()] = normal(rng, 70.0, 10.0).clamp(50.0, 90.0);
    row[Feature::SkinThickness.index()] = normal(rng, 20.0, 8.0).clamp(0.0, 50.0);
    row[Feature::Insulin.index()] = normal(rng, 80.0, 40.0).clamp(0.0, 200.0);
    row[Feature::Bmi.index()] = normal(rng, 25.0, 4.0).clamp(18.0, 35.0);
    row[Feature::Pedigree.index()] = exponential(rng, 0.3).clamp(0.08, 1.0);
    row[Feature::Age.index()] = f64::from(rng.gen_range(21..50_u32));
    row
}

fn positive_case(rng: &mut StdRng) -> Row {
    let mut row = [0.0; FEATURE_COUNT];
    row[Feature::Pregnancies.index()] = f64::from(rng.gen_range(2..12_u32));
    row[Feature::Glucose.index()] = normal(rng, 155.0, 30.0).clamp(100.0, 200.0);
    row[Feature::DiastolicBp.index()] = normal(rng, 78.0, 12.0).clamp(60.0, 110.0);
    row[Feature::SkinThickness.index()] = normal(rng, 32.0, 10.0).clamp(10.0, 60.0);
    row[Feature::Insulin.index()] = normal(rng, 180.0, 80.0).clamp(50.0, 400.0);
    row[Feature::Bmi.index()] = normal(rng, 34.0, 6.0).clamp(25.0, 50.0);
    row[Feature::Pedigree.index()] = exponential(rng, 0.5).clamp(0.1, 2.0);
    row[Feature::Age.index()] = f64::from(rng.gen_range(30..70_u32));
    row
}

/// Box-Muller transform
fn normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    mean + std_dev * z
}

/// Inverse-CDF sample with the given mean
fn exponential(rng: &mut StdRng, scale: f64) -> f64 {
    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    -scale * u.ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIMA_CSV: &str = "\
Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome
6,148,72,35,0,33.6,0.627,50,1
1,85,66,29,0,26.6,0.351,31,0
8,183,64,0,0,23.3,0.672,32,1
";

    #[test]
    fn test_load_pima_headers() {
        let dataset = Dataset::from_csv_reader(PIMA_CSV.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.positives(), 2);

        let first = &dataset.records()[0];
        assert!((first.features[Feature::Glucose.index()] - 148.0).abs() < 1e-9);
        assert!((first.features[Feature::Pedigree.index()] - 0.627).abs() < 1e-9);
        assert!(first.outcome);
    }

    #[test]
    fn test_canonical_headers_any_order() {
        let csv = "\
outcome,age,pedigree,bmi,insulin,skin_thickness,diastolic_bp,glucose,pregnancies,notes
0, 25, 0.2, 21.0, 80, 20, 70, 85, 0, routine
";
        let dataset = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        let record = &dataset.records()[0];
        assert!((record.features[Feature::Age.index()] - 25.0).abs() < 1e-9);
        assert!((record.features[Feature::Glucose.index()] - 85.0).abs() < 1e-9);
        assert!(!record.outcome);
    }

    #[test]
    fn test_missing_column() {
        let csv = "glucose,bmi,outcome\n100,25,0\n";
        let err = Dataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, TrainingError::MissingColumn(ref c) if c == "pregnancies"));

        let csv = "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age\n";
        let err = Dataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, TrainingError::MissingColumn(ref c) if c == "outcome"));
    }

    #[test]
    fn test_non_numeric_cell() {
        let csv = PIMA_CSV.replace("1,85,66", "1,high,66");
        let err = Dataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        match err {
            TrainingError::NonNumeric { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Glucose");
                assert_eq!(value, "high");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_outcome() {
        let csv = PIMA_CSV.replace("0.351,31,0", "0.351,31,2");
        let err = Dataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidOutcome { row: 2, .. }));
    }

    #[test]
    fn test_synthetic_cohort_shape() {
        let cohort = synthetic_cohort(COHORT_SIZE, 42);
        assert_eq!(cohort.len(), COHORT_SIZE);
        assert_eq!(cohort.positives(), 268);

        for record in cohort.records() {
            for feature in Feature::ALL {
                let value = record.features[feature.index()];
                assert!(
                    feature.range().contains(value),
                    "{feature} = {value} outside plausible range"
                );
            }
        }
    }

    #[test]
    fn test_synthetic_cohort_is_seeded() {
        assert_eq!(synthetic_cohort(100, 7), synthetic_cohort(100, 7));
        assert_ne!(synthetic_cohort(100, 7), synthetic_cohort(100, 8));
    }

    #[test]
    fn test_synthetic_classes_differ() {
        let cohort = synthetic_cohort(COHORT_SIZE, 42);
        let mean = |outcome: bool| {
            let values: Vec<f64> = cohort
                .records()
                .iter()
                .filter(|r| r.outcome == outcome)
                .map(|r| r.features[Feature::Glucose.index()])
                .collect();
            values.iter().sum::<f64>() / values.len() as f64
        };
        assert!(mean(true) > mean(false) + 30.0);
    }
}
