//! Feature Model & Validation
//!
//! The eight clinical measurements the classifier consumes, the raw input
//! mapping they are collected in, and the pure `validate` step between them.
//! BMI is always derived from height and weight; a `bmi` key in the raw
//! mapping is ignored.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of model features
pub const FEATURE_COUNT: usize = 8;

/// Raw input key for height in centimetres
pub const HEIGHT_CM: &str = "height_cm";

/// Raw input key for weight in kilograms
pub const WEIGHT_KG: &str = "weight_kg";

const HEIGHT_RANGE: ValueRange = ValueRange::new(50.0, 250.0);
const WEIGHT_RANGE: ValueRange = ValueRange::new(10.0, 350.0);

/// Inclusive plausible range for a measurement
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// A model feature.
///
/// Declaration order is the canonical feature order (the column order of
/// the reference dataset) and is what `Ord` sorts by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Pregnancies,
    Glucose,
    DiastolicBp,
    SkinThickness,
    Insulin,
    Bmi,
    Pedigree,
    Age,
}

impl Feature {
    /// All features in canonical order
    pub const ALL: [Self; FEATURE_COUNT] = [
        Self::Pregnancies,
        Self::Glucose,
        Self::DiastolicBp,
        Self::SkinThickness,
        Self::Insulin,
        Self::Bmi,
        Self::Pedigree,
        Self::Age,
    ];

    /// Position in canonical order
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Raw input / dataset column key
    pub const fn key(self) -> &'static str {
        match self {
            Self::Pregnancies => "pregnancies",
            Self::Glucose => "glucose",
            Self::DiastolicBp => "diastolic_bp",
            Self::SkinThickness => "skin_thickness",
            Self::Insulin => "insulin",
            Self::Bmi => "bmi",
            Self::Pedigree => "pedigree",
            Self::Age => "age",
        }
    }

    /// Human-readable name
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pregnancies => "Pregnancies",
            Self::Glucose => "Blood Glucose",
            Self::DiastolicBp => "Blood Pressure (diastolic)",
            Self::SkinThickness => "Skin Thickness",
            Self::Insulin => "Insulin Level",
            Self::Bmi => "Body Mass Index",
            Self::Pedigree => "Family History",
            Self::Age => "Age",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Pregnancies => "",
            Self::Glucose => "mg/dL",
            Self::DiastolicBp => "mmHg",
            Self::SkinThickness => "mm",
            Self::Insulin => "µU/mL",
            Self::Bmi => "kg/m²",
            Self::Pedigree => "score",
            Self::Age => "years",
        }
    }

    /// Plausible clinical range; values outside are rejected
    pub const fn range(self) -> ValueRange {
        match self {
            Self::Pregnancies => ValueRange::new(0.0, 20.0),
            Self::Glucose => ValueRange::new(0.0, 600.0),
            Self::DiastolicBp => ValueRange::new(0.0, 200.0),
            Self::SkinThickness => ValueRange::new(0.0, 100.0),
            Self::Insulin => ValueRange::new(0.0, 1000.0),
            Self::Bmi => ValueRange::new(10.0, 80.0),
            Self::Pedigree => ValueRange::new(0.0, 3.0),
            Self::Age => ValueRange::new(1.0, 120.0),
        }
    }

    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Pregnancies | Self::Age)
    }

    /// Resolve a column or input key.
    ///
    /// Accepts the canonical keys and the column names of the Pima Indians
    /// diabetes dataset, case-insensitively.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        let feature = match key.as_str() {
            "pregnancies" => Self::Pregnancies,
            "glucose" => Self::Glucose,
            "diastolic_bp" | "bloodpressure" | "blood_pressure" => Self::DiastolicBp,
            "skin_thickness" | "skinthickness" => Self::SkinThickness,
            "insulin" => Self::Insulin,
            "bmi" => Self::Bmi,
            "pedigree" | "diabetespedigreefunction" => Self::Pedigree,
            "age" => Self::Age,
            _ => return None,
        };
        Some(feature)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// Raw Inputs
// ============================================================================

/// A raw, unvalidated value as collected by a form or parsed from a sheet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<u32> for RawValue {
    fn from(v: u32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Mapping of input name to raw value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInputs(BTreeMap<String, RawValue>);

impl RawInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<RawValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Read a required numeric field, checking it against `range`
    fn number(&self, field: &'static str, range: ValueRange) -> Result<f64, ValidationError> {
        let raw = self
            .get(field)
            .ok_or(ValidationError::MissingField { field })?;

        let value = match raw {
            RawValue::Number(n) => *n,
            RawValue::Text(s) if s.trim().is_empty() => {
                return Err(ValidationError::MissingField { field });
            }
            RawValue::Text(s) => s.trim().parse::<f64>().map_err(|_| ValidationError::NotNumeric {
                field,
                raw: s.clone(),
            })?,
        };

        if !value.is_finite() {
            return Err(ValidationError::NotNumeric {
                field,
                raw: value.to_string(),
            });
        }

        if !range.contains(value) {
            return Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.min,
                max: range.max,
            });
        }

        Ok(value)
    }
}

// ============================================================================
// Feature Vector
// ============================================================================

/// Validated bundle of the eight measurements.
///
/// Only obtainable through [`validate`] or [`FeatureVector::from_values`],
/// so every instance is within the plausible ranges.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FeatureVector {
    age: u32,
    bmi: f64,
    glucose: f64,
    diastolic_bp: f64,
    insulin: f64,
    pedigree: f64,
    pregnancies: u32,
    skin_thickness: f64,
}

impl FeatureVector {
    /// Checked constructor taking BMI directly.
    ///
    /// Used by the trainer and by fixtures; form input goes through
    /// [`validate`] so BMI is derived there.
    #[allow(clippy::too_many_arguments)]
    pub fn from_values(
        age: u32,
        bmi: f64,
        glucose: f64,
        diastolic_bp: f64,
        insulin: f64,
        pedigree: f64,
        pregnancies: u32,
        skin_thickness: f64,
    ) -> Result<Self, ValidationError> {
        let fv = Self {
            age,
            bmi,
            glucose,
            diastolic_bp,
            insulin,
            pedigree,
            pregnancies,
            skin_thickness,
        };
        for feature in Feature::ALL {
            let value = fv.get(feature);
            let range = feature.range();
            if !value.is_finite() {
                return Err(ValidationError::NotNumeric {
                    field: feature.key(),
                    raw: value.to_string(),
                });
            }
            if !range.contains(value) {
                return Err(ValidationError::OutOfRange {
                    field: feature.key(),
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(fv)
    }

    pub const fn age(&self) -> u32 {
        self.age
    }

    pub const fn bmi(&self) -> f64 {
        self.bmi
    }

    pub const fn glucose(&self) -> f64 {
        self.glucose
    }

    pub const fn diastolic_bp(&self) -> f64 {
        self.diastolic_bp
    }

    pub const fn insulin(&self) -> f64 {
        self.insulin
    }

    pub const fn pedigree(&self) -> f64 {
        self.pedigree
    }

    pub const fn pregnancies(&self) -> u32 {
        self.pregnancies
    }

    pub const fn skin_thickness(&self) -> f64 {
        self.skin_thickness
    }

    /// Value of a single feature
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Pregnancies => f64::from(self.pregnancies),
            Feature::Glucose => self.glucose,
            Feature::DiastolicBp => self.diastolic_bp,
            Feature::SkinThickness => self.skin_thickness,
            Feature::Insulin => self.insulin,
            Feature::Bmi => self.bmi,
            Feature::Pedigree => self.pedigree,
            Feature::Age => f64::from(self.age),
        }
    }

    /// Values laid out in the given feature order
    pub fn ordered(&self, order: &[Feature; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        order.map(|f| self.get(f))
    }
}

/// Validate a raw input mapping into a [`FeatureVector`].
///
/// Fields are checked in canonical feature order, with BMI derived from
/// `height_cm` and `weight_kg` at its position, so the reported error is
/// always the first offending field in that order.
pub fn validate(raw: &RawInputs) -> Result<FeatureVector, ValidationError> {
    let pregnancies = integral(raw, Feature::Pregnancies)?;
    let glucose = raw.number(Feature::Glucose.key(), Feature::Glucose.range())?;
    let diastolic_bp = raw.number(Feature::DiastolicBp.key(), Feature::DiastolicBp.range())?;
    let skin_thickness = raw.number(Feature::SkinThickness.key(), Feature::SkinThickness.range())?;
    let insulin = raw.number(Feature::Insulin.key(), Feature::Insulin.range())?;
    let bmi = derive_bmi(raw)?;
    let pedigree = raw.number(Feature::Pedigree.key(), Feature::Pedigree.range())?;
    let age = integral(raw, Feature::Age)?;

    Ok(FeatureVector {
        age,
        bmi,
        glucose,
        diastolic_bp,
        insulin,
        pedigree,
        pregnancies,
        skin_thickness,
    })
}

/// BMI = weight_kg / height_m²
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

fn derive_bmi(raw: &RawInputs) -> Result<f64, ValidationError> {
    let height_cm = raw.number(HEIGHT_CM, HEIGHT_RANGE)?;
    let weight_kg = raw.number(WEIGHT_KG, WEIGHT_RANGE)?;
    let bmi = compute_bmi(weight_kg, height_cm);

    let range = Feature::Bmi.range();
    if !range.contains(bmi) {
        return Err(ValidationError::OutOfRange {
            field: Feature::Bmi.key(),
            value: bmi,
            min: range.min,
            max: range.max,
        });
    }
    Ok(bmi)
}

fn integral(raw: &RawInputs, feature: Feature) -> Result<u32, ValidationError> {
    let value = raw.number(feature.key(), feature.range())?;
    if value.fract() != 0.0 {
        return Err(ValidationError::NotIntegral {
            field: feature.key(),
            value,
        });
    }
    // Whole and within a non-negative range, so the cast is exact
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = value as u32;
    Ok(whole)
}
