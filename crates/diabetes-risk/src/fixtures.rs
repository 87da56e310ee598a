//! Hand-built model and inputs shared by tests

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::artifact::{FeatureStats, ModelMetadata, TrainedModel};
use crate::features::{Feature, FeatureVector, RawInputs};
use crate::forest::{DecisionTree, ForestParams, Node, RandomForest};

fn stump(feature: Feature, threshold: f64, below: f64, above: f64) -> DecisionTree {
    DecisionTree::from_nodes(vec![
        Node::Split {
            feature: feature.index(),
            threshold,
            left: 1,
            right: 2,
        },
        Node::Leaf {
            positive_rate: below,
            samples: 50,
        },
        Node::Leaf {
            positive_rate: above,
            samples: 50,
        },
    ])
    .unwrap()
}

/// Four trees keyed on glucose, BMI and age.
///
/// low_risk_inputs -> 0.1125, high_risk_inputs -> 0.8125,
/// regression_inputs -> 0.7
pub fn fixed_model() -> TrainedModel {
    let nested = DecisionTree::from_nodes(vec![
        Node::Split {
            feature: Feature::Glucose.index(),
            threshold: 160.0,
            left: 1,
            right: 4,
        },
        Node::Split {
            feature: Feature::Bmi.index(),
            threshold: 30.0,
            left: 2,
            right: 3,
        },
        Node::Leaf {
            positive_rate: 0.1,
            samples: 40,
        },
        Node::Leaf {
            positive_rate: 0.5,
            samples: 20,
        },
        Node::Leaf {
            positive_rate: 0.95,
            samples: 40,
        },
    ])
    .unwrap();

    let forest = RandomForest::from_trees(vec![
        stump(Feature::Glucose, 125.0, 0.05, 0.9),
        stump(Feature::Bmi, 29.0, 0.1, 0.8),
        stump(Feature::Age, 40.0, 0.2, 0.6),
        nested,
    ])
    .unwrap();

    let stats = |mean, std_dev| FeatureStats { mean, std_dev };
    let metadata = ModelMetadata {
        model_id: Uuid::nil(),
        trained_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        feature_order: Feature::ALL,
        importances: [0.02, 0.40, 0.05, 0.03, 0.05, 0.25, 0.05, 0.15],
        population: [
            stats(3.0, 3.0),
            stats(120.0, 30.0),
            stats(72.0, 12.0),
            stats(25.0, 10.0),
            stats(120.0, 80.0),
            stats(30.0, 6.0),
            stats(0.45, 0.3),
            stats(40.0, 12.0),
        ],
        params: ForestParams::default(),
        seed: 42,
        training_rows: 100,
        validation_rows: 25,
        validation_accuracy: Some(0.9),
    };

    TrainedModel::from_parts(metadata, forest).unwrap()
}

/// glucose=85, bmi=21, age=25, everything else unremarkable
pub fn low_risk_inputs() -> FeatureVector {
    FeatureVector::from_values(25, 21.0, 85.0, 70.0, 80.0, 0.2, 0, 20.0).unwrap()
}

/// glucose=190, bmi=38, age=60, everything else at the population mean
pub fn high_risk_inputs() -> FeatureVector {
    FeatureVector::from_values(60, 38.0, 190.0, 72.0, 120.0, 0.45, 3, 25.0).unwrap()
}

pub fn regression_inputs() -> FeatureVector {
    FeatureVector::from_values(45, 31.2, 150.0, 85.0, 130.0, 0.6, 2, 30.0).unwrap()
}

/// Form input for the low-risk scenario (BMI 170 cm / 60.7 kg = 21.0)
pub fn low_risk_raw() -> RawInputs {
    RawInputs::new()
        .with("age", 25)
        .with("height_cm", 170)
        .with("weight_kg", 60.7)
        .with("glucose", 85)
        .with("diastolic_bp", 70)
        .with("insulin", 80)
        .with("pedigree", 0.2)
        .with("pregnancies", 0)
        .with("skin_thickness", 20)
}

/// Form input for the high-risk scenario (BMI 165 cm / 103.5 kg = 38.0)
pub fn high_risk_raw() -> RawInputs {
    RawInputs::new()
        .with("age", 60)
        .with("height_cm", 165)
        .with("weight_kg", 103.5)
        .with("glucose", 190)
        .with("diastolic_bp", 72)
        .with("insulin", 120)
        .with("pedigree", 0.45)
        .with("pregnancies", 3)
        .with("skin_thickness", 25)
}
