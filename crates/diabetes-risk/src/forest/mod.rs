//! Random Forest Classifier
//!
//! Bagged ensemble of CART trees:
//!
//! ```text
//! ┌──────────────┐   bootstrap    ┌────────┐
//! │ training rows├──────────────▶│ tree 0 │──┐
//! │              ├──────────────▶│ tree 1 │──┼──▶ mean P(positive)
//! │              ├──────────────▶│  ...   │──┘
//! └──────────────┘                └────────┘
//! ```
//!
//! Each tree sees its own bootstrap sample and a random subset of
//! features at every split. Tree `i` is seeded with `seed + i`, so a
//! forest is a pure function of (rows, labels, params, seed).

mod tree;

pub use tree::{DecisionTree, Node};

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::features::FEATURE_COUNT;

/// One feature row in training order
pub type Row = [f64; FEATURE_COUNT];

/// Forest hyper-parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features per split; `None` means √(feature count)
    pub max_features: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
        }
    }
}

impl ForestParams {
    /// Number of features considered at each split
    pub fn features_per_split(&self) -> usize {
        self.max_features
            .unwrap_or_else(|| FEATURE_COUNT.isqrt())
            .clamp(1, FEATURE_COUNT)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_trees == 0 {
            return Err("n_trees must be at least 1".into());
        }
        if self.max_depth == 0 {
            return Err("max_depth must be at least 1".into());
        }
        if self.min_samples_split < 2 {
            return Err("min_samples_split must be at least 2".into());
        }
        if self.min_samples_leaf == 0 {
            return Err("min_samples_leaf must be at least 1".into());
        }
        if self.max_features == Some(0) {
            return Err("max_features must be at least 1".into());
        }
        Ok(())
    }
}

/// Fitted ensemble
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DecisionTree>", into = "Vec<DecisionTree>")]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn from_trees(trees: Vec<DecisionTree>) -> Result<Self, String> {
        if trees.is_empty() {
            return Err("forest has no trees".into());
        }
        Ok(Self { trees })
    }

    /// Fit a forest. Returns the forest and mean-decrease-in-impurity
    /// importances normalised to sum to 1.
    ///
    /// The caller guarantees `rows.len() == labels.len()` and that both
    /// classes are present.
    pub fn fit(
        rows: &[Row],
        labels: &[bool],
        params: &ForestParams,
        seed: u64,
    ) -> (Self, [f64; FEATURE_COUNT]) {
        let n = rows.len();
        let mut trees = Vec::with_capacity(params.n_trees);
        let mut importances = [0.0; FEATURE_COUNT];

        for i in 0..params.n_trees {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let mut sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

            let (tree, tree_importances) = DecisionTree::fit(rows, labels, &mut sample, params, &mut rng);
            for (total, value) in importances.iter_mut().zip(tree_importances) {
                *total += value;
            }
            trees.push(tree);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for value in &mut importances {
                *value /= total;
            }
        }

        (Self { trees }, importances)
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Mean positive-class probability over all trees, in [0, 1]
    pub fn predict_proba(&self, row: &Row) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| tree.predict_proba(row)).sum();
        #[allow(clippy::cast_precision_loss)]
        let p = sum / self.trees.len() as f64;
        p.clamp(0.0, 1.0)
    }

    pub fn predict(&self, row: &Row) -> bool {
        self.predict_proba(row) >= 0.5
    }
}

impl TryFrom<Vec<DecisionTree>> for RandomForest {
    type Error = String;

    fn try_from(trees: Vec<DecisionTree>) -> Result<Self, Self::Error> {
        Self::from_trees(trees)
    }
}

impl From<RandomForest> for Vec<DecisionTree> {
    fn from(forest: RandomForest) -> Self {
        forest.trees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two noisy clusters separated on feature 1 and feature 5
    fn clustered(n: usize) -> (Vec<Row>, Vec<bool>) {
        let mut rng = StdRng::seed_from_u64(99);
        let mut rows = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let positive = i % 3 == 0;
            let mut row = [0.0; FEATURE_COUNT];
            for value in &mut row {
                *value = rng.gen_range(0.0..1.0);
            }
            row[1] += if positive { 2.0 } else { 0.0 };
            row[5] += if positive { 1.0 } else { 0.0 };
            rows.push(row);
            labels.push(positive);
        }
        (rows, labels)
    }

    #[test]
    fn test_default_params() {
        let params = ForestParams::default();
        assert_eq!(params.n_trees, 100);
        assert_eq!(params.max_depth, 10);
        assert_eq!(params.min_samples_split, 5);
        assert_eq!(params.min_samples_leaf, 2);
        assert_eq!(params.features_per_split(), 2);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_params() {
        let params = ForestParams {
            n_trees: 0,
            ..ForestParams::default()
        };
        assert!(params.validate().is_err());

        let params = ForestParams {
            min_samples_split: 1,
            ..ForestParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (rows, labels) = clustered(120);
        let params = ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        };

        let (a, imp_a) = RandomForest::fit(&rows, &labels, &params, 42);
        let (b, imp_b) = RandomForest::fit(&rows, &labels, &params, 42);
        assert_eq!(a, b);
        assert_eq!(imp_a, imp_b);
    }

    #[test]
    fn test_fit_learns_signal() {
        let (rows, labels) = clustered(150);
        let params = ForestParams {
            n_trees: 20,
            ..ForestParams::default()
        };
        let (forest, importances) = RandomForest::fit(&rows, &labels, &params, 42);

        let correct = rows
            .iter()
            .zip(&labels)
            .filter(|(row, label)| forest.predict(row) == **label)
            .count();
        assert!(correct * 10 >= rows.len() * 9, "training accuracy too low: {correct}");

        let total: f64 = importances.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        // Signal features dominate the noise features
        assert!(importances[1] > importances[0]);
        assert!(importances[1] > importances[7]);
    }

    #[test]
    fn test_probability_bounds() {
        let (rows, labels) = clustered(60);
        let params = ForestParams {
            n_trees: 5,
            ..ForestParams::default()
        };
        let (forest, _) = RandomForest::fit(&rows, &labels, &params, 1);
        for row in &rows {
            let p = forest.predict_proba(row);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_empty_forest_rejected() {
        assert!(RandomForest::from_trees(Vec::new()).is_err());
        assert!(serde_json::from_str::<RandomForest>("[]").is_err());
    }
}
