//! CART Decision Tree
//!
//! Binary classification tree grown with Gini impurity. Nodes live in a
//! flat arena; children always sit at higher indices than their parent,
//! which keeps traversal bounded for trees loaded from disk.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{ForestParams, Row};
use crate::features::FEATURE_COUNT;

/// A tree node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Terminal node holding the fraction of positive training samples
    Leaf { positive_rate: f64, samples: usize },

    /// `row[feature] <= threshold` goes left, otherwise right
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted classification tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Node>", into = "Vec<Node>")]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Build from an explicit node list (root at index 0), checking shape
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, String> {
        if nodes.is_empty() {
            return Err("tree has no nodes".into());
        }

        for (idx, node) in nodes.iter().enumerate() {
            match *node {
                Node::Leaf { positive_rate, .. } => {
                    if !(0.0..=1.0).contains(&positive_rate) {
                        return Err(format!("node {idx}: positive rate {positive_rate} outside [0, 1]"));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= FEATURE_COUNT {
                        return Err(format!("node {idx}: feature index {feature} out of bounds"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx}: non-finite threshold"));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= nodes.len() {
                            return Err(format!("node {idx}: invalid child index {child}"));
                        }
                    }
                }
            }
        }

        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of splits from root to the deepest leaf
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }

    /// Probability of the positive class for `row`
    pub fn predict_proba(&self, row: &Row) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { positive_rate, .. } => return positive_rate,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    /// Grow a tree on the rows selected by `indices` (duplicates allowed).
    ///
    /// Returns the tree and its impurity-decrease importance per feature,
    /// normalised to sum to 1 (all zero for a single-leaf tree).
    pub fn fit<R: Rng>(
        rows: &[Row],
        labels: &[bool],
        indices: &mut [usize],
        params: &ForestParams,
        rng: &mut R,
    ) -> (Self, [f64; FEATURE_COUNT]) {
        let mut builder = Builder {
            rows,
            labels,
            params,
            rng,
            nodes: Vec::new(),
            importances: [0.0; FEATURE_COUNT],
        };
        builder.grow(indices, 0);

        let mut importances = builder.importances;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for value in &mut importances {
                *value /= total;
            }
        }

        (Self { nodes: builder.nodes }, importances)
    }
}

impl TryFrom<Vec<Node>> for DecisionTree {
    type Error = String;

    fn try_from(nodes: Vec<Node>) -> Result<Self, Self::Error> {
        Self::from_nodes(nodes)
    }
}

impl From<DecisionTree> for Vec<Node> {
    fn from(tree: DecisionTree) -> Self {
        tree.nodes
    }
}

/// Best split found for a node
struct Candidate {
    feature: usize,
    threshold: f64,
    /// Weighted child impurity (lower is better)
    impurity: f64,
}

struct Builder<'a, R> {
    rows: &'a [Row],
    labels: &'a [bool],
    params: &'a ForestParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
    importances: [f64; FEATURE_COUNT],
}

impl<R: Rng> Builder<'_, R> {
    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let n = indices.len();
        let positives = indices.iter().filter(|&&i| self.labels[i]).count();

        let idx = self.nodes.len();
        self.nodes.push(leaf(positives, n));

        let pure = positives == 0 || positives == n;
        if pure || depth >= self.params.max_depth || n < self.params.min_samples_split {
            return idx;
        }

        let parent_impurity = gini(positives, n);
        let Some(best) = self.best_split(indices, parent_impurity) else {
            return idx;
        };

        // Partition in place: left block first
        let mut boundary = 0;
        for i in 0..n {
            if self.rows[indices[i]][best.feature] <= best.threshold {
                indices.swap(i, boundary);
                boundary += 1;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let weight = n as f64;
        self.importances[best.feature] += weight * (parent_impurity - best.impurity);

        let (left_indices, right_indices) = indices.split_at_mut(boundary);
        let left = self.grow(left_indices, depth + 1);
        let right = self.grow(right_indices, depth + 1);

        self.nodes[idx] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(&mut self, indices: &[usize], parent_impurity: f64) -> Option<Candidate> {
        let mut features: [usize; FEATURE_COUNT] = std::array::from_fn(|i| i);
        features.shuffle(self.rng);
        let max_features = self.params.features_per_split();

        let n = indices.len();
        let total_pos = indices.iter().filter(|&&i| self.labels[i]).count();
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut best: Option<Candidate> = None;
        let mut column: Vec<(f64, bool)> = Vec::with_capacity(n);

        for &feature in features.iter().take(max_features) {
            column.clear();
            column.extend(indices.iter().map(|&i| (self.rows[i][feature], self.labels[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0;
            for split in 1..n {
                if column[split - 1].1 {
                    left_pos += 1;
                }

                let (lo, hi) = (column[split - 1].0, column[split].0);
                if lo >= hi || split < min_leaf || n - split < min_leaf {
                    continue;
                }

                #[allow(clippy::cast_precision_loss)]
                let impurity = (split as f64 * gini(left_pos, split)
                    + (n - split) as f64 * gini(total_pos - left_pos, n - split))
                    / n as f64;

                let improves = impurity < parent_impurity - 1e-12;
                let beats = best.as_ref().is_none_or(|b| impurity < b.impurity);
                if improves && beats {
                    best = Some(Candidate {
                        feature,
                        threshold: lo + (hi - lo) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

fn leaf(positives: usize, n: usize) -> Node {
    #[allow(clippy::cast_precision_loss)]
    let positive_rate = if n == 0 { 0.0 } else { positives as f64 / n as f64 };
    Node::Leaf {
        positive_rate,
        samples: n,
    }
}

/// Gini impurity of a binary node: 2p(1 - p)
fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}
