// src/forest/mod.rs
//! Random-forest classifier for the two-class pass/fail problem.
//!
//! Bagged CART trees: each tree sees a bootstrap sample of the rows and
//! considers √features candidates at every split. Classes are reweighted to
//! balance their total weight. Fitting is deterministic for a given seed.

mod tree;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TrainError;

pub use tree::{DecisionTree, Node};
use tree::TreeParams;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fit on rows `x` with labels `y` (`true` = passed).
    pub fn fit(x: &[Vec<f64>], y: &[bool], params: ForestParams) -> Result<Self, TrainError> {
        if x.len() < 2 || x.len() != y.len() {
            return Err(TrainError::TooFewRows { rows: x.len().min(y.len()), needed: 2 });
        }
        let n_features = x[0].len();
        if let Some(bad) = x.iter().find(|r| r.len() != n_features) {
            return Err(TrainError::WidthMismatch { expected: n_features, actual: bad.len() });
        }

        let positives = y.iter().filter(|&&p| p).count();
        let negatives = y.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(TrainError::SingleClass);
        }

        // n / (classes * count) per class
        let n = y.len() as f64;
        let w_pos = n / (2.0 * positives as f64);
        let w_neg = n / (2.0 * negatives as f64);
        let class_weight: Vec<f64> = y.iter().map(|&p| if p { w_pos } else { w_neg }).collect();

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            max_features: ((n_features as f64).sqrt() as usize).max(1),
        };

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees.max(1));
        let mut importances = vec![0.0; n_features];

        for t in 0..params.n_trees.max(1) {
            let mut samples: Vec<usize> = (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
            let (tree, gains) = DecisionTree::fit(x, y, &class_weight, &mut samples, &tree_params, &mut rng);

            let total: f64 = gains.iter().sum();
            if total > 0.0 {
                for (acc, g) in importances.iter_mut().zip(&gains) {
                    *acc += g / total;
                }
            }
            debug!(tree = t, nodes = tree.node_count(), depth = tree.depth(), "tree grown");
            trees.push(tree);
        }

        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            importances.iter_mut().for_each(|v| *v /= sum);
        }

        Ok(Self { params, n_features, trees, importances })
    }

    /// Mean positive-class probability over all trees.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        self.trees.iter().map(|t| t.predict_proba(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict(&self, row: &[f64]) -> bool {
        self.predict_proba(row) >= 0.5
    }

    /// Mean decrease in impurity per feature, summing to 1 (all zero when no
    /// tree ever split).
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}
