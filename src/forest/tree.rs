// src/forest/tree.rs
//
// One CART tree: binary splits on `feature <= threshold`, Gini impurity over
// weighted samples. Nodes live in a flat arena; index 0 is the root.

use rand::{Rng, seq::index};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Weighted share of the positive class among the samples that reached it.
    Leaf { proba: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

pub(super) struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub max_features: usize,
}

/// Smallest impurity decrease that counts as a split.
const MIN_GAIN: f64 = 1e-12;

impl DecisionTree {
    /// Grow a tree over `samples` (indices into `x`, repeats allowed).
    /// Returns the tree and its raw impurity decrease per feature.
    pub(super) fn fit<R: Rng>(
        x: &[Vec<f64>],
        y: &[bool],
        weights: &[f64],
        samples: &mut [usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> (Self, Vec<f64>) {
        let n_features = x.first().map_or(0, Vec::len);
        let mut b = Builder {
            x,
            y,
            w: weights,
            params,
            nodes: Vec::new(),
            gains: vec![0.0; n_features],
        };
        b.grow(samples, 0, rng);
        (Self { nodes: b.nodes }, b.gains)
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(Node::Leaf { proba }) => return *proba,
                Some(Node::Split { feature, threshold, left, right }) => {
                    let v = row.get(*feature).copied().unwrap_or(0.0);
                    at = if v <= *threshold { *left } else { *right };
                }
                None => return 0.5,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match nodes.get(at) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

fn gini(w0: f64, w1: f64) -> f64 {
    let total = w0 + w1;
    if total <= 0.0 {
        return 0.0;
    }
    let (p0, p1) = (w0 / total, w1 / total);
    1.0 - p0 * p0 - p1 * p1
}

struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [bool],
    w: &'a [f64],
    params: &'a TreeParams,
    nodes: Vec<Node>,
    gains: Vec<f64>,
}

impl Builder<'_> {
    fn class_weights(&self, samples: &[usize]) -> (f64, f64) {
        samples.iter().fold((0.0, 0.0), |(w0, w1), &i| {
            if self.y[i] { (w0, w1 + self.w[i]) } else { (w0 + self.w[i], w1) }
        })
    }

    fn grow<R: Rng>(&mut self, samples: &mut [usize], depth: usize, rng: &mut R) -> usize {
        let (w0, w1) = self.class_weights(samples);
        let total = w0 + w1;
        let proba = if total > 0.0 { w1 / total } else { 0.5 };

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { proba });

        let pure = w0 <= 0.0 || w1 <= 0.0;
        if pure || depth >= self.params.max_depth || samples.len() < self.params.min_samples_split {
            return id;
        }
        let Some(best) = self.best_split(samples, w0, w1, rng) else {
            return id;
        };

        let mut mid = 0;
        for k in 0..samples.len() {
            if self.x[samples[k]][best.feature] <= best.threshold {
                samples.swap(k, mid);
                mid += 1;
            }
        }
        if mid == 0 || mid == samples.len() {
            return id;
        }

        self.gains[best.feature] += best.gain;
        let (l, r) = samples.split_at_mut(mid);
        let left = self.grow(l, depth + 1, rng);
        let right = self.grow(r, depth + 1, rng);
        self.nodes[id] = Node::Split { feature: best.feature, threshold: best.threshold, left, right };
        id
    }

    /// Best split over a random subset of features, scored by weighted Gini decrease.
    fn best_split<R: Rng>(&self, samples: &[usize], w0: f64, w1: f64, rng: &mut R) -> Option<Candidate> {
        let n_features = self.gains.len();
        if n_features == 0 {
            return None;
        }
        let k = self.params.max_features.clamp(1, n_features);
        let parent = (w0 + w1) * gini(w0, w1);

        let mut order = samples.to_vec();
        let mut best: Option<Candidate> = None;

        for f in index::sample(rng, n_features, k).into_iter() {
            order.sort_by(|&a, &b| self.x[a][f].total_cmp(&self.x[b][f]));

            let (mut l0, mut l1) = (0.0, 0.0);
            for pos in 0..order.len().saturating_sub(1) {
                let i = order[pos];
                if self.y[i] { l1 += self.w[i] } else { l0 += self.w[i] }

                let a = self.x[i][f];
                let b = self.x[order[pos + 1]][f];
                if a >= b {
                    continue;
                }
                let (r0, r1) = (w0 - l0, w1 - l1);
                let children = (l0 + l1) * gini(l0, l1) + (r0 + r1) * gini(r0, r1);
                let gain = parent - children;
                if gain > MIN_GAIN && best.as_ref().is_none_or(|c| gain > c.gain) {
                    let mid = a + (b - a) / 2.0;
                    let threshold = if mid >= b { a } else { mid };
                    best = Some(Candidate { feature: f, threshold, gain });
                }
            }
        }
        best
    }
}
