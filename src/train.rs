// src/train.rs
use std::{fmt, fs, path::Path};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::{SplitMethod, TrainOptions},
    error::TrainError,
    features::{FEATURE_NAMES, FEATURE_SCHEMA_VERSION, FeatureRow},
    file::ensure_parent,
    forest::{ForestParams, RandomForest},
};

/// Each partition needs at least this many rows.
const MIN_PARTITION: usize = 2;

/// Cut `rows` into (train, test).
///
/// Chronological keeps the earliest rows for training and the latest for
/// testing; Random shuffles with a fixed seed first. The test share is
/// `ceil(n * test_fraction)`.
pub fn split(rows: &[FeatureRow], method: SplitMethod, test_fraction: f64) -> (Vec<FeatureRow>, Vec<FeatureRow>) {
    let mut rows = rows.to_vec();
    match method {
        SplitMethod::Chronological => rows.sort_by_key(|r| (r.date, r.key)),
        SplitMethod::Random { seed } => {
            rows.sort_by_key(|r| r.key);
            rows.shuffle(&mut StdRng::seed_from_u64(seed));
        }
    }
    let n_test = test_size(rows.len(), test_fraction);
    let test = rows.split_off(rows.len() - n_test);
    (rows, test)
}

fn test_size(n: usize, test_fraction: f64) -> usize {
    let f = test_fraction.clamp(0.0, 1.0);
    ((n as f64 * f).ceil() as usize).min(n)
}

/// Smallest row count that leaves both partitions at least [`MIN_PARTITION`] rows.
fn rows_needed(test_fraction: f64) -> usize {
    (2 * MIN_PARTITION..10_000)
        .find(|&n| {
            let t = test_size(n, test_fraction);
            t >= MIN_PARTITION && n - t >= MIN_PARTITION
        })
        .unwrap_or(usize::MAX)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(tp: usize, fp: usize, fn_: usize) -> Self {
        let ratio = |a: usize, b: usize| if b == 0 { 0.0 } else { a as f64 / b as f64 };
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 { 0.0 } else { 2.0 * precision * recall / (precision + recall) };
        Self { precision, recall, f1, support: tp + fn_ }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub failed: ClassMetrics,
    pub passed: ClassMetrics,
    pub macro_avg: ClassMetrics,
    /// Highest first.
    pub importances: Vec<(String, f64)>,
}

impl EvaluationReport {
    fn evaluate(forest: &RandomForest, train: &[FeatureRow], test: &[FeatureRow]) -> Self {
        let accuracy = |rows: &[FeatureRow]| {
            if rows.is_empty() {
                return 0.0;
            }
            let hits = rows.iter().filter(|r| forest.predict(&r.values) == r.passed).count();
            hits as f64 / rows.len() as f64
        };

        let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
        for r in test {
            match (forest.predict(&r.values), r.passed) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, false) => tn += 1,
                (false, true) => fn_ += 1,
            }
        }
        let passed = ClassMetrics::from_counts(tp, fp, fn_);
        let failed = ClassMetrics::from_counts(tn, fn_, fp);
        let macro_avg = ClassMetrics {
            precision: (passed.precision + failed.precision) / 2.0,
            recall: (passed.recall + failed.recall) / 2.0,
            f1: (passed.f1 + failed.f1) / 2.0,
            support: passed.support + failed.support,
        };

        let mut importances: Vec<(String, f64)> = FEATURE_NAMES
            .iter()
            .zip(forest.feature_importances())
            .map(|(n, v)| (s!(*n), *v))
            .collect();
        importances.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            train_rows: train.len(),
            test_rows: test.len(),
            train_accuracy: accuracy(train),
            test_accuracy: accuracy(test),
            failed,
            passed,
            macro_avg,
            importances,
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {} train / {} test", self.train_rows, self.test_rows)?;
        writeln!(f, "Train accuracy: {:.3}", self.train_accuracy)?;
        writeln!(f, "Test accuracy:  {:.3}", self.test_accuracy)?;
        writeln!(f)?;
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for (label, m) in [("Failed", &self.failed), ("Passed", &self.passed), ("macro avg", &self.macro_avg)] {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Feature importance:")?;
        for (name, v) in &self.importances {
            writeln!(f, "  {name:<28} {v:.4}")?;
        }
        Ok(())
    }
}

/// A fitted forest plus the feature layout it was fitted on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub forest: RandomForest,
}

impl TrainedModel {
    fn check_schema(&self) -> Result<(), TrainError> {
        let current: Vec<String> = FEATURE_NAMES.iter().map(|n| s!(*n)).collect();
        if self.schema_version != FEATURE_SCHEMA_VERSION || self.feature_names != current {
            return Err(TrainError::SchemaMismatch { expected: self.feature_names.clone(), actual: current });
        }
        Ok(())
    }

    /// Probability that the vote passes.
    pub fn predict_proba(&self, row: &FeatureRow) -> Result<f64, TrainError> {
        self.check_schema()?;
        if row.values.len() != self.feature_names.len() {
            return Err(TrainError::WidthMismatch { expected: self.feature_names.len(), actual: row.values.len() });
        }
        Ok(self.forest.predict_proba(&row.values))
    }

    pub fn predict(&self, row: &FeatureRow) -> Result<bool, TrainError> {
        self.predict_proba(row).map(|p| p >= 0.5)
    }

    pub fn save(&self, path: &Path) -> Result<(), TrainError> {
        let io = |message: String| TrainError::ModelIo { path: path.to_path_buf(), message };
        ensure_parent(path).map_err(|e| io(e.to_string()))?;
        let json = serde_json::to_string(self).map_err(|e| io(e.to_string()))?;
        fs::write(path, json).map_err(|e| io(e.to_string()))?;
        info!(path = %path.display(), "model saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, TrainError> {
        let io = |message: String| TrainError::ModelIo { path: path.to_path_buf(), message };
        let text = fs::read_to_string(path).map_err(|e| io(e.to_string()))?;
        let model: Self = serde_json::from_str(&text).map_err(|e| io(e.to_string()))?;
        model.check_schema()?;
        Ok(model)
    }
}

/// Split, fit and evaluate.
pub fn train(rows: &[FeatureRow], opts: &TrainOptions) -> Result<(TrainedModel, EvaluationReport), TrainError> {
    let (train_rows, test_rows) = split(rows, opts.split, opts.test_fraction);
    if train_rows.len() < MIN_PARTITION || test_rows.len() < MIN_PARTITION {
        return Err(TrainError::TooFewRows { rows: rows.len(), needed: rows_needed(opts.test_fraction) });
    }
    info!(
        train = train_rows.len(),
        test = test_rows.len(),
        split = ?opts.split,
        trees = opts.n_trees,
        "training forest"
    );

    let x: Vec<Vec<f64>> = train_rows.iter().map(|r| r.values.clone()).collect();
    let y: Vec<bool> = train_rows.iter().map(|r| r.passed).collect();
    let forest = RandomForest::fit(
        &x,
        &y,
        ForestParams {
            n_trees: opts.n_trees,
            max_depth: opts.max_depth,
            min_samples_split: opts.min_samples_split,
            seed: opts.seed,
        },
    )?;

    info!(
        trees = forest.n_trees(),
        features = forest.n_features(),
        max_depth = forest.params().max_depth,
        seed = forest.params().seed,
        "forest fitted"
    );

    let report = EvaluationReport::evaluate(&forest, &train_rows, &test_rows);
    info!(train_accuracy = report.train_accuracy, test_accuracy = report.test_accuracy, "evaluation done");

    let model = TrainedModel {
        schema_version: FEATURE_SCHEMA_VERSION,
        feature_names: FEATURE_NAMES.iter().map(|n| s!(*n)).collect(),
        forest,
    };
    Ok((model, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{MeasureType, VoteKey};
    use chrono::NaiveDate;

    fn row(n: u32, day: u32, passed: bool) -> FeatureRow {
        FeatureRow {
            key: VoteKey { year: 2024, vote_number: n },
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap().and_hms_opt(12, 0, 0).unwrap(),
            measure_type: MeasureType::Bill,
            passed,
            values: vec![0.0; FEATURE_NAMES.len()],
        }
    }

    #[test]
    fn chronological_split_tests_on_latest() {
        let rows: Vec<FeatureRow> = (1..=10).rev().map(|d| row(d, d, d % 2 == 0)).collect();
        let (train, test) = split(&rows, SplitMethod::Chronological, 0.2);
        assert_eq!(train.len(), 8);
        assert_eq!(test.iter().map(|r| r.key.vote_number).collect::<Vec<_>>(), vec![9, 10]);
        assert!(train.iter().all(|r| r.key.vote_number <= 8));
    }

    #[test]
    fn random_split_is_seeded() {
        let rows: Vec<FeatureRow> = (1..=20).map(|d| row(d, d, d % 2 == 0)).collect();
        let a = split(&rows, SplitMethod::Random { seed: 9 }, 0.25);
        let b = split(&rows, SplitMethod::Random { seed: 9 }, 0.25);
        assert_eq!(a, b);
        assert_eq!(a.1.len(), 5);
    }

    #[test]
    fn too_few_rows() {
        let rows: Vec<FeatureRow> = (1..=4).map(|d| row(d, d, d % 2 == 0)).collect();
        let err = train(&rows, &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, TrainError::TooFewRows { rows: 4, needed: 6 }));
    }

    #[test]
    fn metrics_from_counts() {
        let m = ClassMetrics::from_counts(3, 1, 1);
        assert_eq!(m.precision, 0.75);
        assert_eq!(m.recall, 0.75);
        assert_eq!(m.support, 4);
        assert_eq!(ClassMetrics::from_counts(0, 0, 2).f1, 0.0);
    }

    #[test]
    fn schema_change_is_rejected() {
        let rows: Vec<FeatureRow> = (1..=12)
            .map(|d| {
                let mut r = row(d, d, d > 6);
                r.values[0] = f64::from(d);
                r
            })
            .collect();
        let opts = TrainOptions { n_trees: 5, ..Default::default() };
        let (mut model, _) = train(&rows, &opts).unwrap();
        assert!(model.predict(&rows[0]).is_ok());

        model.feature_names.pop();
        assert!(matches!(model.predict(&rows[0]), Err(TrainError::SchemaMismatch { .. })));
    }
}
