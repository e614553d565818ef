// src/config/options.rs
use std::path::PathBuf;
use std::time::Duration;

use super::consts::*;

/// Process-wide configuration, built once by a binary and handed down
/// explicitly to each component.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppOptions {
    pub fetch: FetchOptions,
    pub scrape: ScrapeOptions,
    pub export: ExportOptions,
    pub train: TrainOptions,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Extra attempts after the first one, for transient failures only.
    pub max_retries: u32,
    /// Base delay; doubles per retry, capped at `RETRY_DELAY_CAP_MS`.
    pub retry_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            base_url: s!(BASE_URL),
            user_agent: s!(USER_AGENT),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub workers: usize,
    /// Pause between consecutive requests of one worker.
    pub request_pause: Duration,
    /// Upper bound of the random extra pause.
    pub jitter: Duration,
    /// Cap on detail pages per year; `None` fetches all of them.
    pub limit: Option<usize>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            workers: WORKERS,
            request_pause: Duration::from_millis(REQUEST_PAUSE_MS),
            jitter: Duration::from_millis(JITTER_MS),
            limit: None,
        }
    }
}

impl ScrapeOptions {
    /// No pauses at all; for tests and local fixtures.
    pub fn unthrottled() -> Self {
        Self {
            request_pause: Duration::ZERO,
            jitter: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportLayout {
    /// One file; rows tagged `Metadata` or `Vote` in the `Section` column.
    #[default]
    Combined,
    /// Two sibling files: `<stem>_metadata.csv` and `<stem>_votes.csv`.
    Split,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    pub out_dir: PathBuf,
    pub layout: ExportLayout,
    /// Multi-year runs: also write every year into one file.
    pub merged: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            layout: ExportLayout::Combined,
            merged: false,
        }
    }
}

impl ExportOptions {
    /// `<out_dir>/<year>/senate_votes_<year>.csv`
    pub fn year_path(&self, year: i32) -> PathBuf {
        self.out_dir
            .join(year.to_string())
            .join(format!("{DEFAULT_STEM}_{year}.csv"))
    }

    /// `<out_dir>/senate_votes_all.csv`
    pub fn merged_path(&self) -> PathBuf {
        self.out_dir.join(format!("{MERGED_STEM}.csv"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SplitMethod {
    /// Earliest rows train, latest rows test.
    #[default]
    Chronological,
    /// Seeded shuffle before the cut.
    Random { seed: u64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainOptions {
    pub split: SplitMethod,
    pub test_fraction: f64,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
    /// Pass rate used when a vote has no prior history to aggregate.
    pub default_pass_rate: f64,
    pub model_out: Option<PathBuf>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            split: SplitMethod::Chronological,
            test_fraction: TEST_FRACTION,
            n_trees: N_TREES,
            max_depth: MAX_DEPTH,
            min_samples_split: MIN_SAMPLES_SPLIT,
            seed: SEED,
            default_pass_rate: DEFAULT_PASS_RATE,
            model_out: None,
        }
    }
}
