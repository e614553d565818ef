// src/config/consts.rs

// Net config
pub const BASE_URL: &str = "https://www.senate.gov";
pub const LISTING_PATH: &str = "/legislative/LIS/roll_call_lists";
pub const USER_AGENT: &str = concat!("senate_votes/", env!("CARGO_PKG_VERSION"));
pub const TIMEOUT_SECS: u64 = 30;

// Retry
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY_MS: u64 = 2_000;
pub const RETRY_DELAY_CAP_MS: u64 = 30_000;

// Concurrency
pub const WORKERS: usize = 4;
pub const REQUEST_PAUSE_MS: u64 = 1_000; // be polite
pub const JITTER_MS: u64 = 250; // extra 0..250 ms

// Export
pub const DEFAULT_OUT_DIR: &str = "senate_votes";
pub const DEFAULT_STEM: &str = "senate_votes";
pub const MERGED_STEM: &str = "senate_votes_all";

// Features
pub const DEFAULT_PASS_RATE: f64 = 0.5;

// Forest
pub const N_TREES: usize = 200;
pub const MAX_DEPTH: usize = 10;
pub const MIN_SAMPLES_SPLIT: usize = 2;
pub const SEED: u64 = 42;
pub const TEST_FRACTION: f64 = 0.2;
