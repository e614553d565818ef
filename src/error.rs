// src/error.rs
//! Error types for collection, dataset I/O and training.
//!
//! Recovery scopes:
//! - [`FetchError`] is retried inside the fetcher, then skipped by the caller.
//! - [`ParseError`] aborts one page (or one year, for the listing page).
//! - [`RowWarning`] is never returned as `Err`; malformed senator lines are
//!   logged and dropped.

use std::path::PathBuf;

/// Network-level failure for a single URL.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("http client error: {0}")]
    Client(String),

    #[error("gave up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Timeouts, connection errors, 429 and 5xx are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } | Self::Body { .. } => true,
            Self::Status { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Client(_) | Self::Exhausted { .. } => false,
        }
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { url: s!(url) }
        } else if err.is_connect() || err.is_request() {
            Self::Connect { url: s!(url), message: err.to_string() }
        } else if let Some(status) = err.status() {
            Self::Status { status: status.as_u16(), url: s!(url) }
        } else if err.is_body() || err.is_decode() {
            Self::Body { url: s!(url), message: err.to_string() }
        } else {
            Self::Client(err.to_string())
        }
    }
}

/// The page does not have the structure the extractors rely on.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{what} not found on {url}")]
    MissingElement { what: &'static str, url: String },

    #[error("field `{field}` missing on {url}")]
    MissingField { field: &'static str, url: String },

    #[error("unparseable vote date {raw:?} on {url}")]
    BadDate { raw: String, url: String },

    #[error("no senator rows on {url}")]
    NoRows { url: String },

    #[error("listing on {url} has no vote links")]
    NoLinks { url: String },

    #[error("pager on {url} offers no \"All\" option")]
    NoShowAll { url: String },

    #[error("bad URL {url:?}: {message}")]
    BadUrl { url: String, message: String },
}

/// One senator line that could not be read. Logged, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("skipped senator row {line:?}: {reason}")]
pub struct RowWarning {
    pub line: String,
    pub reason: &'static str,
}

/// A page or year that did not make it into the dataset.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("no Senate session for year {0}")]
    InvalidYear(i32),
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} line {line}: {message}")]
    Row {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("path exists but is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("no dataset files under {0}")]
    Empty(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("not enough rows: {rows} (need at least {needed})")]
    TooFewRows { rows: usize, needed: usize },

    #[error("training partition contains only one class")]
    SingleClass,

    #[error("feature schema mismatch: model expects {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("row has {actual} features, model expects {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("model file {path}: {message}")]
    ModelIo { path: PathBuf, message: String },
}

/// Crate-level error for the command entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error("source unreachable at startup: {0}")]
    Unreachable(FetchError),
    #[error("every requested year failed ({0} years)")]
    AllYearsFailed(usize),
    #[error("invalid arguments: {0}")]
    Usage(String),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(FetchError::Timeout { url: s!("u") }.is_transient());
        assert!(FetchError::Status { status: 503, url: s!("u") }.is_transient());
        assert!(FetchError::Status { status: 429, url: s!("u") }.is_transient());
        assert!(!FetchError::Status { status: 404, url: s!("u") }.is_transient());
        assert!(!FetchError::Client(s!("bad")).is_transient());
    }
}
