// src/progress.rs
use tracing::{debug, info};

/// Progress reporting for long-running collection runs.
/// Frontends implement this to surface status to users; all calls happen on
/// the thread that started the run.
pub trait Progress {
    /// Called at the start with the total number of units (years or pages).
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One year finished; `votes` is how many vote pages made it in.
    fn item_done(&mut self, _year: i32, _votes: usize) {}

    /// One year was dropped.
    fn item_failed(&mut self, _year: i32, _reason: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Mirrors progress into the log, with a running count.
#[derive(Default)]
pub struct LogProgress {
    total: usize,
    seen: usize,
}

impl Progress for LogProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.seen = 0;
    }

    fn log(&mut self, msg: &str) {
        info!("{msg}");
    }

    fn item_done(&mut self, year: i32, votes: usize) {
        self.seen += 1;
        info!(year, votes, "[{}/{}] year collected", self.seen, self.total);
    }

    /// The failure itself is logged by the orchestrator; this only moves the count.
    fn item_failed(&mut self, _year: i32, _reason: &str) {
        self.seen += 1;
        debug!("[{}/{}] done", self.seen, self.total);
    }
}
