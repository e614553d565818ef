// src/core/net.rs
//
// Page fetching. Everything that reads pages goes through `PageSource`, so
// tests and fixtures can stand in for the live site.

use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::config::FetchOptions;
use crate::config::consts::RETRY_DELAY_CAP_MS;
use crate::error::FetchError;

/// Returns the markup of a page, or why it could not be had.
pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTPS fetcher with bounded retry on transient failures.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(opts: &FetchOptions) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(opts.user_agent.as_str())
            .timeout(opts.timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            max_retries: opts.max_retries,
            retry_delay: opts.retry_delay,
        })
    }

    /// One request, no retry.
    fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), url: s!(url) });
        }
        resp.text().map_err(|e| FetchError::Body { url: s!(url), message: e.to_string() })
    }

    /// Check the source answers at all before starting a run.
    pub fn probe(&self, url: &str) -> Result<(), FetchError> {
        self.fetch(url).map(|_| ())
    }
}

impl PageSource for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(url, attempt, "fetching");

            match self.fetch_once(url) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    let backoff = backoff_delay(self.retry_delay, attempt);
                    warn!(
                        url,
                        attempt,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "retrying fetch"
                    );
                    thread::sleep(backoff);
                }
                Err(e) if e.is_transient() => {
                    return Err(FetchError::Exhausted {
                        url: s!(url),
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// `base * 2^(attempt-1)`, capped, with up to 10% random jitter on top.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let ms = (base.as_millis() as u64)
        .saturating_mul(1u64 << exp)
        .min(RETRY_DELAY_CAP_MS);
    let jitter = if ms >= 10 { rand::thread_rng().gen_range(0..=ms / 10) } else { 0 };
    Duration::from_millis(ms + jitter)
}

/// Random extra pause in `0..=max`, to keep workers from hitting the site in lockstep.
pub fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

/// Polite pause between two requests of the same worker.
pub fn pause(base: Duration, max_jitter: Duration) {
    let total = base + jitter(max_jitter);
    if !total.is_zero() {
        thread::sleep(total);
    }
}
