// src/scrape/years.rs
use std::{
    collections::BTreeSet,
    sync::{Arc, atomic::{AtomicUsize, Ordering}, mpsc},
    thread,
};

use tracing::{error, info};

use crate::{
    config::{FetchOptions, ScrapeOptions},
    core::PageSource,
    progress::Progress,
    records::YearDataset,
};

use super::collect_year;

/// Outcome of a multi-year run. Completed years are kept whatever happened
/// to the others.
#[derive(Debug, Default)]
pub struct MultiYearReport {
    /// Successful years, ascending.
    pub years: Vec<YearDataset>,
    /// Failed years with the reason, ascending.
    pub failed: Vec<(i32, String)>,
}

impl MultiYearReport {
    pub fn total_votes(&self) -> usize {
        self.years.iter().map(|y| y.metas.len()).sum()
    }

    pub fn total_senator_rows(&self) -> usize {
        self.years.iter().map(|y| y.votes.len()).sum()
    }

    pub fn skipped_votes(&self) -> usize {
        self.years.iter().map(|y| y.skipped.len()).sum()
    }
}

/// Collect several years concurrently.
///
/// A fixed pool of `min(workers, years)` threads pulls years off a shared
/// counter; each year runs [`collect_year`] independently. Results come back
/// over a channel to this thread, which alone owns the report. A failing
/// year is logged once and recorded; it never stops the other workers.
pub fn collect_years(
    source: Arc<dyn PageSource>,
    fetch: &FetchOptions,
    scrape: &ScrapeOptions,
    years: &[i32],
    mut progress: Option<&mut dyn Progress>,
) -> MultiYearReport {
    let years: Vec<i32> = years.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

    if let Some(p) = progress.as_deref_mut() {
        p.begin(years.len());
    }
    if years.is_empty() {
        if let Some(p) = progress.as_deref_mut() {
            p.log("No years to collect.");
            p.finish();
        }
        return MultiYearReport::default();
    }

    type YearResult = (i32, Result<YearDataset, String>);

    let years_arc = Arc::new(years.clone());
    let counter = Arc::new(AtomicUsize::new(0));
    let (res_tx, res_rx) = mpsc::channel::<YearResult>();

    let workers = scrape.workers.min(years.len()).max(1);
    info!(years = years.len(), workers, "starting multi-year collection");

    for _ in 0..workers {
        let years = Arc::clone(&years_arc);
        let idx = Arc::clone(&counter);
        let tx = res_tx.clone();
        let source = Arc::clone(&source);
        let fetch = fetch.clone();
        let scrape = scrape.clone();

        thread::spawn(move || {
            loop {
                let i = idx.fetch_add(1, Ordering::Relaxed);
                if i >= years.len() {
                    break;
                }
                let year = years[i];
                let result = collect_year(source.as_ref(), &fetch, &scrape, year).map_err(|e| e.to_string());
                if tx.send((year, result)).is_err() {
                    break;
                }
            }
        });
    }
    drop(res_tx); // this thread is the sole receiver now

    let mut report = MultiYearReport::default();
    let mut heard = BTreeSet::new();

    for _ in 0..years.len() {
        match res_rx.recv() {
            Ok((year, Ok(ds))) => {
                heard.insert(year);
                if let Some(p) = progress.as_deref_mut() {
                    p.item_done(year, ds.metas.len());
                }
                report.years.push(ds);
            }
            Ok((year, Err(msg))) => {
                heard.insert(year);
                error!(year, error = %msg, "year failed");
                if let Some(p) = progress.as_deref_mut() {
                    p.item_failed(year, &msg);
                }
                report.failed.push((year, msg));
            }
            Err(_) => break, // workers ended early
        }
    }

    // A worker that panicked never reports its year.
    for year in years.iter().copied().filter(|y| !heard.contains(y)) {
        let msg = s!("worker stopped before finishing this year");
        error!(year, error = %msg, "year failed");
        if let Some(p) = progress.as_deref_mut() {
            p.item_failed(year, &msg);
        }
        report.failed.push((year, msg));
    }

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }

    report.years.sort_by_key(|y| y.year);
    report.failed.sort_by_key(|(y, _)| *y);
    info!(
        succeeded = report.years.len(),
        failed = report.failed.len(),
        votes = report.total_votes(),
        senator_rows = report.total_senator_rows(),
        "multi-year collection finished"
    );
    report
}
