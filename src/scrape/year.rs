// src/scrape/year.rs
use tracing::{debug, info, warn};

use crate::{
    config::{FetchOptions, ScrapeOptions},
    core::{PageSource, net::pause},
    error::PageError,
    records::{Session, SkippedVote, VoteKey, YearDataset},
    specs::{vote_detail, vote_list},
};

/// Collect every roll-call vote of one year.
///
/// The listing page must load and parse, otherwise the whole year fails.
/// Individual detail pages that fail to fetch or parse are recorded in
/// `skipped` and the year carries on. Output is ordered by vote number.
pub fn collect_year(
    source: &dyn PageSource,
    fetch: &FetchOptions,
    scrape: &ScrapeOptions,
    year: i32,
) -> Result<YearDataset, PageError> {
    let session = Session::for_year(year).ok_or(PageError::InvalidYear(year))?;
    let listing = vote_list::listing_url(&fetch.base_url, session);

    info!(year, url = %listing, "fetching vote listing");
    let doc = source.fetch(&listing)?;
    let mut links = vote_list::parse_listing(&doc, &listing)?;
    if let Some(limit) = scrape.limit {
        links.truncate(limit);
    }
    info!(year, votes = links.len(), "found votes to process");

    let mut out = YearDataset::new(year);

    for link in links {
        pause(scrape.request_pause, scrape.jitter);

        let key = VoteKey { year, vote_number: link.vote_number };
        let page = source
            .fetch(&link.url)
            .map_err(PageError::from)
            .and_then(|doc| vote_detail::parse_detail(&doc, key, &link.url).map_err(PageError::from));

        match page {
            Ok(page) => {
                debug!(vote = %key, date = %page.bundle.meta.date, rows = page.bundle.votes.len(), "processed vote");
                out.row_warnings += page.warnings.len();
                out.push(page.bundle);
            }
            Err(e) => {
                warn!(vote = %key, url = %link.url, error = %e, "skipping vote page");
                out.skipped.push(SkippedVote { key, url: link.url, reason: e.to_string() });
            }
        }
    }

    out.sort();
    info!(
        year,
        votes = out.metas.len(),
        senator_rows = out.votes.len(),
        skipped = out.skipped.len(),
        row_warnings = out.row_warnings,
        "year collected"
    );
    Ok(out)
}
