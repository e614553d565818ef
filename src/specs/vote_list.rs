// src/specs/vote_list.rs
//
// Roll-call listing page: /legislative/LIS/roll_call_lists/vote_menu_<congress>_<session>.htm

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::config::consts::LISTING_PATH;
use crate::core::html::{sel, text_of};
use crate::core::sanitize::leading_digits;
use crate::error::ParseError;
use crate::records::Session;

static TABLE: LazyLock<Selector> = LazyLock::new(|| sel("table#listOfVotes"));
static PAGER: LazyLock<Selector> = LazyLock::new(|| sel(r#"select[name="listOfVotes_length"]"#));
static OPTION: LazyLock<Selector> = LazyLock::new(|| sel("option"));
static ROW: LazyLock<Selector> = LazyLock::new(|| sel("tr"));
static FIRST_CELL_LINK: LazyLock<Selector> = LazyLock::new(|| sel("td:first-child a[href]"));

// ".../vote_118_2_00339.htm" → 339
static HREF_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d+)\.html?$").unwrap_or_else(|e| panic!("{e}")));

/// Value of the pager option that shows every row.
const SHOW_ALL: &str = "-1";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteLink {
    pub vote_number: u32,
    pub url: String,
}

pub fn listing_url(base_url: &str, session: Session) -> String {
    format!(
        "{}{}/vote_menu_{}_{}.htm",
        base_url.trim_end_matches('/'),
        LISTING_PATH,
        session.congress,
        session.session
    )
}

/// Read every detail link from a listing page.
///
/// The page paginates client-side through the `listOfVotes_length` pager.
/// Choosing its "All" option only un-hides rows that the served markup
/// already contains, so for fetched markup it is enough to confirm the
/// option exists and then read the whole table. A missing pager is
/// deliberately not an error: markup served without it (no script ran) is
/// already complete, so the table is read as-is.
pub fn parse_listing(doc: &str, page_url: &str) -> Result<Vec<VoteLink>, ParseError> {
    let base = Url::parse(page_url)
        .map_err(|e| ParseError::BadUrl { url: s!(page_url), message: e.to_string() })?;
    let html = Html::parse_document(doc);

    match html.select(&PAGER).next() {
        Some(pager) => {
            let has_all = pager
                .select(&OPTION)
                .any(|o| o.value().attr("value") == Some(SHOW_ALL));
            if !has_all {
                return Err(ParseError::NoShowAll { url: s!(page_url) });
            }
            debug!(url = page_url, "pager set to show all rows");
        }
        None => debug!(url = page_url, "no pager on page; table served in full"),
    }

    let table = html
        .select(&TABLE)
        .next()
        .ok_or_else(|| ParseError::MissingElement { what: "vote table #listOfVotes", url: s!(page_url) })?;

    let mut links = Vec::new();
    for row in table.select(&ROW) {
        let Some(a) = row.select(&FIRST_CELL_LINK).next() else {
            continue; // header rows
        };
        let Some(href) = a.value().attr("href") else { continue };
        let url = match base.join(href.trim()) {
            Ok(u) => u.to_string(),
            Err(e) => {
                warn!(href, error = %e, "skipping listing row with unusable link");
                continue;
            }
        };
        let text = text_of(a);
        let number = leading_digits(&text)
            .and_then(|d| d.parse::<u32>().ok())
            .or_else(|| number_from_href(href));
        match number {
            Some(vote_number) => links.push(VoteLink { vote_number, url }),
            None => warn!(href, text = %text, "skipping listing row without a vote number"),
        }
    }

    if links.is_empty() {
        return Err(ParseError::NoLinks { url: s!(page_url) });
    }

    links.sort_by_key(|l| l.vote_number);
    links.dedup_by_key(|l| l.vote_number);
    Ok(links)
}

fn number_from_href(href: &str) -> Option<u32> {
    HREF_NUMBER
        .captures(href.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
