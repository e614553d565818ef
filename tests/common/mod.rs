// tests/common/mod.rs
//
// In-memory senate.gov stand-in for pipeline tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use senate_votes::config::{FetchOptions, ScrapeOptions};
use senate_votes::core::PageSource;
use senate_votes::error::FetchError;
use senate_votes::records::Session;
use senate_votes::specs::vote_list::listing_url;

pub const BASE: &str = "https://senate.test";

/// One vote page to serve.
pub struct FakeVote {
    pub number: u32,
    pub date: &'static str,
    pub result: &'static str,
    pub measure: &'static str,
    /// (name, party, state, position)
    pub roster: Vec<(&'static str, &'static str, &'static str, &'static str)>,
}

pub fn two_yeas_one_nay() -> Vec<(&'static str, &'static str, &'static str, &'static str)> {
    vec![
        ("Baldwin", "D", "WI", "Yea"),
        ("Barrasso", "R", "WY", "Yea"),
        ("Sanders", "I", "VT", "Nay"),
    ]
}

#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a listing plus detail pages for `year`.
    pub fn with_year(mut self, year: i32, votes: &[FakeVote]) -> Self {
        let session = Session::for_year(year).unwrap();
        let (c, s) = (session.congress, session.session);
        let mut rows = String::new();
        for v in votes {
            let path = format!("/legislative/LIS/roll_call_votes/vote{c}{s}/vote_{c}_{s}_{:05}.htm", v.number);
            rows.push_str(&format!(
                r#"<tr><td><a href="{path}">{} (50-49)</a></td><td>{}</td><td>On Passage</td><td>Jan 01</td></tr>"#,
                v.number, v.result
            ));
            self.pages.insert(format!("{BASE}{path}"), detail_page(v));
        }
        self.pages.insert(listing_url(BASE, session), listing_page(&rows));
        self
    }

    /// Drop a page so fetching it fails.
    pub fn without(mut self, url: &str) -> Self {
        self.pages.remove(url);
        self
    }

    pub fn listing_for(year: i32) -> String {
        listing_url(BASE, Session::for_year(year).unwrap())
    }
}

impl PageSource for FakeSite {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status { status: 404, url: url.to_string() })
    }
}

pub fn listing_page(rows: &str) -> String {
    format!(
        r#"<html><body>
          <select name="listOfVotes_length"><option value="50">50</option><option value="-1">All</option></select>
          <table id="listOfVotes"><thead><tr><th>Vote</th><th>Result</th></tr></thead><tbody>{rows}</tbody></table>
        </body></html>"#
    )
}

pub fn detail_page(v: &FakeVote) -> String {
    let roster: String = v
        .roster
        .iter()
        .map(|(n, p, s, pos)| format!("{n} ({p}-{s}), <b>{pos}</b><br>\n"))
        .collect();
    format!(
        r#"<html><body>
          <div class="contenttext"><b>Vote Number:</b> {}</div>
          <div class="contenttext"><b>Vote Date:</b> {}</div>
          <div class="contenttext"><b>Vote Result:</b> {}</div>
          <div class="contenttext"><b>Question:</b> On Passage of the Bill</div>
          <div class="contenttext"><b>Measure Number:</b> <a href="https://www.congress.gov/">{}</a></div>
          <div class="contenttext"><b>Measure Title:</b> A bill for testing.</div>
          <span class="contenttext"><div class="newspaperDisplay_3column">{roster}</div></span>
        </body></html>"#,
        v.number, v.date, v.result, v.measure
    )
}

pub fn fetch_opts() -> FetchOptions {
    FetchOptions { base_url: BASE.to_string(), ..FetchOptions::default() }
}

pub fn scrape_opts() -> ScrapeOptions {
    ScrapeOptions::unthrottled()
}
