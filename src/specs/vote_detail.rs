// src/specs/vote_detail.rs
//
// Single roll-call vote page: /legislative/LIS/roll_call_votes/vote<cs>/vote_<c>_<s>_<nnnnn>.htm
//
// Metadata sits in `div.contenttext` blocks, each led by a bold label
// ("Vote Date:", "Vote Result:", "Measure Number:", …). Senator positions sit
// one per line in the first `div.newspaperDisplay_3column`.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::core::html::{first_text, lines_of, sel, text_of};
use crate::core::sanitize::{clean_field, value_after};
use crate::error::{ParseError, RowWarning};
use crate::records::{MeasureType, Position, SenatorVoteRecord, VoteBundle, VoteKey, VoteMetadataRecord};

static BLOCK: LazyLock<Selector> = LazyLock::new(|| sel("div.contenttext"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| sel("b"));
static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a"));
static ROSTER: LazyLock<Selector> = LazyLock::new(|| sel("div.newspaperDisplay_3column"));

// "Baldwin (D-WI), Yea"
static SENATOR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^(]+?)\s*\(([A-Z]{1,3})-([A-Z]{2})\),\s*(.+?)$").unwrap_or_else(|e| panic!("{e}"))
});

// "Amdt. No. 1388", "Amendment 12"
static AMDT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Amdt\.|Amendment)\s*(?:No\.)?\s*(\d+)").unwrap_or_else(|e| panic!("{e}"))
});

const DATE_FORMATS: [&str; 2] = ["%B %d, %Y, %I:%M %p", "%B %d, %Y %I:%M %p"];

/// Parsed page plus the senator lines that had to be dropped.
#[derive(Debug)]
pub struct DetailPage {
    pub bundle: VoteBundle,
    pub warnings: Vec<RowWarning>,
}

/// Labelled metadata block: label text and full block text.
struct Block<'a> {
    label: String,
    text: String,
    el: ElementRef<'a>,
}

pub fn parse_detail(doc: &str, key: VoteKey, url: &str) -> Result<DetailPage, ParseError> {
    let html = Html::parse_document(doc);

    let blocks: Vec<Block<'_>> = html
        .select(&BLOCK)
        .filter_map(|el| {
            let label = first_text(el, &LABEL)?;
            Some(Block { label, text: text_of(el), el })
        })
        .collect();

    if blocks.is_empty() {
        return Err(ParseError::MissingElement { what: "metadata blocks div.contenttext", url: s!(url) });
    }

    let find = |label: &str| blocks.iter().find(|b| b.label.contains(label));
    let field = |label: &str| find(label).and_then(|b| value_after(&b.text, label));

    let raw_date = field("Vote Date:")
        .ok_or(ParseError::MissingField { field: "Vote Date", url: s!(url) })?;
    let date = parse_vote_date(&raw_date)
        .ok_or_else(|| ParseError::BadDate { raw: raw_date.clone(), url: s!(url) })?;
    let result = field("Vote Result:")
        .filter(|r| !r.is_empty())
        .ok_or(ParseError::MissingField { field: "Vote Result", url: s!(url) })?;
    let question = field("Question:").unwrap_or_default();

    let (measure_number, measure_title) = if let Some(b) = find("Amendment Number:") {
        let number = b
            .el
            .select(&LINK)
            .next()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                AMDT_NUMBER
                    .captures(&b.text)
                    .and_then(|c| c.get(1))
                    .map(|m| format!("S.Amdt. {}", m.as_str()))
            })
            .unwrap_or_else(|| s!("AMENDMENT"));
        let title = field("Statement of Purpose:").unwrap_or_else(|| question.clone());
        (number, title)
    } else if let Some(b) = find("Measure Number:") {
        let number = b
            .el
            .select(&LINK)
            .next()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .or_else(|| value_after(&b.text, "Measure Number:"))
            .unwrap_or_default();
        let title = field("Measure Title:").unwrap_or_else(|| question.clone());
        (number, title)
    } else if let Some(b) = find("Nomination:").or_else(|| find("Nominee:")) {
        let title = b
            .text
            .split_once(':')
            .map(|(_, rest)| clean_field(rest))
            .unwrap_or_default();
        (s!("NOMINATION"), title)
    } else {
        (s!("QUESTION"), question.clone())
    };

    let meta = VoteMetadataRecord {
        year: key.year,
        vote_number: key.vote_number,
        date,
        result,
        measure_type: MeasureType::from_measure_number(&measure_number),
        measure_number,
        measure_title,
        question,
    };

    let roster = html
        .select(&ROSTER)
        .next()
        .ok_or_else(|| ParseError::MissingElement { what: "senator list div.newspaperDisplay_3column", url: s!(url) })?;

    let mut votes = Vec::new();
    let mut warnings = Vec::new();
    for line in lines_of(roster) {
        match parse_senator_line(&line, key) {
            Ok(Some(record)) => votes.push(record),
            Ok(None) => {}
            Err(w) => {
                warn!(vote = %key, url, line = %w.line, reason = w.reason, "skipping senator row");
                warnings.push(w);
            }
        }
    }

    if votes.is_empty() {
        return Err(ParseError::NoRows { url: s!(url) });
    }

    Ok(DetailPage { bundle: VoteBundle { meta, votes }, warnings })
}

/// "January 9, 2024, 05:37 PM"; pages without a time are taken at midnight.
pub fn parse_vote_date(raw: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%B %d, %Y")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// `Ok(None)` for lines that are not senator rows at all (headings, blanks);
/// `Err` for lines that look like rows but cannot be read.
fn parse_senator_line(line: &str, key: VoteKey) -> Result<Option<SenatorVoteRecord>, RowWarning> {
    if !looks_like_row(line) {
        return Ok(None);
    }
    let caps = SENATOR_LINE
        .captures(line)
        .ok_or_else(|| RowWarning { line: s!(line), reason: "does not match `Name (P-SS), Position`" })?;

    let position: Position = caps[4]
        .parse()
        .map_err(|_| RowWarning { line: s!(line), reason: "unknown vote position" })?;

    Ok(Some(SenatorVoteRecord {
        year: key.year,
        vote_number: key.vote_number,
        senator: s!(caps[1].trim()),
        party: s!(&caps[2]),
        state: s!(&caps[3]),
        position,
    }))
}

/// Headings carry no party-state, no comma and no trailing position.
fn looks_like_row(line: &str) -> bool {
    const POSITIONS: [&str; 4] = ["Yea", "Nay", "Present", "Not Voting"];
    line.contains('(') || line.contains(',') || POSITIONS.iter().any(|p| line.ends_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const URL: &str = "https://www.senate.gov/legislative/LIS/roll_call_votes/vote1182/vote_118_2_00001.htm";
    const KEY: VoteKey = VoteKey { year: 2024, vote_number: 1 };

    fn page(meta: &str, roster: &str) -> String {
        format!(
            r#"<html><body>
              <div class="contenttext"><b>Vote Number:</b> 1</div>
              {meta}
              <span class="contenttext"><div class="newspaperDisplay_3column">{roster}</div></span>
              <div class="newspaperDisplay_3column">Ignored (D-ZZ), Yea</div>
            </body></html>"#
        )
    }

    const BILL_META: &str = r#"
        <div class="contenttext"><b>Vote Date:</b> January 9, 2024, 05:37 PM</div>
        <div class="contenttext"><b>Vote Result:</b> Bill Passed.</div>
        <div class="contenttext"><b>Question:</b> On Passage of the Bill (H.R. 2882 )</div>
        <div class="contenttext"><b>Measure Number:</b> <a href="https://www.congress.gov/bill/118/hr/2882">H.R. 2882</a> (Further Additional Continuing Appropriations)</div>
        <div class="contenttext"><b>Measure Title:</b> A bill making further continuing appropriations.</div>
    "#;

    const ROSTER: &str = "Baldwin (D-WI), <b>Yea</b><br>\nBarrasso (R-WY), Nay<br>\nSanders (I-VT), Not Voting<br>";

    #[test]
    fn parses_bill_vote() {
        let out = parse_detail(&page(BILL_META, ROSTER), KEY, URL).unwrap();
        let m = &out.bundle.meta;
        assert_eq!(m.year, 2024);
        assert_eq!(m.vote_number, 1);
        assert_eq!((m.date.month(), m.date.day(), m.date.hour(), m.date.minute()), (1, 9, 17, 37));
        assert_eq!(m.result, "Bill Passed");
        assert_eq!(m.measure_number, "H.R. 2882");
        assert_eq!(m.measure_type, MeasureType::Bill);
        assert_eq!(m.measure_title, "A bill making further continuing appropriations");
        assert_eq!(m.question, "On Passage of the Bill (H.R. 2882 )");
        assert!(m.passed());

        let v = &out.bundle.votes;
        assert_eq!(v.len(), 3);
        assert_eq!(v[0].senator, "Baldwin");
        assert_eq!((v[0].party.as_str(), v[0].state.as_str()), ("D", "WI"));
        assert_eq!(v[0].position, Position::Yea);
        assert_eq!(v[2].position, Position::NotVoting);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn amendment_uses_statement_of_purpose() {
        let meta = r#"
            <div class="contenttext"><b>Vote Date:</b> March 8, 2024, 11:02 AM</div>
            <div class="contenttext"><b>Vote Result:</b> Amendment Rejected</div>
            <div class="contenttext"><b>Question:</b> On the Amendment (Lee Amdt. No. 1627 )</div>
            <div class="contenttext"><b>Amendment Number:</b> S.Amdt. 1627 to H.R. 4366</div>
            <div class="contenttext"><b>Statement of Purpose:</b> (To strike earmarks.)</div>
        "#;
        let out = parse_detail(&page(meta, ROSTER), KEY, URL).unwrap();
        let m = &out.bundle.meta;
        assert_eq!(m.measure_number, "S.Amdt. 1627");
        assert_eq!(m.measure_type, MeasureType::Amendment);
        assert_eq!(m.measure_title, "To strike earmarks");
        assert!(!m.passed());
    }

    #[test]
    fn nomination_and_question_only() {
        let nom = r#"
            <div class="contenttext"><b>Vote Date:</b> May 1, 2024, 02:15 PM</div>
            <div class="contenttext"><b>Vote Result:</b> Nomination Confirmed</div>
            <div class="contenttext"><b>Nomination:</b> Jane Doe, of Ohio, to be a Judge.</div>
        "#;
        let m = parse_detail(&page(nom, ROSTER), KEY, URL).unwrap().bundle.meta;
        assert_eq!(m.measure_number, "NOMINATION");
        assert_eq!(m.measure_type, MeasureType::Nomination);
        assert_eq!(m.measure_title, "Jane Doe, of Ohio, to be a Judge");

        let q = r#"
            <div class="contenttext"><b>Vote Date:</b> May 2, 2024, 10:00 AM</div>
            <div class="contenttext"><b>Vote Result:</b> Motion Agreed to</div>
            <div class="contenttext"><b>Question:</b> On the Motion to Proceed</div>
        "#;
        let m = parse_detail(&page(q, ROSTER), KEY, URL).unwrap().bundle.meta;
        assert_eq!(m.measure_number, "QUESTION");
        assert_eq!(m.measure_type, MeasureType::Motion);
        assert_eq!(m.measure_title, "On the Motion to Proceed");
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let roster = "Alphabetical by Senator Name<br>\
                      Baldwin (D-WI), Yea<br>\
                      Broken (D-WI) Yea<br>\
                      Odd (R-TX), Abstain<br>\
                      Cruz (R-TX), Nay<br>\
                      Baldwin, Yea<br>\
                      Baldwin D-WI, Yea<br>\
                      Sanders Not Voting<br>";
        let out = parse_detail(&page(BILL_META, roster), KEY, URL).unwrap();
        assert_eq!(out.bundle.votes.len(), 2);
        assert_eq!(out.warnings.len(), 5);
        assert_eq!(out.warnings[1].reason, "unknown vote position");
        assert_eq!(out.warnings[2].line, "Baldwin, Yea");
        assert_eq!(out.warnings[4].line, "Sanders Not Voting");
    }

    #[test]
    fn headings_are_not_rows() {
        for line in ["Alphabetical by Senator Name", "Grouped By Vote Position", "YEAs ---51"] {
            assert_eq!(parse_senator_line(line, KEY), Ok(None), "{line}");
        }
        assert!(parse_senator_line("Baldwin, Yea", KEY).is_err());
    }

    #[test]
    fn missing_date_or_roster_is_fatal() {
        let no_date = r#"<div class="contenttext"><b>Vote Result:</b> Passed</div>"#;
        assert!(matches!(
            parse_detail(&page(no_date, ROSTER), KEY, URL),
            Err(ParseError::MissingField { field: "Vote Date", .. })
        ));

        let doc = format!("<html><body>{BILL_META}</body></html>");
        assert!(matches!(parse_detail(&doc, KEY, URL), Err(ParseError::MissingElement { .. })));

        assert!(matches!(
            parse_detail(&page(BILL_META, "nobody here"), KEY, URL),
            Err(ParseError::NoRows { .. })
        ));
    }

    #[test]
    fn vote_dates() {
        let d = parse_vote_date("December 20, 2024, 09:42 PM").unwrap();
        assert_eq!((d.year(), d.hour()), (2024, 21));
        let d = parse_vote_date("June 3, 2015").unwrap();
        assert_eq!((d.day(), d.hour()), (3, 0));
        assert!(parse_vote_date("yesterday").is_none());
    }
}
