// src/records.rs
//
// Typed records produced at the parse boundary. Everything downstream
// (dataset files, features, training) works on these, never on raw rows.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Congress number and session for a calendar year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Session {
    pub congress: u16,
    pub session: u8,
}

impl Session {
    /// The 1st Congress convened in 1789; each Congress spans two years,
    /// session 1 in the odd year and session 2 in the even one.
    pub fn for_year(year: i32) -> Option<Self> {
        if year < 1789 {
            return None;
        }
        let congress = u16::try_from((year - 1789) / 2 + 1).ok()?;
        let session = if year % 2 == 1 { 1 } else { 2 };
        Some(Self { congress, session })
    }
}

/// Identity of one roll-call vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoteKey {
    pub year: i32,
    pub vote_number: u32,
}

impl fmt::Display for VoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:05}", self.year, self.vote_number)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Yea,
    Nay,
    Present,
    #[serde(rename = "Not Voting")]
    NotVoting,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yea => "Yea",
            Self::Nay => "Nay",
            Self::Present => "Present",
            Self::NotVoting => "Not Voting",
        }
    }
}

impl FromStr for Position {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Yea" | "Guilty" => Ok(Self::Yea),
            "Nay" | "Not Guilty" => Ok(Self::Nay),
            "Present" => Ok(Self::Present),
            "Not Voting" => Ok(Self::NotVoting),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of measure a vote is about, derived from its measure number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MeasureType {
    Bill,
    Resolution,
    JointResolution,
    ConcurrentResolution,
    Amendment,
    Nomination,
    Treaty,
    Motion,
}

impl MeasureType {
    pub const ALL: [MeasureType; 8] = [
        Self::Bill,
        Self::Resolution,
        Self::JointResolution,
        Self::ConcurrentResolution,
        Self::Amendment,
        Self::Nomination,
        Self::Treaty,
        Self::Motion,
    ];

    /// "S.Amdt. 1388" → Amendment, "H.R. 815" → Bill, "PN1234" → Nomination…
    pub fn from_measure_number(number: &str) -> Self {
        let compact: String = number
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let starts_with_any = |prefixes: &[&str]| prefixes.iter().any(|p| compact.starts_with(p));
        let followed_by_digit = |prefix: &str| {
            compact
                .strip_prefix(prefix)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_digit())
        };

        if compact.contains("AMDT") {
            Self::Amendment
        } else if starts_with_any(&["SJRES", "HJRES"]) {
            Self::JointResolution
        } else if starts_with_any(&["SCONRES", "HCONRES"]) {
            Self::ConcurrentResolution
        } else if starts_with_any(&["SRES", "HRES"]) {
            Self::Resolution
        } else if compact == "NOMINATION" || followed_by_digit("PN") {
            Self::Nomination
        } else if compact.starts_with("TREATY") {
            Self::Treaty
        } else if followed_by_digit("HR") || followed_by_digit("S") {
            Self::Bill
        } else {
            Self::Motion
        }
    }
}

/// One scraped vote page's header block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteMetadataRecord {
    pub year: i32,
    pub vote_number: u32,
    pub date: NaiveDateTime,
    pub result: String,
    pub measure_number: String,
    pub measure_type: MeasureType,
    pub measure_title: String,
    pub question: String,
}

impl VoteMetadataRecord {
    pub fn key(&self) -> VoteKey {
        VoteKey { year: self.year, vote_number: self.vote_number }
    }

    /// "Agreed to", "Bill Passed", "Nomination Confirmed", … count as passing.
    pub fn passed(&self) -> bool {
        result_passed(&self.result)
    }
}

pub fn result_passed(result: &str) -> bool {
    let lc = result.to_ascii_lowercase();
    ["agreed", "passed", "confirmed"].iter().any(|w| lc.contains(w))
}

/// One senator's position on one vote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenatorVoteRecord {
    pub year: i32,
    pub vote_number: u32,
    pub senator: String,
    pub party: String,
    pub state: String,
    pub position: Position,
}

impl SenatorVoteRecord {
    pub fn key(&self) -> VoteKey {
        VoteKey { year: self.year, vote_number: self.vote_number }
    }
}

/// Everything extracted from one detail page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteBundle {
    pub meta: VoteMetadataRecord,
    pub votes: Vec<SenatorVoteRecord>,
}

/// A detail page that was skipped, and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedVote {
    pub key: VoteKey,
    pub url: String,
    pub reason: String,
}

/// One year's collection, ordered by vote number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct YearDataset {
    pub year: i32,
    pub metas: Vec<VoteMetadataRecord>,
    pub votes: Vec<SenatorVoteRecord>,
    pub skipped: Vec<SkippedVote>,
    pub row_warnings: usize,
}

impl YearDataset {
    pub fn new(year: i32) -> Self {
        Self { year, ..Default::default() }
    }

    pub fn push(&mut self, bundle: VoteBundle) {
        self.metas.push(bundle.meta);
        self.votes.extend(bundle.votes);
    }

    /// Stable order: by vote number, senator rows keep page order.
    pub fn sort(&mut self) {
        self.metas.sort_by_key(|m| m.key());
        self.votes.sort_by_key(|v| v.key());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_for_year() {
        assert_eq!(Session::for_year(2024), Some(Session { congress: 118, session: 2 }));
        assert_eq!(Session::for_year(2023), Some(Session { congress: 118, session: 1 }));
        assert_eq!(Session::for_year(2015), Some(Session { congress: 114, session: 1 }));
        assert_eq!(Session::for_year(1700), None);
    }

    #[test]
    fn measure_types_from_numbers() {
        use MeasureType::*;
        assert_eq!(MeasureType::from_measure_number("S.Amdt. 1388"), Amendment);
        assert_eq!(MeasureType::from_measure_number("H.R. 815"), Bill);
        assert_eq!(MeasureType::from_measure_number("S. 4361"), Bill);
        assert_eq!(MeasureType::from_measure_number("S.J.Res. 62"), JointResolution);
        assert_eq!(MeasureType::from_measure_number("H.Con.Res. 7"), ConcurrentResolution);
        assert_eq!(MeasureType::from_measure_number("S.Res. 548"), Resolution);
        assert_eq!(MeasureType::from_measure_number("PN1054"), Nomination);
        assert_eq!(MeasureType::from_measure_number("NOMINATION"), Nomination);
        assert_eq!(MeasureType::from_measure_number("Treaty Doc. 118-1"), Treaty);
        assert_eq!(MeasureType::from_measure_number("QUESTION"), Motion);
        assert_eq!(MeasureType::from_measure_number("SENATE"), Motion);
    }

    #[test]
    fn passing_results() {
        assert!(result_passed("Agreed to"));
        assert!(result_passed("Bill Passed"));
        assert!(result_passed("Nomination Confirmed"));
        assert!(!result_passed("Rejected"));
        assert!(!result_passed("Failed"));
        assert!(!result_passed("Cloture Motion Rejected"));
    }

    #[test]
    fn positions_parse() {
        assert_eq!("Not Voting".parse::<Position>(), Ok(Position::NotVoting));
        assert_eq!(" Yea ".parse::<Position>(), Ok(Position::Yea));
        assert!("Maybe".parse::<Position>().is_err());
    }
}
