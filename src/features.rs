// src/features.rs
//! Per-vote feature rows for the pass/fail classifier.
//!
//! Static features come from the vote's own fields. History features are
//! aggregates over votes with a strictly earlier timestamp: records are
//! sorted by `(date, year, vote_number)` and handled in groups of equal
//! timestamp, so votes taken at the same minute never see each other.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

use crate::{
    config::TrainOptions,
    records::{MeasureType, Position, SenatorVoteRecord, VoteKey, VoteMetadataRecord},
};

/// Bumped whenever a feature is added, removed, reordered or derived differently.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

pub const FEATURE_NAMES: [&str; 27] = [
    // measure type
    "is_bill",
    "is_resolution",
    "is_joint_resolution",
    "is_concurrent_resolution",
    "is_amendment",
    "is_nomination",
    "is_treaty",
    "is_motion",
    // title
    "title_length",
    "title_appropriation",
    "title_amendment",
    "title_authorization",
    "title_emergency",
    // time
    "hour",
    "time_of_day",
    "is_late_night",
    "is_weekend",
    "fiscal_quarter",
    "days_to_fiscal_end",
    // same-type history
    "prev_measures_count",
    "prev_pass_rate",
    // all-type history
    "prev_total_count",
    "total_pass_rate",
    // senators
    "avg_senator_yea_rate",
    "avg_senator_participation",
    "active_senators",
    "senator_agreement",
];

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRow {
    pub key: VoteKey,
    pub date: NaiveDateTime,
    pub measure_type: MeasureType,
    pub passed: bool,
    /// Ordered as [`FEATURE_NAMES`].
    pub values: Vec<f64>,
}

impl FeatureRow {
    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).and_then(|i| self.values.get(i).copied())
    }
}

/// Build one row per metadata record. Input order does not matter.
pub fn build_features(
    metas: &[VoteMetadataRecord],
    votes: &[SenatorVoteRecord],
    opts: &TrainOptions,
) -> Vec<FeatureRow> {
    let mut sorted: Vec<&VoteMetadataRecord> = metas.iter().collect();
    sorted.sort_by_key(|m| (m.date, m.year, m.vote_number));
    sorted.dedup_by_key(|m| m.key());

    let mut rows_by_key: HashMap<VoteKey, Vec<&SenatorVoteRecord>> = HashMap::new();
    for v in votes {
        rows_by_key.entry(v.key()).or_default().push(v);
    }

    let mut history = History::default();
    let mut out = Vec::with_capacity(sorted.len());

    for group in sorted.chunk_by(|a, b| a.date == b.date) {
        let senators = history.senators.snapshot();
        for m in group {
            let mut values = Vec::with_capacity(FEATURE_NAMES.len());
            push_static(&mut values, m);

            let same = history.by_type.get(&m.measure_type).copied().unwrap_or_default();
            values.push(f64::from(same.count));
            values.push(same.rate(opts.default_pass_rate));
            values.push(f64::from(history.all.count));
            values.push(history.all.rate(opts.default_pass_rate));

            values.extend_from_slice(&senators);

            debug_assert_eq!(values.len(), FEATURE_NAMES.len());
            out.push(FeatureRow {
                key: m.key(),
                date: m.date,
                measure_type: m.measure_type,
                passed: m.passed(),
                values,
            });
        }

        for m in group {
            let passed = m.passed();
            history.all.add(passed);
            history.by_type.entry(m.measure_type).or_default().add(passed);
            if let Some(rows) = rows_by_key.get(&m.key()) {
                history.senators.record(rows);
            }
        }
    }

    out
}

fn push_static(values: &mut Vec<f64>, m: &VoteMetadataRecord) {
    for t in MeasureType::ALL {
        values.push(flag!(m.measure_type == t));
    }

    let title = m.measure_title.to_lowercase();
    values.push(title.chars().count() as f64);
    values.push(flag!(title.contains("appropriation")));
    values.push(flag!(title.contains("amendment")));
    values.push(flag!(title.contains("authorization")));
    values.push(flag!(title.contains("emergency")));

    let hour = m.date.hour();
    values.push(f64::from(hour));
    values.push(f64::from(time_of_day(hour)));
    values.push(flag!(hour >= 22 || hour <= 4));
    values.push(flag!(matches!(m.date.weekday(), Weekday::Sat | Weekday::Sun)));
    values.push(f64::from(fiscal_quarter(m.date.month())));
    values.push(days_to_fiscal_end(m.date.date()) as f64);
}

/// 0 morning, 1 afternoon, 2 evening, 3 late night.
pub fn time_of_day(hour: u32) -> u8 {
    match hour {
        0..=11 => 0,
        12..=16 => 1,
        17..=21 => 2,
        _ => 3,
    }
}

/// Federal fiscal year starts October 1: Oct–Dec is Q1, Jul–Sep is Q4.
pub fn fiscal_quarter(month: u32) -> u8 {
    ((month + 2) % 12 / 3 + 1) as u8
}

/// Days until the next September 30 (0 on the day itself).
pub fn days_to_fiscal_end(date: NaiveDate) -> i64 {
    let end_this_year = NaiveDate::from_ymd_opt(date.year(), 9, 30);
    let end = match end_this_year {
        Some(end) if date <= end => Some(end),
        _ => NaiveDate::from_ymd_opt(date.year() + 1, 9, 30),
    };
    end.map_or(0, |end| (end - date).num_days())
}

/* ---------------- Running history ---------------- */

#[derive(Clone, Copy, Debug, Default)]
struct PassTally {
    count: u32,
    passed: u32,
}

impl PassTally {
    fn add(&mut self, passed: bool) {
        self.count += 1;
        self.passed += u32::from(passed);
    }

    fn rate(&self, default: f64) -> f64 {
        if self.count == 0 {
            default
        } else {
            f64::from(self.passed) / f64::from(self.count)
        }
    }
}

#[derive(Default)]
struct History {
    all: PassTally,
    by_type: HashMap<MeasureType, PassTally>,
    senators: SenatorHistory,
}

#[derive(Clone, Copy, Default)]
struct SenatorTally {
    votes: u32,
    yeas: u32,
    participated: u32,
}

#[derive(Clone, Copy, Default)]
struct PairTally {
    common: u32,
    agreed: u32,
}

impl PairTally {
    fn rate(&self) -> f64 {
        f64::from(self.agreed) / f64::from(self.common)
    }
}

/// Per-senator participation and pairwise agreement, updated one vote at a
/// time. Senators are identified by name and state.
#[derive(Default)]
struct SenatorHistory {
    ids: HashMap<(String, String), usize>,
    tallies: Vec<SenatorTally>,
    pairs: HashMap<(usize, usize), PairTally>,
    agreement_sum: f64,
}

impl SenatorHistory {
    /// `[avg_senator_yea_rate, avg_senator_participation, active_senators, senator_agreement]`
    fn snapshot(&self) -> [f64; 4] {
        if self.tallies.is_empty() {
            return [0.0; 4];
        }
        let n = self.tallies.len() as f64;
        let yea = self.tallies.iter().map(|t| f64::from(t.yeas) / f64::from(t.votes)).sum::<f64>() / n;
        let part = self
            .tallies
            .iter()
            .map(|t| f64::from(t.participated) / f64::from(t.votes))
            .sum::<f64>()
            / n;
        let agreement = if self.pairs.is_empty() {
            0.0
        } else {
            self.agreement_sum / self.pairs.len() as f64
        };
        [yea, part, n, agreement]
    }

    fn record(&mut self, rows: &[&SenatorVoteRecord]) {
        let mut cast: Vec<(&str, &str, Position)> = rows
            .iter()
            .map(|r| (r.senator.as_str(), r.state.as_str(), r.position))
            .collect();
        cast.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        cast.dedup_by(|a, b| a.0 == b.0 && a.1 == b.1);

        let mut seen: Vec<(usize, Position)> = Vec::with_capacity(cast.len());
        for (name, state, position) in cast {
            let next = self.tallies.len();
            let id = *self.ids.entry((s!(name), s!(state))).or_insert(next);
            if id == next {
                self.tallies.push(SenatorTally::default());
            }
            let t = &mut self.tallies[id];
            t.votes += 1;
            t.yeas += u32::from(position == Position::Yea);
            t.participated += u32::from(position != Position::NotVoting);
            seen.push((id, position));
        }

        for (i, &(a, pa)) in seen.iter().enumerate() {
            for &(b, pb) in &seen[i + 1..] {
                let key = if a < b { (a, b) } else { (b, a) };
                let pair = self.pairs.entry(key).or_default();
                let before = if pair.common == 0 { 0.0 } else { pair.rate() };
                pair.common += 1;
                pair.agreed += u32::from(pa == pb);
                self.agreement_sum += pair.rate() - before;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn meta(n: u32, date: NaiveDateTime, number: &str, result: &str) -> VoteMetadataRecord {
        VoteMetadataRecord {
            year: date.year(),
            vote_number: n,
            date,
            result: s!(result),
            measure_number: s!(number),
            measure_type: MeasureType::from_measure_number(number),
            measure_title: s!("Emergency Appropriations Act"),
            question: s!("On Passage of the Bill"),
        }
    }

    fn cast(n: u32, year: i32, senator: &str, position: Position) -> SenatorVoteRecord {
        SenatorVoteRecord {
            year,
            vote_number: n,
            senator: s!(senator),
            party: s!("D"),
            state: s!("WI"),
            position,
        }
    }

    #[test]
    fn names_match_width() {
        let opts = TrainOptions::default();
        let rows = build_features(&[meta(1, at(2024, 1, 9, 14), "H.R. 1", "Passed")], &[], &opts);
        assert_eq!(rows[0].values.len(), FEATURE_NAMES.len());
    }

    #[test]
    fn fiscal_calendar() {
        assert_eq!(fiscal_quarter(10), 1);
        assert_eq!(fiscal_quarter(12), 1);
        assert_eq!(fiscal_quarter(1), 2);
        assert_eq!(fiscal_quarter(6), 3);
        assert_eq!(fiscal_quarter(9), 4);
        let d = |y, m, dd| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
        assert_eq!(days_to_fiscal_end(d(2024, 9, 30)), 0);
        assert_eq!(days_to_fiscal_end(d(2024, 9, 1)), 29);
        assert_eq!(days_to_fiscal_end(d(2024, 10, 1)), 364);
    }

    #[test]
    fn time_buckets() {
        assert_eq!(time_of_day(9), 0);
        assert_eq!(time_of_day(12), 1);
        assert_eq!(time_of_day(17), 2);
        assert_eq!(time_of_day(23), 3);
        assert_eq!(time_of_day(3), 0);
    }

    #[test]
    fn static_signals() {
        let opts = TrainOptions::default();
        let rows = build_features(&[meta(1, at(2024, 1, 6, 23), "S.Amdt. 5", "Rejected")], &[], &opts);
        let r = &rows[0];
        assert_eq!(r.get("is_amendment"), Some(1.0));
        assert_eq!(r.get("is_bill"), Some(0.0));
        assert_eq!(r.get("title_emergency"), Some(1.0));
        assert_eq!(r.get("title_appropriation"), Some(1.0));
        assert_eq!(r.get("is_weekend"), Some(1.0)); // Saturday
        assert_eq!(r.get("is_late_night"), Some(1.0));
        assert_eq!(r.get("fiscal_quarter"), Some(2.0));
        assert!(!r.passed);
    }

    #[test]
    fn history_uses_strictly_earlier_votes_only() {
        let opts = TrainOptions::default();
        let metas = [
            meta(1, at(2024, 1, 9, 10), "H.R. 1", "Passed"),
            meta(2, at(2024, 1, 9, 10), "H.R. 2", "Failed"), // same instant as #1
            meta(3, at(2024, 1, 9, 11), "H.R. 3", "Failed"),
            meta(4, at(2024, 1, 9, 12), "S.Res. 4", "Agreed to"),
        ];
        let rows = build_features(&metas, &[], &opts);

        assert_eq!(rows[0].get("prev_measures_count"), Some(0.0));
        assert_eq!(rows[0].get("prev_pass_rate"), Some(0.5));
        assert_eq!(rows[1].get("prev_measures_count"), Some(0.0));
        assert_eq!(rows[1].get("prev_total_count"), Some(0.0));
        assert_eq!(rows[2].get("prev_measures_count"), Some(2.0));
        assert_eq!(rows[2].get("prev_pass_rate"), Some(0.5));

        // First resolution: no same-type history, but three earlier votes overall.
        assert_eq!(rows[3].get("prev_measures_count"), Some(0.0));
        assert_eq!(rows[3].get("prev_pass_rate"), Some(opts.default_pass_rate));
        assert_eq!(rows[3].get("prev_total_count"), Some(3.0));
        assert!((rows[3].get("total_pass_rate").unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn senator_history_aggregates() {
        let opts = TrainOptions::default();
        let metas = [
            meta(1, at(2024, 2, 1, 10), "H.R. 1", "Passed"),
            meta(2, at(2024, 2, 2, 10), "H.R. 2", "Passed"),
            meta(3, at(2024, 2, 3, 10), "H.R. 3", "Passed"),
        ];
        let votes = [
            cast(1, 2024, "Baldwin", Position::Yea),
            cast(1, 2024, "Barrasso", Position::Yea),
            cast(2, 2024, "Baldwin", Position::Yea),
            cast(2, 2024, "Barrasso", Position::NotVoting),
        ];
        let rows = build_features(&metas, &votes, &opts);

        assert_eq!(rows[0].get("active_senators"), Some(0.0));
        assert_eq!(rows[0].get("senator_agreement"), Some(0.0));

        assert_eq!(rows[1].get("active_senators"), Some(2.0));
        assert_eq!(rows[1].get("avg_senator_yea_rate"), Some(1.0));
        assert_eq!(rows[1].get("senator_agreement"), Some(1.0));

        // Baldwin 2/2 yea, Barrasso 1/2 yea and 1/2 present; they agreed once in two.
        assert_eq!(rows[2].get("avg_senator_yea_rate"), Some(0.75));
        assert_eq!(rows[2].get("avg_senator_participation"), Some(0.75));
        assert_eq!(rows[2].get("senator_agreement"), Some(0.5));
    }
}
