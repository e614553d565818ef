// src/dataset.rs
//
// Year files on disk. Two layouts:
//   Combined: one file, `Section` = Metadata | Vote, each metadata row followed
//             by its senator rows, irrelevant columns left empty.
//   Split:    `<stem>_metadata.csv` + `<stem>_votes.csv`.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::{ExportLayout, ExportOptions},
    error::DatasetError,
    file::{csv_files_one_level, ensure_parent, split_paths},
    records::{MeasureType, Position, SenatorVoteRecord, VoteKey, VoteMetadataRecord, YearDataset},
    specs::vote_detail::parse_vote_date,
};

/// Same rendering the vote pages use, e.g. "January 09, 2024, 02:30 PM".
pub const DATE_FORMAT: &str = "%B %d, %Y, %I:%M %p";

const COMBINED_HEADER: [&str; 13] = [
    "Section", "Year", "Vote_Number", "Date", "Result", "Measure_Number", "Measure_Type",
    "Measure_Title", "Question", "Senator", "Party", "State", "Vote",
];
const METADATA_HEADER: [&str; 8] = [
    "Year", "Vote_Number", "Date", "Result", "Measure_Number", "Measure_Type", "Measure_Title", "Question",
];
const VOTES_HEADER: [&str; 6] = ["Year", "Vote_Number", "Senator", "Party", "State", "Vote"];

const SECTION_METADATA: &str = "Metadata";
const SECTION_VOTE: &str = "Vote";

/// Metadata and senator rows read back from disk, sorted by vote key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    pub metas: Vec<VoteMetadataRecord>,
    pub votes: Vec<SenatorVoteRecord>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    fn extend(&mut self, other: Dataset) {
        self.metas.extend(other.metas);
        self.votes.extend(other.votes);
    }

    fn sort(&mut self) {
        self.metas.sort_by_key(|m| m.key());
        self.votes.sort_by_key(|v| v.key());
    }
}

impl From<YearDataset> for Dataset {
    fn from(y: YearDataset) -> Self {
        Self { metas: y.metas, votes: y.votes }
    }
}

/* ---------------- Row shapes ---------------- */

#[derive(Debug, Default, Serialize, Deserialize)]
struct CombinedRow {
    #[serde(rename = "Section")]
    section: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Vote_Number")]
    vote_number: u32,
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Result")]
    result: Option<String>,
    #[serde(rename = "Measure_Number")]
    measure_number: Option<String>,
    #[serde(rename = "Measure_Type")]
    measure_type: Option<MeasureType>,
    #[serde(rename = "Measure_Title")]
    measure_title: Option<String>,
    #[serde(rename = "Question")]
    question: Option<String>,
    #[serde(rename = "Senator")]
    senator: Option<String>,
    #[serde(rename = "Party")]
    party: Option<String>,
    #[serde(rename = "State")]
    state: Option<String>,
    #[serde(rename = "Vote")]
    vote: Option<Position>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MetadataRow {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Vote_Number")]
    vote_number: u32,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Result")]
    result: String,
    #[serde(rename = "Measure_Number")]
    measure_number: String,
    #[serde(rename = "Measure_Type")]
    measure_type: MeasureType,
    #[serde(rename = "Measure_Title")]
    measure_title: String,
    #[serde(rename = "Question")]
    question: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct VoteRow {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Vote_Number")]
    vote_number: u32,
    #[serde(rename = "Senator")]
    senator: String,
    #[serde(rename = "Party")]
    party: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Vote")]
    vote: Position,
}

impl From<&VoteMetadataRecord> for MetadataRow {
    fn from(m: &VoteMetadataRecord) -> Self {
        Self {
            year: m.year,
            vote_number: m.vote_number,
            date: m.date.format(DATE_FORMAT).to_string(),
            result: m.result.clone(),
            measure_number: m.measure_number.clone(),
            measure_type: m.measure_type,
            measure_title: m.measure_title.clone(),
            question: m.question.clone(),
        }
    }
}

impl From<&SenatorVoteRecord> for VoteRow {
    fn from(v: &SenatorVoteRecord) -> Self {
        Self {
            year: v.year,
            vote_number: v.vote_number,
            senator: v.senator.clone(),
            party: v.party.clone(),
            state: v.state.clone(),
            vote: v.position,
        }
    }
}

impl From<VoteRow> for SenatorVoteRecord {
    fn from(r: VoteRow) -> Self {
        Self {
            year: r.year,
            vote_number: r.vote_number,
            senator: r.senator,
            party: r.party,
            state: r.state,
            position: r.vote,
        }
    }
}

impl MetadataRow {
    fn into_record(self, path: &Path, line: u64) -> Result<VoteMetadataRecord, DatasetError> {
        let date = parse_vote_date(&self.date).ok_or_else(|| DatasetError::Row {
            path: path.to_path_buf(),
            line,
            message: format!("unparseable date {:?}", self.date),
        })?;
        Ok(VoteMetadataRecord {
            year: self.year,
            vote_number: self.vote_number,
            date,
            result: self.result,
            measure_number: self.measure_number,
            measure_type: self.measure_type,
            measure_title: self.measure_title,
            question: self.question,
        })
    }
}

impl CombinedRow {
    fn metadata(m: &VoteMetadataRecord) -> Self {
        let r = MetadataRow::from(m);
        Self {
            section: s!(SECTION_METADATA),
            year: r.year,
            vote_number: r.vote_number,
            date: Some(r.date),
            result: Some(r.result),
            measure_number: Some(r.measure_number),
            measure_type: Some(r.measure_type),
            measure_title: Some(r.measure_title),
            question: Some(r.question),
            ..Default::default()
        }
    }

    fn vote(v: &SenatorVoteRecord) -> Self {
        Self {
            section: s!(SECTION_VOTE),
            year: v.year,
            vote_number: v.vote_number,
            senator: Some(v.senator.clone()),
            party: Some(v.party.clone()),
            state: Some(v.state.clone()),
            vote: Some(v.position),
            ..Default::default()
        }
    }
}

enum Parsed {
    Meta(VoteMetadataRecord),
    Vote(SenatorVoteRecord),
}

impl CombinedRow {
    fn parse(self, path: &Path, line: u64) -> Result<Parsed, DatasetError> {
        let bad = |message: String| DatasetError::Row { path: path.to_path_buf(), line, message };
        match self.section.as_str() {
            SECTION_METADATA => {
                let date = self.date.ok_or_else(|| bad(s!("metadata row without Date")))?;
                let result = self.result.ok_or_else(|| bad(s!("metadata row without Result")))?;
                let measure_type = self
                    .measure_type
                    .ok_or_else(|| bad(s!("metadata row without Measure_Type")))?;
                MetadataRow {
                    year: self.year,
                    vote_number: self.vote_number,
                    date,
                    result,
                    measure_number: self.measure_number.unwrap_or_default(),
                    measure_type,
                    measure_title: self.measure_title.unwrap_or_default(),
                    question: self.question.unwrap_or_default(),
                }
                .into_record(path, line)
                .map(Parsed::Meta)
            }
            SECTION_VOTE => {
                let senator = self.senator.ok_or_else(|| bad(s!("vote row without Senator")))?;
                let vote = self.vote.ok_or_else(|| bad(s!("vote row without Vote")))?;
                Ok(Parsed::Vote(SenatorVoteRecord {
                    year: self.year,
                    vote_number: self.vote_number,
                    senator,
                    party: self.party.unwrap_or_default(),
                    state: self.state.unwrap_or_default(),
                    position: vote,
                }))
            }
            other => Err(bad(format!("unknown Section {other:?}"))),
        }
    }
}

/* ---------------- Writing ---------------- */

/// Header is written up front so a file with no rows still reads back.
fn csv_writer(path: &Path, header: &[&str]) -> Result<csv::Writer<BufWriter<File>>, DatasetError> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|source| DatasetError::Io { path: path.to_path_buf(), source })?;
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    w.write_record(header)
        .map_err(|source| DatasetError::Csv { path: path.to_path_buf(), source })?;
    Ok(w)
}

fn finish<W: Write>(mut w: csv::Writer<W>, path: &Path) -> Result<(), DatasetError> {
    w.flush().map_err(|source| DatasetError::Io { path: path.to_path_buf(), source })
}

/// Write records to `path` in the given layout. Returns every file written.
///
/// Output depends only on the records, so writing the same data twice gives
/// byte-identical files.
pub fn write_dataset(
    path: &Path,
    layout: ExportLayout,
    metas: &[VoteMetadataRecord],
    votes: &[SenatorVoteRecord],
) -> Result<Vec<PathBuf>, DatasetError> {
    let csv_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| DatasetError::Csv { path, source }
    };

    let mut metas: Vec<&VoteMetadataRecord> = metas.iter().collect();
    metas.sort_by_key(|m| m.key());

    let written = match layout {
        ExportLayout::Combined => {
            let mut by_key: BTreeMap<VoteKey, Vec<&SenatorVoteRecord>> = BTreeMap::new();
            for v in votes {
                by_key.entry(v.key()).or_default().push(v);
            }

            let mut w = csv_writer(path, &COMBINED_HEADER)?;
            for m in &metas {
                w.serialize(CombinedRow::metadata(m)).map_err(csv_err(path))?;
                for v in by_key.remove(&m.key()).unwrap_or_default() {
                    w.serialize(CombinedRow::vote(v)).map_err(csv_err(path))?;
                }
            }
            // Senator rows whose metadata is missing still get written.
            for v in by_key.into_values().flatten() {
                w.serialize(CombinedRow::vote(v)).map_err(csv_err(path))?;
            }
            finish(w, path)?;
            vec![path.to_path_buf()]
        }
        ExportLayout::Split => {
            let (meta_path, votes_path) = split_paths(path);

            let mut w = csv_writer(&meta_path, &METADATA_HEADER)?;
            for m in &metas {
                w.serialize(MetadataRow::from(*m)).map_err(csv_err(&meta_path))?;
            }
            finish(w, &meta_path)?;

            let mut votes: Vec<&SenatorVoteRecord> = votes.iter().collect();
            votes.sort_by_key(|v| v.key());
            let mut w = csv_writer(&votes_path, &VOTES_HEADER)?;
            for v in votes {
                w.serialize(VoteRow::from(v)).map_err(csv_err(&votes_path))?;
            }
            finish(w, &votes_path)?;
            vec![meta_path, votes_path]
        }
    };

    debug!(files = ?written, votes = metas.len(), "dataset written");
    Ok(written)
}

/// Write one year to `<out_dir>/<year>/senate_votes_<year>.csv` (or its split pair).
pub fn write_year(export: &ExportOptions, year: &YearDataset) -> Result<Vec<PathBuf>, DatasetError> {
    let path = export.year_path(year.year);
    let written = write_dataset(&path, export.layout, &year.metas, &year.votes)?;
    info!(year = year.year, votes = year.metas.len(), path = %path.display(), "year saved");
    Ok(written)
}

/// Write all years into `<out_dir>/senate_votes_all.csv`.
pub fn write_merged(export: &ExportOptions, years: &[YearDataset]) -> Result<Vec<PathBuf>, DatasetError> {
    let metas: Vec<VoteMetadataRecord> = years.iter().flat_map(|y| y.metas.iter().cloned()).collect();
    let votes: Vec<SenatorVoteRecord> = years.iter().flat_map(|y| y.votes.iter().cloned()).collect();
    let path = export.merged_path();
    let written = write_dataset(&path, export.layout, &metas, &votes)?;
    info!(years = years.len(), votes = metas.len(), path = %path.display(), "merged dataset saved");
    Ok(written)
}

/* ---------------- Reading ---------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Combined,
    MetadataOnly,
    VotesOnly,
}

fn kind_from_headers(headers: &csv::StringRecord) -> Option<FileKind> {
    let has = |name: &str| headers.iter().any(|h| h == name);
    if has("Section") {
        Some(FileKind::Combined)
    } else if has("Senator") && has("Vote") {
        Some(FileKind::VotesOnly)
    } else if has("Date") && has("Result") {
        Some(FileKind::MetadataOnly)
    } else {
        None
    }
}

/// Read one dataset file. Combined files and either half of a split pair are
/// recognised by their header.
pub fn read_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let csv_err = |source| DatasetError::Csv { path: path.to_path_buf(), source };

    let mut rdr = csv::Reader::from_path(path).map_err(csv_err)?;
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let kind = kind_from_headers(&headers).ok_or_else(|| DatasetError::Row {
        path: path.to_path_buf(),
        line: 1,
        message: format!("unrecognised header {headers:?}"),
    })?;

    let mut out = Dataset::default();
    let mut record = csv::StringRecord::new();
    while rdr.read_record(&mut record).map_err(csv_err)? {
        let line = record.position().map_or(0, |p| p.line());
        match kind {
            FileKind::Combined => {
                let row: CombinedRow = record.deserialize(Some(&headers)).map_err(csv_err)?;
                match row.parse(path, line)? {
                    Parsed::Meta(m) => out.metas.push(m),
                    Parsed::Vote(v) => out.votes.push(v),
                }
            }
            FileKind::MetadataOnly => {
                let row: MetadataRow = record.deserialize(Some(&headers)).map_err(csv_err)?;
                out.metas.push(row.into_record(path, line)?);
            }
            FileKind::VotesOnly => {
                let row: VoteRow = record.deserialize(Some(&headers)).map_err(csv_err)?;
                out.votes.push(row.into());
            }
        }
    }

    out.sort();
    debug!(path = %path.display(), votes = out.metas.len(), rows = out.votes.len(), "dataset read");
    Ok(out)
}

/// Read every `dir/*/*.csv` (one directory per year) into one dataset.
pub fn read_dataset_dir(dir: &Path) -> Result<Dataset, DatasetError> {
    let files = csv_files_one_level(dir)?;
    if files.is_empty() {
        return Err(DatasetError::Empty(dir.to_path_buf()));
    }

    let mut out = Dataset::default();
    for f in &files {
        out.extend(read_dataset(f)?);
    }
    out.sort();
    info!(files = files.len(), votes = out.metas.len(), rows = out.votes.len(), "datasets loaded");
    Ok(out)
}
