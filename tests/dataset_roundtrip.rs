// tests/dataset_roundtrip.rs
use chrono::NaiveDate;

use senate_votes::config::{ExportLayout, ExportOptions};
use senate_votes::dataset::{read_dataset, read_dataset_dir, write_dataset, write_merged, write_year};
use senate_votes::records::{MeasureType, Position, SenatorVoteRecord, VoteMetadataRecord, YearDataset};

fn meta(year: i32, n: u32, title: &str) -> VoteMetadataRecord {
    VoteMetadataRecord {
        year,
        vote_number: n,
        date: NaiveDate::from_ymd_opt(year, 6, 12).unwrap().and_hms_opt(17, 5, 0).unwrap(),
        result: String::from("Amendment Rejected"),
        measure_number: format!("S.Amdt. {n}"),
        measure_type: MeasureType::Amendment,
        measure_title: title.to_string(),
        question: String::from("On the Amendment (Lee Amdt. No. 1627 )"),
    }
}

fn rows(year: i32, n: u32) -> Vec<SenatorVoteRecord> {
    [("Baldwin", "D", "WI", Position::Yea), ("Cruz", "R", "TX", Position::NotVoting), ("Murkowski", "R", "AK", Position::Present)]
        .into_iter()
        .map(|(s, p, st, pos)| SenatorVoteRecord {
            year,
            vote_number: n,
            senator: s.to_string(),
            party: p.to_string(),
            state: st.to_string(),
            position: pos,
        })
        .collect()
}

fn year(y: i32) -> YearDataset {
    let mut ds = YearDataset::new(y);
    for n in 1..=3 {
        ds.metas.push(meta(y, n, "To provide \"emergency\" funding, and other purposes"));
        ds.votes.extend(rows(y, n));
    }
    ds
}

#[test]
fn combined_round_trip_is_field_for_field() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("votes.csv");
    let ds = year(2023);

    write_dataset(&path, ExportLayout::Combined, &ds.metas, &ds.votes).unwrap();
    let back = read_dataset(&path).unwrap();
    assert_eq!(back.metas, ds.metas);
    assert_eq!(back.votes, ds.votes);
}

#[test]
fn directory_reader_takes_one_level_and_skips_merged_file() {
    let tmp = tempfile::tempdir().unwrap();
    let export = ExportOptions { out_dir: tmp.path().to_path_buf(), layout: ExportLayout::Combined, merged: true };
    let years = vec![year(2022), year(2023)];
    for y in &years {
        write_year(&export, y).unwrap();
    }
    write_merged(&export, &years).unwrap();
    assert!(export.merged_path().is_file());

    let all = read_dataset_dir(tmp.path()).unwrap();
    assert_eq!(all.metas.len(), 6);
    assert_eq!(all.votes.len(), 18);
    assert_eq!(all.metas[0].year, 2022);
    assert_eq!(all.metas[5].year, 2023);

    let merged = read_dataset(&export.merged_path()).unwrap();
    assert_eq!(merged, all);
}

#[test]
fn split_layout_pairs_read_from_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let export = ExportOptions { out_dir: tmp.path().to_path_buf(), layout: ExportLayout::Split, merged: false };
    let written = write_year(&export, &year(2024)).unwrap();
    assert!(written[0].ends_with("2024/senate_votes_2024_metadata.csv"));
    assert!(written[1].ends_with("2024/senate_votes_2024_votes.csv"));

    let all = read_dataset_dir(tmp.path()).unwrap();
    let expected = year(2024);
    assert_eq!(all.metas, expected.metas);
    assert_eq!(all.votes, expected.votes);
}
