// src/scrape/mod.rs
//
// Collection runs: one year end to end, and many years over a worker pool.
mod year;
mod years;

pub use year::collect_year;
pub use years::{MultiYearReport, collect_years};
