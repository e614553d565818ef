// src/lib.rs

#[macro_use]
pub mod macros;

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod records;
pub mod specs;

pub mod dataset;
pub mod features;
pub mod file;
pub mod forest;
pub mod progress;
pub mod scrape;
pub mod train;

pub use error::{Error, Result};
