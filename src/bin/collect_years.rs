// src/bin/collect_years.rs
use clap::Parser;
use senate_votes::cli::{self, CollectYearsArgs};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli::collect_range(CollectYearsArgs::parse())?;
    Ok(())
}
