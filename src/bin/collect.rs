// src/bin/collect.rs
use clap::Parser;
use senate_votes::cli::{self, CollectArgs};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli::collect(CollectArgs::parse())?;
    Ok(())
}
