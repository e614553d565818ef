// src/bin/train.rs
use clap::Parser;
use senate_votes::cli::{self, TrainArgs};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli::train_model(TrainArgs::parse())?;
    Ok(())
}
