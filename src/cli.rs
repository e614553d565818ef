// src/cli.rs
//
// Argument structs and entry points for the three binaries. Each entry point
// builds one `AppOptions` from its flags and passes it down explicitly.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{Args, Parser, ValueEnum};
use tracing::{info, warn};

use crate::{
    config::{AppOptions, ExportLayout, ExportOptions, FetchOptions, ScrapeOptions, SplitMethod, TrainOptions, consts::*},
    core::{HttpFetcher, PageSource},
    dataset::{self, Dataset},
    error::{Error, Result},
    features::build_features,
    logging,
    progress::LogProgress,
    records::{Session, YearDataset},
    scrape::{MultiYearReport, collect_year, collect_years},
    train::train,
};

#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Log filter directives, e.g. `info` or `senate_votes=debug`
    #[arg(long, env = "SENATE_LOG", default_value = "info")]
    pub log: String,

    /// Append log lines to this file instead of stderr
    #[arg(long, env = "SENATE_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl LogArgs {
    fn init(&self) -> Result<()> {
        logging::init(&self.log, self.log_file.as_deref())
    }
}

#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    #[arg(long, env = "SENATE_BASE_URL", default_value = BASE_URL)]
    pub base_url: String,

    /// Extra attempts for timeouts, connection errors, 429 and 5xx
    #[arg(long, env = "SENATE_RETRIES", default_value_t = MAX_RETRIES)]
    pub retries: u32,

    /// Pause between requests, in milliseconds (plus random jitter)
    #[arg(long, env = "SENATE_PAUSE_MS", default_value_t = REQUEST_PAUSE_MS)]
    pub pause_ms: u64,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    #[arg(long, env = "SENATE_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ExportLayout::Combined)]
    pub layout: ExportLayout,

    /// Only fetch the first N vote pages of each year
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Collect one year of Senate roll-call votes into CSV.
#[derive(Debug, Parser)]
#[command(name = "senate-collect", version, about)]
pub struct CollectArgs {
    #[arg(long, env = "SENATE_YEAR")]
    pub year: i32,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub fetch: FetchArgs,

    #[command(flatten)]
    pub logging: LogArgs,
}

/// Collect a range of years concurrently, one worker per in-flight year.
#[derive(Debug, Parser)]
#[command(name = "senate-collect-years", version, about)]
pub struct CollectYearsArgs {
    #[arg(long)]
    pub from: i32,

    #[arg(long)]
    pub to: i32,

    #[arg(long, env = "SENATE_WORKERS", default_value_t = WORKERS)]
    pub workers: usize,

    /// Also write every year into one `senate_votes_all.csv`
    #[arg(long)]
    pub merged: bool,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub fetch: FetchArgs,

    #[command(flatten)]
    pub logging: LogArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SplitKind {
    Chronological,
    Random,
}

/// Train and evaluate the pass/fail classifier on collected votes.
#[derive(Debug, Parser)]
#[command(name = "senate-train", version, about)]
pub struct TrainArgs {
    /// A dataset file, or a directory holding `<year>/*.csv`
    #[arg(long, env = "SENATE_INPUT", default_value = DEFAULT_OUT_DIR)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = SplitKind::Chronological)]
    pub split: SplitKind,

    #[arg(long, default_value_t = SEED)]
    pub seed: u64,

    #[arg(long, default_value_t = N_TREES)]
    pub trees: usize,

    #[arg(long, default_value_t = MAX_DEPTH)]
    pub max_depth: usize,

    #[arg(long, default_value_t = TEST_FRACTION)]
    pub test_fraction: f64,

    /// Pass rate assumed for a vote with no earlier history
    #[arg(long, default_value_t = DEFAULT_PASS_RATE)]
    pub default_pass_rate: f64,

    /// Save the fitted model as JSON
    #[arg(long)]
    pub model_out: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LogArgs,
}

impl FetchArgs {
    fn options(&self) -> FetchOptions {
        FetchOptions {
            base_url: self.base_url.clone(),
            max_retries: self.retries,
            ..FetchOptions::default()
        }
    }

    fn scrape_options(&self, workers: usize, limit: Option<usize>) -> ScrapeOptions {
        ScrapeOptions {
            workers,
            request_pause: Duration::from_millis(self.pause_ms),
            limit,
            ..ScrapeOptions::default()
        }
    }
}

impl OutputArgs {
    fn options(&self, merged: bool) -> ExportOptions {
        ExportOptions { out_dir: self.out_dir.clone(), layout: self.layout, merged }
    }
}

impl CollectArgs {
    pub fn app_options(&self) -> AppOptions {
        AppOptions {
            fetch: self.fetch.options(),
            scrape: self.fetch.scrape_options(1, self.output.limit),
            export: self.output.options(false),
            ..AppOptions::default()
        }
    }
}

impl CollectYearsArgs {
    pub fn app_options(&self) -> AppOptions {
        AppOptions {
            fetch: self.fetch.options(),
            scrape: self.fetch.scrape_options(self.workers.max(1), self.output.limit),
            export: self.output.options(self.merged),
            ..AppOptions::default()
        }
    }
}

impl TrainArgs {
    pub fn app_options(&self) -> AppOptions {
        let split = match self.split {
            SplitKind::Chronological => SplitMethod::Chronological,
            SplitKind::Random => SplitMethod::Random { seed: self.seed },
        };
        AppOptions {
            train: TrainOptions {
                split,
                test_fraction: self.test_fraction,
                n_trees: self.trees,
                max_depth: self.max_depth,
                seed: self.seed,
                default_pass_rate: self.default_pass_rate,
                model_out: self.model_out.clone(),
                ..TrainOptions::default()
            },
            ..AppOptions::default()
        }
    }
}

fn check_year(year: i32) -> Result<()> {
    if Session::for_year(year).is_none() {
        return Err(Error::Usage(format!("{year} is before the first Congress (1789)")));
    }
    Ok(())
}

/// Fail fast when the site cannot be reached at all.
fn connect(fetch: &FetchOptions) -> Result<HttpFetcher> {
    let fetcher = HttpFetcher::new(fetch)?;
    fetcher.probe(&fetch.base_url).map_err(Error::Unreachable)?;
    Ok(fetcher)
}

fn print_year(ds: &YearDataset) {
    println!(
        "{}: {} votes, {} senator rows, {} skipped pages, {} skipped rows",
        ds.year,
        ds.metas.len(),
        ds.votes.len(),
        ds.skipped.len(),
        ds.row_warnings
    );
    for s in &ds.skipped {
        println!("  skipped {} ({}): {}", s.key, s.url, s.reason);
    }
}

/// `senate-collect`
pub fn collect(args: CollectArgs) -> Result<()> {
    args.logging.init()?;
    check_year(args.year)?;
    let opts = args.app_options();

    let fetcher = connect(&opts.fetch)?;
    let ds = collect_year(&fetcher, &opts.fetch, &opts.scrape, args.year)?;

    for path in dataset::write_year(&opts.export, &ds)? {
        println!("Wrote {}", path.display());
    }
    print_year(&ds);
    Ok(())
}

/// `senate-collect-years`
pub fn collect_range(args: CollectYearsArgs) -> Result<()> {
    args.logging.init()?;
    if args.from > args.to {
        return Err(Error::Usage(format!("--from {} is after --to {}", args.from, args.to)));
    }
    check_year(args.from)?;
    let opts = args.app_options();
    let years: Vec<i32> = (args.from..=args.to).collect();

    let fetcher = connect(&opts.fetch)?;
    let source: Arc<dyn PageSource> = Arc::new(fetcher);
    let mut progress = LogProgress::default();
    let report = collect_years(source, &opts.fetch, &opts.scrape, &years, Some(&mut progress));

    save_report(&opts.export, &report)?;
    print_report(&report);

    if report.years.is_empty() {
        return Err(Error::AllYearsFailed(report.failed.len()));
    }
    Ok(())
}

fn save_report(export: &ExportOptions, report: &MultiYearReport) -> Result<()> {
    for ds in &report.years {
        for path in dataset::write_year(export, ds)? {
            println!("Wrote {}", path.display());
        }
    }
    if export.merged && !report.years.is_empty() {
        for path in dataset::write_merged(export, &report.years)? {
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn print_report(report: &MultiYearReport) {
    println!(
        "Collected {} years ({} votes, {} senator rows, {} skipped pages); {} years failed",
        report.years.len(),
        report.total_votes(),
        report.total_senator_rows(),
        report.skipped_votes(),
        report.failed.len()
    );
    for ds in &report.years {
        print_year(ds);
    }
    for (year, reason) in &report.failed {
        println!("{year}: FAILED: {reason}");
    }
}

fn load_input(input: &Path) -> Result<Dataset> {
    if input.is_dir() {
        Ok(dataset::read_dataset_dir(input)?)
    } else if input.is_file() {
        Ok(dataset::read_dataset(input)?)
    } else {
        Err(Error::Usage(format!("input {} does not exist", input.display())))
    }
}

/// `senate-train`
pub fn train_model(args: TrainArgs) -> Result<()> {
    args.logging.init()?;
    let opts = args.app_options();

    let data = load_input(&args.input)?;
    if data.votes.is_empty() {
        warn!("dataset has no senator rows; senator history features will be zero");
    }
    let rows = build_features(&data.metas, &data.votes, &opts.train);
    info!(rows = rows.len(), "features built");

    let (model, report) = train(&rows, &opts.train)?;
    println!("{report}");

    if let Some(path) = &opts.train.model_out {
        model.save(path)?;
        println!("Model saved to {}", path.display());
    }
    Ok(())
}
