mod config;
mod summary;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use gnucash_split::{
    Compression, DateWindow, Namespaces, OpeningBalances, SplitJob, SplitOptions,
};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "gnucash-split",
    about = "Extract a range of years from a GnuCash XML file, carrying over prior balances"
)]
struct Args {
    /// GnuCash file to read, gzipped or plain
    #[arg(short, long)]
    input: PathBuf,

    /// File to write the extracted ledger to
    #[arg(short, long)]
    output: PathBuf,

    /// First year to keep
    #[arg(short, long)]
    year: i32,

    /// Last year to keep [default: 2442]
    #[arg(short, long)]
    end_year: Option<i32>,

    /// Write the output without gzip compression
    #[arg(short, long)]
    nozip: bool,

    /// Start every account from zero instead of carrying over prior balances
    #[arg(short, long, conflicts_with = "qif")]
    zero: bool,

    /// Write prior balances as QIF statements instead of a transaction
    #[arg(short, long)]
    qif: bool,

    /// Directory for the QIF statements [default: .]
    #[arg(long)]
    statement_dir: Option<PathBuf>,

    /// Config file, instead of looking for gnucash-split.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn opening_balances(&self) -> OpeningBalances {
        if self.zero {
            OpeningBalances::Discard
        } else if self.qif {
            OpeningBalances::Statements
        } else {
            OpeningBalances::Transaction
        }
    }

    /// Command line flags win over the config file.
    fn into_job(self, config: Config) -> Result<SplitJob> {
        let opening_balances = self.opening_balances();
        let end_year = self.end_year.or(config.window.end_year);
        let window = DateWindow::from_years(self.year, end_year).context("Invalid year range")?;

        let compress = !self.nozip && config.output.compress.unwrap_or(true);
        let compression = if compress {
            Compression::Gzip
        } else {
            Compression::None
        };

        let statement_dir = self
            .statement_dir
            .or(config.output.statement_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut namespaces = Namespaces::gnucash();
        for (alias, uri) in config.namespaces {
            namespaces.insert(alias, uri);
        }

        Ok(SplitJob {
            options: SplitOptions {
                window,
                opening_balances,
            },
            input: self.input,
            output: self.output,
            compression,
            statement_dir,
            namespaces,
        })
    }
}

pub fn run(args: impl IntoIterator<Item = String>) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gnucash_split=info".into());
    // a second run in the same process keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse_from(args);
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(Path::new("."))?.unwrap_or_default(),
    };

    let job = args.into_job(config)?;
    let report = job
        .run()
        .with_context(|| format!("Failed to split {}", job.input.display()))?;
    summary::print_summary(&job, &report);

    Ok(())
}
