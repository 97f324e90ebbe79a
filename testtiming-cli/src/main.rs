//! testtiming: how long one test took, commit by commit, on the Go LUCI builders.
//!
//! # Usage
//!
//! ```text
//! testtiming --test <test-id> [--repo go] [--branch master] [--builder <name>]
//!            [--days N] [--parallelism N] [--config <path>] [--verbose]
//! ```
//!
//! CSV goes to stdout; logs go to stderr.

mod csv;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use testtiming_board::{BoardError, DashboardAssembler, TestTimingExtractor};
use testtiming_core::{ClientConfig, Project};
use testtiming_luci::HttpServices;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "testtiming",
    version,
    about = "Print the pass/fail durations of one test across recent LUCI builds as CSV",
    long_about = None,
)]
struct Cli {
    /// Repository whose commits form the columns (go, tools, net, ...).
    #[arg(long, default_value = "go")]
    repo: String,

    /// Go branch the builders test against.
    #[arg(long, default_value = "master")]
    branch: String,

    /// Restrict to one builder. Empty means every matching builder.
    #[arg(long, default_value = "")]
    builder: String,

    /// Test id to report, matched exactly.
    #[arg(long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    test: String,

    /// Look back this many days (default 60).
    #[arg(long)]
    days: Option<u32>,

    /// Builders fetched concurrently.
    #[arg(long)]
    parallelism: Option<usize>,

    /// Config file (default: <config dir>/testtiming/config.yaml, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every remote call.
    #[arg(long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = Arc::new(resolve_config(&cli)?);
    run(&cli, config)
}

fn run(cli: &Cli, config: Arc<ClientConfig>) -> Result<()> {
    let services = HttpServices::new(&config);
    let since = Utc::now() - chrono::Duration::days(i64::from(config.lookback_days));

    let assembler = DashboardAssembler::new(
        Arc::new(services.gitiles),
        Arc::new(services.buildbucket),
        Arc::clone(&config),
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let dash = runtime
        .block_on(assembler.read_board(
            Project::new(&cli.repo, &cli.branch),
            &cli.builder,
            since,
        ))
        .map_err(|err| {
            if let BoardError::InvariantViolation { kind, detail } = &err {
                tracing::error!(%kind, detail = %detail, "upstream data broke an invariant");
            }
            err
        })
        .context("failed to read dashboard")?;
    drop(runtime);

    tracing::info!(
        builders = dash.builders.len(),
        commits = dash.commits.len(),
        "dashboard ready"
    );

    let with_builder = dash.builders.len() > 1;
    let extractor = TestTimingExtractor::new(Arc::new(services.resultdb), Arc::clone(&config));
    let mut out = BufWriter::new(io::stdout().lock());
    extractor.for_each_record(&dash, &cli.test, |record| -> Result<()> {
        writeln!(out, "{}", csv::format_line(&record, with_builder))?;
        Ok(())
    })?;
    out.flush().context("failed to flush stdout")?;
    Ok(())
}

/// `--config` if given, else the per-user file if it exists, else defaults;
/// then flag overrides.
fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let path = cli.config.clone().or_else(|| {
        dirs::config_dir()
            .map(|dir| ClientConfig::default_path_at(&dir))
            .filter(|path| path.exists())
    });
    let mut config = match path {
        Some(path) => ClientConfig::load_at(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClientConfig::default(),
    };

    if let Some(parallelism) = cli.parallelism {
        config.max_parallelism = parallelism;
    }
    if let Some(days) = cli.days {
        config.lookback_days = days;
    }
    if cli.verbose {
        config.trace_steps = true;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
