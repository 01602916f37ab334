//! Kobo Activities - KoboToolbox submissions normalized for activity reporting.
//!
//! # Commands
//!
//! - `fetch` - Download all submissions to `SUBMISSIONS_PATH`
//! - `transform` - Normalize `SUBMISSIONS_PATH` into `ACTIVITIES_PATH`
//! - `run` - Both, in order
//!
//! # Environment
//!
//! - `KOBO_TOKEN`, `KOBO_ASSET_UID` (required for `fetch` and `run`)
//! - `KOBO_BASE_URL`, `KOBO_TIMEOUT_SECS`, `KOBO_MAX_PAGES`,
//!   `KOBO_PAGE_DELAY_MS`, `KOBO_RETRY_BACKOFF_MS`
//! - `SUBMISSIONS_PATH`, `ACTIVITIES_PATH`

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use kobo_activities::config::{DataPaths, KoboConfig};
use kobo_activities::data_sources::KoboClient;
use kobo_activities::pipeline::{run_fetch, run_transform};

#[derive(Debug, Parser)]
#[command(name = "kobo-activities", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download every submission of the configured asset
    Fetch,
    /// Normalize downloaded submissions into activities
    Transform {
        /// Date used for the overdue flag (defaults to today, local time)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Fetch, then transform
    Run {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

async fn fetch(paths: &DataPaths) -> anyhow::Result<()> {
    let config = KoboConfig::from_env()?;
    let client = KoboClient::from_config(&config)?;

    info!(
        base_url = %config.base_url,
        asset_uid = %config.asset_uid,
        "Fetching submissions"
    );
    let summary = run_fetch(&client, &config.asset_uid, &paths.submissions).await?;
    info!(
        records = summary.records,
        output = %summary.output.display(),
        "Fetch complete"
    );
    Ok(())
}

fn transform(paths: &DataPaths, today: Option<NaiveDate>) -> anyhow::Result<()> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let summary = run_transform(&paths.submissions, &paths.activities, today)?;
    info!(
        activities = summary.activities,
        overdue = summary.overdue,
        output = %summary.output.display(),
        "Transform complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("kobo_activities=info".parse()?))
        .init();

    let cli = Cli::parse();
    let paths = DataPaths::from_env();

    match cli.command {
        Command::Fetch => fetch(&paths).await.context("fetch stage failed"),
        Command::Transform { today } => transform(&paths, today).context("transform stage failed"),
        Command::Run { today } => {
            fetch(&paths).await.context("fetch stage failed")?;
            transform(&paths, today).context("transform stage failed")
        }
    }
}
