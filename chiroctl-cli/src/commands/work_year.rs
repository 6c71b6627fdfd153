//! Work-year lookups

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use chiroctl_core::{usecases, ChiroConfig, Store};
use chiroctl_server::db::PgStore;

use super::connect;

#[derive(Parser, Debug)]
pub struct WorkYearArgs {
    #[command(subcommand)]
    pub command: WorkYearCommands,
}

#[derive(Subcommand, Debug)]
pub enum WorkYearCommands {
    /// Show the work-year covering today (or --date)
    Current(CurrentArgs),
}

#[derive(Parser, Debug)]
pub struct CurrentArgs {
    /// Date to look up (YYYY-MM-DD); defaults to today in the configured time zone
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Print the work-year as JSON
    #[arg(long)]
    pub json: bool,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

pub async fn run_work_year(args: WorkYearArgs, config: ChiroConfig) -> Result<()> {
    match args.command {
        WorkYearCommands::Current(args) => run_current(args, config).await,
    }
}

async fn run_current(args: CurrentArgs, config: ChiroConfig) -> Result<()> {
    let date = match args.date {
        Some(date) => date,
        None => config.today()?,
    };

    let store = PgStore::new(connect(args.database_url, &config).await?);
    let mut uow = store.begin().await?;
    let work_year = usecases::current_work_year(uow.as_mut(), date)
        .await
        .with_context(|| format!("looking up the work-year for {date}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&work_year)?);
    } else {
        println!(
            "{} ({} to {}), membership fee {}.{:02} EUR",
            work_year.name,
            work_year.start_date,
            work_year.end_date,
            work_year.membership_fee.cents() / 100,
            work_year.membership_fee.cents() % 100
        );
    }
    Ok(())
}
