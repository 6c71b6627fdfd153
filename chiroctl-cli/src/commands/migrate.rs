//! Database schema command

use anyhow::{Context, Result};
use clap::Parser;

use chiroctl_core::ChiroConfig;
use chiroctl_server::db::migrations;

use super::connect;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

/// Create missing tables and indexes; safe to run repeatedly.
pub async fn run_migrate(args: MigrateArgs, config: ChiroConfig) -> Result<()> {
    let pool = connect(args.database_url, &config).await?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    println!("✅ Database schema is up to date");
    Ok(())
}
