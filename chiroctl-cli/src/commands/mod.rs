//! Command implementations for chiroctl CLI

pub mod migrate;
pub mod serve;
pub mod work_year;

pub use migrate::run_migrate;
pub use serve::run_serve;
pub use work_year::run_work_year;

use anyhow::{Context, Result};
use chiroctl_core::ChiroConfig;
use chiroctl_server::db::{self, PgPool, PoolSettings};

/// Connect using the flag, else the configured URL (file or `DATABASE_URL`).
pub(crate) async fn connect(flag: Option<String>, config: &ChiroConfig) -> Result<PgPool> {
    let database_url = flag.or_else(|| config.database.url.clone()).context(
        "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, .env, \
         or [database] url in the config file",
    )?;

    db::connect(&database_url, PoolSettings::from(&config.database))
        .await
        .context("Failed to create database pool")
}
