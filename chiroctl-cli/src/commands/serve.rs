//! HTTP server command
//!
//! Runs the chiroctl JSON API against PostgreSQL, or against an in-memory
//! store for demos and local front-end work.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use chiroctl_core::{ChiroConfig, MemoryStore, Store};
use chiroctl_server::db::{migrations, PgStore};
use chiroctl_server::http::{run_server, AppState, ServerConfig};

use super::connect;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default from config: 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Keep all data in memory; nothing survives a restart
    #[arg(long, conflicts_with = "database_url")]
    pub in_memory: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config: ChiroConfig) -> Result<()> {
    let bind_addr = match args.bind {
        Some(addr) => addr,
        None => config
            .server
            .bind
            .parse()
            .with_context(|| format!("invalid [server] bind address '{}'", config.server.bind))?,
    };
    let timezone = config.timezone()?;

    let store: Arc<dyn Store> = if args.in_memory {
        tracing::warn!("Using in-memory store - data is lost on shutdown");
        Arc::new(MemoryStore::new())
    } else {
        let pool = connect(args.database_url, &config).await?;
        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;
        Arc::new(PgStore::new(pool))
    };

    tracing::info!(
        organization = %config.organization.name,
        "Starting chiroctl server on {}",
        bind_addr
    );

    let server_config = ServerConfig {
        bind_addr,
        cors_permissive: args.cors_permissive || config.server.cors_permissive,
    };

    // Run server (blocks until shutdown)
    run_server(AppState::new(store, timezone), server_config)
        .await
        .context("Server error")?;

    Ok(())
}
