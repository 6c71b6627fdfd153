//! chiroctl CLI - membership administration for a Chiro chapter
//!
//! - `serve`: run the JSON API (PostgreSQL or in-memory)
//! - `migrate`: create or update the database schema
//! - `work-year current`: show the work-year covering a date
//! - `config`: inspect or create `~/.chiroctl/config.toml`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use chiroctl_core::ChiroConfig;

mod commands;
mod config;
mod tracing_setup;

use tracing_setup::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "chiroctl",
    author,
    version,
    about = "Membership administration for a Chiro youth chapter",
    long_about = "Register members with their parents, care details and group, manage \
                  work-years, groups, events and sponsors, and serve it all as a JSON API."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Work-year lookups
    WorkYear(commands::work_year::WorkYearArgs),
    /// Manage chiroctl configuration (path, show, init)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so DATABASE_URL can come from it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, load_config()?).await?,
        Commands::Migrate(args) => commands::run_migrate(args, load_config()?).await?,
        Commands::WorkYear(args) => commands::run_work_year(args, load_config()?).await?,
        Commands::Config(args) => config::run_config(args)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

fn load_config() -> Result<ChiroConfig> {
    ChiroConfig::load().with_context(|| {
        format!(
            "failed to load config from {}",
            ChiroConfig::config_path().display()
        )
    })
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
