//! mes-seed - MES Office API seeding and endpoint testing
//!
//! Command-line companion to the `mes-api-client` crate: inspect tokens, probe
//! collections, issue raw requests and clean up seeded test data.

use clap::{Parser, Subcommand};
use mes_api_client::{ClientConfig, Entity, MesClient};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;

use commands::{cleanup, entities, get, probe, token};

/// Seeding and endpoint-testing CLI for the MES Office API
#[derive(Parser)]
#[command(name = "mes-seed")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Configuration file (defaults to .mes-api.toml / mes-api.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Company to act for (sent as X-Company-Id)
    #[arg(long, global = true)]
    company: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire an API token and show its expiry
    Token,

    /// Fetch collections and report status, item count and timing
    Probe {
        /// Entities to probe (probes all if not specified)
        #[arg(short, long)]
        entity: Vec<Entity>,

        /// Show the failure message of each failed probe
        #[arg(short, long)]
        detailed: bool,
    },

    /// GET an API path and print the JSON response
    Get {
        /// Path relative to the base URL, e.g. api/warehouses/1
        path: String,
    },

    /// List the known API collections
    Entities,

    /// Find and delete seeded test records of one entity
    Cleanup {
        /// Entity to clean up
        entity: Entity,

        /// JSON field holding the record's business code
        #[arg(long, default_value = "code")]
        code_field: String,

        /// Delete the records (dry-run if not specified)
        #[arg(short, long)]
        apply: bool,
    },
}

fn build_client(cli: &Cli) -> anyhow::Result<MesClient> {
    let config = ClientConfig::load(cli.config.as_deref())?;
    let client = MesClient::with_config(config)?;
    Ok(match cli.company {
        Some(company_id) => client.with_company_id(company_id),
        None => client,
    })
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Entities = cli.command {
        return entities::run(&cli.format);
    }

    let client = build_client(&cli)?;

    match cli.command {
        Commands::Token => token::run(&client, &cli.format).await,
        Commands::Probe { entity, detailed } => {
            probe::run(&client, &entity, detailed, &cli.format).await
        }
        Commands::Get { path } => get::run(&client, &path, &cli.format).await,
        Commands::Entities => entities::run(&cli.format),
        Commands::Cleanup {
            entity,
            code_field,
            apply,
        } => cleanup::run(&client, entity, &code_field, apply, &cli.format).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("mes_seed=debug,mes_api_client=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
