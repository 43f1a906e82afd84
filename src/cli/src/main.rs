//! Innsight CLI - inspect access policy and probe a running server.
//!
//! Offline commands evaluate the built-in tables; `probe` and `health` talk
//! to a server.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config, health, policy, probe, token};
use output::OutputFormat;

/// Innsight - access policy tooling for the reporting portal
#[derive(Parser)]
#[command(
    name = "innsight",
    version,
    about = "Innsight - access policy tooling for the reporting portal",
    long_about = "CLI tool for inspecting role, permission and route policy, minting development tokens and probing a running Innsight server.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// API server URL
    #[arg(long, global = true, env = "INNSIGHT_API_URL")]
    api_url: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the role hierarchy
    Roles,

    /// Show the permission table
    Permissions,

    /// Show the route policy table in declared order
    Routes(policy::RoutesArgs),

    /// Evaluate the request gate for a path
    Check(policy::CheckArgs),

    /// Check whether roles grant a permission
    Can(policy::CanArgs),

    /// Mint a development session token
    Token(token::TokenArgs),

    /// Request a path on a running server without following redirects
    Probe(probe::ProbeArgs),

    /// Check system health
    Health(health::HealthArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let api_url = cli
        .api_url
        .clone()
        .or_else(config::load_api_url)
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    let client = client::ApiClient::new(&api_url)?;
    let format = cli.output;

    let result = match cli.command {
        Commands::Roles => policy::roles(format),
        Commands::Permissions => policy::permissions(format),
        Commands::Routes(args) => policy::routes(args, format),
        Commands::Check(args) => policy::check(args, format),
        Commands::Can(args) => policy::can(args, format),
        Commands::Token(args) => token::execute(args, format),
        Commands::Probe(args) => probe::execute(args, &client, format).await,
        Commands::Health(args) => health::execute(args, &client, format).await,
        Commands::Config(cmd) => config::execute(cmd, format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
