//! Hybrid Scaler CLI
//!
//! A command-line tool for requesting scaling decisions, running them
//! offline, and inspecting persisted learning state.

mod client;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{decide, inspect, quantize, workloads};
use std::path::PathBuf;

/// Hybrid Scaler CLI
#[derive(Parser)]
#[command(name = "hsctl")]
#[command(author, version, about = "CLI for the Hybrid Scaler decision engine", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via HSCTL_API_URL env var)
    #[arg(long, env = "HSCTL_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Request a scaling decision for a workload
    Decide {
        /// Workload key (format: namespace/name)
        #[arg(long, short)]
        workload: String,

        /// Path to the workload state JSON
        #[arg(long, short)]
        state: PathBuf,

        /// Learning state from the previous decision (missing file starts fresh)
        #[arg(long, short)]
        learning_state: Option<PathBuf>,

        /// Learning parameters JSON overriding the defaults
        #[arg(long, short)]
        parameters: Option<PathBuf>,

        /// Where to write the new learning state
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Decide in-process instead of calling the service
        #[arg(long)]
        local: bool,

        /// Exploration probability for local runs
        #[arg(long, default_value_t = 0.1)]
        epsilon: f64,

        /// Seed for reproducible local runs
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the Q-table of a persisted learning state
    Inspect {
        /// Path to the learning state
        learning_state: PathBuf,

        /// Show only one learning state, e.g. 4_100_75_100_75
        #[arg(long)]
        state_name: Option<String>,
    },

    /// Show the discretized learning state and cost of a workload state
    Quantize {
        /// Path to the workload state JSON
        #[arg(long, short)]
        state: PathBuf,

        /// Learning parameters JSON overriding the defaults
        #[arg(long, short)]
        parameters: Option<PathBuf>,
    },

    /// List workloads with a live agent in the service
    Workloads,

    /// Drop a workload's agent in the service
    Forget {
        /// Workload key (format: namespace/name)
        workload: String,
    },

    /// Show or change the saved CLI configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the saved configuration and where it lives
    Show,

    /// Update the saved configuration
    Set {
        /// API endpoint URL used when --api-url is not given
        #[arg(long)]
        api_url: Option<String>,

        /// Output format used when --format is not given
        #[arg(long)]
        default_format: Option<output::OutputFormat>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load().unwrap_or_else(|e| {
        output::print_error(&format!("Ignoring config file: {:#}", e));
        config::Config::default()
    });
    let format = config.resolve_format(cli.format);
    let api_url = config.resolve_api_url(cli.api_url);

    match cli.command {
        Commands::Decide {
            workload,
            state,
            learning_state,
            parameters,
            out,
            local,
            epsilon,
            seed,
        } => {
            let args = decide::DecideArgs {
                workload,
                state,
                learning_state,
                parameters,
                out,
                local,
                epsilon,
                seed,
            };
            if args.local {
                decide::decide_local(args, format)?;
            } else {
                let client = client::ApiClient::new(&api_url)?;
                decide::decide_remote(&client, args, format).await?;
            }
        }
        Commands::Inspect {
            learning_state,
            state_name,
        } => {
            inspect::inspect(&learning_state, state_name.as_deref(), format)?;
        }
        Commands::Quantize { state, parameters } => {
            quantize::quantize(&state, parameters.as_deref(), format)?;
        }
        Commands::Workloads => {
            let client = client::ApiClient::new(&api_url)?;
            workloads::list_workloads(&client, format).await?;
        }
        Commands::Forget { workload } => {
            let client = client::ApiClient::new(&api_url)?;
            workloads::forget_workload(&client, &workload).await?;
        }
        Commands::Config(ConfigCommands::Show) => {
            output::print_info(&format!("Config file: {}", config::Config::path()?.display()));
            output::print_json(&config)?;
        }
        Commands::Config(ConfigCommands::Set {
            api_url,
            default_format,
        }) => {
            let mut updated = config.clone();
            if let Some(url) = api_url {
                url::Url::parse(&url).context("Invalid API URL")?;
                updated.api_url = Some(url);
            }
            if default_format.is_some() {
                updated.default_format = default_format;
            }
            updated.save()?;
            output::print_success("Configuration saved");
        }
    }

    Ok(())
}
