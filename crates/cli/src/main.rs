//! kfin CLI
//!
//! Estimates what a Kubernetes cluster costs per month and shows it either as
//! plain reports or as an interactive terminal dashboard.

mod commands;
mod config;
mod inventory;
mod output;
mod tui;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{analyze, dashboard, history, status};

/// Kubernetes cluster cost intelligence
#[derive(Parser)]
#[command(name = "kfin")]
#[command(author, version, about = "kfin - Kubernetes cluster cost intelligence", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, env = "KFIN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Path to kubeconfig file (uses default if not specified)
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<String>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Runs the dashboard when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze workload and node costs in the cluster
    Analyze,

    /// Estimate usage-based cost from historical stats
    History {
        /// Lookback window in hours (defaults to stats.default_lookback_hours)
        #[arg(long)]
        hours: Option<u64>,

        /// Query step, for example 1m, 5m, 15m
        #[arg(long, default_value = "5m")]
        step: String,

        /// Print query URLs, series point counts and pricing details
        #[arg(long)]
        debug: bool,

        /// Pricing source: config or oracle
        #[arg(long, default_value = "config")]
        pricing_source: String,

        /// Command printing pricing JSON (defaults to pricing.oracle.command)
        #[arg(long)]
        pricing_command: Option<String>,

        /// Argument passed to the pricing command (repeatable)
        #[arg(long = "pricing-arg", allow_hyphen_values = true)]
        pricing_args: Vec<String>,
    },

    /// Show cluster node and pod counts
    Status,

    /// Open the interactive dashboard
    Tui,
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let settings = config::load_settings(cli.config.as_deref());
    let kube = config::KubeTarget::new(cli.kubeconfig.clone(), cli.context.clone());

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Analyze => {
            analyze::run(&settings, &kube, cli.format).await?;
        }
        Commands::History {
            hours,
            step,
            debug,
            pricing_source,
            pricing_command,
            pricing_args,
        } => {
            let options = history::HistoryOptions {
                hours,
                step,
                debug,
                pricing_source,
                pricing_command,
                pricing_args,
            };
            history::run(&settings, options, cli.format).await?;
        }
        Commands::Status => {
            status::run(&kube, cli.format).await?;
        }
        Commands::Tui => {
            dashboard::run(&settings, &kube).await?;
        }
    }

    Ok(())
}
