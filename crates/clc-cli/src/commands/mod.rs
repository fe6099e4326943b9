//! CLI command definitions and dispatch.

pub mod config;
pub mod group;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::output::OutputFormat;
use clc_core::config::AppConfig;
use clc_core::error::AppError;

/// clc — browse hardware groups of a cloud account
#[derive(Debug, Parser)]
#[command(name = "clc", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Hardware group hierarchy
    Group(group::GroupArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Group(args) => group::execute(args, &config, self.format).await,
            Commands::Config(args) => config::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: a cancellation token tripped by Ctrl-C
pub fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}
