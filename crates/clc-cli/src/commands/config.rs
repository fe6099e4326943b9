//! Configuration inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use clc_core::config::AppConfig;
use clc_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (password redacted)
    Show,
}

/// One setting
#[derive(Debug, Serialize, Tabled)]
struct SettingRow {
    /// Key
    key: String,
    /// Value
    value: String,
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let shown = config.redacted();
            if format == OutputFormat::Json {
                output::print_json(&shown);
                return Ok(());
            }

            let rows = vec![
                SettingRow { key: "api.base_url".into(), value: shown.api.base_url.clone() },
                SettingRow { key: "api.username".into(), value: opt(&shown.api.username) },
                SettingRow { key: "api.password".into(), value: opt(&shown.api.password) },
                SettingRow { key: "api.account_alias".into(), value: opt(&shown.api.account_alias) },
                SettingRow {
                    key: "api.request_timeout_seconds".into(),
                    value: shown.api.request_timeout_seconds.to_string(),
                },
                SettingRow { key: "walk.worker_count".into(), value: shown.walk.worker_count.to_string() },
                SettingRow {
                    key: "walk.channel_capacity".into(),
                    value: shown.walk.channel_capacity.to_string(),
                },
                SettingRow {
                    key: "walk.deadline_seconds".into(),
                    value: shown
                        .walk
                        .deadline_seconds
                        .map_or_else(|| "-".to_string(), |s| s.to_string()),
                },
                SettingRow { key: "logging.level".into(), value: shown.logging.level.clone() },
                SettingRow { key: "logging.format".into(), value: shown.logging.format.clone() },
            ];
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
