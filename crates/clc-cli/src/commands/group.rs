//! Hardware group CLI commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use clc_client::{ApiClient, GroupSource, JsonFileSource};
use clc_core::config::AppConfig;
use clc_core::error::AppError;
use clc_entity::group::ReassembledNode;
use clc_service::{
    BillingAnnotator, GroupWalker, NodeAnnotator, ServerCountAnnotator, WalkOptions,
};

/// Arguments for group commands
#[derive(Debug, Args)]
pub struct GroupArgs {
    /// Group subcommand
    #[command(subcommand)]
    pub command: GroupCommand,
}

/// Where to read a hierarchy from and how to walk it
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Datacenter location alias, e.g. WA1
    #[arg(short, long)]
    pub location: String,
    /// Read the hierarchy from an exported JSON file instead of the API
    #[arg(short, long)]
    pub source_file: Option<PathBuf>,
    /// Concurrent annotation workers, 1 to 256 (defaults to walk.worker_count)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=256))]
    pub workers: Option<u16>,
    /// Give up on fetch and walk after this many seconds (defaults to walk.deadline_seconds)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_seconds: Option<u64>,
    /// Attach each group's billing summary (requires API credentials)
    #[arg(long)]
    pub billing: bool,
}

/// Group subcommands
#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Show the group hierarchy as a tree
    Tree(FetchArgs),
    /// List every group with its depth and server count
    List(FetchArgs),
    /// Save the raw hierarchy as JSON for later use with --source-file
    Export {
        /// Datacenter location alias, e.g. WA1
        #[arg(short, long)]
        location: String,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Group display row
#[derive(Debug, Serialize, Tabled)]
struct GroupRow {
    /// Group ID
    id: String,
    /// Name, indented by depth
    name: String,
    /// Type
    #[tabled(rename = "type")]
    group_type: String,
    /// Depth
    depth: usize,
    /// Servers directly inside
    servers: usize,
}

/// Execute group commands
pub async fn execute(
    args: &GroupArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        GroupCommand::Tree(fetch) => {
            let tree = fetch_tree(fetch, config).await?;
            match format {
                OutputFormat::Table => print!("{}", output::render_tree(&tree)),
                OutputFormat::Json => output::print_json(&tree),
            }
        }
        GroupCommand::List(fetch) => {
            let tree = fetch_tree(fetch, config).await?;
            let rows: Vec<GroupRow> = tree
                .iter_with_depth()
                .map(|(depth, node)| GroupRow {
                    id: node.id.clone(),
                    name: format!("{}{}", "  ".repeat(depth), node.name),
                    group_type: node.group_type.to_string(),
                    depth,
                    servers: node.server_ids.len(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        GroupCommand::Export { location, output: path } => {
            let client = ApiClient::new(config.api.clone())?;
            let root = client.fetch_group_hierarchy(location).await?;
            let json = serde_json::to_vec_pretty(&root)?;
            tokio::fs::write(path, json).await?;
            output::print_success(&format!(
                "Exported {} groups of {} to {}",
                root.group_count(),
                location,
                path.display()
            ));
        }
    }

    Ok(())
}

/// Fetch a hierarchy and run it through the walk engine
async fn fetch_tree(args: &FetchArgs, config: &AppConfig) -> Result<ReassembledNode, AppError> {
    let mut options = WalkOptions::from_config(&config.walk);
    if let Some(workers) = args.workers {
        options = options.with_worker_count(usize::from(workers));
    }
    if let Some(secs) = args.timeout_seconds {
        options = options.with_deadline(Duration::from_secs(secs));
    }

    let client = if args.billing || args.source_file.is_none() {
        Some(Arc::new(ApiClient::new(config.api.clone())?))
    } else {
        None
    };

    let source: Arc<dyn GroupSource> = match (&args.source_file, &client) {
        (Some(path), _) => Arc::new(JsonFileSource::new(path)),
        (None, Some(client)) => client.clone(),
        (None, None) => return Err(AppError::internal("No group source available")),
    };

    let annotator: Arc<dyn NodeAnnotator> = match (&client, args.billing) {
        (Some(client), true) => Arc::new(BillingAnnotator::new(Arc::clone(client))),
        _ => Arc::new(ServerCountAnnotator),
    };

    let walker = GroupWalker::new(options).with_annotator(annotator);
    tracing::debug!(?walker, location = %args.location, "Walking group hierarchy");

    let cancel = super::interrupt_token();
    walker
        .fetch_and_walk(&cancel, source.as_ref(), &args.location)
        .await
}
