//! Recall CLI — retrieve backup artifacts for one cluster node.
//!
//! Set RECALL_PROVIDER, RECALL_BUCKET, RECALL_CLUSTER_ID and RECALL_NODE_ID
//! (plus RECALL_ENDPOINT or RECALL_LOCAL_ROOT depending on the provider).

use anyhow::Context;
use clap::{Parser, Subcommand};
use recall_cli::{init_tracing, restore_prefix};
use recall_core::RestoreConfig;
use recall_storage::{create_downloader, Downloader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recall", about = "Retrieve backup artifacts from remote storage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List object keys under a prefix of the node's backup
    List {
        /// Prefix relative to the node root (whole node if omitted)
        prefix: Option<PathBuf>,
    },
    /// Download a single object
    Get {
        /// Object key relative to the node root
        key: PathBuf,
        /// Local destination file
        #[arg(long)]
        dest: PathBuf,
    },
    /// Download every object under a prefix
    Fetch {
        /// Prefix relative to the node root (whole node if omitted)
        prefix: Option<PathBuf>,
        /// Local restore directory
        #[arg(long)]
        dest: PathBuf,
    },
}

async fn run(downloader: &dyn Downloader, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::List { prefix } => {
            let prefix =
                downloader.object_key_to_remote_reference(&prefix.unwrap_or_default())?;
            let objects = downloader.list_files(&prefix).await?;
            for object in &objects {
                println!("{}", object.object_key().display());
            }
        }
        Commands::Get { key, dest } => {
            let object = downloader.object_key_to_remote_reference(&key)?;
            downloader.download_file(&dest, &object).await?;
            println!("{} -> {}", object, dest.display());
        }
        Commands::Fetch { prefix, dest } => {
            let summary =
                restore_prefix(downloader, &prefix.unwrap_or_default(), &dest).await?;
            println!(
                "Restored {} files ({} bytes) into {}",
                summary.files,
                summary.bytes,
                dest.display()
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = RestoreConfig::from_env().context(
        "Failed to load restore configuration. Set RECALL_BUCKET, RECALL_CLUSTER_ID and RECALL_NODE_ID",
    )?;
    let downloader = create_downloader(&config)
        .await
        .context("Failed to create downloader")?;

    let result = run(downloader.as_ref(), cli.command).await;

    // Release the client even when the command failed
    if let Err(e) = downloader.cleanup().await {
        tracing::warn!(error = %e, "Downloader cleanup failed");
    }

    result
}
