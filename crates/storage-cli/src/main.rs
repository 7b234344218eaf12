//! storage - command-line client for the file storage service

mod commands;

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use storage_client::{Config, FileStatus, StorageClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "storage")]
#[command(about = "Client for the file storage service")]
#[command(version)]
struct Args {
    /// Storage service base URL
    #[arg(long, env = "STORAGE_SERVICE_URL", default_value = "http://localhost:3003")]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "STORAGE_SERVICE_TIMEOUT", default_value = "10")]
    timeout: u64,

    /// Enable debug logging
    #[arg(short, long, env = "STORAGE_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload one or more files
    Upload {
        /// Local files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// JSON object applied as metadata to every file
        #[arg(short, long)]
        metadata: Option<String>,
    },

    /// Check files against the service's rules without storing them
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List or search files
    List(ListArgs),

    /// Show a file record
    Get { id: String },

    /// Download a file
    Download {
        id: String,

        /// Output path (defaults to the name suggested by the service)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch a file for inline display, optionally revalidating a cached copy
    Content {
        id: String,

        /// ETag of a cached copy
        #[arg(long)]
        etag: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show size and upload limits
    Limits,

    /// Update a file record
    Update(UpdateArgs),

    /// Delete a file
    Delete { id: String },
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Raw query string, sent as-is (overrides the other options)
    #[arg(short, long)]
    query: Option<String>,

    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    per_page: Option<u32>,

    #[arg(long)]
    status: Option<FileStatus>,

    #[arg(long)]
    file_type: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct UpdateArgs {
    id: String,

    /// New file name
    #[arg(long)]
    name: Option<String>,

    /// New status (active, inactive, archived, deleted)
    #[arg(long)]
    status: Option<FileStatus>,

    /// Replacement metadata as a JSON object
    #[arg(long, conflicts_with = "clear_metadata")]
    metadata: Option<String>,

    /// Remove all metadata
    #[arg(long)]
    clear_metadata: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("storage_cli={},storage_client={}", log_level, log_level).into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::new(&args.base_url).with_timeout(Duration::from_secs(args.timeout));
    let client = StorageClient::new(config)?;
    tracing::debug!("Using storage service at {}", args.base_url);

    commands::run(&client, args.command).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload() {
        let args = Args::try_parse_from([
            "storage",
            "--base-url",
            "http://files:3003",
            "upload",
            "a.txt",
            "b.txt",
            "--metadata",
            r#"{"owner":"u1"}"#,
        ])
        .unwrap();

        assert_eq!(args.base_url, "http://files:3003");
        match args.command {
            Command::Upload { files, metadata } => {
                assert_eq!(files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
                assert_eq!(metadata.as_deref(), Some(r#"{"owner":"u1"}"#));
            }
            other => panic!("Expected Upload, got {:?}", other),
        }
    }

    #[test]
    fn test_upload_requires_files() {
        assert!(Args::try_parse_from(["storage", "upload"]).is_err());
    }

    #[test]
    fn test_parse_update_status() {
        let args =
            Args::try_parse_from(["storage", "update", "f1", "--status", "archived"]).unwrap();
        match args.command {
            Command::Update(update) => {
                assert_eq!(update.id, "f1");
                assert_eq!(update.status, Some(FileStatus::Archived));
                assert!(update.name.is_none());
                assert!(!update.clear_metadata);
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn test_metadata_conflicts_with_clear() {
        let result = Args::try_parse_from([
            "storage",
            "update",
            "f1",
            "--metadata",
            "{}",
            "--clear-metadata",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_status_rejected() {
        assert!(Args::try_parse_from(["storage", "update", "f1", "--status", "gone"]).is_err());
    }
}
