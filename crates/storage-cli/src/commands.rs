//! Subcommand execution

use crate::{Command, ListArgs, UpdateArgs};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use storage_client::{
    FileContent, FileStream, ListFilesQuery, Metadata, StorageClient, UpdateFileRequest,
};

pub(crate) async fn run(client: &StorageClient, command: Command) -> Result<()> {
    match command {
        Command::Upload { files, metadata } => {
            if let Some(meta) = &metadata {
                parse_metadata(meta)?;
            }
            let result = client.upload_files(&files, metadata.as_deref()).await?;
            if result.data.is_partial() {
                tracing::warn!(
                    "{} of {} files failed to upload",
                    result.data.failed,
                    result.data.total_files
                );
            }
            print_json(&result.data)
        }
        Command::Validate { files } => {
            let result = client.validate_files(&files).await?;
            print_json(&result.data)
        }
        Command::List(args) => {
            let result = client.list_files(&list_query(&args)).await?;
            print_json(&serde_json::json!({
                "files": result.data,
                "pagination": result.pagination,
            }))
        }
        Command::Get { id } => print_json(&client.get_file(&id).await?.data),
        Command::Download { id, output } => {
            let stream = client.download_file(&id).await?;
            save(stream, output, &id).await
        }
        Command::Content { id, etag, output } => {
            match client.serve_file_content(&id, etag.as_deref()).await? {
                FileContent::NotModified { etag } => {
                    println!("not modified{}", etag.map(|e| format!(" ({})", e)).unwrap_or_default());
                    Ok(())
                }
                FileContent::Modified(stream) => {
                    if let Some(etag) = stream.etag() {
                        eprintln!("etag: {}", etag);
                    }
                    save(stream, output, &id).await
                }
            }
        }
        Command::Limits => print_json(&client.get_file_limits().await?.data),
        Command::Update(args) => {
            let id = args.id.clone();
            let update = update_request(args)?;
            anyhow::ensure!(!update.is_empty(), "nothing to update");
            print_json(&client.update_file(&id, &update).await?.data)
        }
        Command::Delete { id } => {
            client.delete_file(&id).await?;
            println!("deleted {}", id);
            Ok(())
        }
    }
}

fn list_query(args: &ListArgs) -> String {
    if let Some(raw) = &args.query {
        return raw.clone();
    }

    let mut query = ListFilesQuery::new();
    if let Some(page) = args.page {
        query = query.page(page);
    }
    if let Some(per_page) = args.per_page {
        query = query.per_page(per_page);
    }
    if let Some(status) = args.status {
        query = query.status(status);
    }
    if let Some(file_type) = &args.file_type {
        query = query.file_type(file_type.clone());
    }
    query.to_query_string()
}

fn update_request(args: UpdateArgs) -> Result<UpdateFileRequest> {
    let mut update = UpdateFileRequest::new();
    if let Some(name) = args.name {
        update = update.with_file_name(name);
    }
    if let Some(status) = args.status {
        update = update.with_status(status);
    }
    if let Some(meta) = &args.metadata {
        update = update.with_metadata(parse_metadata(meta)?);
    }
    if args.clear_metadata {
        update = update.clear_metadata();
    }
    Ok(update)
}

fn parse_metadata(raw: &str) -> Result<Metadata> {
    serde_json::from_str(raw).context("metadata must be a JSON object")
}

/// Where to write a downloaded body
fn output_path(output: Option<PathBuf>, suggested: Option<String>, id: &str) -> PathBuf {
    output.unwrap_or_else(|| {
        // Only the final component of a server-suggested name is trusted
        suggested
            .as_deref()
            .and_then(|name| Path::new(name).file_name())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(id))
    })
}

async fn save(stream: FileStream, output: Option<PathBuf>, id: &str) -> Result<()> {
    let target = output_path(output, stream.file_name(), id);
    let written = stream
        .write_to(&target)
        .await
        .with_context(|| format!("failed to save {}", target.display()))?;
    println!("{} bytes written to {}", written, target.display());
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_client::FileStatus;

    fn list_args() -> ListArgs {
        ListArgs {
            query: None,
            page: None,
            per_page: None,
            status: None,
            file_type: None,
        }
    }

    #[test]
    fn test_raw_query_wins() {
        let args = ListArgs {
            query: Some("status_eq=inactive".to_string()),
            page: Some(3),
            ..list_args()
        };
        assert_eq!(list_query(&args), "status_eq=inactive");
    }

    #[test]
    fn test_typed_query() {
        let args = ListArgs {
            page: Some(1),
            status: Some(FileStatus::Active),
            ..list_args()
        };
        assert_eq!(list_query(&args), "page=1&status_eq=active");
    }

    #[test]
    fn test_update_request_from_args() {
        let update = update_request(UpdateArgs {
            id: "f1".to_string(),
            name: None,
            status: None,
            metadata: Some(r#"{"k":"v"}"#.to_string()),
            clear_metadata: false,
        })
        .unwrap();
        assert_eq!(update.metadata.unwrap().unwrap()["k"], "v");

        let bad = update_request(UpdateArgs {
            id: "f1".to_string(),
            name: None,
            status: None,
            metadata: Some("[1,2]".to_string()),
            clear_metadata: false,
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Some(PathBuf::from("x.bin")), Some("y.bin".into()), "id"),
            PathBuf::from("x.bin")
        );
        assert_eq!(
            output_path(None, Some("../../etc/passwd".into()), "id"),
            PathBuf::from("passwd")
        );
        assert_eq!(output_path(None, None, "f1"), PathBuf::from("f1"));
    }
}
