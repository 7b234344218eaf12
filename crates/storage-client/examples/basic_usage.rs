//! Basic usage example for the storage service client
//!
//! This example demonstrates:
//! - Checking limits and validating a file
//! - Uploading with metadata
//! - Listing and updating records
//! - Downloading and revalidating content
//! - Deleting a file
//!
//! Run with: cargo run -p storage-client --example basic_usage

use serde_json::json;
use storage_client::{
    Config, FileContent, FileStatus, ListFilesQuery, StorageClient, UpdateFileRequest,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let base_url =
        std::env::var("STORAGE_SERVICE_URL").unwrap_or_else(|_| "http://localhost:3003".into());
    let client = StorageClient::new(Config::new(base_url))?;

    // ==================== Limits & Validation ====================

    let limits = client.get_file_limits().await?.data;
    println!("📏 Default max size: {} bytes", limits.default_max_size);

    let dir = tempfile::tempdir()?;
    let note = dir.path().join("hello.txt");
    std::fs::write(&note, "Hello, storage service!")?;

    let verdicts = client.validate_files(&[&note]).await?.data;
    for v in &verdicts.validation_results {
        println!(
            "🔎 {}: allowed={} (declared {}, detected {})",
            v.original_name, v.is_allowed, v.header_mime_type, v.detected_mime_type
        );
    }

    // ==================== Upload ====================

    let uploaded = client
        .upload_files_with_metadata(&[&note], &json!({"source": "basic_usage"}))
        .await?
        .data;
    println!(
        "📤 Uploaded {}/{} files",
        uploaded.successful, uploaded.total_files
    );
    for failed in &uploaded.failed_uploads {
        println!("   ⚠️  {:?}: {:?}", failed.original_name, failed.error);
    }
    let Some(file) = uploaded.uploaded_files.first() else {
        return Ok(());
    };

    // ==================== Metadata ====================

    let page = client
        .search_files(&ListFilesQuery::new().per_page(5).status(FileStatus::Active))
        .await?;
    println!("📋 {} active files on this page", page.data.len());

    let update = UpdateFileRequest::new().with_status(FileStatus::Archived);
    let archived = client.update_file(&file.id, &update).await?.data;
    println!("🗄️  {} is now {}", archived.original_name, archived.status);

    // ==================== Content ====================

    let bytes = client.download_file(&file.id).await?.bytes().await?;
    println!("📥 Downloaded: {}", String::from_utf8_lossy(&bytes));

    if let FileContent::Modified(stream) = client.serve_file_content(&file.id, None).await? {
        if let Some(etag) = stream.etag().map(str::to_string) {
            drop(stream);
            let again = client.serve_file_content(&file.id, Some(&etag)).await?;
            println!("♻️  Revalidated, not modified: {}", again.is_not_modified());
        }
    }

    // ==================== Cleanup ====================

    match client.delete_file(&file.id).await {
        Ok(()) => println!("🗑️  Deleted {}", file.id),
        Err(e) if e.is_not_found() => println!("   already gone"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
