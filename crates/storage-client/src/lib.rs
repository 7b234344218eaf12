//! # Storage Client SDK
//!
//! A client SDK for the file storage service REST API.
//!
//! ## Features
//!
//! - **Upload & Validation**: Multipart uploads streamed straight from disk
//! - **Metadata**: List, search, get, update and delete file records
//! - **Content**: Attachment downloads and cache-aware inline content
//! - **Typed Errors**: Remote API errors are matchable apart from transport failures
//!
//! ## Example
//!
//! ```rust,ignore
//! use storage_client::{StorageClient, Config, UpdateFileRequest, FileStatus};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Create client
//!     let client = StorageClient::new(Config::new("http://localhost:3003"))?;
//!
//!     // Upload a file
//!     let uploaded = client.upload_files(&["report.pdf"], Some(r#"{"owner":"u1"}"#)).await?;
//!     let id = &uploaded.data.uploaded_files[0].id;
//!
//!     // Archive it
//!     let update = UpdateFileRequest::new().with_status(FileStatus::Archived);
//!     client.update_file(id, &update).await?;
//!
//!     // Download it
//!     client.download_file(id).await?.write_to("report-copy.pdf").await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod query;
mod stream;
mod transport;
mod types;

pub use client::StorageClient;
pub use config::{Config, API_PATH_PREFIX, DEFAULT_TIMEOUT};
pub use error::{ApiError, ClientError, Result};
pub use query::ListFilesQuery;
pub use stream::{FileContent, FileStream};
pub use types::*;
