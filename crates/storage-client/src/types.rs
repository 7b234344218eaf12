//! Common types for the client SDK

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Open-ended key-value metadata attached to a file
pub type Metadata = Map<String, Value>;

/// Decode `null` the same as a missing value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope wrapping every JSON response of the storage service
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct ApiResponse<T> {
    /// Whether the service considers the request successful
    pub success: bool,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// HTTP status echoed by the service
    pub status: u16,
    /// Payload, defaulted when omitted or null
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: T,
    /// Present on list responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Lifecycle status of a stored file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Active,
    Inactive,
    Archived,
    Deleted,
    /// A status this client does not know about
    #[default]
    #[serde(other)]
    Unknown,
}

impl FileStatus {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "archived" => Ok(Self::Archived),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("unknown file status: {}", other)),
        }
    }
}

/// A file record as returned by list, get, upload and update
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    /// File identifier
    pub id: String,
    /// Name the file was uploaded with
    #[serde(default)]
    pub original_name: String,
    /// Name on the storage backend
    #[serde(default)]
    pub stored_name: String,
    /// Storage path
    #[serde(default)]
    pub file_path: String,
    /// Size in bytes
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub extension: String,
    /// Coarse classification (image, document, ...)
    #[serde(default)]
    pub file_type: String,
    /// Content hash
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub status: FileStatus,
    /// User metadata, empty when omitted or null
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub metadata: Metadata,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// Pagination metadata of a list response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_page: Option<u32>,
}

/// Payload of an upload response
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadData {
    /// Files stored successfully
    #[serde(default, deserialize_with = "null_as_default")]
    pub uploaded_files: Vec<FileItem>,
    /// Number of files in the request
    #[serde(default)]
    pub total_files: u32,
    /// Number of files stored
    #[serde(default)]
    pub successful: u32,
    /// Number of files rejected
    #[serde(default)]
    pub failed: u32,
    /// Per-file failure details
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed_uploads: Vec<FailedUpload>,
}

impl UploadData {
    /// True when some files were stored and some were rejected
    pub fn is_partial(&self) -> bool {
        self.successful > 0 && self.failed > 0
    }
}

/// A file the service refused to store
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedUpload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Any other fields the service reported
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a validate response
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub validation_results: Vec<ValidationResult>,
    #[serde(default)]
    pub total_files: u32,
}

/// Verdict for one validated file
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub original_name: String,
    pub extension: String,
    pub size: u64,
    #[serde(default)]
    pub size_formatted: String,
    /// MIME type declared by the client
    pub header_mime_type: String,
    /// MIME type sniffed from the content
    pub detected_mime_type: String,
    pub is_allowed: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub max_size: u64,
    #[serde(default)]
    pub max_size_formatted: String,
}

/// Size and upload limits enforced by the service
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLimits {
    /// Size limit for extensions without an override
    #[serde(default)]
    pub default_max_size: u64,
    /// Per-extension size limits
    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: BTreeMap<String, u64>,
    /// Upload-limit policy
    #[serde(default, deserialize_with = "null_as_default")]
    pub upload_limits: Map<String, Value>,
}

impl FileLimits {
    /// Size limit applying to the given extension
    pub fn max_size_for(&self, extension: &str) -> u64 {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.extensions
            .get(&ext)
            .copied()
            .unwrap_or(self.default_max_size)
    }
}

/// Partial update of a file record.
///
/// Only fields that were set are sent. `metadata` distinguishes "leave
/// unchanged" (`None`) from "clear" (`Some(None)`) and "replace"
/// (`Some(Some(map))`).
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FileStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Option<Metadata>>,
}

impl UpdateFileRequest {
    /// Create an empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the file
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Change the lifecycle status
    pub fn with_status(mut self, status: FileStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Replace the metadata map
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(Some(metadata));
        self
    }

    /// Send an explicit null for metadata
    pub fn clear_metadata(mut self) -> Self {
        self.metadata = Some(None);
        self
    }

    /// True when nothing would be changed
    pub fn is_empty(&self) -> bool {
        self.file_name.is_none() && self.status.is_none() && self.metadata.is_none()
    }
}
