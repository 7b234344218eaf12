//! Main client implementation

use crate::{
    stream::{FileContent, FileStream},
    transport::{classify, decode, MultipartForm, Transport},
    types::*,
    ClientError, Config, ListFilesQuery, Result,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Method, StatusCode,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, instrument};

/// Characters left untouched in a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Storage service client
#[derive(Clone, Debug)]
pub struct StorageClient {
    config: Config,
    transport: Transport,
}

impl StorageClient {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let transport = Transport::new(&config)?;
        Ok(Self { config, transport })
    }

    /// Create with a base URL and default settings
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(Config::new(base_url))
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Upload & Validation ====================

    /// Upload one or more local files.
    ///
    /// `metadata` is a JSON object string applied to every file. A 206 answer
    /// is returned as `Ok`; inspect [`UploadData::failed_uploads`].
    #[instrument(skip(self, paths), fields(files = paths.len()))]
    pub async fn upload_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        metadata: Option<&str>,
    ) -> Result<ApiResponse<UploadData>> {
        require_paths(paths)?;

        let mut form = MultipartForm::new().files("files", paths);
        if let Some(meta) = metadata.filter(|m| !m.is_empty()) {
            form = form.field("metadata", meta);
        }

        let response = self.transport.send_multipart("/files/", form).await?;
        let response = classify(response, &[StatusCode::CREATED, StatusCode::PARTIAL_CONTENT]).await?;
        let result: ApiResponse<UploadData> = decode(response).await?;

        debug!(
            successful = result.data.successful,
            failed = result.data.failed,
            "Upload finished"
        );
        Ok(result)
    }

    /// Upload with metadata given as any serializable value
    pub async fn upload_files_with_metadata<P, M>(
        &self,
        paths: &[P],
        metadata: &M,
    ) -> Result<ApiResponse<UploadData>>
    where
        P: AsRef<Path>,
        M: Serialize + ?Sized,
    {
        require_paths(paths)?;
        let metadata = serde_json::to_string(metadata)?;
        self.upload_files(paths, Some(&metadata)).await
    }

    /// Validate local files against the service's rules without storing them
    #[instrument(skip(self, paths), fields(files = paths.len()))]
    pub async fn validate_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
    ) -> Result<ApiResponse<ValidationData>> {
        require_paths(paths)?;

        let form = MultipartForm::new().files("files", paths);
        let response = self.transport.send_multipart("/files/validate", form).await?;
        let response = classify(response, &[StatusCode::OK]).await?;
        decode(response).await
    }

    // ==================== Metadata ====================

    /// List files. `query` is appended verbatim after `?`, e.g.
    /// `page=1&per_page=20&status_eq=active`.
    #[instrument(skip(self))]
    pub async fn list_files(&self, query: &str) -> Result<ApiResponse<Vec<FileItem>>> {
        let path = list_path(query);
        let response = self.transport.send(Method::GET, &path, None).await?;
        let response = classify(response, &[StatusCode::OK]).await?;
        decode(response).await
    }

    /// List files using a typed query
    pub async fn search_files(&self, query: &ListFilesQuery) -> Result<ApiResponse<Vec<FileItem>>> {
        self.list_files(&query.to_query_string()).await
    }

    /// Get file metadata by ID
    #[instrument(skip(self))]
    pub async fn get_file(&self, file_id: &str) -> Result<ApiResponse<FileItem>> {
        let path = file_path(file_id)?;
        let response = self.transport.send(Method::GET, &path, None).await?;
        let response = classify(response, &[StatusCode::OK]).await?;
        decode(response).await
    }

    /// Get size and upload limits
    #[instrument(skip(self))]
    pub async fn get_file_limits(&self) -> Result<ApiResponse<FileLimits>> {
        let response = self.transport.send(Method::GET, "/files/limits", None).await?;
        let response = classify(response, &[StatusCode::OK]).await?;
        decode(response).await
    }

    /// Apply a partial update to a file record
    #[instrument(skip(self, update))]
    pub async fn update_file(
        &self,
        file_id: &str,
        update: &UpdateFileRequest,
    ) -> Result<ApiResponse<FileItem>> {
        let path = file_path(file_id)?;
        if update.status == Some(FileStatus::Unknown) {
            return Err(ClientError::InvalidArgument(
                "status must be active, inactive, archived or deleted".to_string(),
            ));
        }
        let response = self.transport.send_json(Method::PUT, &path, update).await?;
        let response = classify(response, &[StatusCode::OK]).await?;
        decode(response).await
    }

    /// Delete a file and its record
    #[instrument(skip(self))]
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let path = file_path(file_id)?;
        let response = self.transport.send(Method::DELETE, &path, None).await?;
        classify(response, &[StatusCode::OK, StatusCode::NO_CONTENT]).await?;
        Ok(())
    }

    // ==================== Content ====================

    /// Download a file as an attachment
    #[instrument(skip(self))]
    pub async fn download_file(&self, file_id: &str) -> Result<FileStream> {
        let path = format!("{}?download=true", file_path(file_id)?);
        let response = self.transport.send(Method::GET, &path, None).await?;
        let response = classify(response, &[StatusCode::OK]).await?;
        Ok(FileStream::new(response))
    }

    /// Fetch file content for inline display.
    ///
    /// With `if_none_match` set to a previously seen ETag, a 304 answer yields
    /// [`FileContent::NotModified`].
    #[instrument(skip(self))]
    pub async fn serve_file_content(
        &self,
        file_id: &str,
        if_none_match: Option<&str>,
    ) -> Result<FileContent> {
        let path = format!("{}/content", file_path(file_id)?);

        let headers = match if_none_match {
            Some(etag) => {
                let mut headers = HeaderMap::new();
                let value = HeaderValue::from_str(etag).map_err(|e| {
                    ClientError::InvalidArgument(format!("invalid ETag: {}", e))
                })?;
                headers.insert(header::IF_NONE_MATCH, value);
                Some(headers)
            }
            None => None,
        };

        let response = self.transport.send(Method::GET, &path, headers).await?;
        let response = classify(response, &[StatusCode::OK, StatusCode::NOT_MODIFIED]).await?;

        if response.status() == StatusCode::NOT_MODIFIED {
            let etag = response
                .headers()
                .get(header::ETAG)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            return Ok(FileContent::NotModified { etag });
        }

        Ok(FileContent::Modified(FileStream::new(response)))
    }
}

fn require_paths<P>(paths: &[P]) -> Result<()> {
    if paths.is_empty() {
        return Err(ClientError::InvalidArgument(
            "at least one file path is required".to_string(),
        ));
    }
    Ok(())
}

/// `/files` with the caller's query string, untouched
fn list_path(query: &str) -> String {
    if query.is_empty() {
        "/files".to_string()
    } else {
        format!("/files?{}", query)
    }
}

/// `/files/<id>` with the ID encoded as a single path segment
fn file_path(file_id: &str) -> Result<String> {
    if file_id.is_empty() {
        return Err(ClientError::InvalidArgument("file ID is required".to_string()));
    }
    Ok(format!("/files/{}", utf8_percent_encode(file_id, PATH_SEGMENT)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_encodes_segment() {
        assert_eq!(file_path("abc-123").unwrap(), "/files/abc-123");
        assert_eq!(file_path("a/b c?d#e").unwrap(), "/files/a%2Fb%20c%3Fd%23e");
        assert_eq!(file_path("100%").unwrap(), "/files/100%25");
    }

    #[test]
    fn test_list_path_keeps_query_verbatim() {
        assert_eq!(list_path(""), "/files");
        assert_eq!(list_path("page=1&tag=a%2Cb"), "/files?page=1&tag=a%2Cb");
        assert_eq!(list_path("?page=1"), "/files??page=1");
    }

    #[test]
    fn test_file_path_requires_id() {
        assert!(matches!(file_path(""), Err(ClientError::InvalidArgument(_))));
    }

    #[test]
    fn test_require_paths() {
        let empty: [&str; 0] = [];
        assert!(require_paths(&empty).is_err());
        assert!(require_paths(&["a.txt"]).is_ok());
    }
}
