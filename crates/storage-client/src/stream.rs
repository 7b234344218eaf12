//! Byte streams returned by download and inline content requests

use crate::{ClientError, Result};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::{header, Response};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// An open file body.
///
/// Holds the underlying connection until it is consumed or dropped.
#[derive(Debug)]
pub struct FileStream {
    response: Response,
}

/// Outcome of a conditional inline content request
#[derive(Debug)]
pub enum FileContent {
    /// The content changed (or no validator was sent)
    Modified(FileStream),
    /// The cached copy identified by the validator is still current
    NotModified {
        /// ETag echoed by the service, if any
        etag: Option<String>,
    },
}

impl FileContent {
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified { .. })
    }

    /// The stream, if the content was sent
    pub fn into_stream(self) -> Option<FileStream> {
        match self {
            Self::Modified(stream) => Some(stream),
            Self::NotModified { .. } => None,
        }
    }
}

impl FileStream {
    pub(crate) fn new(response: Response) -> Self {
        Self { response }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    /// All response headers
    pub fn headers(&self) -> &header::HeaderMap {
        self.response.headers()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    pub fn content_disposition(&self) -> Option<&str> {
        self.header(header::CONTENT_DISPOSITION)
    }

    /// File name suggested by `Content-Disposition`
    pub fn file_name(&self) -> Option<String> {
        self.content_disposition().and_then(parse_disposition_file_name)
    }

    pub fn etag(&self) -> Option<&str> {
        self.header(header::ETAG)
    }

    pub fn cache_control(&self) -> Option<&str> {
        self.header(header::CACHE_CONTROL)
    }

    fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    /// Next chunk of the body, `None` at the end
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.response.chunk().await?)
    }

    /// Body as a stream of chunks
    pub fn bytes_stream(self) -> impl Stream<Item = Result<Bytes>> {
        self.response.bytes_stream().map_err(ClientError::from)
    }

    /// Collect the whole body into memory
    pub async fn bytes(self) -> Result<Bytes> {
        Ok(self.response.bytes().await?)
    }

    /// Stream the body into a local file, returning the number of bytes written
    pub async fn write_to(mut self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| ClientError::io(path, e))?;

        let mut written = 0u64;
        while let Some(chunk) = self.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| ClientError::io(path, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| ClientError::io(path, e))?;

        Ok(written)
    }
}

/// Extract the file name from a `Content-Disposition` value.
///
/// `filename*` (RFC 5987) takes precedence over `filename`.
fn parse_disposition_file_name(value: &str) -> Option<String> {
    let mut plain = None;

    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // charset'language'encoded
                let encoded = raw.trim().splitn(3, '\'').nth(2)?;
                let decoded = percent_encoding::percent_decode_str(encoded)
                    .decode_utf8()
                    .ok()?;
                return Some(decoded.into_owned());
            }
            "filename" => {
                plain = Some(raw.trim().trim_matches('"').to_string());
            }
            _ => {}
        }
    }

    plain.filter(|name| !name.is_empty())
}
