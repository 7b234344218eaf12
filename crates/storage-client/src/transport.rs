//! HTTP transport and response classification

use crate::{config::API_PATH_PREFIX, ApiError, ClientError, Config, Result};
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    multipart::{Form, Part},
    Body, Client, Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Multipart form made of local files and scalar fields
#[derive(Clone, Debug, Default)]
pub(crate) struct MultipartForm {
    files: Vec<(String, PathBuf)>,
    fields: Vec<(String, String)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one part per path, all under the same field name
    pub fn files<P: AsRef<Path>>(mut self, field: &str, paths: &[P]) -> Self {
        self.files.extend(
            paths
                .iter()
                .map(|p| (field.to_string(), p.as_ref().to_path_buf())),
        );
        self
    }

    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    /// Open every file and assemble the form. File bodies are streamed.
    async fn into_form(self) -> Result<Form> {
        let mut form = Form::new();
        for (field, path) in self.files {
            form = form.part(field, file_part(&path).await?);
        }
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

async fn file_part(path: &Path) -> Result<Part> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ClientError::io(path, e))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| ClientError::io(path, e))?
        .len();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    debug!(path = %path.display(), size = len, mime = %mime, "Attaching file");

    Ok(Part::stream_with_length(Body::from(file), len)
        .file_name(file_name)
        .mime_str(mime.as_ref())?)
}

/// Issues requests against `<base_url>/api/v1`
#[derive(Clone, Debug)]
pub(crate) struct Transport {
    http: Client,
    base_url: String,
}

impl Transport {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.normalized_base_url();
        if base_url.is_empty() {
            return Err(ClientError::Config("base URL is required".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ClientError::Config(format!("invalid user agent: {}", e)))?,
        );

        let http = Client::builder()
            .timeout(config.effective_timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// Full URL for a path relative to the API prefix
    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PATH_PREFIX, path)
    }

    /// Request without a body
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> Result<Response> {
        let url = self.url(path);
        let mut req = self.http.request(method.clone(), &url);
        if let Some(hdrs) = headers {
            req = req.headers(hdrs);
        }

        debug!("Sending {} request to {}", method, url);
        Ok(req.send().await?)
    }

    /// Request with a JSON body
    pub async fn send_json<B>(&self, method: Method, path: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let raw = serde_json::to_vec(body)?;

        debug!("Sending {} request to {} ({} byte JSON body)", method, url, raw.len());
        Ok(self
            .http
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(raw)
            .send()
            .await?)
    }

    /// Multipart POST
    pub async fn send_multipart(&self, path: &str, form: MultipartForm) -> Result<Response> {
        let url = self.url(path);
        let form = form.into_form().await?;

        debug!("Sending multipart POST request to {}", url);
        Ok(self.http.post(&url).multipart(form).send().await?)
    }
}

/// Pass the response through if its status is accepted, otherwise
/// consume the body into an [`ApiError`].
pub(crate) async fn classify(response: Response, accepted: &[StatusCode]) -> Result<Response> {
    let status = response.status();
    debug!(status = status.as_u16(), "Received response");

    if accepted.contains(&status) {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(status = status.as_u16(), error = %e, "Failed to read error body");
            String::new()
        }
    };
    let error = ApiError::from_response(status.as_u16(), body);
    warn!(status = error.status, message = %error.message, "Storage service error");
    Err(error.into())
}

/// Read the full body and decode it as JSON
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_base_url_rejected() {
        let err = Transport::new(&Config::new("")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        let err = Transport::new(&Config::new("///")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_url_ignores_trailing_slash() {
        let with = Transport::new(&Config::new("http://storage:3003/")).unwrap();
        let without = Transport::new(&Config::new("http://storage:3003")).unwrap();
        assert_eq!(with.url("/files/abc"), without.url("/files/abc"));
        assert_eq!(without.url("/files/abc"), "http://storage:3003/api/v1/files/abc");
    }

    #[test]
    fn test_form_collects_parts_in_order() {
        let form = MultipartForm::new()
            .files("files", &["a.txt", "dir/b.png"])
            .field("metadata", "{}");
        assert_eq!(form.files.len(), 2);
        assert_eq!(form.files[1], ("files".to_string(), PathBuf::from("dir/b.png")));
        assert_eq!(form.fields, vec![("metadata".to_string(), "{}".to_string())]);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = MultipartForm::new()
            .files("files", &["/definitely/not/here.bin"])
            .into_form()
            .await
            .unwrap_err();
        match err {
            ClientError::Io { path, .. } => assert_eq!(path, PathBuf::from("/definitely/not/here.bin")),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }
}
