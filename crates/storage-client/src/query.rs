//! Builder for list/search query strings

use crate::FileStatus;

/// Options for listing files.
///
/// Renders to the raw query string [`StorageClient::list_files`] accepts.
///
/// [`StorageClient::list_files`]: crate::StorageClient::list_files
#[derive(Clone, Debug, Default)]
pub struct ListFilesQuery {
    page: Option<u32>,
    per_page: Option<u32>,
    filters: Vec<(String, String)>,
}

impl ListFilesQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page number, starting at 1
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Page size
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Only files with this status
    pub fn status(self, status: FileStatus) -> Self {
        self.filter("status_eq", status.as_str())
    }

    /// Only files of this type classification
    pub fn file_type(self, file_type: impl Into<String>) -> Self {
        self.filter("file_type_eq", file_type)
    }

    /// Arbitrary filter, e.g. `("original_name_like", "report")`
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Render as a URL-encoded query string without the leading `?`
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(page) = self.page {
            serializer.append_pair("page", &page.to_string());
        }
        if let Some(per_page) = self.per_page {
            serializer.append_pair("per_page", &per_page.to_string());
        }
        for (key, value) in &self.filters {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query() {
        assert_eq!(ListFilesQuery::new().to_query_string(), "");
    }

    #[test]
    fn test_query_rendering() {
        let query = ListFilesQuery::new()
            .page(2)
            .per_page(25)
            .status(FileStatus::Active)
            .file_type("image")
            .filter("original_name_like", "q1 report&draft");

        assert_eq!(
            query.to_query_string(),
            "page=2&per_page=25&status_eq=active&file_type_eq=image&original_name_like=q1+report%26draft"
        );
    }
}
