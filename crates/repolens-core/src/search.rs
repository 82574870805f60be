use crate::{
    models::{SearchPage, SearchRequest},
    Result,
};

/// Anything that can answer a repository search - makes testing easier and
/// keeps the controller away from HTTP details.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage>;
}

/// The two README calls: metadata lookup, then raw download.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ReadmeProvider: Send + Sync {
    /// `download_url` from the README metadata, `None` when the metadata
    /// carries no download location
    async fn readme_download_url(&self, owner: &str, repo: &str) -> Result<Option<String>>;

    async fn download(&self, url: &str) -> Result<String>;
}
