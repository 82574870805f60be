// GitHub provider implementation - bridges API client with the provider traits
use async_trait::async_trait;
use repolens_api::{GitHubClient, GitHubRepo};

use crate::{
    config::Config,
    models::{Owner, RepositorySummary, SearchPage, SearchRequest},
    search::{ReadmeProvider, SearchProvider},
    Result,
};

/// Wrapper around GitHubClient that implements SearchProvider and ReadmeProvider
pub struct GitHubProvider {
    client: GitHubClient,
}

impl GitHubProvider {
    pub fn new(token: Option<String>) -> Self {
        Self::with_client(GitHubClient::new(token))
    }

    pub fn with_client(client: GitHubClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Self {
        let client = GitHubClient::with_endpoints(
            config.github.token.clone(),
            config.github.search_url.clone(),
            config.github.repos_url.clone(),
        )
        .with_retry_config(config.http.retry_config());

        Self::with_client(client)
    }
}

#[async_trait]
impl SearchProvider for GitHubProvider {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let response = self
            .client
            .search_repositories(
                &request.query,
                request.sort_by.as_str(),
                request.order_by.as_str(),
                request.per_page,
                request.page,
            )
            .await?;

        Ok(SearchPage {
            total_count: response.total_count,
            items: response.items.into_iter().map(github_to_summary).collect(),
        })
    }
}

#[async_trait]
impl ReadmeProvider for GitHubProvider {
    async fn readme_download_url(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        let metadata = self.client.get_readme_metadata(owner, repo).await?;
        Ok(metadata.download_url.filter(|url| !url.trim().is_empty()))
    }

    async fn download(&self, url: &str) -> Result<String> {
        Ok(self.client.download(url).await?)
    }
}

/// Convert a GitHub search hit to the card model
fn github_to_summary(gh: GitHubRepo) -> RepositorySummary {
    RepositorySummary {
        id: gh.id,
        name: gh.name,
        full_name: gh.full_name,
        html_url: gh.html_url.filter(|url| !url.is_empty()),
        owner: gh
            .owner
            .filter(|owner| !owner.login.is_empty())
            .map(|owner| Owner {
                login: owner.login,
                html_url: owner.html_url,
            }),
        stargazers_count: gh.stargazers_count,
        forks_count: gh.forks_count,
        open_issues_count: gh.open_issues_count,
    }
}
