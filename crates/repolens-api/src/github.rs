use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::retry::{is_retryable_status, with_retry, Retryable, RetryConfig};

pub const GITHUB_SEARCH_URL: &str = "https://api.github.com/search/repositories";
pub const GITHUB_REPOS_URL: &str = "https://api.github.com/repos";

const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("HTTP status {status}")]
    RequestFailed {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Rate limit exceeded, resets in {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl Retryable for GitHubError {
    fn is_retryable(&self) -> bool {
        match self {
            GitHubError::RequestFailed { status, .. } => is_retryable_status(*status),
            GitHubError::NetworkError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;

/// Client for the two GitHub endpoints RepoLens talks to: repository search
/// and README lookup.
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    search_url: String,
    repos_url: String,
    retry_config: RetryConfig,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_endpoints(
            token,
            GITHUB_SEARCH_URL.to_string(),
            GITHUB_REPOS_URL.to_string(),
        )
    }

    /// For GitHub Enterprise or a mock server
    pub fn with_endpoints(token: Option<String>, search_url: String, repos_url: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("RepoLens/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            token,
            search_url: search_url.trim_end_matches('/').to_string(),
            repos_url: repos_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::none(),
        }
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Run a repository search.
    ///
    /// `query` is passed verbatim as the `q` parameter, qualifiers included
    /// (e.g. `tokio created:2024-01-01..2024-02-01`).
    pub async fn search_repositories(
        &self,
        query: &str,
        sort: &str,
        order: &str,
        per_page: u32,
        page: u32,
    ) -> Result<SearchResponse> {
        debug!(query, sort, order, page, "GET {}", self.search_url);

        with_retry(&self.retry_config, || async {
            let mut request = self
                .client
                .get(&self.search_url)
                .header(reqwest::header::ACCEPT, GITHUB_JSON)
                .query(&[
                    ("q", query),
                    ("sort", sort),
                    ("order", order),
                    ("per_page", &per_page.to_string()),
                    ("page", &page.to_string()),
                ]);

            if let Some(ref token) = self.token {
                request = request.bearer_auth(token);
            }

            let response = check_status(request.send().await?, query).await?;
            let body = response.text().await?;
            let results: SearchResponse = serde_json::from_str(&body)?;
            Ok(results)
        })
        .await
    }

    /// Fetch README metadata for `owner/repo`
    pub async fn get_readme_metadata(&self, owner: &str, repo: &str) -> Result<ReadmeMetadata> {
        let url = format!(
            "{}/{}/{}/readme",
            self.repos_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        let full_name = format!("{}/{}", owner, repo);
        debug!("GET {}", url);

        with_retry(&self.retry_config, || async {
            let mut request = self
                .client
                .get(&url)
                .header(reqwest::header::ACCEPT, GITHUB_JSON);

            if let Some(ref token) = self.token {
                request = request.bearer_auth(token);
            }

            let response =
                check_status(request.send().await?, &format!("README for {}", full_name)).await?;
            let body = response.text().await?;
            let metadata: ReadmeMetadata = serde_json::from_str(&body)?;
            Ok(metadata)
        })
        .await
    }

    /// Download raw text, typically a README `download_url`
    pub async fn download(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        with_retry(&self.retry_config, || async {
            let response = check_status(self.client.get(url).send().await?, url).await?;
            let content = response.text().await?;
            Ok(content)
        })
        .await
    }
}

/// Map non-success responses onto `GitHubError`
async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(GitHubError::NotFound(what.to_string()));
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GitHubError::AuthRequired);
    }

    if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        if let Some(retry_after) = rate_limit_reset(response.headers()) {
            return Err(GitHubError::RateLimitExceeded { retry_after });
        }
    }

    let body = response.text().await.unwrap_or_default();
    Err(GitHubError::RequestFailed { status, body })
}

/// Seconds until the rate limit resets, if the headers say we hit it.
///
/// GitHub signals exhaustion with `x-ratelimit-remaining: 0` and an epoch
/// `x-ratelimit-reset`; secondary limits send `retry-after` instead.
fn rate_limit_reset(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
    };

    if let Some(seconds) = header("retry-after") {
        return Some(seconds.max(0) as u64);
    }

    if header("x-ratelimit-remaining") == Some(0) {
        let now = chrono::Utc::now().timestamp();
        let reset = header("x-ratelimit-reset").unwrap_or(now);
        return Some((reset - now).max(0) as u64);
    }

    None
}

/// Search response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<GitHubRepo>,
}

/// The slice of a search hit that RepoLens renders. Counts default to zero
/// when a record comes back without them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub owner: Option<GitHubOwner>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubOwner {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub html_url: String,
}

/// Response of `GET /repos/{owner}/{repo}/readme`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadmeMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}
