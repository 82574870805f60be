// API client for GitHub search and README lookup
pub mod github;
pub mod retry;

// Re-export common types
pub use github::{
    GitHubClient, GitHubError, GitHubOwner, GitHubRepo, ReadmeMetadata, SearchResponse,
    GITHUB_REPOS_URL, GITHUB_SEARCH_URL,
};
pub use retry::RetryConfig;
