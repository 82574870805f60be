use repolens_api::GitHubError;
use thiserror::Error;

/// All the ways a RepoLens operation can fail
#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Try again in {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<GitHubError> for Error {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::RequestFailed { status, .. } => Error::ApiError(format!("HTTP status {}", status)),
            GitHubError::RateLimitExceeded { retry_after } => Error::RateLimitExceeded { retry_after },
            GitHubError::NotFound(what) => Error::NotFound(what),
            GitHubError::AuthRequired => {
                Error::AuthError("GitHub rejected the token (401)".to_string())
            }
            GitHubError::NetworkError(e) => Error::NetworkError(e),
            GitHubError::ParseError(e) => Error::SerializationError(e),
        }
    }
}
