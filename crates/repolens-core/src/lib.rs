// Core logic: models, controllers, pagination and the GitHub provider
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod providers;
pub mod readme;
pub mod search;
pub mod search_controller;
pub mod search_state;

pub use config::Config;
pub use error::Error;
pub use models::{OrderBy, Owner, QueryParams, RepositorySummary, ResultPage, SortBy};
pub use pagination::Pagination;
pub use readme::{ReadmeController, ReadmeError, ReadmeState};
pub use search::{ReadmeProvider, SearchProvider};
pub use search_controller::{ControllerSettings, SearchController};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
