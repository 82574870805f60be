use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Repository summary - what a result card shows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: u64,
    pub name: String,
    /// "owner/repo"
    pub full_name: String,
    pub html_url: Option<String>,
    pub owner: Option<Owner>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    pub html_url: String,
}

/// Sort field understood by the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    Updated,
    Stars,
    Forks,
    HelpWantedIssues,
}

impl SortBy {
    pub const ALL: [SortBy; 4] = [
        SortBy::Updated,
        SortBy::Stars,
        SortBy::Forks,
        SortBy::HelpWantedIssues,
    ];

    /// Wire value for the `sort` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Updated => "updated",
            SortBy::Stars => "stars",
            SortBy::Forks => "forks",
            SortBy::HelpWantedIssues => "help-wanted-issues",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Updated => "Updated",
            SortBy::Stars => "Stars",
            SortBy::Forks => "Forks",
            SortBy::HelpWantedIssues => "Issues",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortBy::Updated => SortBy::Stars,
            SortBy::Stars => SortBy::Forks,
            SortBy::Forks => SortBy::HelpWantedIssues,
            SortBy::HelpWantedIssues => SortBy::Updated,
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortBy::ALL
            .into_iter()
            .find(|sort| sort.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown sort '{}', expected one of: updated, stars, forks, help-wanted-issues",
                    s
                )
            })
    }
}

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    Asc,
    #[default]
    Desc,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Asc => "asc",
            OrderBy::Desc => "desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderBy::Asc => "Ascending",
            OrderBy::Desc => "Descending",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            OrderBy::Asc => OrderBy::Desc,
            OrderBy::Desc => OrderBy::Asc,
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(OrderBy::Asc),
            "desc" => Ok(OrderBy::Desc),
            other => Err(format!("unknown order '{}', expected asc or desc", other)),
        }
    }
}

/// Everything the search form controls.
///
/// A new value is a new fetch cycle; the controller decides from the diff
/// against the previous value whether that means a debounced search, an
/// immediate page load, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub search_term: String,
    pub created_from: NaiveDate,
    pub created_to: NaiveDate,
    pub sort_by: SortBy,
    pub order_by: OrderBy,
    pub page: u32,
}

impl QueryParams {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            ..Self::default()
        }
    }

    /// `months` calendar months ago up to today (UTC)
    pub fn default_range(months: u32) -> (NaiveDate, NaiveDate) {
        let today = Utc::now().date_naive();
        let from = today.checked_sub_months(Months::new(months)).unwrap_or(today);
        (from, today)
    }

    pub fn trimmed_term(&self) -> &str {
        self.search_term.trim()
    }

    /// False for input that never reaches the network: a blank term or a
    /// range that ends before it starts.
    pub fn is_searchable(&self) -> bool {
        !self.trimmed_term().is_empty() && self.created_from <= self.created_to
    }

    /// Same search apart from the page number
    pub fn same_query(&self, other: &QueryParams) -> bool {
        self.trimmed_term() == other.trimmed_term()
            && self.created_from == other.created_from
            && self.created_to == other.created_to
            && self.sort_by == other.sort_by
            && self.order_by == other.order_by
    }

    /// The `q` parameter: term plus the created-date qualifier
    pub fn query_string(&self) -> String {
        format!(
            "{} created:{}..{}",
            self.trimmed_term(),
            self.created_from.format("%Y-%m-%d"),
            self.created_to.format("%Y-%m-%d")
        )
    }
}

impl Default for QueryParams {
    fn default() -> Self {
        let (created_from, created_to) = Self::default_range(1);
        Self {
            search_term: String::new(),
            created_from,
            created_to,
            sort_by: SortBy::default(),
            order_by: OrderBy::default(),
            page: 1,
        }
    }
}

/// One request against the search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub sort_by: SortBy,
    pub order_by: OrderBy,
    pub per_page: u32,
    pub page: u32,
}

impl SearchRequest {
    pub fn for_page(params: &QueryParams, page: u32, per_page: u32) -> Self {
        Self {
            query: params.query_string(),
            sort_by: params.sort_by,
            order_by: params.order_by,
            per_page,
            page: page.max(1),
        }
    }
}

/// A single page as returned by a provider
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<RepositorySummary>,
    pub total_count: u64,
}

/// What the search controller exposes to the view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultPage {
    pub repositories: Vec<RepositorySummary>,
    pub total_count: u64,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl ResultPage {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }
}
