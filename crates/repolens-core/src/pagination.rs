//! Page arithmetic for the search results view.
//!
//! GitHub only serves the first 1000 hits of any search, so the page count
//! is computed from `min(total_count, result_cap)`.

pub const DEFAULT_PER_PAGE: u32 = 30;
pub const DEFAULT_RESULT_CAP: u64 = 1000;
/// Largest `per_page` the search endpoint honours
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub per_page: u32,
    pub result_cap: u64,
}

impl Pagination {
    pub fn new(per_page: u32, result_cap: u64) -> Self {
        Self {
            per_page: per_page.max(1),
            result_cap,
        }
    }

    /// `ceil(min(total_count, result_cap) / per_page)`
    pub fn total_pages(&self, total_count: u64) -> u32 {
        let reachable = total_count.min(self.result_cap);
        let pages = reachable.div_ceil(u64::from(self.per_page));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn can_go_forward(&self, page: u32, total_count: u64) -> bool {
        page < self.total_pages(total_count)
    }

    pub fn can_go_back(&self, page: u32) -> bool {
        page > 1
    }

    /// "Page 3 of 34 • 1,234 total results"
    pub fn summary(&self, page: u32, total_count: u64) -> String {
        let total_pages = self.total_pages(total_count).max(1);
        if total_count > 0 {
            format!(
                "Page {} of {} • {} total results",
                page,
                total_pages,
                group_thousands(total_count)
            )
        } else {
            format!("Page {} of {}", page, total_pages)
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE, DEFAULT_RESULT_CAP)
    }
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
