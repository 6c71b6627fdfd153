//! Pagination for member listings

use serde::{Deserialize, Serialize};

/// Maximum items per page
const MAX_PER_PAGE: u32 = 200;

/// Default items per page; a typical group fits on one page
const DEFAULT_PER_PAGE: u32 = 50;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page (max 200)
    pub per_page: u32,
}

impl Pagination {
    /// Create pagination with validation.
    ///
    /// - Page is clamped to minimum of 1
    /// - Per page is clamped to 1..=200
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Calculate SQL OFFSET value.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// Get LIMIT value.
    pub fn limit(&self) -> u32 {
        self.per_page
    }

    /// Cut one page out of an already ordered, complete list.
    pub fn slice<T>(&self, items: Vec<T>) -> Paginated<T> {
        let total = items.len() as i64;
        let items = items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.per_page as usize)
            .collect();
        Paginated::new(items, total, *self)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items for current page
    pub items: Vec<T>,
    /// Total count across all pages
    pub total: i64,
    /// Current page number
    pub page: u32,
    /// Items per page
    pub per_page: u32,
    /// Always at least 1, even for an empty listing
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let total_pages = if total <= 0 {
            1
        } else {
            (total as u64).div_ceil(pagination.per_page as u64).max(1) as u32
        };
        Self {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

/// Query parameters for pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        Self::new(
            params.page.unwrap_or(1),
            params.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_calculation() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(2, 10).offset(), 10);
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn clamps_page_and_size() {
        assert_eq!(Pagination::new(0, 10).page, 1);
        assert_eq!(Pagination::new(1, 0).per_page, 1);
        assert_eq!(Pagination::new(1, 999).per_page, 200);
    }

    #[test]
    fn slice_takes_one_page() {
        let page = Pagination::new(2, 3).slice((1..=8).collect::<Vec<_>>());
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 8);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let page = Pagination::default().slice(Vec::<u8>::new());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }
}
