//! Offset pagination for audit and list queries.

use serde::{Deserialize, Serialize};

/// Page request, 1-indexed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, starting at 1. Zero is read as 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Requested page size, capped at [`PageRequest::MAX_PER_PAGE`].
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Largest page a caller can ask for.
    pub const MAX_PER_PAGE: u32 = 500;

    /// Creates a page request.
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    fn page_size(self) -> u32 {
        self.per_page.min(Self::MAX_PER_PAGE)
    }

    /// Rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size())
    }

    /// Rows to take.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size())
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Rows on this page.
    pub data: Vec<T>,
    /// Position and totals.
    pub meta: PageMeta,
}

/// Page position and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Page number served.
    pub page: u32,
    /// Effective page size.
    pub per_page: u32,
    /// Rows across all pages.
    pub total: u64,
    /// Number of pages, at least 1.
    pub total_pages: u32,
    /// Whether a later page exists.
    pub has_more: bool,
}

impl<T> PageResponse<T> {
    /// Wraps a fetched page.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        let per_page = request.page_size();
        let total_pages = if total == 0 || per_page == 0 {
            1
        } else {
            u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
        };
        let page = request.page.max(1);

        Self {
            data,
            meta: PageMeta {
                page,
                per_page,
                total,
                total_pages,
                has_more: page < total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_page_reads_as_first() {
        let request = PageRequest::new(0, 10);
        assert_eq!(request.offset(), 0);
        assert_eq!(PageResponse::<u8>::new(vec![], request, 0).meta.page, 1);
    }

    #[test]
    fn test_page_size_is_capped() {
        let request = PageRequest::new(3, 10_000);
        assert_eq!(request.limit(), u64::from(PageRequest::MAX_PER_PAGE));
        assert_eq!(request.offset(), 2 * u64::from(PageRequest::MAX_PER_PAGE));
    }

    #[test]
    fn test_meta_totals() {
        let meta = PageResponse::new(vec![1; 10], PageRequest::new(1, 10), 21).meta;
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_more);

        let meta = PageResponse::new(vec![1], PageRequest::new(3, 10), 21).meta;
        assert!(!meta.has_more);

        let meta = PageResponse::<u8>::new(vec![], PageRequest::default(), 0).meta;
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_more);
    }
}
