//! Page-number pagination shared by list queries.
//!
//! # Invariants
//! - `page_size` defaults to 20 and is clamped to `1..=100`.
//! - An empty result still has one (empty) page.
//! - Requested pages outside `1..=num_pages` clamp to the nearest valid page.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Requested page; both fields are 1-based and optional on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    pub fn effective_page_size(&self) -> u32 {
        match self.page_size {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(size) => size.min(MAX_PAGE_SIZE),
        }
    }

    /// Resolves the page window for a result of `total` rows.
    pub fn window(&self, total: u64) -> PageWindow {
        let page_size = self.effective_page_size();
        let num_pages = total.div_ceil(u64::from(page_size)).max(1);
        let requested = u64::from(self.page.unwrap_or(1).max(1));
        let current_page = requested.min(num_pages);
        PageWindow {
            limit: page_size,
            offset: (current_page - 1) * u64::from(page_size),
            current_page,
            num_pages,
        }
    }
}

/// SQL window resolved from a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
    pub current_page: u64,
    pub num_pages: u64,
}

/// Pagination envelope returned by list use-cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    pub count: u64,
    pub num_pages: u64,
    pub current_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Paginated<T> {
    pub fn new(results: Vec<T>, count: u64, window: PageWindow) -> Self {
        Self {
            results,
            count,
            num_pages: window.num_pages,
            current_page: window.current_page,
            has_next: window.current_page < window.num_pages,
            has_previous: window.current_page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PageRequest, Paginated, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

    #[test]
    fn page_size_defaults_and_clamps() {
        assert_eq!(PageRequest::default().effective_page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageRequest::new(1, 0).effective_page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageRequest::new(1, 500).effective_page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn window_clamps_out_of_range_pages() {
        let window = PageRequest::new(9, 10).window(25);
        assert_eq!(window.num_pages, 3);
        assert_eq!(window.current_page, 3);
        assert_eq!(window.offset, 20);

        let first = PageRequest::new(0, 10).window(25);
        assert_eq!(first.current_page, 1);
        assert_eq!(first.offset, 0);
    }

    #[test]
    fn empty_result_has_single_page_without_neighbours() {
        let window = PageRequest::default().window(0);
        let page: Paginated<u8> = Paginated::new(Vec::new(), 0, window);
        assert_eq!(page.num_pages, 1);
        assert_eq!(page.current_page, 1);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn envelope_reports_neighbours() {
        let window = PageRequest::new(2, 10).window(25);
        let page = Paginated::new(vec![1, 2, 3], 25, window);
        assert!(page.has_next);
        assert!(page.has_previous);
        let json = serde_json::to_value(&page).unwrap();
        for key in ["results", "count", "num_pages", "current_page", "has_next", "has_previous"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }
}
