//! Shared offset pagination helpers.
//!
//! Listing pages are 1-based with fixed per-list page sizes. A `PagedResult`
//! is assembled per request from a cached or freshly fetched sorted set and
//! never persisted.

use serde::Serialize;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Page numbers below 1 and zero page sizes are clamped rather than
    /// rejected; an out-of-range page is a valid request for an empty slice.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }
}

/// One page of a sorted collection plus the collection's total size.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page: request.page(),
            page_size: request.page_size(),
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.total_count == 0 {
            0
        } else {
            self.total_count.div_ceil(self.page_size as u64) as u32
        }
    }
}

impl<T: Clone> PagedResult<T> {
    /// Slice a fully sorted collection for the requested page. The last page
    /// may be short; a page past the end yields an empty slice, not an error.
    pub fn from_sorted(items: &[T], request: PageRequest) -> Self {
        Self {
            items: slice_page(items, request),
            total_count: items.len() as u64,
            page: request.page(),
            page_size: request.page_size(),
        }
    }
}

/// `items[(page-1)*size .. page*size]`, clamped to the collection bounds.
pub fn slice_page<T: Clone>(items: &[T], request: PageRequest) -> Vec<T> {
    let start = request.offset().min(items.len());
    let end = (start + request.page_size() as usize).min(items.len());
    items[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_page_is_exact_window() {
        let items: Vec<u32> = (0..50).collect();
        let page = slice_page(&items, PageRequest::new(2, 10));
        assert_eq!(page, (10..20).collect::<Vec<u32>>());
    }

    #[test]
    fn last_page_may_be_short() {
        let items: Vec<u32> = (0..37).collect();
        let page = slice_page(&items, PageRequest::new(2, 24));
        assert_eq!(page.len(), 13);
        assert_eq!(page.first(), Some(&24));
        assert_eq!(page.last(), Some(&36));
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() {
        let items: Vec<u32> = (0..5).collect();
        assert!(slice_page(&items, PageRequest::new(3, 10)).is_empty());
    }

    #[test]
    fn page_zero_is_clamped_to_first() {
        let items: Vec<u32> = (0..5).collect();
        assert_eq!(slice_page(&items, PageRequest::new(0, 3)), vec![0, 1, 2]);
    }

    #[test]
    fn from_sorted_reports_total_and_pages() {
        let items: Vec<u32> = (0..37).collect();
        let result = PagedResult::from_sorted(&items, PageRequest::new(1, 24));
        assert_eq!(result.total_count, 37);
        assert_eq!(result.items.len(), 24);
        assert_eq!(result.total_pages(), 2);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let result = PagedResult::<u32>::empty(PageRequest::new(1, 12));
        assert_eq!(result.total_pages(), 0);
    }
}
