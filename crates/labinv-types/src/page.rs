//! Offset pagination shared by the paged listings.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// A normalized page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Page 0 and a missing page both mean the first page. Size falls back
    /// to `default_size` and is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<u32>, size: Option<u32>, default_size: u32) -> Self {
        let page = page.unwrap_or(1).max(1);
        let size = size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE);
        Self { page, size }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.size as i64
    }

    pub fn limit(&self) -> i64 {
        self.size as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let size = request.size as i64;
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_normalization() {
        let req = PageRequest::new(Some(0), Some(5000), DEFAULT_PAGE_SIZE);
        assert_eq!(req.page, 1);
        assert_eq!(req.size, MAX_PAGE_SIZE);
        assert_eq!(req.offset(), 0);

        let req = PageRequest::new(Some(3), Some(10), DEFAULT_PAGE_SIZE);
        assert_eq!(req.offset(), 20);
        assert_eq!(req.limit(), 10);

        let req = PageRequest::new(None, Some(0), 10);
        assert_eq!(req.size, 1);
    }

    #[test]
    fn test_page_totals() {
        let req = PageRequest::new(Some(1), Some(10), 10);
        let page = Page::new(vec![1, 2, 3], req, 21);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], req, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
