//! 1-indexed pagination with page clamping.

use serde::{Deserialize, Serialize};

use crate::types::UnitRecord;

/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A requested page. Out-of-range numbers are clamped by [`paginate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    /// 1-indexed; out-of-range values are clamped.
    pub page: usize,
    /// Zero is treated as 1.
    pub page_size: usize,
}

impl PageSpec {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Page 1 of `page_size`.
    pub fn first(page_size: usize) -> Self {
        Self::new(1, page_size)
    }

    fn effective_size(&self) -> usize {
        self.page_size.max(1)
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of a filtered, sorted sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub records: Vec<T>,
    /// The page actually served, after clamping.
    pub page: usize,
    pub page_size: usize,
    /// Items before slicing.
    pub total: usize,
    /// At least 1, even for an empty sequence.
    pub page_count: usize,
}

impl<T> Page<T> {
    pub fn is_first(&self) -> bool {
        self.page == 1
    }

    pub fn is_last(&self) -> bool {
        self.page == self.page_count
    }
}

pub type UnitPage = Page<UnitRecord>;

/// `max(1, ceil(total / page_size))`.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// `page` moved into `1..=page_count(total, page_size)`.
pub fn clamp_page(page: usize, total: usize, page_size: usize) -> usize {
    page.clamp(1, page_count(total, page_size))
}

/// Slice `items` to the requested page, clamping the page number first.
pub fn paginate<T: Clone>(items: &[T], spec: PageSpec) -> Page<T> {
    let page_size = spec.effective_size();
    let total = items.len();
    let page_count = page_count(total, page_size);
    let page = clamp_page(spec.page, total, page_size);
    let start = ((page - 1) * page_size).min(total);
    let end = (start + page_size).min(total);
    Page {
        records: items[start..end].to_vec(),
        page,
        page_size,
        total,
        page_count,
    }
}
