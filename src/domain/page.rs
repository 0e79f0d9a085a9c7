//! Offset pagination shared by the stores.

/// Upper bound on `per_page`.
pub const MAX_PER_PAGE: u32 = 100;

/// A validated page request (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u32,
    /// Items per page, between 1 and [`MAX_PER_PAGE`].
    pub per_page: u32,
}

impl PageRequest {
    /// Builds a request, clamping out-of-range values.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// Row limit.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.per_page as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// One page of results plus the total count matching the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Number of rows matching the filter, independent of paging.
    pub total: u64,
}

impl<T> Page<T> {
    /// Maps every item, keeping the total.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }

    /// Total number of pages for the given request.
    #[must_use]
    pub const fn total_pages(&self, request: PageRequest) -> u64 {
        self.total.div_ceil(request.per_page as u64)
    }
}
