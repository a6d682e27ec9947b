// src/pagination.rs

use crate::error::Result;
use crate::models::LogEntry;
use crate::store::LogStore;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Where the view currently is. Passed into and returned from every query
/// instead of living in shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

impl PaginationState {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Page to request for "previous". A no-op on page 1.
    pub fn prev(&self) -> usize {
        if self.has_prev() { self.page - 1 } else { self.page }
    }

    /// Page to request for "next". A no-op on the last page.
    pub fn next(&self) -> usize {
        if self.has_next() { self.page + 1 } else { self.page }
    }

    /// Page to request after a delete left `remaining` records in the store.
    /// Steps back one page when the current one is now empty.
    pub fn after_delete(&self, remaining: usize, page_size: usize) -> usize {
        let pages = total_pages(remaining, page_size);
        if self.page > 1 && self.page > pages {
            self.page - 1
        } else {
            self.page
        }
    }
}

/// One rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    pub entries: Vec<LogEntry>,
    pub state: PaginationState,
}

pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size)
}

/// Clamps a requested page into `[1, max(total_pages, 1)]`.
pub fn clamp_page(requested: usize, total_pages: usize) -> usize {
    requested.clamp(1, total_pages.max(1))
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: usize,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Paginator { page_size: page_size.max(1) }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetches the requested page, clamped against the store's current size.
    ///
    /// The count is re-read on every call. If the store shrank between the
    /// count and the ranged read, the page is clamped again and re-read so the
    /// result never points past the end.
    pub fn fetch_page(&self, store: &dyn LogStore, requested: usize) -> Result<Page> {
        let mut requested = requested;
        loop {
            let total = store.count()?;
            let pages = total_pages(total, self.page_size);
            let page = clamp_page(requested, pages);
            let offset = (page - 1) * self.page_size;
            let entries = store.range_by_time_desc(offset, self.page_size)?;

            if entries.is_empty() && page > 1 {
                requested = page - 1;
                continue;
            }

            return Ok(Page {
                entries,
                state: PaginationState { page, total_pages: pages, total },
            });
        }
    }
}
