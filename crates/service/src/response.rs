use ipledger_core::search::PageWindow;
use serde::Serialize;

/// One page of a listing with its pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, window: PageWindow) -> Self {
        Self {
            items,
            total,
            page: window.page,
            page_size: window.limit,
            total_pages: window.total_pages(total),
        }
    }
}
