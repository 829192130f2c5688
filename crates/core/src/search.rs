//! Listing filters and pagination helpers shared by the repositories and
//! the service layer.

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum number of rows per page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Resolved `LIMIT`/`OFFSET` for a 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    /// Pages below 1 are treated as page 1; page sizes are clamped to
    /// `1..=MAX_PAGE_SIZE`. The offset saturates, so an absurd page number
    /// lands past the last row instead of wrapping back to the first.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let limit = clamp_limit(page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let page = page.unwrap_or(1).max(1);
        let offset = clamp_offset(Some((page - 1).saturating_mul(limit)));
        Self { page, limit, offset }
    }

    /// Number of pages needed for `total` rows.
    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

/// Normalise a free-text keyword into an `ILIKE` pattern, or `None` if blank.
///
/// `%`, `_` and `\` in the input are escaped so they match literally.
pub fn like_pattern(keyword: Option<&str>) -> Option<String> {
    let trimmed = keyword?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut escaped = String::with_capacity(trimmed.len() + 2);
    escaped.push('%');
    for c in trimmed.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Some(escaped)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
