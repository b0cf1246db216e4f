//! Paging of the session list

use serde::Serialize;

/// Sessions per page
pub const PAGE_SIZE: i64 = 50;

/// Where one page of the session list sits within the filtered result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionPage {
    /// Matching sessions across all pages
    pub total: i64,
    /// 1-based page actually served
    pub page: i64,
    /// 0 when nothing matches
    pub total_pages: i64,
    pub page_size: i64,
    pub has_previous: bool,
    pub has_next: bool,
    #[serde(skip)]
    pub offset: i64,
}

impl SessionPage {
    /// Page for `requested`, moved onto the nearest page that exists
    ///
    /// # Examples
    /// ```
    /// use mira_review::pagination::SessionPage;
    ///
    /// // 120 sessions: 50 + 50 + 20
    /// let p = SessionPage::locate(120, 2);
    /// assert_eq!((p.page, p.total_pages, p.offset), (2, 3, 50));
    ///
    /// let p = SessionPage::locate(120, 99);
    /// assert_eq!((p.page, p.offset), (3, 100));
    /// assert!(!p.has_next);
    /// ```
    pub fn locate(total: i64, requested: i64) -> Self {
        let total = total.max(0);
        let total_pages = if total == 0 { 0 } else { (total - 1) / PAGE_SIZE + 1 };
        let last = total_pages.max(1);
        let page = requested.clamp(1, last);

        Self {
            total,
            page,
            total_pages,
            page_size: PAGE_SIZE,
            has_previous: page > 1,
            has_next: page < total_pages,
            offset: (page - 1) * PAGE_SIZE,
        }
    }
}
