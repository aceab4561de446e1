//! Listing query model: pagination parameters and the page envelope.
//!
//! The visibility clause itself (admin sees all, others see assigned-or-created)
//! is applied by the store; see `taskdesk_infra::store::TaskFilter`.

use serde::Serialize;

use crate::{TaskPriority, TaskStatus};

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Parameters for a task listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTasksQuery {
    /// 1-indexed page number. Values below 1 are clamped to 1.
    pub page: u64,
    /// Rows per page. Values below 1 are clamped to 1.
    pub limit: u64,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl Default for ListTasksQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            status: None,
            priority: None,
        }
    }
}

impl ListTasksQuery {
    /// Clamp out-of-range parameters instead of rejecting them.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.max(1),
            ..self
        }
    }

    /// Offset of the first row on this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

/// One page of results plus the derived pagination fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage<T> {
    pub data: Vec<T>,
    /// Count of ALL rows matching the visibility + filter clauses, not just
    /// this page.
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> TaskPage<T> {
    pub fn new(data: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            data,
            total,
            page,
            limit,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> TaskPage<U> {
        TaskPage {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_page_one_limit_ten() {
        let q = ListTasksQuery::default();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn page_and_limit_are_clamped_to_one() {
        let q = ListTasksQuery {
            page: 0,
            limit: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 1);
    }

    #[test]
    fn offset_is_page_minus_one_times_limit() {
        let q = ListTasksQuery {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn twenty_three_rows_at_ten_per_page_is_three_pages() {
        let page = TaskPage::new(vec![(); 10], 23, 1, 10);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(!page.has_prev_page);

        let last = TaskPage::new(vec![(); 3], 23, 3, 10);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);

        // Past-the-end pages are empty, not an error.
        let past = TaskPage::new(Vec::<()>::new(), 23, 4, 10);
        assert_eq!(past.data.len(), 0);
        assert_eq!(past.total, 23);
        assert!(!past.has_next_page);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page = TaskPage::new(Vec::<()>::new(), 0, 1, 10);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
        assert!(!page.has_prev_page);
    }

    #[test]
    fn exact_multiple_has_no_partial_page() {
        let page = TaskPage::new(vec![(); 10], 20, 2, 10);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next_page);
    }
}
