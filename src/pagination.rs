// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! History table pagination.
//!
//! The enclave returns history by `(startPoint, endPoint)` index windows over
//! an account's transaction list. Page 1 is the newest window and ends at the
//! transaction count; older pages step back by the page size.

use serde::Serialize;
use utoipa::ToSchema;

/// Half-open index window `[start, end)` into an account's transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageWindow {
    pub start: u64,
    pub end: u64,
}

impl PageWindow {
    /// Newest window for an account with `txn_count` transactions.
    pub fn initial(txn_count: u64, page_size: u64) -> Self {
        if txn_count > page_size {
            Self {
                start: txn_count - page_size,
                end: txn_count,
            }
        } else {
            Self {
                start: 0,
                end: txn_count,
            }
        }
    }

    /// Number of rows the window covers.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cursor over history pages for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    txn_count: u64,
    page_size: u64,
    current_page: u64,
    window: PageWindow,
}

impl Paginator {
    pub fn new(txn_count: u64, page_size: u64) -> Self {
        let page_size = page_size.max(1);
        Self {
            txn_count,
            page_size,
            current_page: 1,
            window: PageWindow::initial(txn_count, page_size),
        }
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn txn_count(&self) -> u64 {
        self.txn_count
    }

    /// `ceil(txn_count / page_size)`, never less than 1 so an empty history
    /// still reads as "page 1 of 1".
    pub fn total_pages(&self) -> u64 {
        self.txn_count.div_ceil(self.page_size).max(1)
    }

    pub fn has_older(&self) -> bool {
        self.txn_count > self.current_page * self.page_size
    }

    pub fn has_newer(&self) -> bool {
        self.current_page > 1
    }

    /// Step to the next older page. Returns `false` when already on the oldest.
    pub fn older(&mut self) -> bool {
        if !self.has_older() {
            return false;
        }
        self.current_page += 1;
        self.window = PageWindow {
            start: self.window.start.saturating_sub(self.page_size),
            end: self.window.end.saturating_sub(self.page_size),
        };
        true
    }

    /// Step to the next newer page. Returns `false` when already on page 1.
    pub fn newer(&mut self) -> bool {
        if !self.has_newer() {
            return false;
        }
        self.current_page -= 1;
        let start = self.window.end;
        self.window = PageWindow {
            start,
            end: (start + self.page_size).min(self.txn_count),
        };
        true
    }

    /// Jump to a 1-based page, clamped to the available range.
    pub fn go_to(&mut self, page: u64) {
        let target = page.clamp(1, self.total_pages());
        *self = Self::new(self.txn_count, self.page_size);
        while self.current_page < target && self.older() {}
    }

    /// Footer text shown under a rendered page.
    pub fn footer(&self) -> String {
        format!("Viewing page {} of {}", self.current_page, self.total_pages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_window_for_small_history() {
        assert_eq!(PageWindow::initial(3, 5), PageWindow { start: 0, end: 3 });
        assert_eq!(PageWindow::initial(5, 5), PageWindow { start: 0, end: 5 });
        assert_eq!(PageWindow::initial(0, 5), PageWindow { start: 0, end: 0 });
    }

    #[test]
    fn initial_window_for_large_history() {
        assert_eq!(PageWindow::initial(12, 5), PageWindow { start: 7, end: 12 });
    }

    #[test]
    fn walks_older_then_back() {
        let mut pages = Paginator::new(12, 5);
        assert_eq!(pages.total_pages(), 3);
        assert_eq!(pages.footer(), "Viewing page 1 of 3");

        assert!(pages.older());
        assert_eq!(pages.window(), PageWindow { start: 2, end: 7 });
        assert!(pages.older());
        assert_eq!(pages.window(), PageWindow { start: 0, end: 2 });
        assert_eq!(pages.current_page(), 3);
        assert!(!pages.older());

        assert!(pages.newer());
        assert_eq!(pages.window(), PageWindow { start: 2, end: 7 });
        assert!(pages.newer());
        assert_eq!(pages.window(), PageWindow { start: 7, end: 12 });
        assert!(!pages.newer());
    }

    #[test]
    fn exact_multiple_of_page_size() {
        let mut pages = Paginator::new(10, 5);
        assert_eq!(pages.total_pages(), 2);
        assert!(pages.older());
        assert_eq!(pages.window(), PageWindow { start: 0, end: 5 });
        assert!(!pages.older());
    }

    #[test]
    fn empty_history_has_one_page() {
        let mut pages = Paginator::new(0, 5);
        assert_eq!(pages.total_pages(), 1);
        assert!(pages.window().is_empty());
        assert!(!pages.older());
        assert!(!pages.newer());
    }

    #[test]
    fn go_to_clamps() {
        let mut pages = Paginator::new(12, 5);
        pages.go_to(99);
        assert_eq!(pages.current_page(), 3);
        assert_eq!(pages.window(), PageWindow { start: 0, end: 2 });
        pages.go_to(0);
        assert_eq!(pages.current_page(), 1);
        assert_eq!(pages.window().len(), 5);
    }
}
