//! Query state store.
//!
//! [`QueryParams`] is the effective query key: the tuple (page, pageSize,
//! search, sortBy, sortOrder, filters) that determines which data should be
//! displayed. A fresh value is produced on every transition; the table engine
//! only refetches when a transition actually changed the key, which is why
//! every mutator reports whether it did.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sort direction for a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// The parameters of one server-side page fetch.
///
/// Field names serialize camelCase (`pageSize`, `sortBy`, `sortOrder`) to
/// match the admin dashboard wire contract. `filters` uses a `BTreeMap` so
/// the key is deterministic for equality checks and query-string encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub page: u64,
    pub page_size: u64,
    #[serde(default)]
    pub search: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl QueryParams {
    /// Defaults: page 1, no search, no sort, no filters.
    pub fn new(page_size: u64) -> Self {
        QueryParams {
            page: 1,
            page_size: page_size.max(1),
            search: String::new(),
            sort_by: None,
            sort_order: None,
            filters: BTreeMap::new(),
        }
    }

    /// `ceil(total / page_size)`.
    pub fn total_pages(total: u64, page_size: u64) -> u64 {
        total.div_ceil(page_size.max(1))
    }

    /// Set the committed (debounced) search term. Resets to page 1.
    pub fn commit_search(&mut self, text: &str) -> bool {
        if self.search == text {
            return false;
        }
        self.search = text.to_string();
        self.page = 1;
        true
    }

    /// Set or clear one filter entry. Resets to page 1.
    ///
    /// Clearing is signalled by an empty string; the key stays present with
    /// that value, and downstream consumers treat `""` as "no constraint".
    pub fn set_filter(&mut self, key: &str, value: &str) -> bool {
        if self.filters.get(key).map(String::as_str) == Some(value) {
            return false;
        }
        self.filters.insert(key.to_string(), value.to_string());
        self.page = 1;
        true
    }

    /// Three-state sort cycle per column: none → asc → desc → none.
    ///
    /// Switching to a different column always restarts at asc, never
    /// inheriting the prior column's direction. Does not reset the page.
    pub fn cycle_sort(&mut self, key: &str) -> bool {
        match (&self.sort_by, self.sort_order) {
            (Some(active), Some(SortOrder::Asc)) if active == key => {
                self.sort_order = Some(SortOrder::Desc);
            }
            (Some(active), Some(SortOrder::Desc)) if active == key => {
                self.sort_by = None;
                self.sort_order = None;
            }
            _ => {
                self.sort_by = Some(key.to_string());
                self.sort_order = Some(SortOrder::Asc);
            }
        }
        true
    }

    /// Navigate to a page, clamped to `[1, max(total_pages, 1)]`.
    pub fn set_page(&mut self, page: u64, total: u64) -> bool {
        let last = Self::total_pages(total, self.page_size).max(1);
        let clamped = page.clamp(1, last);
        if self.page == clamped {
            return false;
        }
        self.page = clamped;
        true
    }

    /// Change the page size. Resets to page 1.
    pub fn set_page_size(&mut self, page_size: u64) -> bool {
        let page_size = page_size.max(1);
        if self.page_size == page_size {
            return false;
        }
        self.page_size = page_size;
        self.page = 1;
        true
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(QueryParams::total_pages(95, 10), 10);
        assert_eq!(QueryParams::total_pages(100, 10), 10);
        assert_eq!(QueryParams::total_pages(101, 10), 11);
        assert_eq!(QueryParams::total_pages(0, 10), 0);
        assert_eq!(QueryParams::total_pages(1, 1), 1);
    }

    #[test]
    fn test_set_page_clamps_to_valid_range() {
        let mut q = QueryParams::new(10);
        assert!(q.set_page(10, 95));
        assert_eq!(q.page, 10);
        assert!(!q.set_page(99, 95));
        assert_eq!(q.page, 10);
        assert!(q.set_page(0, 95));
        assert_eq!(q.page, 1);
    }

    #[test]
    fn test_set_page_stays_at_one_when_empty() {
        let mut q = QueryParams::new(10);
        assert!(!q.set_page(5, 0));
        assert_eq!(q.page, 1);
    }

    #[test]
    fn test_commit_search_resets_page() {
        let mut q = QueryParams::new(10);
        q.set_page(7, 100);
        assert!(q.commit_search("jane"));
        assert_eq!(q.page, 1);
        assert_eq!(q.search, "jane");
        // Same term again is not a key change.
        q.set_page(3, 100);
        assert!(!q.commit_search("jane"));
        assert_eq!(q.page, 3);
    }

    #[test]
    fn test_set_filter_resets_page_and_keeps_cleared_key() {
        let mut q = QueryParams::new(10);
        q.set_page(4, 100);
        assert!(q.set_filter("status", "active"));
        assert_eq!(q.page, 1);

        q.set_page(2, 100);
        assert!(q.set_filter("status", ""));
        assert_eq!(q.page, 1);
        // Cleared filter stays present as "no constraint".
        assert_eq!(q.filters.get("status").map(String::as_str), Some(""));

        // Re-clearing is a no-op.
        assert!(!q.set_filter("status", ""));
    }

    #[test]
    fn test_sort_cycles_none_asc_desc_none() {
        let mut q = QueryParams::new(10);
        q.cycle_sort("name");
        assert_eq!(q.sort_by.as_deref(), Some("name"));
        assert_eq!(q.sort_order, Some(SortOrder::Asc));
        q.cycle_sort("name");
        assert_eq!(q.sort_order, Some(SortOrder::Desc));
        q.cycle_sort("name");
        assert_eq!(q.sort_by, None);
        assert_eq!(q.sort_order, None);
    }

    #[test]
    fn test_sort_switching_columns_restarts_at_asc() {
        let mut q = QueryParams::new(10);
        q.cycle_sort("name");
        q.cycle_sort("name"); // name desc
        q.cycle_sort("code");
        assert_eq!(q.sort_by.as_deref(), Some("code"));
        assert_eq!(q.sort_order, Some(SortOrder::Asc));
    }

    #[test]
    fn test_sort_does_not_reset_page() {
        let mut q = QueryParams::new(10);
        q.set_page(5, 100);
        q.cycle_sort("name");
        assert_eq!(q.page, 5);
    }

    #[test]
    fn test_set_page_size_resets_page() {
        let mut q = QueryParams::new(10);
        q.set_page(5, 100);
        assert!(q.set_page_size(25));
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 25);
        assert!(!q.set_page_size(25));
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut q = QueryParams::new(10);
        q.commit_search("mug");
        q.cycle_sort("name");
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["sortBy"], "name");
        assert_eq!(json["sortOrder"], "asc");
        assert_eq!(json["search"], "mug");
    }
}
