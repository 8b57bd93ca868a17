//! Page sources.
//!
//! A [`PageSource`] is the table engine's only view of the data: hand it a
//! [`QueryParams`], get back one page plus the total count under those
//! constraints. Transport is the source's business (HTTP, RPC, in-memory).
//!
//! [`MemoryPageSource`] covers endpoints that return the full list in one
//! shot: search, filter, sort, and paginate are applied locally, mirroring
//! what the admin dashboard screens do for small collections. It doubles as
//! the engine's primary test double.

use crate::column::{display_value, Column, FilterKind};
use crate::error::SourceError;
use crate::query::{QueryParams, SortOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::future::Future;

/// One page of server results.
///
/// `total` is the row count under the *current* filters/search, not the
/// unfiltered dataset size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub data: Vec<Value>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

/// A remote (or remote-shaped) collection the table can page through.
pub trait PageSource: Send + Sync {
    fn fetch(
        &self,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Page, SourceError>> + Send;
}

// ---------------------------------------------------------------------------
// In-memory source
// ---------------------------------------------------------------------------

/// Page source over a full in-memory list.
pub struct MemoryPageSource {
    rows: Vec<Value>,
    /// Fields joined into the free-text search haystack. Empty means every
    /// top-level field of each row.
    search_fields: Vec<String>,
    /// Fields whose filters are enumerated choices and therefore match by
    /// equality, not substring.
    select_fields: HashSet<String>,
}

impl MemoryPageSource {
    pub fn new(rows: Vec<Value>) -> Self {
        MemoryPageSource {
            rows,
            search_fields: Vec::new(),
            select_fields: HashSet::new(),
        }
    }

    /// Restrict free-text search to the named fields.
    pub fn with_search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Learn which fields carry select-kind filters from the same descriptor
    /// set handed to the table. Select filters match their enumerated value
    /// exactly (`active` must not match `inactive`); text filters keep
    /// substring matching.
    pub fn with_columns(mut self, columns: &[Column]) -> Self {
        self.select_fields = columns
            .iter()
            .filter(|c| !c.is_actions() && c.filterable)
            .filter(|c| matches!(c.filter, FilterKind::Select(_)))
            .map(|c| c.key.clone())
            .collect();
        self
    }

    fn matches_search(&self, row: &Value, needle: &str) -> bool {
        let haystack: String = match (self.search_fields.is_empty(), row.as_object()) {
            (false, _) => self
                .search_fields
                .iter()
                .map(|f| display_value(row.get(f).unwrap_or(&Value::Null)))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            (true, Some(obj)) => obj
                .values()
                .map(display_value)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            (true, None) => display_value(row),
        };
        haystack.to_lowercase().contains(needle)
    }

    fn matches_filters(&self, row: &Value, params: &QueryParams) -> bool {
        params.filters.iter().all(|(key, wanted)| {
            // Empty string means "no constraint" for that key.
            if wanted.is_empty() {
                return true;
            }
            let actual = display_value(row.get(key).unwrap_or(&Value::Null)).to_lowercase();
            let wanted = wanted.to_lowercase();
            if self.select_fields.contains(key) {
                actual == wanted
            } else {
                actual.contains(&wanted)
            }
        })
    }
}

impl PageSource for MemoryPageSource {
    async fn fetch(&self, params: &QueryParams) -> Result<Page, SourceError> {
        let needle = params.search.trim().to_lowercase();

        let mut rows: Vec<&Value> = self
            .rows
            .iter()
            .filter(|row| needle.is_empty() || self.matches_search(row, &needle))
            .filter(|row| self.matches_filters(row, params))
            .collect();

        if let Some(key) = &params.sort_by {
            let descending = params.sort_order == Some(SortOrder::Desc);
            rows.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(key).unwrap_or(&Value::Null),
                    b.get(key).unwrap_or(&Value::Null),
                );
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let total = rows.len() as u64;
        let start = (params.page.saturating_sub(1) * params.page_size) as usize;
        let data: Vec<Value> = rows
            .into_iter()
            .skip(start)
            .take(params.page_size as usize)
            .cloned()
            .collect();

        Ok(Page {
            data,
            total,
            page: params.page,
            page_size: params.page_size,
        })
    }
}

/// Mixed-type comparison used for client-side sorting: nulls sort toward the
/// front on ascending, numbers compare numerically, booleans as false < true,
/// everything else lexicographically on the display form.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => display_value(a).cmp(&display_value(b)),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
