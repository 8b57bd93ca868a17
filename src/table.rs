//! The server-driven data table engine.
//!
//! One [`DataTable`] instance backs one list screen. It owns the query state,
//! the debounced search, the selection set, and the filter-option cache, and
//! it orchestrates page fetches against the configured [`PageSource`].
//!
//! Key design goals:
//! - **Single source of truth**: views read immutable [`Snapshot`] values
//!   published through a `tokio::sync::watch` channel
//! - **Race-safe fetching**: every fetch carries a sequence number; a
//!   response that is no longer the latest at resolution time is discarded,
//!   so a slow early response can never overwrite newer results
//! - **Stale-but-present on error**: a failed fetch clears the loading flag
//!   and records a passive error message, leaving the previous rows up

use crate::column::{Column, FilterOption};
use crate::debounce::Debouncer;
use crate::error::ExportError;
use crate::export::{self, CsvExport, TableExport};
use crate::filters::FilterOptionResolver;
use crate::query::{QueryParams, SortOrder};
use crate::selection::{default_row_key, RowKeyFn, SelectionManager};
use crate::source::PageSource;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default quiet period for the search debouncer (500 ms).
const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Per-instance configuration.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Human-readable title; also the stem of export filenames.
    pub title: String,
    pub page_size: u64,
    pub search_debounce: Duration,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            title: "Data Table".to_string(),
            page_size: 10,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

impl TableConfig {
    pub fn titled(title: impl Into<String>) -> Self {
        TableConfig {
            title: title.into(),
            ..TableConfig::default()
        }
    }
}

/// Immutable view of the table at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub rows: Arc<Vec<Value>>,
    /// Row count under the current filters/search, not the dataset size.
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub loading: bool,
    /// Message from the most recent failed fetch; cleared by a success.
    pub last_error: Option<String>,
    /// The committed (debounced) search term.
    pub search: String,
    pub sort: Option<(String, SortOrder)>,
}

impl Snapshot {
    pub fn total_pages(&self) -> u64 {
        QueryParams::total_pages(self.total, self.page_size)
    }

    /// Pagination footer text, e.g. "Showing 91 to 95 of 95 results".
    pub fn range_label(&self) -> String {
        let first = ((self.page - 1) * self.page_size + 1).min(self.total);
        let last = (self.page * self.page_size).min(self.total);
        format!("Showing {first} to {last} of {} results", self.total)
    }
}

/// Server-driven collection viewer engine.
pub struct DataTable<S> {
    config: TableConfig,
    columns: Arc<Vec<Column>>,
    source: S,
    query: Mutex<QueryParams>,
    /// Raw keystroke buffer, distinct from the committed search term.
    search_input: Mutex<String>,
    /// Monotonic fetch sequence; only the latest tag may publish results.
    seq: AtomicU64,
    snapshot_tx: watch::Sender<Snapshot>,
    selection: SelectionManager,
    options: FilterOptionResolver,
    debounce: Debouncer,
    cancel: CancellationToken,
    weak: Weak<Self>,
}

impl<S: PageSource + 'static> DataTable<S> {
    /// Create a table and kick off the initial page fetch. Must be called
    /// inside a tokio runtime. Rows are keyed by their `id` field; use
    /// [`DataTable::with_row_key`] for collections keyed differently.
    pub fn new(config: TableConfig, columns: Vec<Column>, source: S) -> Arc<Self> {
        Self::with_row_key(config, columns, source, Arc::new(default_row_key))
    }

    pub fn with_row_key(
        config: TableConfig,
        columns: Vec<Column>,
        source: S,
        key_fn: RowKeyFn,
    ) -> Arc<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.key.as_str()) {
                warn!(column = %col.key, "duplicate column key in descriptor set");
            }
        }

        let columns = Arc::new(columns);
        let (snapshot_tx, _) = watch::channel(Snapshot {
            rows: Arc::new(Vec::new()),
            total: 0,
            page: 1,
            page_size: config.page_size.max(1),
            loading: true,
            last_error: None,
            search: String::new(),
            sort: None,
        });

        let table = Arc::new_cyclic(|weak| DataTable {
            query: Mutex::new(QueryParams::new(config.page_size)),
            search_input: Mutex::new(String::new()),
            columns: Arc::clone(&columns),
            source,
            seq: AtomicU64::new(0),
            snapshot_tx,
            selection: SelectionManager::new(key_fn),
            options: FilterOptionResolver::new(columns),
            debounce: Debouncer::new(config.search_debounce),
            cancel: CancellationToken::new(),
            weak: weak.clone(),
            config,
        });

        info!(title = %table.config.title, "data table created");
        let initial = Arc::clone(&table);
        tokio::spawn(async move { initial.refresh().await });
        table
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Current state; cheap to clone (rows are behind an `Arc`).
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Watch for state changes; views re-render on every received update.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    // -----------------------------------------------------------------------
    // Query transitions
    // -----------------------------------------------------------------------

    /// Record a raw search edit. Does not change the committed search term;
    /// the debouncer commits the final buffer after the quiet period.
    pub fn set_search_input(&self, text: &str) {
        *self
            .search_input
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = text.to_string();

        let Some(table) = self.weak.upgrade() else {
            return;
        };
        let text = text.to_string();
        self.debounce
            .schedule(async move { table.commit_search(&text).await });
    }

    /// The raw keystroke buffer (what the search box currently shows).
    pub fn search_input(&self) -> String {
        self.search_input
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Commit a search term immediately, bypassing the debouncer.
    pub async fn commit_search(&self, text: &str) {
        let changed = self
            .query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .commit_search(text);
        if changed {
            self.refresh().await;
        }
    }

    /// Set or clear one filter. Ignored for unknown, non-filterable, or
    /// action columns.
    pub async fn set_filter(&self, key: &str, value: &str) {
        let Some(col) = self.columns.iter().find(|c| c.key == key) else {
            warn!(column = %key, "filter for unknown column ignored");
            return;
        };
        if col.is_actions() || !col.filterable {
            warn!(column = %key, "filter for non-filterable column ignored");
            return;
        }
        let changed = self
            .query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set_filter(key, value);
        if changed {
            self.refresh().await;
        }
    }

    /// Advance the sort cycle for a column (none → asc → desc → none).
    /// Ignored for unknown, non-sortable, or action columns.
    pub async fn cycle_sort(&self, key: &str) {
        let Some(col) = self.columns.iter().find(|c| c.key == key) else {
            warn!(column = %key, "sort for unknown column ignored");
            return;
        };
        if col.is_actions() || !col.sortable {
            warn!(column = %key, "sort for non-sortable column ignored");
            return;
        }
        let changed = self
            .query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cycle_sort(key);
        if changed {
            self.refresh().await;
        }
    }

    /// Navigate to a page, clamped against the last known total.
    pub async fn set_page(&self, page: u64) {
        let total = self.snapshot_tx.borrow().total;
        let changed = self
            .query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set_page(page, total);
        if changed {
            self.refresh().await;
        }
    }

    pub async fn set_page_size(&self, page_size: u64) {
        let changed = self
            .query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set_page_size(page_size);
        if changed {
            self.refresh().await;
        }
    }

    // -----------------------------------------------------------------------
    // Fetch orchestration
    // -----------------------------------------------------------------------

    /// Fetch the page for the current query state and publish the result.
    ///
    /// Concurrent calls are safe: each fetch is tagged with a sequence
    /// number, and a response whose tag is no longer the latest when it
    /// resolves is dropped without touching the snapshot.
    pub async fn refresh(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let params = self
            .query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        self.snapshot_tx.send_modify(|s| s.loading = true);
        debug!(seq, page = params.page, search = %params.search, "fetching page");

        let result = self.source.fetch(&params).await;

        if self.cancel.is_cancelled() || self.seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "stale response discarded");
            return;
        }

        match result {
            Ok(page) => {
                self.snapshot_tx.send_modify(|s| {
                    s.rows = Arc::new(page.data);
                    s.total = page.total;
                    s.page = params.page;
                    s.page_size = params.page_size;
                    s.search = params.search.clone();
                    s.sort = params.sort_by.clone().zip(params.sort_order);
                    s.loading = false;
                    s.last_error = None;
                });
            }
            Err(e) => {
                warn!(seq, error = %e, "page fetch failed; keeping previous rows");
                self.snapshot_tx.send_modify(|s| {
                    s.loading = false;
                    s.last_error = Some(e.to_string());
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Filter options
    // -----------------------------------------------------------------------

    /// Select-filter choices for one column. Loaders run on first call only.
    pub async fn filter_options(&self, key: &str) -> Vec<FilterOption> {
        self.options.for_column(key).await
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Toggle one row; returns whether it is selected afterwards.
    pub fn toggle_row(&self, row: &Value) -> bool {
        self.selection.toggle(row)
    }

    /// Select-all over the current page; a second call with the page fully
    /// selected clears the selection. Returns the selection count.
    pub fn select_all(&self) -> usize {
        let rows = self.snapshot_tx.borrow().rows.clone();
        self.selection.select_all(&rows)
    }

    pub fn is_selected(&self, row: &Value) -> bool {
        self.selection.is_selected(row)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Selected rows as captured at selection time, for bulk actions.
    pub fn selected_rows(&self) -> Vec<Value> {
        self.selection.rows()
    }

    pub fn clear_selection(&self) {
        self.selection.clear()
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Export the entire filtered/sorted result set as CSV.
    pub async fn export_csv(&self) -> Result<CsvExport, ExportError> {
        let (query, total) = self.export_scope();
        export::export_csv(&self.source, &self.columns, &query, total, &self.config.title).await
    }

    /// Export the entire filtered/sorted result set as a tabular document.
    pub async fn export_table(&self) -> Result<TableExport, ExportError> {
        let (query, total) = self.export_scope();
        export::export_table(&self.source, &self.columns, &query, total, &self.config.title).await
    }

    fn export_scope(&self) -> (QueryParams, u64) {
        let query = self
            .query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let total = self.snapshot_tx.borrow().total;
        (query, total)
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Tear the table down: cancels any pending debounce timer and causes
    /// in-flight fetch responses to be discarded.
    pub fn close(&self) {
        self.cancel.cancel();
        self.debounce.shutdown();
        self.seq.fetch_add(1, Ordering::SeqCst);
        info!(title = %self.config.title, "data table closed");
    }
}

// ===========================================================================
// Tests
// ===========================================================================
