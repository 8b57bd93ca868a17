//! Server-driven data table engine for The Small admin dashboards.
//!
//! Many unrelated list screens (categories, vendors, purchases, customers,
//! sales, stores, …) share one engine for paging, sorting, filtering,
//! debounced search, row selection, and bulk export against a remote
//! collection whose total size and contents are unknown to the client.
//!
//! A screen supplies a [`PageSource`] (how to fetch one page plus a total
//! count) and a set of [`Column`] descriptors (what to render and how to
//! filter/sort each field), then drives a [`DataTable`] and renders its
//! [`Snapshot`]s:
//!
//! ```no_run
//! use the_small_datatable::{Column, DataTable, HttpPageSource, TableConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let source = HttpPageSource::new("admin.thesmall.app", "/api/vendors")?;
//! let columns = vec![
//!     Column::new("name", "Name"),
//!     Column::new("code", "Code"),
//!     Column::new("created_at", "Created").date("%Y-%m-%d").filterable(false),
//!     Column::actions("Actions"),
//! ];
//! let table = DataTable::new(TableConfig::titled("Vendors"), columns, source);
//!
//! let mut updates = table.subscribe();
//! table.set_search_input("jane"); // commits after the quiet period
//! updates.changed().await?;
//! let snapshot = table.snapshot();
//! println!("{}", snapshot.range_label());
//! # Ok(())
//! # }
//! ```

mod column;
mod debounce;
mod error;
mod export;
mod filters;
mod http;
mod query;
mod selection;
mod source;
mod table;

pub use column::{
    display_value, CellKind, Column, ComputedCell, FilterKind, FilterOption, OptionLoader,
    SelectOptions, ACTIONS_KEY,
};
pub use debounce::Debouncer;
pub use error::{ExportError, SourceError};
pub use export::{export_filename, CsvExport, TableExport};
pub use filters::FilterOptionResolver;
pub use http::{normalize_base_url, HttpPageSource};
pub use query::{QueryParams, SortOrder};
pub use selection::{default_row_key, RowKeyFn, SelectionManager};
pub use source::{MemoryPageSource, Page, PageSource};
pub use table::{DataTable, Snapshot, TableConfig};
