//! Column descriptors.
//!
//! Each list screen hands the table engine a set of [`Column`]s describing
//! what to render and how to filter/sort each field. Rendering is modeled as
//! a typed [`CellKind`] variant set rather than a raw function pointer, so
//! screens share the common kinds (text, badge, date) and only reach for
//! `Computed` when a cell genuinely derives from multiple fields.

use chrono::DateTime;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Reserved pseudo-key for the action column. Excluded from filtering,
/// sorting, and export bodies.
pub const ACTIONS_KEY: &str = "actions";

/// One choice in a select-type filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        FilterOption {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Async loader for select-filter choices, invoked once per table instance.
pub type OptionLoader =
    Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Vec<FilterOption>>> + Send + Sync>;

/// How a column can be filtered.
#[derive(Clone)]
pub enum FilterKind {
    /// Free-text substring filter.
    Text,
    /// Enumerated choices, either static or loaded asynchronously.
    Select(SelectOptions),
}

#[derive(Clone)]
pub enum SelectOptions {
    Static(Vec<FilterOption>),
    Loader(OptionLoader),
}

/// Computed cell: `(value, row) -> display text`.
pub type ComputedCell = Arc<dyn Fn(&Value, &Value) -> String + Send + Sync>;

/// How a cell is rendered for display.
#[derive(Clone)]
pub enum CellKind {
    /// Stringified field value.
    Text,
    /// Field value mapped through a value → label table; unmapped values
    /// pass through unchanged.
    Badge(HashMap<String, String>),
    /// RFC 3339 timestamp reformatted with a chrono format string. Values
    /// that do not parse pass through unchanged.
    Date(String),
    Computed(ComputedCell),
}

/// Descriptor for one table column.
///
/// `key` must be unique within a descriptor set but need not identify rows.
#[derive(Clone)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub filterable: bool,
    pub filter: FilterKind,
    pub cell: CellKind,
}

impl Column {
    /// A sortable, text-filterable text column (the common case).
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Column {
            key: key.into(),
            label: label.into(),
            sortable: true,
            filterable: true,
            filter: FilterKind::Text,
            cell: CellKind::Text,
        }
    }

    /// The reserved action column: never sorted, filtered, or exported.
    pub fn actions(label: impl Into<String>) -> Self {
        Column {
            key: ACTIONS_KEY.to_string(),
            label: label.into(),
            sortable: false,
            filterable: false,
            filter: FilterKind::Text,
            cell: CellKind::Text,
        }
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    /// Select filter with a static option list.
    pub fn select_filter(mut self, options: Vec<FilterOption>) -> Self {
        self.filter = FilterKind::Select(SelectOptions::Static(options));
        self
    }

    /// Select filter whose options are loaded asynchronously (e.g. from the
    /// categories endpoint). The loader runs once per table instance.
    pub fn loader_filter<F, Fut>(mut self, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<FilterOption>>> + Send + 'static,
    {
        self.filter = FilterKind::Select(SelectOptions::Loader(Arc::new(move || {
            loader().boxed()
        })));
        self
    }

    pub fn badge(mut self, labels: HashMap<String, String>) -> Self {
        self.cell = CellKind::Badge(labels);
        self
    }

    pub fn date(mut self, format: impl Into<String>) -> Self {
        self.cell = CellKind::Date(format.into());
        self
    }

    pub fn computed<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> String + Send + Sync + 'static,
    {
        self.cell = CellKind::Computed(Arc::new(f));
        self
    }

    pub fn is_actions(&self) -> bool {
        self.key == ACTIONS_KEY
    }

    /// Render this column's cell for one row.
    pub fn render_cell(&self, row: &Value) -> String {
        let value = row.get(&self.key).unwrap_or(&Value::Null);
        match &self.cell {
            CellKind::Text => display_value(value),
            CellKind::Badge(labels) => {
                let raw = display_value(value);
                labels.get(&raw).cloned().unwrap_or(raw)
            }
            CellKind::Date(format) => {
                let raw = display_value(value);
                match DateTime::parse_from_rfc3339(&raw) {
                    Ok(ts) => ts.format(format).to_string(),
                    Err(_) => raw,
                }
            }
            CellKind::Computed(f) => f(value, row),
        }
    }
}

/// Stringify a JSON value for display/export: null → empty string, strings
/// unquoted, everything else via its JSON form.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
