//! Filter option resolution.
//!
//! Select-type columns declare their choices either statically or through an
//! async loader (typically another collection endpoint). Loaders run exactly
//! once per table instance, no matter how often the filter panel is opened;
//! the resolved lists are cached by column key for the instance lifetime. A
//! failing loader degrades to an empty option list and is logged, never
//! surfaced as a table error.

use crate::column::{Column, FilterKind, FilterOption, SelectOptions};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

pub struct FilterOptionResolver {
    columns: Arc<Vec<Column>>,
    cache: OnceCell<HashMap<String, Vec<FilterOption>>>,
}

impl FilterOptionResolver {
    pub fn new(columns: Arc<Vec<Column>>) -> Self {
        FilterOptionResolver {
            columns,
            cache: OnceCell::new(),
        }
    }

    /// Resolved options for every select column, loading on first call.
    pub async fn all(&self) -> &HashMap<String, Vec<FilterOption>> {
        self.cache
            .get_or_init(|| async {
                let mut resolved = HashMap::new();
                for col in self.columns.iter() {
                    if col.is_actions() || !col.filterable {
                        continue;
                    }
                    let FilterKind::Select(options) = &col.filter else {
                        continue;
                    };
                    let list = match options {
                        SelectOptions::Static(list) => list.clone(),
                        SelectOptions::Loader(loader) => match loader().await {
                            Ok(list) => list,
                            Err(e) => {
                                warn!(column = %col.key, error = %e, "filter option loader failed");
                                Vec::new()
                            }
                        },
                    };
                    debug!(column = %col.key, options = list.len(), "filter options resolved");
                    resolved.insert(col.key.clone(), list);
                }
                resolved
            })
            .await
    }

    /// Options for one column; empty if the column has no select filter.
    pub async fn for_column(&self, key: &str) -> Vec<FilterOption> {
        self.all().await.get(key).cloned().unwrap_or_default()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
