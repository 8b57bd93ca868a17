//! Key-based row selection.
//!
//! Rows are tracked by a stable identifier extracted from each row (the `id`
//! field by default, or a caller-supplied extractor), not by reference
//! equality against the current page. Selections therefore survive refetches:
//! paging, sorting, or filtering away and back keeps a row selected. The row
//! value is captured at selection time so bulk actions still receive usable
//! rows for entries no longer on screen, and `rows()`/`keys()` report entries
//! in the order they were selected.

use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Extracts the stable identifier for a row, if it has one.
pub type RowKeyFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Default extractor: the top-level `id` field, string or integer.
pub fn default_row_key(row: &Value) -> Option<String> {
    match row.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub struct SelectionManager {
    key_fn: RowKeyFn,
    // Selection order is preserved: rows()/keys() list entries in the order
    // the user selected them.
    selected: Mutex<Vec<(String, Value)>>,
}

impl SelectionManager {
    pub fn new(key_fn: RowKeyFn) -> Self {
        SelectionManager {
            key_fn,
            selected: Mutex::new(Vec::new()),
        }
    }

    pub fn key_of(&self, row: &Value) -> Option<String> {
        (self.key_fn)(row)
    }

    pub fn is_selected(&self, row: &Value) -> bool {
        match self.key_of(row) {
            Some(key) => self
                .selected
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .any(|(k, _)| *k == key),
            None => false,
        }
    }

    /// Toggle one row. Returns whether the row is selected afterwards.
    pub fn toggle(&self, row: &Value) -> bool {
        let Some(key) = self.key_of(row) else {
            warn!("row has no stable key; selection ignored");
            return false;
        };
        let mut selected = self.selected.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pos) = selected.iter().position(|(k, _)| *k == key) {
            selected.remove(pos);
            false
        } else {
            selected.push((key, row.clone()));
            true
        }
    }

    /// Select-all over the current page: if every page row is already
    /// selected, clear the whole set; otherwise the set becomes exactly the
    /// page rows. Returns the resulting selection count.
    pub fn select_all(&self, rows: &[Value]) -> usize {
        let keyed: Vec<(String, &Value)> = rows
            .iter()
            .filter_map(|row| self.key_of(row).map(|key| (key, row)))
            .collect();

        let mut selected = self.selected.lock().unwrap_or_else(|e| e.into_inner());
        let all_selected = !keyed.is_empty()
            && keyed
                .iter()
                .all(|(key, _)| selected.iter().any(|(k, _)| k == key));

        if all_selected {
            selected.clear();
        } else {
            *selected = keyed
                .into_iter()
                .map(|(key, row)| (key, row.clone()))
                .collect();
        }
        selected.len()
    }

    pub fn clear(&self) {
        self.selected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.selected.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The selected rows as captured at selection time, in selection order.
    pub fn rows(&self) -> Vec<Value> {
        self.selected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, row)| row.clone())
            .collect()
    }

    /// Selected row keys, in selection order.
    pub fn keys(&self) -> Vec<String> {
        self.selected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> SelectionManager {
        SelectionManager::new(Arc::new(default_row_key))
    }

    fn page(ids: &[i64]) -> Vec<Value> {
        ids.iter().map(|i| json!({ "id": i })).collect()
    }

    #[test]
    fn test_default_row_key_reads_string_or_number() {
        assert_eq!(default_row_key(&json!({ "id": 7 })), Some("7".to_string()));
        assert_eq!(
            default_row_key(&json!({ "id": "abc" })),
            Some("abc".to_string())
        );
        assert_eq!(default_row_key(&json!({ "name": "x" })), None);
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let sel = manager();
        let row = json!({ "id": 1 });
        assert!(sel.toggle(&row));
        assert!(sel.is_selected(&row));
        assert!(!sel.toggle(&row));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_select_all_matches_page_then_toggles_off() {
        let sel = manager();
        let rows = page(&[1, 2, 3]);
        assert_eq!(sel.select_all(&rows), rows.len());
        assert_eq!(sel.select_all(&rows), 0);
    }

    #[test]
    fn test_select_all_replaces_partial_selection_with_page() {
        let sel = manager();
        sel.toggle(&json!({ "id": 99 }));
        let rows = page(&[1, 2]);
        assert_eq!(sel.select_all(&rows), 2);
        assert_eq!(sel.keys(), vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_keys_and_rows_preserve_selection_order() {
        let sel = manager();
        sel.toggle(&json!({ "id": 2 }));
        sel.toggle(&json!({ "id": 10 }));
        sel.toggle(&json!({ "id": 1 }));
        assert_eq!(
            sel.keys(),
            vec!["2".to_string(), "10".to_string(), "1".to_string()]
        );
        assert_eq!(sel.rows()[1]["id"], 10);

        // Deselecting from the middle keeps the rest in order.
        sel.toggle(&json!({ "id": 10 }));
        assert_eq!(sel.keys(), vec!["2".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_selection_survives_page_replacement() {
        let sel = manager();
        sel.toggle(&json!({ "id": 5, "name": "Vendor 5" }));
        // The page turns over; the selection is still answerable by key and
        // the captured row is still available for bulk actions.
        let new_page = page(&[6, 7]);
        assert!(!new_page.iter().any(|r| sel.is_selected(r)));
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.rows()[0]["name"], "Vendor 5");
    }

    #[test]
    fn test_rows_without_keys_are_ignored() {
        let sel = manager();
        assert!(!sel.toggle(&json!({ "name": "no id" })));
        assert_eq!(sel.select_all(&[json!({ "name": "no id" })]), 0);
    }
}
