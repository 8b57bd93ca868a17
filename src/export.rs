//! Bulk export.
//!
//! Export re-fetches the entire filtered/sorted result set in one page
//! (`page = 1`, `pageSize = total`) rather than reusing the rows on screen,
//! so the output always reflects the current committed search/sort/filters.
//! Raw field values are exported, not rendered cells; the `"actions"` pseudo
//! column is skipped. Errors propagate to the caller: export is a direct
//! user action with no fallback state.

use crate::column::{display_value, Column};
use crate::error::ExportError;
use crate::query::QueryParams;
use crate::source::PageSource;
use serde_json::Value;
use tracing::info;

/// Finished CSV export: bytes plus a suggested download filename.
pub struct CsvExport {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Finished tabular export (PDF/print pipelines): a header of column labels
/// and one stringified row per record.
pub struct TableExport {
    pub filename: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Derive a download filename from the table title: non-alphanumeric runs
/// collapse to a single underscore.
pub fn export_filename(title: &str, extension: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    let mut last_was_sep = false;
    for c in title.trim().chars() {
        if c.is_alphanumeric() {
            stem.push(c);
            last_was_sep = false;
        } else if !last_was_sep && !stem.is_empty() {
            stem.push('_');
            last_was_sep = true;
        }
    }
    while stem.ends_with('_') {
        stem.pop();
    }
    if stem.is_empty() {
        stem.push_str("export");
    }
    format!("{stem}.{extension}")
}

/// The current query widened to the whole result set.
fn export_params(query: &QueryParams, total: u64) -> QueryParams {
    let mut params = query.clone();
    params.page = 1;
    params.page_size = total.max(1);
    params
}

/// Fetch every row under the current constraints. Skips the fetch entirely
/// when the collection is empty (`pageSize` must stay positive).
async fn fetch_all<S: PageSource>(
    source: &S,
    query: &QueryParams,
    total: u64,
) -> Result<Vec<Value>, ExportError> {
    if total == 0 {
        return Ok(Vec::new());
    }
    let page = source.fetch(&export_params(query, total)).await?;
    Ok(page.data)
}

pub(crate) async fn export_csv<S: PageSource>(
    source: &S,
    columns: &[Column],
    query: &QueryParams,
    total: u64,
    title: &str,
) -> Result<CsvExport, ExportError> {
    let rows = fetch_all(source, query, total).await?;
    let keys: Vec<&str> = columns
        .iter()
        .filter(|c| !c.is_actions())
        .map(|c| c.key.as_str())
        .collect();

    let mut content = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut content);
        writer.write_record(&keys)?;
        for row in &rows {
            let record: Vec<String> = keys
                .iter()
                .map(|key| display_value(row.get(*key).unwrap_or(&Value::Null)))
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }

    info!(title = %title, rows = rows.len(), "CSV export complete");
    Ok(CsvExport {
        filename: export_filename(title, "csv"),
        content,
    })
}

pub(crate) async fn export_table<S: PageSource>(
    source: &S,
    columns: &[Column],
    query: &QueryParams,
    total: u64,
    title: &str,
) -> Result<TableExport, ExportError> {
    let data = fetch_all(source, query, total).await?;
    let exported: Vec<&Column> = columns.iter().filter(|c| !c.is_actions()).collect();

    let header: Vec<String> = exported.iter().map(|c| c.label.clone()).collect();
    let rows: Vec<Vec<String>> = data
        .iter()
        .map(|row| {
            exported
                .iter()
                .map(|c| display_value(row.get(&c.key).unwrap_or(&Value::Null)))
                .collect()
        })
        .collect();

    info!(title = %title, rows = rows.len(), "tabular export complete");
    Ok(TableExport {
        filename: export_filename(title, "pdf"),
        header,
        rows,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
