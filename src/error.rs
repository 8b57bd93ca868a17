//! Error types for page sources and export.
//!
//! Fetch failures inside the table engine degrade to a passive
//! `Snapshot::last_error` message; export failures propagate as `Result`
//! because export is a direct user action with no fallback state.

use thiserror::Error;

/// Failure reported by a [`PageSource`](crate::source::PageSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure (connect, timeout, invalid URL). Carries a
    /// message already phrased for an operator.
    #[error("{0}")]
    Network(String),

    /// Non-success HTTP status from the data source.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    /// The source answered but the payload could not be decoded as a page.
    #[error("invalid response from data source: {0}")]
    InvalidResponse(String),

    /// Escape hatch for custom sources and option loaders.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure during a bulk export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export fetch failed: {0}")]
    Fetch(#[from] SourceError),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Io(#[from] std::io::Error),
}
