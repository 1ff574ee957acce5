//! Persistence seam
//!
//! Sinks receive extracted records and must upsert idempotently, keyed by
//! title: storing the same record twice leaves exactly one copy and is
//! never an error.

mod csv_sink;
mod memory;

pub use csv_sink::CsvSink;
pub use memory::MemorySink;

use crate::extract::PageRecord;
use thiserror::Error;

/// Errors that can occur while persisting records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Receives extracted records for storage
///
/// Implementations must be thread-safe; the engine stores from concurrent
/// workers.
pub trait Sink: Send + Sync {
    /// Stores a record unless one with the same title already exists.
    /// Returns `true` when the record was newly stored, `false` when a
    /// duplicate was skipped.
    fn store(&self, record: &PageRecord) -> SinkResult<bool>;
}
