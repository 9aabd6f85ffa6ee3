//! Error types for wikigraph-store.

use thiserror::Error;
use wikigraph_core::CoreError;

use crate::store::BatchKind;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while talking to a graph store.
///
/// All of them are fatal to a run. Batches committed before the failure
/// stay committed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or opened.
    #[error("Cannot connect to {backend} store: {message}")]
    Connectivity {
        /// Backend name (`neo4j`, `duckdb`).
        backend: &'static str,
        /// Description of the connection failure.
        message: String,
    },

    /// A batch write transaction failed; later batches were not attempted.
    #[error("{kind} batch {batch} failed: {source}")]
    Transaction {
        kind: BatchKind,
        /// Zero-based index of the failing batch within its phase.
        batch: usize,
        #[source]
        source: Box<StoreError>,
    },

    /// A non-batch statement (schema, stats, clear) failed.
    #[error("Store query failed: {0}")]
    Query(String),

    /// The run was cancelled before all batches were submitted.
    #[error("Write cancelled after {committed} committed batches")]
    Cancelled {
        /// Batches that had been committed when cancellation was observed.
        committed: usize,
    },

    /// Invalid writer setup (e.g. a zero batch size).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    /// True when the failure, or the batch failure it wraps, is a lost connection.
    pub fn is_connectivity(&self) -> bool {
        match self {
            StoreError::Connectivity { .. } => true,
            StoreError::Transaction { source, .. } => source.is_connectivity(),
            _ => false,
        }
    }

    pub(crate) fn query(err: impl std::fmt::Display) -> Self {
        StoreError::Query(err.to_string())
    }
}
