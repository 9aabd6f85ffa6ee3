//! Error types for wikigraph-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wikigraph-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while scanning a corpus or building its link graph.
///
/// Per-link anomalies (malformed syntax, dangling targets, self-loops) are
/// never errors; everything here aborts the run.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A document could not be read.
    #[error("Failed to read {path}: {source}")]
    FileAccess {
        /// Path of the unreadable document.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two distinct documents resolve to the same page title.
    #[error("Title collision: '{title}' is produced by both {first} and {second}")]
    DuplicateTitle {
        /// The shared title.
        title: String,
        /// Document that claimed the title first.
        first: PathBuf,
        /// Document that collided with it.
        second: PathBuf,
    },

    /// Batch size must be at least one.
    #[error("Invalid batch size: {0} (must be greater than zero)")]
    InvalidBatchSize(usize),

    /// The corpus root could not be scanned.
    #[error("Failed to scan {path}: {message}")]
    Scan {
        /// Root that was being scanned.
        path: PathBuf,
        /// Description of the scan failure.
        message: String,
    },

    /// The dangling-reference log could not be written.
    #[error("Failed to write dangling-reference log {path}: {source}")]
    LogWrite {
        /// Log file or directory being written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A converted page or its directory could not be written.
    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An exported HTML page lacks an element the conversion needs.
    #[error("No {element} element in {path}")]
    MissingElement {
        path: PathBuf,
        element: &'static str,
    },

    /// HTML to Markdown conversion failed.
    #[error("Failed to convert {path}: {message}")]
    Convert { path: PathBuf, message: String },

    /// The conversion output directory cannot be used.
    #[error("Cannot convert into {path}: {reason}")]
    InvalidDestination { path: PathBuf, reason: String },
}
