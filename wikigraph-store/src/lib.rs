//! wikigraph store - batched, idempotent writes of a link graph.
//!
//! A [`GraphStore`] backend hands out sessions, and [`GraphStoreWriter`]
//! drives one session per run: pages first, then links, one transaction per
//! batch. Two backends ship with the crate:
//!
//! - [`Neo4jStore`]: a Neo4j server over Bolt
//! - [`DuckDbStore`]: an embedded DuckDB file
//!
//! ```no_run
//! use std::path::Path;
//! use wikigraph_core::{DirectoryCorpus, GraphBuilder, ScanOptions, DEFAULT_BATCH_SIZE};
//! use wikigraph_store::{DuckDbStore, GraphStoreWriter};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let corpus = DirectoryCorpus::scan(Path::new("wiki"), &ScanOptions::default())?;
//! let graph = GraphBuilder::new().build(&corpus)?;
//!
//! let store = DuckDbStore::new(".wikigraph/graph.duckdb");
//! let summary = GraphStoreWriter::new(&store, DEFAULT_BATCH_SIZE)?
//!     .write(&graph)
//!     .await?;
//! println!("{} pages created", summary.pages_created);
//! # Ok(())
//! # }
//! ```

pub mod duckdb_store;
pub mod error;
pub mod neo4j;
pub mod store;
pub mod writer;

pub use duckdb_store::DuckDbStore;
pub use error::{Result, StoreError};
pub use neo4j::{Neo4jSettings, Neo4jStore};
pub use store::{BatchKind, GraphStore, StoreSession, StoreStats, WriteBatch};
pub use writer::{BatchReport, GraphStoreWriter, WriteSummary};
