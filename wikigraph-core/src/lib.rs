//! wikigraph core - link graph extraction for Markdown wiki exports.
//!
//! This crate turns a directory of Markdown pages into a validated graph of
//! internal cross-references, ready to be written to a graph store.
//!
//! # Pipeline
//!
//! - **Corpus**: discover documents ([`corpus::DirectoryCorpus`])
//! - **Links**: pull `[text](destination)` links out of each page ([`links`])
//! - **Titles**: map files and destinations onto page titles ([`title`])
//! - **Graph**: drop dangling links, self-links and duplicates ([`graph`])
//! - **Batches**: split nodes and edges into bounded write batches ([`batch`])
//!
//! [`convert`] turns an HTML wiki export into the Markdown pages this
//! pipeline reads.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use wikigraph_core::{DirectoryCorpus, GraphBuilder, ScanOptions};
//!
//! let corpus = DirectoryCorpus::scan(Path::new("wiki"), &ScanOptions::default())?;
//! let graph = GraphBuilder::new().build(&corpus)?;
//! println!("{} pages, {} links", graph.node_count(), graph.edge_count());
//! # Ok::<(), wikigraph_core::CoreError>(())
//! ```

pub mod batch;
pub mod convert;
pub mod corpus;
pub mod dangling;
pub mod error;
pub mod graph;
pub mod links;
pub mod title;

pub use batch::{plan, Batch, BatchPlan, Batches, DEFAULT_BATCH_SIZE};
pub use convert::{ConvertSummary, HtmlConverter};
pub use corpus::{Corpus, DirectoryCorpus, ScanOptions};
pub use dangling::DanglingLog;
pub use error::{CoreError, Result};
pub use graph::{DanglingReference, GraphBuilder, LinkCandidate, LinkEdge, LinkGraph, PageNode};
pub use links::{LinkExtractor, MarkdownLinkExtractor};
