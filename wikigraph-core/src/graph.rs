//! Link graph construction.
//!
//! Building happens in two passes over the corpus:
//! 1. Resolve every document's title. These titles are the node set.
//! 2. Read every document, extract link destinations, resolve them to
//!    titles and keep the ones that point at a known node.
//!
//! Node discovery must finish before any edge is validated, because any
//! title is a potential target for any other document.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::corpus::Corpus;
use crate::error::{CoreError, Result};
use crate::links::{LinkExtractor, MarkdownLinkExtractor};
use crate::title;

/// A page in the link graph, keyed by title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageNode {
    pub title: String,
}

impl PageNode {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// A directed "source links to target" relationship between two pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkEdge {
    pub source: String,
    pub target: String,
}

impl LinkEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A link whose target is not a page in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DanglingReference {
    pub source: String,
    pub target: String,
}

/// One link found in a document, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCandidate<'a> {
    /// Destination exactly as written in the document.
    pub destination: &'a str,
    /// Title the destination resolves to.
    pub target: String,
}

/// Validated link graph for a whole corpus.
///
/// Nodes keep corpus order, edges keep first-occurrence order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkGraph {
    pub nodes: Vec<PageNode>,
    pub edges: Vec<LinkEdge>,
    pub dangling: Vec<DanglingReference>,
    /// Number of documents read.
    pub files_processed: usize,
    /// Links dropped because they point at their own page.
    pub self_links: usize,
    /// Links dropped because the same pair was already present.
    pub duplicate_links: usize,
}

impl LinkGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Builds a [`LinkGraph`] from a [`Corpus`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder<E = MarkdownLinkExtractor> {
    extractor: E,
}

impl GraphBuilder {
    /// Create a builder using the inline Markdown link extractor.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: LinkExtractor> GraphBuilder<E> {
    /// Create a builder with a custom link extractor.
    pub fn with_extractor(extractor: E) -> Self {
        Self { extractor }
    }

    /// Links found in one document's text, resolved to titles, in order.
    pub fn candidates<'a>(&'a self, text: &'a str) -> impl Iterator<Item = LinkCandidate<'a>> + 'a {
        self.extractor
            .destinations(text)
            .map(|destination| LinkCandidate {
                destination,
                target: title::resolve(destination),
            })
    }

    /// Build the validated link graph for every document in `corpus`.
    ///
    /// Fails if two documents share a title or if any document cannot be
    /// read; no partial graph is returned.
    pub fn build<C: Corpus + ?Sized>(&self, corpus: &C) -> Result<LinkGraph> {
        let start = Instant::now();
        let documents = corpus.documents();

        // Pass 1: node discovery
        let mut owners: HashMap<String, &PathBuf> = HashMap::with_capacity(documents.len());
        let mut nodes = Vec::with_capacity(documents.len());
        for path in documents {
            let title = title::resolve_path(path);
            match owners.entry(title) {
                Entry::Occupied(existing) => {
                    return Err(CoreError::DuplicateTitle {
                        title: existing.key().clone(),
                        first: existing.get().to_path_buf(),
                        second: path.clone(),
                    });
                }
                Entry::Vacant(slot) => {
                    nodes.push(PageNode::new(slot.key().clone()));
                    slot.insert(path);
                }
            }
        }
        debug!("Discovered {} pages", nodes.len());

        // Pass 2: read and extract in parallel, reassembled in corpus order
        let targets: Vec<Vec<String>> = documents
            .par_iter()
            .map(|path| -> Result<Vec<String>> {
                let text = corpus.read(path)?;
                Ok(self.candidates(&text).map(|c| c.target).collect())
            })
            .collect::<Result<_>>()?;

        let mut edges = Vec::new();
        let mut dangling = Vec::new();
        let mut self_links = 0;
        let mut duplicate_links = 0;

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for (node, doc_targets) in nodes.iter().zip(&targets) {
            let source = node.title.as_str();
            for target in doc_targets {
                if !owners.contains_key(target) {
                    debug!("Dangling reference: {} -> {}", source, target);
                    dangling.push(DanglingReference {
                        source: source.to_string(),
                        target: target.clone(),
                    });
                    continue;
                }
                if target == source {
                    self_links += 1;
                    continue;
                }
                if seen.insert((source, target.as_str())) {
                    edges.push(LinkEdge::new(source, target.as_str()));
                } else {
                    duplicate_links += 1;
                }
            }
        }
        drop(seen);

        if !dangling.is_empty() {
            warn!(
                "Discarded {} dangling references (targets not in corpus)",
                dangling.len()
            );
        }
        info!(
            "Built link graph: {} pages, {} links ({} self-links, {} duplicates dropped) in {:?}",
            nodes.len(),
            edges.len(),
            self_links,
            duplicate_links,
            start.elapsed()
        );

        Ok(LinkGraph {
            files_processed: documents.len(),
            nodes,
            edges,
            dangling,
            self_links,
            duplicate_links,
        })
    }
}
