//! Graph store client abstraction.
//!
//! A [`GraphStore`] hands out sessions; a [`StoreSession`] runs one write
//! transaction per batch. Each backend owns its query text. The only
//! requirements on it are list-parameterized batch writes, create-if-absent
//! semantics and page lookup by unique title.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use wikigraph_core::{LinkEdge, PageNode};

use crate::error::Result;

/// Which phase a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    Pages,
    Links,
}

impl BatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchKind::Pages => "page",
            BatchKind::Links => "link",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of one write transaction.
#[derive(Debug, Clone, Copy)]
pub enum WriteBatch<'a> {
    /// Upsert one `Page` per title.
    Pages(&'a [PageNode]),
    /// Merge one `LINKS_TO` relationship per pair, matching pages by title.
    Links(&'a [LinkEdge]),
}

impl WriteBatch<'_> {
    pub fn kind(&self) -> BatchKind {
        match self {
            WriteBatch::Pages(_) => BatchKind::Pages,
            WriteBatch::Links(_) => BatchKind::Links,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            WriteBatch::Pages(pages) => pages.len(),
            WriteBatch::Links(links) => links.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Page and link counts held by a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub pages: u64,
    pub links: u64,
}

/// A graph store that can open write sessions.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Short backend name for messages.
    fn backend(&self) -> &'static str;

    /// Where the store lives (URI or file path), safe to print.
    fn location(&self) -> String;

    /// Open a session. Failure here is a connectivity error.
    async fn open_session(&self) -> Result<Box<dyn StoreSession>>;

    /// Check that the store is reachable and answering queries.
    async fn verify(&self) -> Result<()> {
        let mut session = self.open_session().await?;
        let pinged = session.ping().await;
        let closed = session.close().await;
        pinged.and(closed)
    }
}

/// An open connection to a graph store.
///
/// Callers must call [`StoreSession::close`] on every exit path.
#[async_trait]
pub trait StoreSession: Send {
    /// Round-trip a trivial query.
    async fn ping(&mut self) -> Result<()>;

    /// Create constraints or tables needed for idempotent writes.
    async fn ensure_schema(&mut self) -> Result<()>;

    /// Run one batch in its own write transaction.
    ///
    /// Returns how many pages or links were actually created; entities that
    /// already existed are left untouched and not counted.
    async fn run_write_transaction(&mut self, batch: WriteBatch<'_>) -> Result<usize>;

    /// Current page and link counts.
    async fn stats(&mut self) -> Result<StoreStats>;

    /// Delete every page and link, returning what was removed.
    async fn clear(&mut self) -> Result<StoreStats>;

    /// Release the session.
    async fn close(self: Box<Self>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_kind_display() {
        assert_eq!(BatchKind::Pages.to_string(), "page");
        assert_eq!(BatchKind::Links.to_string(), "link");
    }

    #[test]
    fn test_write_batch_len_and_kind() {
        let pages = vec![PageNode::new("A"), PageNode::new("B")];
        let links = vec![LinkEdge::new("A", "B")];

        let batch = WriteBatch::Pages(&pages);
        assert_eq!(batch.kind(), BatchKind::Pages);
        assert_eq!(batch.len(), 2);

        let batch = WriteBatch::Links(&links);
        assert_eq!(batch.kind(), BatchKind::Links);
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
    }
}
