//! Batched write phase.
//!
//! One session per run: schema first, then every page batch, then every link
//! batch, each in its own transaction. The first failing batch ends the run;
//! batches committed before it stay committed.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wikigraph_core::{plan, BatchPlan, LinkGraph};

use crate::error::{Result, StoreError};
use crate::store::{BatchKind, GraphStore, StoreSession, WriteBatch};

/// Progress event emitted after each committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub kind: BatchKind,
    /// Zero-based index within the phase.
    pub index: usize,
    /// Number of batches in the phase.
    pub total: usize,
    /// Items in the batch.
    pub len: usize,
    /// Entities the batch actually created.
    pub created: usize,
}

/// What a completed write phase did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub pages_written: usize,
    pub links_written: usize,
    pub pages_created: usize,
    pub links_created: usize,
    pub page_batches: usize,
    pub link_batches: usize,
}

impl WriteSummary {
    pub fn batches(&self) -> usize {
        self.page_batches + self.link_batches
    }
}

#[derive(Debug, Default)]
struct PhaseOutcome {
    written: usize,
    created: usize,
    batches: usize,
}

type ProgressFn<'s> = Box<dyn Fn(&BatchReport) + Send + Sync + 's>;

/// Writes a [`LinkGraph`] to a [`GraphStore`] in fixed-size batches.
pub struct GraphStoreWriter<'s> {
    store: &'s dyn GraphStore,
    batch_size: usize,
    cancel: CancellationToken,
    progress: Option<ProgressFn<'s>>,
}

impl<'s> GraphStoreWriter<'s> {
    /// Create a writer; a zero `batch_size` is rejected here.
    pub fn new(store: &'s dyn GraphStore, batch_size: usize) -> Result<Self> {
        BatchPlan::new(0, batch_size)?;
        Ok(Self {
            store,
            batch_size,
            cancel: CancellationToken::new(),
            progress: None,
        })
    }

    /// Stop submitting batches once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Call `f` after every committed batch.
    pub fn on_batch(mut self, f: impl Fn(&BatchReport) + Send + Sync + 's) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Write all pages, then all links.
    pub async fn write(&self, graph: &LinkGraph) -> Result<WriteSummary> {
        info!(
            "Writing {} pages and {} links to {} store at {}",
            graph.node_count(),
            graph.edge_count(),
            self.store.backend(),
            self.store.location()
        );

        let mut session = self.store.open_session().await?;
        let outcome = self.write_phases(session.as_mut(), graph).await;
        let closed = session.close().await;

        match (outcome, closed) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!("Failed to close store session: {}", close_err);
                }
                Err(e)
            }
        }
    }

    async fn write_phases(
        &self,
        session: &mut dyn StoreSession,
        graph: &LinkGraph,
    ) -> Result<WriteSummary> {
        session.ensure_schema().await?;

        let mut committed = 0;
        let pages = self
            .write_phase(
                session,
                BatchKind::Pages,
                &graph.nodes,
                |pages| WriteBatch::Pages(pages),
                &mut committed,
            )
            .await?;
        info!(
            "Pages done: {} written, {} created in {} batches",
            pages.written, pages.created, pages.batches
        );

        let links = self
            .write_phase(
                session,
                BatchKind::Links,
                &graph.edges,
                |links| WriteBatch::Links(links),
                &mut committed,
            )
            .await?;
        info!(
            "Links done: {} written, {} created in {} batches",
            links.written, links.created, links.batches
        );

        Ok(WriteSummary {
            pages_written: pages.written,
            links_written: links.written,
            pages_created: pages.created,
            links_created: links.created,
            page_batches: pages.batches,
            link_batches: links.batches,
        })
    }

    async fn write_phase<T: Sync>(
        &self,
        session: &mut dyn StoreSession,
        kind: BatchKind,
        items: &[T],
        to_batch: fn(&[T]) -> WriteBatch<'_>,
        committed: &mut usize,
    ) -> Result<PhaseOutcome> {
        let batches = plan(items, self.batch_size)?;
        let total = batches.len();
        let mut outcome = PhaseOutcome::default();

        for batch in batches {
            if self.cancel.is_cancelled() {
                warn!(
                    "Write cancelled before {} batch {}/{}",
                    kind,
                    batch.index + 1,
                    total
                );
                return Err(StoreError::Cancelled {
                    committed: *committed,
                });
            }

            let created = session
                .run_write_transaction(to_batch(batch.items))
                .await
                .map_err(|e| StoreError::Transaction {
                    kind,
                    batch: batch.index,
                    source: Box::new(e),
                })?;

            *committed += 1;
            outcome.written += batch.len();
            outcome.created += created;
            outcome.batches += 1;

            debug!(
                "Committed {} batch {}/{} ({} items, {} created)",
                kind,
                batch.index + 1,
                total,
                batch.len(),
                created
            );

            if let Some(progress) = &self.progress {
                progress(&BatchReport {
                    kind,
                    index: batch.index,
                    total,
                    len: batch.len(),
                    created,
                });
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use wikigraph_core::{CoreError, LinkEdge, PageNode};

    use crate::store::StoreStats;

    /// In-memory store that records every call and can fail on demand.
    #[derive(Default, Clone)]
    struct RecordingStore {
        events: Arc<Mutex<Vec<String>>>,
        fail_open: bool,
        fail_on: Option<(BatchKind, usize)>,
        lose_connection: bool,
    }

    impl RecordingStore {
        fn failing_on(kind: BatchKind, index: usize) -> Self {
            Self {
                fail_on: Some((kind, index)),
                ..Self::default()
            }
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    struct RecordingSession {
        store: RecordingStore,
        seen: Vec<usize>,
    }

    #[async_trait]
    impl GraphStore for RecordingStore {
        fn backend(&self) -> &'static str {
            "recording"
        }

        fn location(&self) -> String {
            "memory".to_string()
        }

        async fn open_session(&self) -> Result<Box<dyn StoreSession>> {
            if self.fail_open {
                return Err(StoreError::Connectivity {
                    backend: "recording",
                    message: "refused".to_string(),
                });
            }
            self.events.lock().unwrap().push("open".to_string());
            Ok(Box::new(RecordingSession {
                store: self.clone(),
                seen: vec![0, 0],
            }))
        }
    }

    #[async_trait]
    impl StoreSession for RecordingSession {
        async fn ping(&mut self) -> Result<()> {
            Ok(())
        }

        async fn ensure_schema(&mut self) -> Result<()> {
            self.store.events.lock().unwrap().push("schema".to_string());
            Ok(())
        }

        async fn run_write_transaction(&mut self, batch: WriteBatch<'_>) -> Result<usize> {
            let kind = batch.kind();
            let slot = match kind {
                BatchKind::Pages => 0,
                BatchKind::Links => 1,
            };
            let index = self.seen[slot];
            self.seen[slot] += 1;

            if self.store.fail_on == Some((kind, index)) {
                if self.store.lose_connection {
                    return Err(StoreError::Connectivity {
                        backend: "recording",
                        message: "connection reset".to_string(),
                    });
                }
                return Err(StoreError::Query("constraint violated".to_string()));
            }
            self.store
                .events
                .lock()
                .unwrap()
                .push(format!("{}:{}:{}", kind, index, batch.len()));
            Ok(batch.len())
        }

        async fn stats(&mut self) -> Result<StoreStats> {
            Ok(StoreStats::default())
        }

        async fn clear(&mut self) -> Result<StoreStats> {
            Ok(StoreStats::default())
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.store.events.lock().unwrap().push("close".to_string());
            Ok(())
        }
    }

    fn graph(pages: usize, links: usize) -> LinkGraph {
        let nodes: Vec<PageNode> = (0..pages).map(|i| PageNode::new(format!("P{}", i))).collect();
        let edges: Vec<LinkEdge> = (0..links)
            .map(|i| LinkEdge::new(format!("P{}", i), format!("P{}", i + 1)))
            .collect();
        LinkGraph {
            nodes,
            edges,
            ..LinkGraph::default()
        }
    }

    #[tokio::test]
    async fn test_pages_before_links() {
        let store = RecordingStore::default();
        let writer = GraphStoreWriter::new(&store, 2).unwrap();

        let summary = writer.write(&graph(3, 2)).await.unwrap();

        assert_eq!(
            store.events(),
            vec!["open", "schema", "page:0:2", "page:1:1", "link:0:2", "close"]
        );
        assert_eq!(summary.page_batches, 2);
        assert_eq!(summary.link_batches, 1);
        assert_eq!(summary.batches(), 3);
        assert_eq!(summary.pages_created, 3);
        assert_eq!(summary.links_created, 2);
    }

    #[tokio::test]
    async fn test_default_batch_size_splits_300_pages() {
        let store = RecordingStore::default();
        let writer = GraphStoreWriter::new(&store, wikigraph_core::DEFAULT_BATCH_SIZE).unwrap();

        let summary = writer.write(&graph(300, 0)).await.unwrap();

        let events = store.events();
        assert!(events.contains(&"page:0:256".to_string()));
        assert!(events.contains(&"page:1:44".to_string()));
        assert_eq!(summary.pages_written, 300);
        assert_eq!(summary.link_batches, 0);
    }

    #[tokio::test]
    async fn test_failing_batch_stops_the_run() {
        let store = RecordingStore::failing_on(BatchKind::Pages, 1);
        let writer = GraphStoreWriter::new(&store, 2).unwrap();

        let err = writer.write(&graph(6, 3)).await.unwrap_err();

        match err {
            StoreError::Transaction { kind, batch, source } => {
                assert_eq!(kind, BatchKind::Pages);
                assert_eq!(batch, 1);
                assert!(source.to_string().contains("constraint violated"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // No later page batch and no link batch ran, but the session closed.
        assert_eq!(store.events(), vec!["open", "schema", "page:0:2", "close"]);
    }

    #[tokio::test]
    async fn test_lost_connection_mid_run_keeps_its_cause() {
        let store = RecordingStore {
            lose_connection: true,
            ..RecordingStore::failing_on(BatchKind::Links, 1)
        };
        let writer = GraphStoreWriter::new(&store, 2).unwrap();

        let err = writer.write(&graph(4, 4)).await.unwrap_err();

        assert!(err.is_connectivity());
        let cause = std::error::Error::source(&err).expect("batch failure keeps its cause");
        assert!(cause.to_string().contains("connection reset"));
        assert!(matches!(
            err,
            StoreError::Transaction {
                kind: BatchKind::Links,
                batch: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_failing_link_batch_keeps_pages() {
        let store = RecordingStore::failing_on(BatchKind::Links, 0);
        let writer = GraphStoreWriter::new(&store, 10).unwrap();

        let err = writer.write(&graph(4, 3)).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::Transaction {
                kind: BatchKind::Links,
                batch: 0,
                ..
            }
        ));
        assert_eq!(store.events(), vec!["open", "schema", "page:0:4", "close"]);
    }

    #[tokio::test]
    async fn test_connectivity_failure_runs_no_batches() {
        let store = RecordingStore {
            fail_open: true,
            ..RecordingStore::default()
        };
        let writer = GraphStoreWriter::new(&store, 2).unwrap();

        let err = writer.write(&graph(2, 1)).await.unwrap_err();

        assert!(matches!(err, StoreError::Connectivity { .. }));
        assert!(store.events().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let store = RecordingStore::default();
        let token = CancellationToken::new();
        token.cancel();
        let writer = GraphStoreWriter::new(&store, 2)
            .unwrap()
            .with_cancellation(token);

        let err = writer.write(&graph(4, 0)).await.unwrap_err();

        assert!(matches!(err, StoreError::Cancelled { committed: 0 }));
        assert_eq!(store.events(), vec!["open", "schema", "close"]);
    }

    #[tokio::test]
    async fn test_cancelled_between_batches() {
        let store = RecordingStore::default();
        let token = CancellationToken::new();
        let trigger = token.clone();
        let writer = GraphStoreWriter::new(&store, 2)
            .unwrap()
            .with_cancellation(token)
            .on_batch(move |report| {
                if report.index == 0 {
                    trigger.cancel();
                }
            });

        let err = writer.write(&graph(6, 2)).await.unwrap_err();

        assert!(matches!(err, StoreError::Cancelled { committed: 1 }));
        assert_eq!(store.events(), vec!["open", "schema", "page:0:2", "close"]);
    }

    #[tokio::test]
    async fn test_progress_reports_every_batch() {
        let store = RecordingStore::default();
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let writer = GraphStoreWriter::new(&store, 2)
            .unwrap()
            .on_batch(move |report| sink.lock().unwrap().push(*report));

        writer.write(&graph(3, 1)).await.unwrap();

        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].total, 2);
        assert_eq!(reports[1].len, 1);
        assert_eq!(reports[2].kind, BatchKind::Links);
    }

    #[tokio::test]
    async fn test_empty_graph_still_ensures_schema() {
        let store = RecordingStore::default();
        let writer = GraphStoreWriter::new(&store, 2).unwrap();

        let summary = writer.write(&LinkGraph::default()).await.unwrap();

        assert_eq!(summary, WriteSummary::default());
        assert_eq!(store.events(), vec!["open", "schema", "close"]);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let store = RecordingStore::default();
        let err = GraphStoreWriter::new(&store, 0).err().unwrap();
        assert!(matches!(
            err,
            StoreError::Core(CoreError::InvalidBatchSize(0))
        ));
    }
}
