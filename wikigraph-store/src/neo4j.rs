//! Neo4j backend over Bolt, using `neo4rs`.
//!
//! Every batch is a single `UNWIND $list ... MERGE` statement inside an
//! explicit transaction. Pages are `(:Page {title})` nodes, links are
//! `(:Page)-[:LINKS_TO]->(:Page)` relationships.

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Query, Txn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::store::{GraphStore, StoreSession, StoreStats, WriteBatch};

const BACKEND: &str = "neo4j";

const PAGE_CONSTRAINT: &str =
    "CREATE CONSTRAINT page_title IF NOT EXISTS FOR (p:Page) REQUIRE p.title IS UNIQUE";

const MERGE_PAGES: &str = "UNWIND $titles AS title
     OPTIONAL MATCH (existing:Page {title: title})
     WITH title, existing IS NULL AS fresh
     MERGE (:Page {title: title})
     RETURN count(CASE WHEN fresh THEN 1 END) AS created";

const MERGE_LINKS: &str = "UNWIND $links AS link
     MATCH (source:Page {title: link.source})
     MATCH (target:Page {title: link.target})
     OPTIONAL MATCH (source)-[existing:LINKS_TO]->(target)
     WITH source, target, existing IS NULL AS fresh
     MERGE (source)-[:LINKS_TO]->(target)
     RETURN count(CASE WHEN fresh THEN 1 END) AS created";

const COUNT_PAGES: &str = "MATCH (p:Page) RETURN count(p) AS total";

const COUNT_LINKS: &str = "MATCH (:Page)-[r:LINKS_TO]->(:Page) RETURN count(r) AS total";

const DELETE_PAGES: &str = "MATCH (p:Page) DETACH DELETE p";

/// Connection settings for a Neo4j server.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Database name; the server default when unset.
    pub database: Option<String>,
    pub max_connections: usize,
    /// Seconds to wait for the server to answer when a session opens.
    pub connect_timeout_secs: u64,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: None,
            max_connections: 4,
            connect_timeout_secs: 10,
        }
    }
}

// Keep the password out of logs and error output.
impl fmt::Debug for Neo4jSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jSettings")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Neo4j graph store.
#[derive(Debug, Clone)]
pub struct Neo4jStore {
    settings: Neo4jSettings,
}

impl Neo4jStore {
    pub fn new(settings: Neo4jSettings) -> Self {
        Self { settings }
    }
}

fn connectivity(err: impl fmt::Display) -> StoreError {
    StoreError::Connectivity {
        backend: BACKEND,
        message: err.to_string(),
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn location(&self) -> String {
        match &self.settings.database {
            Some(db) => format!("{} (database {})", self.settings.uri, db),
            None => self.settings.uri.clone(),
        }
    }

    async fn open_session(&self) -> Result<Box<dyn StoreSession>> {
        debug!("Connecting to {:?}", self.settings);

        let mut builder = ConfigBuilder::default()
            .uri(self.settings.uri.as_str())
            .user(self.settings.user.as_str())
            .password(self.settings.password.as_str())
            .max_connections(self.settings.max_connections.max(1));
        if let Some(db) = &self.settings.database {
            builder = builder.db(db.as_str());
        }
        let config = builder.build().map_err(connectivity)?;
        let graph = Graph::connect(config).await.map_err(connectivity)?;

        // The pool connects lazily; a round trip proves the server is there.
        let mut session = Neo4jSession { graph };
        let limit = Duration::from_secs(self.settings.connect_timeout_secs.max(1));
        match tokio::time::timeout(limit, session.ping()).await {
            Ok(answered) => answered?,
            Err(_) => {
                return Err(connectivity(format!(
                    "no answer from {} within {}s",
                    self.settings.uri,
                    limit.as_secs()
                )))
            }
        }

        Ok(Box::new(session))
    }
}

/// Session holding a `neo4rs` connection pool.
pub struct Neo4jSession {
    graph: Graph,
}

impl Neo4jSession {
    /// Run `q` in its own transaction and sum the integer `column` over all rows.
    async fn sum_in_txn(&self, q: Query, column: &str) -> Result<i64> {
        let mut txn = self.graph.start_txn().await.map_err(StoreError::query)?;

        match sum_column(&mut txn, q, column).await {
            Ok(total) => {
                txn.commit().await.map_err(StoreError::query)?;
                Ok(total)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!("Rollback failed after error '{}': {}", e, rollback);
                }
                Err(e)
            }
        }
    }
}

async fn sum_column(txn: &mut Txn, q: Query, column: &str) -> Result<i64> {
    let mut rows = txn.execute(q).await.map_err(StoreError::query)?;
    let mut total = 0;
    while let Some(row) = rows.next(txn.handle()).await.map_err(StoreError::query)? {
        total += row.get::<i64>(column).map_err(StoreError::query)?;
    }
    Ok(total)
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl StoreSession for Neo4jSession {
    async fn ping(&mut self) -> Result<()> {
        self.graph
            .run(query("RETURN 1"))
            .await
            .map_err(connectivity)
    }

    async fn ensure_schema(&mut self) -> Result<()> {
        self.graph
            .run(query(PAGE_CONSTRAINT))
            .await
            .map_err(StoreError::query)
    }

    async fn run_write_transaction(&mut self, batch: WriteBatch<'_>) -> Result<usize> {
        let q = match batch {
            WriteBatch::Pages(pages) => {
                let titles: Vec<String> = pages.iter().map(|p| p.title.clone()).collect();
                query(MERGE_PAGES).param("titles", titles)
            }
            WriteBatch::Links(links) => {
                let rows: Vec<HashMap<String, String>> = links
                    .iter()
                    .map(|link| {
                        HashMap::from([
                            ("source".to_string(), link.source.clone()),
                            ("target".to_string(), link.target.clone()),
                        ])
                    })
                    .collect();
                query(MERGE_LINKS).param("links", rows)
            }
        };

        let created = self.sum_in_txn(q, "created").await?;
        Ok(to_count(created) as usize)
    }

    async fn stats(&mut self) -> Result<StoreStats> {
        let pages = self.sum_in_txn(query(COUNT_PAGES), "total").await?;
        let links = self.sum_in_txn(query(COUNT_LINKS), "total").await?;
        Ok(StoreStats {
            pages: to_count(pages),
            links: to_count(links),
        })
    }

    async fn clear(&mut self) -> Result<StoreStats> {
        let before = self.stats().await?;
        self.graph
            .run(query(DELETE_PAGES))
            .await
            .map_err(StoreError::query)?;
        Ok(before)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        // dropping the pool closes its connections
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let settings = Neo4jSettings {
            password: "hunter2".to_string(),
            ..Neo4jSettings::default()
        };
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_location_includes_database() {
        let store = Neo4jStore::new(Neo4jSettings {
            database: Some("wiki".to_string()),
            ..Neo4jSettings::default()
        });
        assert_eq!(store.location(), "bolt://localhost:7687 (database wiki)");
        assert_eq!(store.backend(), "neo4j");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_connectivity_error() {
        let store = Neo4jStore::new(Neo4jSettings {
            uri: "bolt://127.0.0.1:1".to_string(),
            connect_timeout_secs: 1,
            ..Neo4jSettings::default()
        });

        let err = match store.open_session().await {
            Ok(_) => panic!("session opened against a closed port"),
            Err(e) => e,
        };
        assert!(err.is_connectivity(), "unexpected error: {:?}", err);
        assert!(store.verify().await.is_err());
    }

    #[test]
    fn test_batch_queries_are_idempotent_merges() {
        assert!(MERGE_PAGES.contains("UNWIND $titles"));
        assert!(MERGE_PAGES.contains("MERGE (:Page {title: title})"));
        assert!(MERGE_LINKS.contains("UNWIND $links"));
        assert!(MERGE_LINKS.contains("MERGE (source)-[:LINKS_TO]->(target)"));
        assert!(!MERGE_LINKS.contains("CREATE"));
    }
}
