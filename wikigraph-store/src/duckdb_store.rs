//! Embedded DuckDB backend.
//!
//! Pages and links live in two tables keyed by title. Useful for running
//! exports without a Neo4j server, and for tests.

use async_trait::async_trait;
use duckdb::{params, Connection, Transaction};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::{GraphStore, StoreSession, StoreStats, WriteBatch};

const BACKEND: &str = "duckdb";

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS pages (
    title VARCHAR PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS links (
    source VARCHAR NOT NULL,
    target VARCHAR NOT NULL,
    PRIMARY KEY (source, target)
);
"#;

const INSERT_PAGE: &str = "INSERT OR IGNORE INTO pages (title) VALUES (?)";

// Only links whose endpoints are both stored pages are inserted.
const INSERT_LINK: &str = "INSERT OR IGNORE INTO links (source, target)
     SELECT s.title, t.title FROM pages s, pages t
     WHERE s.title = ? AND t.title = ?";

/// DuckDB graph store backed by a single database file.
#[derive(Debug, Clone)]
pub struct DuckDbStore {
    path: PathBuf,
}

impl DuckDbStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn connectivity(err: impl std::fmt::Display) -> StoreError {
    StoreError::Connectivity {
        backend: BACKEND,
        message: err.to_string(),
    }
}

#[async_trait]
impl GraphStore for DuckDbStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn open_session(&self) -> Result<Box<dyn StoreSession>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| connectivity(format!("{}: {}", parent.display(), e)))?;
        }

        debug!("Opening DuckDB store at {:?}", self.path);
        let conn = Connection::open(&self.path)
            .map_err(|e| connectivity(format!("{}: {}", self.path.display(), e)))?;

        Ok(Box::new(DuckDbSession { conn }))
    }
}

/// Session owning one DuckDB connection.
pub struct DuckDbSession {
    conn: Connection,
}

fn count(conn: &Connection, table: &str) -> duckdb::Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    let total: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(u64::try_from(total).unwrap_or(0))
}

fn write_batch(tx: &Transaction<'_>, batch: WriteBatch<'_>) -> duckdb::Result<u64> {
    let table = match batch {
        WriteBatch::Pages(_) => "pages",
        WriteBatch::Links(_) => "links",
    };
    let before = count(tx, table)?;

    match batch {
        WriteBatch::Pages(pages) => {
            let mut stmt = tx.prepare(INSERT_PAGE)?;
            for page in pages {
                stmt.execute(params![page.title])?;
            }
        }
        WriteBatch::Links(links) => {
            let mut stmt = tx.prepare(INSERT_LINK)?;
            for link in links {
                stmt.execute(params![link.source, link.target])?;
            }
        }
    }

    let after = count(tx, table)?;
    Ok(after.saturating_sub(before))
}

#[async_trait]
impl StoreSession for DuckDbSession {
    async fn ping(&mut self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i32>(0))
            .map(|_| ())
            .map_err(connectivity)
    }

    async fn ensure_schema(&mut self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .map_err(StoreError::query)
    }

    async fn run_write_transaction(&mut self, batch: WriteBatch<'_>) -> Result<usize> {
        let tx = self.conn.transaction().map_err(StoreError::query)?;
        // An uncommitted transaction rolls back when dropped.
        let created = write_batch(&tx, batch).map_err(StoreError::query)?;
        tx.commit().map_err(StoreError::query)?;
        Ok(created as usize)
    }

    async fn stats(&mut self) -> Result<StoreStats> {
        Ok(StoreStats {
            pages: count(&self.conn, "pages").map_err(StoreError::query)?,
            links: count(&self.conn, "links").map_err(StoreError::query)?,
        })
    }

    async fn clear(&mut self) -> Result<StoreStats> {
        let before = self.stats().await?;
        self.conn
            .execute_batch("DELETE FROM links; DELETE FROM pages;")
            .map_err(StoreError::query)?;
        Ok(before)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().map_err(|(_, e)| StoreError::query(e))
    }
}
