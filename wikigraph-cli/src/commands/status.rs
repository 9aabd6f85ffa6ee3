//! Status command - page and link counts currently held by the store

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::time::Instant;

use super::{run_store_action, StoreAction};
use crate::config::WikiConfig;
use crate::output::{Output, OutputFormat, TableDisplay};

/// Store contents summary.
#[derive(Debug, Serialize)]
pub struct StatusInfo {
    pub backend: String,
    pub location: String,
    pub pages: u64,
    pub links: u64,
    pub duration_ms: u64,
}

impl TableDisplay for StatusInfo {
    fn to_table(&self) -> String {
        [
            format!("{}", "wikigraph store".green().bold()),
            format!("  {}: {}", "Backend".cyan(), self.backend),
            format!("  {}: {}", "Location".cyan(), self.location),
            format!("  {}: {}", "Pages".cyan(), self.pages),
            format!("  {}: {}", "Links".cyan(), self.links),
            format!("{}", format!("({} ms)", self.duration_ms).dimmed()),
        ]
        .join("\n")
    }
}

pub async fn run(config: &WikiConfig, format: OutputFormat) -> Result<()> {
    let start = Instant::now();
    let store = config.build_store();

    let stats = run_store_action(store.as_ref(), StoreAction::Stats)
        .await
        .with_context(|| format!("Failed to read {} store status", store.backend()))?;

    let info = StatusInfo {
        backend: store.backend().to_string(),
        location: store.location(),
        pages: stats.pages,
        links: stats.links,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Output::new(info, format).render()
}
