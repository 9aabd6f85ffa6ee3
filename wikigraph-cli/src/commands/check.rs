//! Check command - verify that the configured graph store is reachable

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::time::Instant;

use crate::config::WikiConfig;
use crate::output::{Output, OutputFormat, TableDisplay};

/// Result of a connectivity check.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub backend: String,
    pub location: String,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl TableDisplay for CheckResult {
    fn to_table(&self) -> String {
        let status = if self.connected {
            "Store reachable".green().bold()
        } else {
            "Store unreachable".red().bold()
        };

        let mut lines = vec![
            format!("{}", status),
            format!("  {}: {}", "Backend".cyan(), self.backend),
            format!("  {}: {}", "Location".cyan(), self.location),
        ];
        if let Some(error) = &self.error {
            lines.push(format!("  {}: {}", "Error".cyan(), error));
        }
        lines.push(format!("{}", format!("({} ms)", self.duration_ms).dimmed()));
        lines.join("\n")
    }
}

pub async fn run(config: &WikiConfig, format: OutputFormat) -> Result<()> {
    let start = Instant::now();
    let store = config.build_store();

    tracing::info!("Checking {} store at {}", store.backend(), store.location());
    let verified = store.verify().await;

    let result = CheckResult {
        backend: store.backend().to_string(),
        location: store.location(),
        connected: verified.is_ok(),
        error: verified.as_ref().err().map(|e| e.to_string()),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Output::new(result, format).render()?;

    verified.context("Store check failed")
}
