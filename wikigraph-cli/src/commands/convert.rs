//! Convert command - turn an HTML wiki export into Markdown pages

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use wikigraph_core::{ConvertSummary, HtmlConverter};

use crate::output::{Output, OutputFormat, TableDisplay};

/// Outcome of a conversion run.
#[derive(Debug, Serialize)]
pub struct ConvertResult {
    pub source: String,
    pub destination: String,
    pub files_converted: usize,
    pub duration_ms: u64,
}

impl ConvertResult {
    fn new(source: &Path, summary: ConvertSummary) -> Self {
        Self {
            source: source.display().to_string(),
            destination: summary.destination.display().to_string(),
            files_converted: summary.files_converted,
            duration_ms: summary.duration_ms,
        }
    }
}

impl TableDisplay for ConvertResult {
    fn to_table(&self) -> String {
        [
            format!("{}", "Conversion complete".green().bold()),
            format!("  {}: {}", "Source".cyan(), self.source),
            format!("  {}: {}", "Destination".cyan(), self.destination),
            format!("  {}: {}", "Pages".cyan(), self.files_converted),
            format!("{}", format!("({} ms)", self.duration_ms).dimmed()),
        ]
        .join("\n")
    }
}

pub async fn run(source: &Path, dest: &Path, force: bool, format: OutputFormat) -> Result<()> {
    let summary = HtmlConverter::new()
        .overwrite(force)
        .convert_dir(source, dest)
        .with_context(|| format!("Failed to convert {}", source.display()))?;

    Output::new(ConvertResult::new(source, summary), format).render()
}
