//! Export command - scan a wiki export and write its link graph to the store
//!
//! Pipeline: scan pages, build the validated graph, log dangling references,
//! then write pages and links in batches.

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wikigraph_core::{DanglingLog, DirectoryCorpus, GraphBuilder, LinkGraph};
use wikigraph_store::{GraphStoreWriter, StoreError, WriteSummary};

use crate::config::WikiConfig;
use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

/// Command-line overrides for an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub batch_size: Option<usize>,
    pub log_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub dry_run: bool,
}

/// Outcome of an export run.
#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub files_processed: usize,
    pub pages: usize,
    pub links: usize,
    pub pages_created: usize,
    pub links_created: usize,
    pub dangling: usize,
    pub self_links: usize,
    pub duplicate_links: usize,
    pub dangling_log: Option<String>,
    pub batches: usize,
    pub backend: Option<String>,
    pub dry_run: bool,
    pub duration_ms: u64,
}

impl ExportSummary {
    fn from_graph(graph: &LinkGraph, dry_run: bool) -> Self {
        Self {
            files_processed: graph.files_processed,
            pages: graph.node_count(),
            links: graph.edge_count(),
            pages_created: 0,
            links_created: 0,
            dangling: graph.dangling.len(),
            self_links: graph.self_links,
            duplicate_links: graph.duplicate_links,
            dangling_log: None,
            batches: 0,
            backend: None,
            dry_run,
            duration_ms: 0,
        }
    }

    fn record_write(&mut self, written: &WriteSummary) {
        self.pages_created = written.pages_created;
        self.links_created = written.links_created;
        self.batches = written.batches();
    }
}

impl TableDisplay for ExportSummary {
    fn to_table(&self) -> String {
        let heading = if self.dry_run {
            "Dry run: nothing written".yellow().bold()
        } else {
            "Export complete".green().bold()
        };

        let mut pairs = vec![
            ("Files", self.files_processed.to_string()),
            ("Pages", self.pages.to_string()),
            ("Links", self.links.to_string()),
        ];
        if !self.dry_run {
            pairs.push(("Pages created", self.pages_created.to_string()));
            pairs.push(("Links created", self.links_created.to_string()));
            pairs.push(("Batches", self.batches.to_string()));
        }
        pairs.push(("Dangling", self.dangling.to_string()));
        pairs.push(("Self-links", self.self_links.to_string()));
        pairs.push(("Duplicates", self.duplicate_links.to_string()));
        if let Some(log) = &self.dangling_log {
            pairs.push(("Dangling log", log.clone()));
        }
        if let Some(backend) = &self.backend {
            pairs.push(("Store", backend.clone()));
        }

        format!(
            "{}\n{}\n{}",
            heading,
            TableOutput::format_key_value(&pairs),
            format!("({} ms)", self.duration_ms).dimmed()
        )
    }
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Cancel `token` on Ctrl-C or when `timeout` elapses, whichever comes first.
fn spawn_watchdog(token: CancellationToken, timeout: Option<Duration>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted; stopping after the current batch");
            }
            _ = deadline => {
                tracing::warn!("Export timed out; stopping after the current batch");
            }
        }
        token.cancel();
    })
}

pub async fn run(
    dir: &Path,
    options: ExportOptions,
    config: &WikiConfig,
    format: OutputFormat,
) -> Result<()> {
    let timeout = match options.timeout_secs {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => config.timeout(),
    };

    let token = CancellationToken::new();
    let watchdog = spawn_watchdog(token.clone(), timeout);
    let summary = export(dir, options, config, &token).await;
    watchdog.abort();

    Output::new(summary?, format).render()
}

fn ensure_active(token: &CancellationToken, stage: &str) -> Result<()> {
    if token.is_cancelled() {
        anyhow::bail!("Export cancelled {}; nothing was written", stage);
    }
    Ok(())
}

async fn export(
    dir: &Path,
    options: ExportOptions,
    config: &WikiConfig,
    token: &CancellationToken,
) -> Result<ExportSummary> {
    let start = Instant::now();

    let corpus = DirectoryCorpus::scan(dir, &config.scan_options())
        .with_context(|| format!("Failed to scan {}", dir.display()))?;
    tracing::info!("Found {} pages in {}", corpus.len(), dir.display());
    ensure_active(token, "after scanning")?;

    let graph = GraphBuilder::new()
        .build(&corpus)
        .context("Failed to build link graph")?;
    ensure_active(token, "after building the link graph")?;

    let mut summary = ExportSummary::from_graph(&graph, options.dry_run);

    if options.dry_run {
        summary.duration_ms = start.elapsed().as_millis() as u64;
        return Ok(summary);
    }

    let store = config.build_store();
    summary.backend = Some(format!("{} ({})", store.backend(), store.location()));

    let batch_size = options.batch_size.unwrap_or(config.export.batch_size);
    let writer = GraphStoreWriter::new(store.as_ref(), batch_size)
        .context("Invalid export settings")?;

    let log_dir = options
        .log_dir
        .unwrap_or_else(|| config.export.log_dir.clone());
    let log_path = DanglingLog::new(log_dir)
        .write(&graph.dangling)
        .context("Failed to write dangling-reference log")?;
    summary.dangling_log = Some(log_path.display().to_string());

    let progress = spinner();
    progress.set_message(format!("Writing to {} store...", store.backend()));
    let reporter = progress.clone();

    let written = writer
        .with_cancellation(token.clone())
        .on_batch(move |report| {
            reporter.set_message(format!(
                "Wrote {} batch {}/{}",
                report.kind,
                report.index + 1,
                report.total
            ));
        })
        .write(&graph)
        .await;

    progress.finish_and_clear();

    let written = match written {
        Ok(written) => written,
        Err(StoreError::Cancelled { committed }) => {
            anyhow::bail!(
                "Export cancelled after {} committed batches; re-run to finish",
                committed
            )
        }
        Err(e) => return Err(e).context("Export failed"),
    };

    summary.record_write(&written);
    summary.duration_ms = start.elapsed().as_millis() as u64;
    Ok(summary)
}
