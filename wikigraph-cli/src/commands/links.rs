//! Links command - show the links one page would contribute

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use wikigraph_core::{title, Corpus, DirectoryCorpus, GraphBuilder};

use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

#[derive(Debug, Serialize)]
pub struct LinkRow {
    /// Destination as written in the page.
    pub destination: String,
    /// Title the destination resolves to.
    pub target: String,
    /// The link points back at its own page and would be dropped.
    pub self_link: bool,
}

#[derive(Debug, Serialize)]
pub struct LinkReport {
    pub file: String,
    pub title: String,
    pub links: Vec<LinkRow>,
}

impl TableDisplay for LinkReport {
    fn to_table(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .links
            .iter()
            .map(|link| {
                let note = if link.self_link { "self-link" } else { "" };
                vec![
                    link.destination.clone(),
                    link.target.clone(),
                    note.to_string(),
                ]
            })
            .collect();

        format!(
            "{} {} ({} links)\n{}",
            "Page".cyan().bold(),
            self.title,
            self.links.len(),
            TableOutput::from_rows(&["Destination", "Target", "Note"], &rows)
        )
    }
}

/// Extract the candidate links of a single file.
pub fn collect(file: &Path) -> Result<LinkReport> {
    let corpus = DirectoryCorpus::from_paths(vec![file.to_path_buf()]);
    let text = corpus
        .read(file)
        .with_context(|| format!("Failed to read page {}", file.display()))?;

    let source = title::resolve_path(file);
    let builder = GraphBuilder::new();
    let links = builder
        .candidates(&text)
        .map(|candidate| LinkRow {
            destination: candidate.destination.to_string(),
            self_link: candidate.target == source,
            target: candidate.target,
        })
        .collect();

    Ok(LinkReport {
        file: file.display().to_string(),
        title: source,
        links,
    })
}

pub async fn run(file: &Path, format: OutputFormat) -> Result<()> {
    let report = collect(file)?;
    Output::new(report, format).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_resolves_destinations() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Home.md");
        std::fs::write(
            &file,
            "[FAQ](docs/FAQ.md) [me](Home.md) [site](https://example.com)",
        )
        .unwrap();

        let report = collect(&file).unwrap();

        assert_eq!(report.title, "Home");
        assert_eq!(report.links.len(), 2);
        assert_eq!(report.links[0].destination, "docs/FAQ.md");
        assert_eq!(report.links[0].target, "FAQ");
        assert!(!report.links[0].self_link);
        assert!(report.links[1].self_link);
    }

    #[test]
    fn test_collect_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(collect(&dir.path().join("Nope.md")).is_err());
    }
}
