//! Document corpus discovery and reading.
//!
//! Uses the `ignore` crate for gitignore-aware traversal, so exported wikis
//! that live inside a repository skip whatever the repository ignores.
//! A `.wikigraphignore` file is honored at every level.

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{CoreError, Result};

/// A finite set of readable text documents with stable identifiers.
pub trait Corpus: Sync {
    /// Document identifiers, in a stable order.
    fn documents(&self) -> &[PathBuf];

    /// Read one document's text.
    fn read(&self, document: &Path) -> Result<String>;
}

/// Options controlling directory scanning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanOptions {
    /// File extensions to include, without the leading dot.
    pub extensions: Vec<String>,

    /// Additional glob patterns to exclude (beyond .gitignore).
    pub ignore_patterns: Vec<String>,

    /// Descend into subdirectories.
    pub recursive: bool,

    /// Include hidden files and directories.
    pub include_hidden: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string()],
            ignore_patterns: Vec::new(),
            recursive: true,
            include_hidden: false,
        }
    }
}

/// Corpus backed by files on disk.
#[derive(Clone, Debug, Default)]
pub struct DirectoryCorpus {
    documents: Vec<PathBuf>,
    skipped_count: usize,
    error_count: usize,
}

impl DirectoryCorpus {
    /// Scan `root` for documents matching `options`.
    ///
    /// Paths are sorted so that every run sees the same order.
    pub fn scan(root: &Path, options: &ScanOptions) -> Result<Self> {
        let start = Instant::now();

        if !root.is_dir() {
            return Err(CoreError::Scan {
                path: root.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        let ext_filter: HashSet<String> = options
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(!options.include_hidden)
            .git_ignore(true)
            .git_exclude(true)
            .require_git(false)
            .add_custom_ignore_filename(".wikigraphignore");

        if !options.recursive {
            builder.max_depth(Some(1));
        }

        if !options.ignore_patterns.is_empty() {
            let mut overrides = OverrideBuilder::new(root);
            for pattern in &options.ignore_patterns {
                // `!` turns an override glob into an exclusion
                if let Err(e) = overrides.add(&format!("!{}", pattern)) {
                    tracing::warn!("Invalid ignore pattern '{}': {}", pattern, e);
                }
            }
            let overrides = overrides.build().map_err(|e| CoreError::Scan {
                path: root.to_path_buf(),
                message: e.to_string(),
            })?;
            builder.overrides(overrides);
        }

        let mut documents = Vec::new();
        let mut skipped_count = 0;
        let mut error_count = 0;

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    error_count += 1;
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let matches_ext = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| ext_filter.contains(&e.to_lowercase()));

            if matches_ext {
                documents.push(entry.into_path());
            } else {
                skipped_count += 1;
            }
        }

        documents.sort();

        tracing::debug!(
            "Scanned {:?}: {} documents, {} skipped, {} errors in {:?}",
            root,
            documents.len(),
            skipped_count,
            error_count,
            start.elapsed()
        );

        Ok(Self {
            documents,
            skipped_count,
            error_count,
        })
    }

    /// Build a corpus from an explicit list of paths, keeping their order.
    pub fn from_paths(documents: Vec<PathBuf>) -> Self {
        Self {
            documents,
            skipped_count: 0,
            error_count: 0,
        }
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Files seen during the scan that did not match the extension filter.
    pub fn skipped_count(&self) -> usize {
        self.skipped_count
    }

    /// Directory entries that could not be read during the scan.
    pub fn error_count(&self) -> usize {
        self.error_count
    }
}

impl Corpus for DirectoryCorpus {
    fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    fn read(&self, document: &Path) -> Result<String> {
        let bytes = fs::read(document).map_err(|source| CoreError::FileAccess {
            path: document.to_path_buf(),
            source,
        })?;
        // Exports occasionally carry stray non-UTF-8 bytes; links survive lossy decoding.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
