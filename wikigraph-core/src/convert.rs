//! HTML wiki export to Markdown conversion.
//!
//! Wiki exports ship as one `wiki?Page.html` file per page. Each file keeps
//! its `<title>` as a `# Title` heading and the contents of `<div id="wiki">`
//! as the Markdown body. Links of the form `(wiki%3FPage.html)` are rewritten
//! to `(Page)` so that they resolve to the converted page titles.

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::corpus::{Corpus, DirectoryCorpus, ScanOptions};
use crate::error::{CoreError, Result};

static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector is valid"));

static WIKI_BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#wiki").expect("wiki body selector is valid"));

static WIKI_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(wiki(?:%3F|\?)(.*?)\.html\)").expect("wiki link pattern is valid")
});

/// Prefix the export puts in front of every page file name.
const PAGE_PREFIX: &str = "wiki?";

/// Outcome of converting one export directory.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    pub files_converted: usize,
    pub destination: PathBuf,
    pub duration_ms: u64,
}

/// Converts a directory of exported HTML pages into Markdown pages.
#[derive(Debug, Clone, Default)]
pub struct HtmlConverter {
    overwrite: bool,
}

impl HtmlConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of an existing, non-empty destination.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Convert every `.html` file under `source` into `dest`.
    ///
    /// Subdirectories are mirrored. Nothing is written unless every source
    /// page converts.
    pub fn convert_dir(&self, source: &Path, dest: &Path) -> Result<ConvertSummary> {
        let start = Instant::now();

        let options = ScanOptions {
            extensions: vec!["html".to_string()],
            ..ScanOptions::default()
        };
        let corpus = DirectoryCorpus::scan(source, &options)?;
        self.check_destination(source, dest)?;

        let pages = corpus
            .documents()
            .par_iter()
            .map(|path| -> Result<(PathBuf, String)> {
                let html = corpus.read(path)?;
                let markdown = convert_page(&html, path)?;
                Ok((markdown_path(source, path), markdown))
            })
            .collect::<Result<Vec<_>>>()?;

        self.prepare_destination(dest)?;
        for (relative, markdown) in &pages {
            let target = dest.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| CoreError::FileWrite {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&target, markdown).map_err(|source| CoreError::FileWrite {
                path: target.clone(),
                source,
            })?;
            debug!("Wrote {:?}", target);
        }

        info!(
            "Converted {} pages from {:?} to {:?} in {:?}",
            pages.len(),
            source,
            dest,
            start.elapsed()
        );

        Ok(ConvertSummary {
            files_converted: pages.len(),
            destination: dest.to_path_buf(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn check_destination(&self, source: &Path, dest: &Path) -> Result<()> {
        let invalid = |reason: &str| CoreError::InvalidDestination {
            path: dest.to_path_buf(),
            reason: reason.to_string(),
        };

        if !dest.exists() {
            return Ok(());
        }
        if !dest.is_dir() {
            return Err(invalid("not a directory"));
        }

        // Clearing a destination that holds the source would delete the export.
        if let (Ok(source), Ok(dest)) = (source.canonicalize(), dest.canonicalize()) {
            if source.starts_with(&dest) {
                return Err(invalid("contains the source directory"));
            }
        }

        let occupied = fs::read_dir(dest)
            .map_err(|source| CoreError::FileAccess {
                path: dest.to_path_buf(),
                source,
            })?
            .next()
            .is_some();
        if occupied && !self.overwrite {
            return Err(invalid("not empty (pass --force to replace it)"));
        }
        Ok(())
    }

    fn prepare_destination(&self, dest: &Path) -> Result<()> {
        if self.overwrite && dest.exists() {
            fs::remove_dir_all(dest).map_err(|source| CoreError::FileWrite {
                path: dest.to_path_buf(),
                source,
            })?;
        }
        fs::create_dir_all(dest).map_err(|source| CoreError::FileWrite {
            path: dest.to_path_buf(),
            source,
        })
    }
}

/// Convert one exported HTML page to Markdown.
///
/// `path` is only used in error messages.
pub fn convert_page(html: &str, path: &Path) -> Result<String> {
    let document = Html::parse_document(html);

    let missing = |element: &'static str| CoreError::MissingElement {
        path: path.to_path_buf(),
        element,
    };

    let title: String = document
        .select(&TITLE)
        .next()
        .ok_or_else(|| missing("<title>"))?
        .text()
        .collect();
    let body = document
        .select(&WIKI_BODY)
        .next()
        .ok_or_else(|| missing("<div id=\"wiki\">"))?
        .inner_html();

    let markdown = htmd::convert(&body).map_err(|e| CoreError::Convert {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(format!(
        "# {}\n\n{}\n",
        title.trim(),
        rewrite_links(markdown.trim_end())
    ))
}

/// Rewrite export-style `(wiki%3FPage.html)` link targets to `(Page)`.
pub fn rewrite_links(markdown: &str) -> String {
    WIKI_LINK.replace_all(markdown, "($1)").into_owned()
}

/// Destination of `path`'s Markdown page, relative to the output directory.
fn markdown_path(source: &Path, path: &Path) -> PathBuf {
    let relative = path.strip_prefix(source).unwrap_or(path);
    let name = relative
        .file_stem()
        .map(|stem| stem.to_string_lossy().replace(PAGE_PREFIX, ""))
        .unwrap_or_default();
    relative.with_file_name(format!("{}.md", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = r#"<html><head><title>Front Page</title></head>
<body><div id="nav">skip me</div>
<div id="wiki"><p>See <a href="wiki%3FOtherPage.html">OtherPage</a> and
<a href="https://example.com">the web</a>.</p></div></body></html>"#;

    #[test]
    fn test_converts_title_and_body() {
        let markdown = convert_page(PAGE, Path::new("wiki?FrontPage.html")).unwrap();

        assert!(markdown.starts_with("# Front Page\n\n"));
        assert!(markdown.contains("[OtherPage](OtherPage)"));
        assert!(markdown.contains("(https://example.com)"));
        assert!(!markdown.contains("skip me"));
    }

    #[test]
    fn test_missing_wiki_body_is_an_error() {
        let err = convert_page(
            "<html><head><title>T</title></head><body></body></html>",
            Path::new("bad.html"),
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::MissingElement { .. }));
        assert!(err.to_string().contains("bad.html"));
    }

    #[test]
    fn test_rewrite_links() {
        assert_eq!(rewrite_links("[A](wiki%3FA.html)"), "[A](A)");
        assert_eq!(rewrite_links("[A](wiki?A.html) [B](wiki%3FB.html)"), "[A](A) [B](B)");
        assert_eq!(rewrite_links("[x](other.html)"), "[x](other.html)");
    }

    #[test]
    fn test_markdown_path_drops_prefix() {
        let source = Path::new("export");
        assert_eq!(
            markdown_path(source, Path::new("export/wiki?FrontPage.html")),
            PathBuf::from("FrontPage.md")
        );
        assert_eq!(
            markdown_path(source, Path::new("export/sub/wiki?Deep.html")),
            PathBuf::from("sub/Deep.md")
        );
    }

    #[test]
    fn test_convert_dir_writes_markdown_pages() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("html");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("wiki?FrontPage.html"), PAGE).unwrap();
        fs::write(source.join("notes.txt"), "ignored").unwrap();
        let dest = dir.path().join("md");

        let summary = HtmlConverter::new().convert_dir(&source, &dest).unwrap();

        assert_eq!(summary.files_converted, 1);
        let page = fs::read_to_string(dest.join("FrontPage.md")).unwrap();
        assert!(page.starts_with("# Front Page"));
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 1);
    }

    #[test]
    fn test_non_empty_destination_requires_overwrite() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("html");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("wiki?FrontPage.html"), PAGE).unwrap();
        let dest = dir.path().join("md");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("Stale.md"), "old").unwrap();

        let err = HtmlConverter::new().convert_dir(&source, &dest).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDestination { .. }));
        assert!(dest.join("Stale.md").exists());

        HtmlConverter::new()
            .overwrite(true)
            .convert_dir(&source, &dest)
            .unwrap();
        assert!(!dest.join("Stale.md").exists());
        assert!(dest.join("FrontPage.md").exists());
    }

    #[test]
    fn test_refuses_to_clear_the_source() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("wiki?FrontPage.html"), PAGE).unwrap();

        let err = HtmlConverter::new()
            .overwrite(true)
            .convert_dir(dir.path(), dir.path())
            .unwrap_err();

        assert!(err.to_string().contains("contains the source"));
        assert!(dir.path().join("wiki?FrontPage.html").exists());
    }

    #[test]
    fn test_broken_page_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("html");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("wiki?FrontPage.html"), PAGE).unwrap();
        fs::write(source.join("wiki?Broken.html"), "<html></html>").unwrap();
        let dest = dir.path().join("md");

        assert!(HtmlConverter::new().convert_dir(&source, &dest).is_err());
        assert!(!dest.exists());
    }
}
