//! Page title derivation.
//!
//! A page's identity is its file's base name without the extension. Link
//! destinations go through the same function so that `B.md`, `./B.md` and
//! `pages/B.md` all land on the node produced by the file `B.md`.

use std::path::Path;

/// Resolve a file identifier (path or link destination) to a page title.
///
/// Both `/` and `\` count as directory separators. The extension is the text
/// after the last `.` of the base name, so a bare `.md` is all extension.
/// Degenerate input yields an empty title.
pub fn resolve(identifier: &str) -> String {
    let base = identifier
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    if base == "." || base == ".." {
        return String::new();
    }

    match base.rfind('.') {
        None => base.to_string(),
        Some(idx) => base[..idx].to_string(),
    }
}

/// Resolve a filesystem path to a page title.
pub fn resolve_path(path: &Path) -> String {
    resolve(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_directory_and_extension() {
        assert_eq!(resolve("result/WikiPage.md"), "WikiPage");
        assert_eq!(resolve("/abs/path/to/Page.md"), "Page");
        assert_eq!(resolve("Page.md"), "Page");
    }

    #[test]
    fn test_destination_without_extension() {
        assert_eq!(resolve("CamelCasePage"), "CamelCasePage");
        assert_eq!(resolve("./sub/CamelCasePage"), "CamelCasePage");
    }

    #[test]
    fn test_only_last_extension_removed() {
        assert_eq!(resolve("archive.tar.gz"), "archive.tar");
    }

    #[test]
    fn test_windows_separators() {
        assert_eq!(resolve(r"wiki\pages\Front.md"), "Front");
    }

    #[test]
    fn test_extension_only_name_is_empty_title() {
        assert_eq!(resolve("dir/.md"), "");
        assert_eq!(resolve(r"wiki\.md"), "");
    }

    #[test]
    fn test_degenerate_identifiers() {
        assert_eq!(resolve(""), "");
        assert_eq!(resolve("dir/"), "dir");
        assert_eq!(resolve(".."), "");
        assert_eq!(resolve(".md"), "");
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path(Path::new("corpus/nested/Home.md")), "Home");
    }
}
