//! wikigraph configuration loading from `.wikigraph.toml`.
//!
//! Configuration is optional: a missing file means defaults. Environment
//! variables override the store settings after the file is read, so
//! credentials can stay out of the repository.
//!
//! # Example Configuration
//!
//! ```toml
//! [store]
//! backend = "neo4j"
//!
//! [neo4j]
//! uri = "bolt://localhost:7687"
//! user = "neo4j"
//! password = "secret"
//!
//! [duckdb]
//! path = ".wikigraph/graph.duckdb"
//!
//! [export]
//! batch_size = 256
//! log_dir = "logs"
//! timeout_secs = 0
//!
//! [scanner]
//! extensions = ["md"]
//! ignore = ["drafts/"]
//!
//! [output]
//! format = "table"
//! color = true
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use wikigraph_core::{ScanOptions, DEFAULT_BATCH_SIZE};
use wikigraph_store::{DuckDbStore, GraphStore, Neo4jSettings, Neo4jStore};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".wikigraph.toml";

pub const ENV_NEO4J_URI: &str = "WIKIGRAPH_NEO4J_URI";
pub const ENV_NEO4J_USER: &str = "WIKIGRAPH_NEO4J_USER";
pub const ENV_NEO4J_PASSWORD: &str = "WIKIGRAPH_NEO4J_PASSWORD";
pub const ENV_BACKEND: &str = "WIKIGRAPH_BACKEND";

/// Root configuration structure loaded from `.wikigraph.toml`.
///
/// All sections are optional and fall back to defaults.
#[derive(Debug, Deserialize, Default)]
pub struct WikiConfig {
    /// Which graph store to write to.
    #[serde(default)]
    pub store: StoreSection,

    /// Neo4j connection settings.
    #[serde(default)]
    pub neo4j: Neo4jSettings,

    /// Embedded DuckDB settings.
    #[serde(default)]
    pub duckdb: DuckDbSection,

    /// Export run settings.
    #[serde(default)]
    pub export: ExportSection,

    /// Page discovery settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Supported graph store backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Neo4j,
    Duckdb,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neo4j" => Ok(Backend::Neo4j),
            "duckdb" => Ok(Backend::Duckdb),
            _ => Err(format!("Unknown store backend: '{}'", s)),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: Backend,
}

#[derive(Debug, Deserialize)]
pub struct DuckDbSection {
    /// Database file, relative to the working directory.
    #[serde(default = "default_duckdb_path")]
    pub path: PathBuf,
}

fn default_duckdb_path() -> PathBuf {
    PathBuf::from(".wikigraph").join("graph.duckdb")
}

impl Default for DuckDbSection {
    fn default() -> Self {
        Self {
            path: default_duckdb_path(),
        }
    }
}

/// Export run configuration.
#[derive(Debug, Deserialize)]
pub struct ExportSection {
    /// Items per write transaction. Zero is rejected when the writer starts.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Directory for dangling-reference logs.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Cancel the export after this many seconds; 0 disables the limit.
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            log_dir: default_log_dir(),
            timeout_secs: 0,
        }
    }
}

/// Scanner configuration controlling page discovery.
#[derive(Debug, Deserialize)]
pub struct ScannerConfig {
    /// Extensions treated as pages.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Additional glob patterns to ignore during scanning.
    ///
    /// Combined with built-in defaults and any `.gitignore` /
    /// `.wikigraphignore` rules.
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default = "default_recursive")]
    pub recursive: bool,

    #[serde(default)]
    pub include_hidden: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

fn default_recursive() -> bool {
    true
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore: Vec::new(),
            recursive: true,
            include_hidden: false,
        }
    }
}

/// Output formatting preferences. Command-line flags win.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Valid values: `table`, `json`.
    #[serde(default)]
    pub format: Option<String>,

    /// Defaults to `true` when stdout is a TTY.
    #[serde(default)]
    pub color: Option<bool>,
}

/// Ignore patterns that are always included.
const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".git/", ".wikigraph/", "node_modules/"];

impl WikiConfig {
    /// Load `.wikigraph.toml` from `root`, falling back to defaults.
    ///
    /// Read and parse errors are logged as warnings but don't cause failures.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("{:#}", e),
            }
        }
        Self::default()
    }

    /// Load an explicitly named config file. Any failure is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Resolve the run configuration: file first, then environment overrides.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => Self::load(Path::new(".")),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `WIKIGRAPH_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(uri) = lookup(ENV_NEO4J_URI) {
            self.neo4j.uri = uri;
        }
        if let Some(user) = lookup(ENV_NEO4J_USER) {
            self.neo4j.user = user;
        }
        if let Some(password) = lookup(ENV_NEO4J_PASSWORD) {
            self.neo4j.password = password;
        }
        if let Some(backend) = lookup(ENV_BACKEND) {
            match backend.parse() {
                Ok(backend) => self.store.backend = backend,
                Err(e) => bail!("{} ({})", e, ENV_BACKEND),
            }
        }
        Ok(())
    }

    /// Construct the configured graph store.
    pub fn build_store(&self) -> Box<dyn GraphStore> {
        match self.store.backend {
            Backend::Neo4j => Box::new(Neo4jStore::new(self.neo4j.clone())),
            Backend::Duckdb => Box::new(DuckDbStore::new(self.duckdb.path.clone())),
        }
    }

    /// Scanner options, with default ignore patterns appended.
    pub fn scan_options(&self) -> ScanOptions {
        let mut patterns = self.scanner.ignore.clone();
        for default in DEFAULT_IGNORE_PATTERNS {
            if !patterns.iter().any(|p| p == default) {
                patterns.push(default.to_string());
            }
        }

        ScanOptions {
            extensions: self.scanner.extensions.clone(),
            ignore_patterns: patterns,
            recursive: self.scanner.recursive,
            include_hidden: self.scanner.include_hidden,
        }
    }

    /// Write-phase time limit, if any.
    pub fn timeout(&self) -> Option<Duration> {
        match self.export.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = WikiConfig::default();
        assert_eq!(config.store.backend, Backend::Neo4j);
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.export.batch_size, 256);
        assert_eq!(config.export.log_dir, PathBuf::from("logs"));
        assert_eq!(config.scanner.extensions, vec!["md"]);
        assert!(config.scanner.recursive);
        assert!(config.timeout().is_none());
        assert!(config.default_format().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[store]
backend = "duckdb"

[neo4j]
uri = "bolt://graph:7687"
user = "wiki"
password = "secret"
database = "pages"
max_connections = 8

[duckdb]
path = "data/wiki.duckdb"

[export]
batch_size = 100
log_dir = "out/logs"
timeout_secs = 30

[scanner]
extensions = ["md", "markdown"]
ignore = ["drafts/"]
recursive = false

[output]
format = "json"
color = false
"#;
        let config: WikiConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.store.backend, Backend::Duckdb);
        assert_eq!(config.neo4j.user, "wiki");
        assert_eq!(config.neo4j.database.as_deref(), Some("pages"));
        assert_eq!(config.neo4j.max_connections, 8);
        assert_eq!(config.duckdb.path, PathBuf::from("data/wiki.duckdb"));
        assert_eq!(config.export.batch_size, 100);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert!(!config.scanner.recursive);
        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));
    }

    #[test]
    fn test_partial_neo4j_section_keeps_defaults() {
        let config: WikiConfig = toml::from_str("[neo4j]\nuser = \"reader\"\n").unwrap();
        assert_eq!(config.neo4j.user, "reader");
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.neo4j.max_connections, 4);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: WikiConfig =
            toml::from_str("[neo4j]\nuri = \"bolt://file:7687\"\npassword = \"file\"\n").unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_NEO4J_URI, "bolt://env:7687"),
            (ENV_NEO4J_PASSWORD, "from-env"),
            (ENV_BACKEND, "DuckDB"),
        ]);

        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.neo4j.uri, "bolt://env:7687");
        assert_eq!(config.neo4j.password, "from-env");
        assert_eq!(config.neo4j.user, "neo4j");
        assert_eq!(config.store.backend, Backend::Duckdb);
    }

    #[test]
    fn test_invalid_backend_env_is_error() {
        let mut config = WikiConfig::default();
        let err = config
            .apply_env(|key| (key == ENV_BACKEND).then(|| "sqlite".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("sqlite"));
    }

    #[test]
    fn test_invalid_default_file_falls_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[export\nbatch_size = ").unwrap();

        let config = WikiConfig::load(dir.path());
        assert_eq!(config.export.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_invalid_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[store]\nbackend = 3\n").unwrap();

        assert!(WikiConfig::load_from(&path).is_err());
        assert!(WikiConfig::load_from(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_scan_options_with_default_ignores() {
        let config: WikiConfig =
            toml::from_str("[scanner]\nignore = [\"drafts/\", \".git/\"]\n").unwrap();
        let options = config.scan_options();

        assert_eq!(options.ignore_patterns[0], "drafts/");
        assert_eq!(
            options
                .ignore_patterns
                .iter()
                .filter(|p| *p == ".git/")
                .count(),
            1
        );
        assert!(options.ignore_patterns.contains(&".wikigraph/".to_string()));
    }
}
