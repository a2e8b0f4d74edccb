//! Configuration for the verbatim Q&A system
//!
//! Values come from three layers, later layers winning: built-in defaults, an
//! optional TOML file, then environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Sparse retrieval model recorded in newly built indexes
pub const DEFAULT_SPARSE_MODEL: &str =
    "opensearch-project/opensearch-neural-sparse-encoding-doc-v2-distill";

/// Default number of passages retrieved per question
pub const DEFAULT_TOP_K: usize = 16;

/// Environment variable names
pub mod env {
    pub const BASE_DIR: &str = "VERBATIM_BASE_DIR";
    pub const DOCS_DIR: &str = "DOCS_DIR";
    pub const DB_PATH: &str = "DB_PATH";
    pub const SPARSE_MODEL: &str = "VERBATIM_SPARSE_MODEL";
    pub const EXTRACTOR: &str = "VERBATIM_EXTRACTOR";
    pub const CONFIG: &str = "VERBATIM_CONFIG";
    pub const HOST: &str = "VERBATIM_HOST";
    pub const PORT: &str = "VERBATIM_PORT";
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbatimConfig {
    /// Document folder and index locations
    pub paths: PathsConfig,
    /// Index construction
    pub index: IndexConfig,
    /// Query defaults
    pub query: QueryConfig,
    /// Span extractor
    pub extractor: ExtractorConfig,
    /// Web UI server
    pub server: ServerConfig,
    /// Answer rendering
    pub answer: AnswerConfig,
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Base directory; the other two default to children of it
    pub base_dir: PathBuf,
    /// Folder holding uploaded PDFs
    pub docs_dir: PathBuf,
    /// Index database file
    pub db_path: PathBuf,
}

impl PathsConfig {
    /// Paths rooted at `base_dir`
    pub fn rooted_at(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            docs_dir: base_dir.join("doc"),
            db_path: base_dir.join("index.db"),
            base_dir,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base_dir = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
            .join("verbatim-rag");
        Self::rooted_at(base_dir)
    }
}

/// Index construction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Sparse model identifier stored with the index
    pub sparse_model: String,
    /// Target passage size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive passages in characters
    pub chunk_overlap: usize,
    /// Passages shorter than this are dropped
    pub min_chunk_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            sparse_model: DEFAULT_SPARSE_MODEL.to_string(),
            chunk_size: 1024,
            chunk_overlap: 200,
            min_chunk_size: 20,
        }
    }
}

/// Query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Passages retrieved per question
    pub top_k: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K }
    }
}

/// Span extractor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Model served by Ollama; `None` selects the built-in lexical extractor
    pub model: Option<String>,
    /// Ollama base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for failed requests
    pub max_retries: u32,
    /// Maximum spans kept per answer
    pub max_spans: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            model: None,
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 120,
            max_retries: 2,
            max_spans: 5,
        }
    }
}

/// Web UI server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS on the JSON API
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// Idle UI sessions older than this are dropped (default: 24h)
    pub session_ttl_secs: u64,
    /// Upper bound on live UI sessions; the least recently seen goes first
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            enable_cors: false,
            max_upload_size: 100 * 1024 * 1024,
            session_ttl_secs: 24 * 60 * 60,
            max_sessions: 10_000,
        }
    }
}

/// Answer rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Remove bullet glyphs from answer lines
    pub strip_bullets: bool,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self { strip_bullets: true }
    }
}

impl VerbatimConfig {
    /// Load configuration: defaults, then `path` (or `$VERBATIM_CONFIG`), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(env::CONFIG).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    ///
    /// `VERBATIM_BASE_DIR` rebases both paths; `DOCS_DIR` and `DB_PATH` then
    /// override them individually. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = get(env::BASE_DIR) {
            self.paths = PathsConfig::rooted_at(expand_home(Path::new(&base)));
        }
        if let Some(docs) = get(env::DOCS_DIR) {
            self.paths.docs_dir = expand_home(Path::new(&docs));
        }
        if let Some(db) = get(env::DB_PATH) {
            self.paths.db_path = expand_home(Path::new(&db));
        }
        if let Some(model) = get(env::SPARSE_MODEL) {
            self.index.sparse_model = model;
        }
        if let Some(extractor) = get(env::EXTRACTOR) {
            self.extractor.model = Some(extractor);
        }
        if let Some(host) = get(env::HOST) {
            self.server.host = host;
        }
        if let Some(port) = get(env::PORT) {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid {}={}", env::PORT, port),
            }
        }
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Expand `~` and make the path absolute without requiring it to exist
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    let expanded = expand_home(path);
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(std::env::current_dir()?.join(expanded))
    }
}
