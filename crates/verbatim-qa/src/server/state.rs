//! Application state for the web front-end

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::{resolve_path, VerbatimConfig};
use crate::error::{self, Result};
use crate::format::{format_answer, FormatOptions};
use crate::ingestion::DocumentFolder;
use crate::pipeline;
use crate::session::ChatHistory;
use crate::storage::{IndexStats, VerbatimIndex};
use crate::types::QueryResponse;

/// Severity of a one-shot notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Message shown once on the next page render
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Preformatted detail (a diagnostic trace)
    pub detail: Option<String>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into(), detail: None }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into(), detail: None }
    }

    pub fn error(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into(), detail: Some(detail.into()) }
    }
}

/// State of one browser session
#[derive(Debug)]
pub struct Session {
    pub history: ChatHistory,
    pub notices: Vec<Notice>,
    last_seen: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            history: ChatHistory::default(),
            notices: Vec::new(),
            last_seen: Instant::now(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: VerbatimConfig,
    folder: DocumentFolder,
    db_path: PathBuf,
    sessions: DashMap<Uuid, Session>,
}

impl AppState {
    /// Create state, resolving paths and creating the documents folder
    pub fn new(config: VerbatimConfig) -> Result<Self> {
        let folder = DocumentFolder::new(resolve_path(&config.paths.docs_dir)?);
        folder.ensure_exists()?;
        let db_path = resolve_path(&config.paths.db_path)?;

        tracing::info!("Documents folder: {}", folder.path().display());
        tracing::info!("Index path: {}", db_path.display());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                folder,
                db_path,
                sessions: DashMap::new(),
            }),
        })
    }

    pub fn config(&self) -> &VerbatimConfig {
        &self.inner.config
    }

    pub fn folder(&self) -> &DocumentFolder {
        &self.inner.folder
    }

    pub fn db_path(&self) -> &Path {
        &self.inner.db_path
    }

    pub fn index_exists(&self) -> bool {
        self.inner.db_path.is_file()
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions::from(&self.inner.config.answer)
    }

    /// Run `f` against the session, creating it on first use
    pub fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> R {
        if !self.inner.sessions.contains_key(&id) {
            self.evict_sessions();
        }
        let mut session = self.inner.sessions.entry(id).or_insert_with(Session::new);
        session.last_seen = Instant::now();
        f(session.value_mut())
    }

    pub fn notify(&self, id: Uuid, notice: Notice) {
        self.with_session(id, |s| s.notices.push(notice));
    }

    /// Snapshot of the session history and its pending notices (which are consumed).
    /// Unknown sessions render empty and are not stored.
    pub fn take_view(&self, id: Uuid) -> (ChatHistory, Vec<Notice>) {
        match self.inner.sessions.get_mut(&id) {
            Some(mut session) => {
                session.last_seen = Instant::now();
                (session.history.clone(), std::mem::take(&mut session.notices))
            }
            None => (ChatHistory::default(), Vec::new()),
        }
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Drop expired sessions, then the least recently seen ones until a new one fits
    fn evict_sessions(&self) {
        let server = &self.inner.config.server;
        let ttl = Duration::from_secs(server.session_ttl_secs);
        let sessions = &self.inner.sessions;

        sessions.retain(|_, session| session.last_seen.elapsed() < ttl);

        let cap = server.max_sessions.max(1);
        while sessions.len() >= cap {
            let oldest = sessions
                .iter()
                .min_by_key(|entry| entry.value().last_seen)
                .map(|entry| *entry.key());
            match oldest {
                Some(id) => {
                    tracing::debug!("Evicting session {}", id);
                    sessions.remove(&id);
                }
                None => break,
            }
        }
    }

    /// Build the index from the documents folder
    pub async fn build_index(&self) -> Result<PathBuf> {
        let docs_dir = self.inner.folder.path().to_path_buf();
        let db_path = self.inner.db_path.clone();
        let index_config = self.inner.config.index.clone();

        tokio::task::spawn_blocking(move || {
            pipeline::build_index(&docs_dir, &db_path, &index_config)
        })
        .await
        .map_err(|e| error::Error::internal(format!("Build task failed: {}", e)))?
    }

    /// Ask a question against the current index
    pub async fn ask(&self, question: &str, k: Option<usize>) -> Result<QueryResponse> {
        let k = k.unwrap_or(self.inner.config.query.top_k);
        pipeline::ask(question, &self.inner.db_path, k, &self.inner.config).await
    }

    /// Record a question and its outcome in the session history
    pub async fn ask_in_session(&self, id: Uuid, question: &str) {
        let question = question.trim();
        if question.is_empty() {
            return;
        }
        self.with_session(id, |s| s.history.push_user(question));

        let reply = match self.ask(question, None).await {
            Ok(response) => format_answer(Some(&response), self.format_options()),
            Err(err) => {
                tracing::warn!("Query failed: {}", err);
                format!("Backend error:\n```\n{}\n```", error::diagnostic(err))
            }
        };
        self.with_session(id, |s| s.history.push_assistant(reply));
    }

    /// Statistics of the current index, if one exists
    pub async fn index_stats(&self) -> Result<Option<IndexStats>> {
        if !self.index_exists() {
            return Ok(None);
        }
        let db_path = self.inner.db_path.clone();
        let sparse_model = self.inner.config.index.sparse_model.clone();

        tokio::task::spawn_blocking(move || {
            VerbatimIndex::open(&sparse_model, &db_path)?.stats().map(Some)
        })
        .await
        .map_err(|e| error::Error::internal(format!("Stats task failed: {}", e)))?
    }
}
