//! Reader sessions - the path-tracking state machine
//!
//! One [`StorySession`] exists per (reader, story) pair and owns every path
//! mutation for that pair: choice taps, shared-link overrides, and the sync
//! between the in-memory path, the shareable URL token, and persisted
//! progress.
//!
//! ## State machine
//!
//! ```text
//! Uninitialized ──initialize──▶ AtDepth(path) ──make_choice──▶ AtDepth / Terminal
//!                                    ▲                               │
//!                                    └──────set_path_from_url────────┘
//! ```
//!
//! `Terminal` holds whenever the path has reached `max_depth` or the
//! resolved position has no authored children.
//!
//! ## Ordering
//!
//! A session serializes its own transitions behind a `tokio::sync::Mutex`:
//! a second call issued while one is in flight waits for the first to
//! settle and then operates on the settled state, so no transition ever
//! applies to an out-of-date path and the exported URL token always agrees
//! with the path that produced it.
//!
//! ## Persistence
//!
//! Progress writes are absorbed: a failed write is retried per
//! [`SessionConfig::persist_retries`] and then dropped with a warning. The
//! reader keeps navigating on the in-memory state either way.

pub mod registry;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::progress::ProgressStore;
use crate::tree::{Choice, ChoiceToken, Path, StoryTree};
use crate::types::{EngineError, Result};

pub use registry::SessionRegistry;

// =============================================================================
// State
// =============================================================================

/// Tracker state for one (reader, story) session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackerState {
    /// No navigation has happened yet this session
    Uninitialized,
    /// Reader stands at `path` and can still descend
    AtDepth { path: Path },
    /// Reader stands at `path` and cannot descend further
    Terminal { path: Path },
}

impl TrackerState {
    /// Current path; the empty path before initialization
    pub fn path(&self) -> Path {
        match self {
            Self::Uninitialized => Path::empty(),
            Self::AtDepth { path } | Self::Terminal { path } => path.clone(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }
}

/// The two next choices offered at the current position
#[derive(Debug, Clone, Serialize)]
pub struct ChoicePair {
    pub a: Choice,
    pub b: Choice,
}

/// Snapshot handed to the rendering layer after any transition settles.
///
/// `url_token` is re-encoded from the settled path, so the two can never
/// disagree in what a caller observes.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub story_id: String,
    pub path: Path,
    pub depth: u32,
    pub terminal: bool,
    pub url_token: String,
    /// `None` when the current path is dangling (tree changed under us)
    pub choices: Option<ChoicePair>,
}

struct TrackerInner {
    state: TrackerState,
    /// Set by the first `initialize` or URL override; once set, persisted
    /// progress is never consulted again this session.
    initialized: bool,
}

// =============================================================================
// Story session
// =============================================================================

/// Per-(reader, story) path tracker.
///
/// Create through [`SessionRegistry`] so concurrent callers share one
/// serialized instance per pair.
pub struct StorySession {
    session_id: String,
    reader_id: String,
    tree: Arc<StoryTree>,
    store: Arc<dyn ProgressStore>,
    config: SessionConfig,
    inner: Mutex<TrackerInner>,
}

impl StorySession {
    pub fn new(
        reader_id: impl Into<String>,
        tree: Arc<StoryTree>,
        store: Arc<dyn ProgressStore>,
        config: SessionConfig,
    ) -> Self {
        let session_id = Uuid::new_v4().to_string();
        let reader_id = reader_id.into();
        info!(
            session_id = %session_id,
            reader_id = %reader_id,
            story_id = %tree.story().id,
            max_depth = tree.max_depth(),
            "Story session created"
        );
        Self {
            session_id,
            reader_id,
            tree,
            store,
            config,
            inner: Mutex::new(TrackerInner {
                state: TrackerState::Uninitialized,
                initialized: false,
            }),
        }
    }

    pub fn reader_id(&self) -> &str {
        &self.reader_id
    }

    pub fn story_id(&self) -> &str {
        &self.tree.story().id
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Enter the session's starting state.
    ///
    /// An explicit path (from a shared URL) wins over persisted progress;
    /// otherwise progress is loaded and the reader resumes where they left
    /// off; otherwise the session starts at the root. Runs at most once -
    /// later calls are no-ops returning the current view, so a stale stored
    /// path can never clobber a user-driven navigation mid-session.
    pub async fn initialize(&self, explicit_path: Option<Path>) -> Result<SessionView> {
        let mut inner = self.inner.lock().await;
        if inner.initialized {
            debug!(session_id = %self.session_id, "Session already initialized; keeping current state");
            return Ok(self.view_of(&inner));
        }

        let path = match explicit_path {
            Some(path) => {
                self.check_depth(&path)?;
                debug!(session_id = %self.session_id, path = %path, "Initializing from explicit path");
                path
            }
            None => match self.store.load(&self.reader_id, self.story_id()).await {
                Ok(Some(progress)) => {
                    // A story edit may have shortened or pruned the tree
                    // since this row was written; resume at the deepest
                    // surviving ancestor rather than a dead position.
                    let stored = progress
                        .current_path
                        .truncated(self.tree.max_depth() as usize);
                    let resumed = self.tree.longest_resolvable_prefix(&stored);
                    if resumed != stored {
                        debug!(
                            session_id = %self.session_id,
                            stored = %stored,
                            resumed = %resumed,
                            "Stored progress no longer resolves; resuming at ancestor"
                        );
                    }
                    resumed
                }
                Ok(None) => Path::empty(),
                Err(e) => {
                    // A storage hiccup must never produce a navigation
                    // dead-end; start at the root instead.
                    warn!(
                        session_id = %self.session_id,
                        error = %e,
                        "Progress load failed; starting at root"
                    );
                    Path::empty()
                }
            },
        };

        inner.state = self.state_for(path);
        inner.initialized = true;
        Ok(self.view_of(&inner))
    }

    /// Take one choice from the current position.
    ///
    /// Rejected without mutation at the depth limit; aborted with
    /// [`EngineError::StaleTree`] when the chosen child was never authored
    /// (the rendering layer is showing stale node data).
    pub async fn make_choice(&self, token: ChoiceToken) -> Result<SessionView> {
        let mut inner = self.inner.lock().await;
        if !inner.initialized {
            // First navigation into the story creates the session state
            inner.state = self.state_for(Path::empty());
            inner.initialized = true;
        }

        let current = inner.state.path();
        if current.depth() >= self.tree.max_depth() {
            return Err(EngineError::PathTooDeep {
                len: current.len() + 1,
                max: self.tree.max_depth(),
            });
        }

        let next = current.child(token);
        if self.tree.resolve(&next).is_none() {
            return Err(EngineError::StaleTree(format!(
                "no node at path '{}' in story {}",
                next,
                self.story_id()
            )));
        }

        debug!(
            session_id = %self.session_id,
            token = %token,
            path = %next,
            depth = next.depth(),
            "Choice applied"
        );
        inner.state = self.state_for(next.clone());
        self.persist(&next).await;
        Ok(self.view_of(&inner))
    }

    /// External path override (back/forward navigation or a shared link).
    ///
    /// Re-validates and re-enters the matching state without `make_choice`
    /// sequencing; supersedes any loaded progress for the rest of the
    /// session.
    pub async fn set_path_from_url(&self, path: Path) -> Result<SessionView> {
        self.check_depth(&path)?;
        let mut inner = self.inner.lock().await;
        debug!(session_id = %self.session_id, path = %path, "Path set from URL");
        inner.state = self.state_for(path.clone());
        inner.initialized = true;
        self.persist(&path).await;
        Ok(self.view_of(&inner))
    }

    /// Decode a raw URL token and apply it.
    ///
    /// Invalid tokens in the link are discarded and the result is clamped
    /// to the story's depth limit, so a mangled shared link degrades
    /// instead of failing.
    pub async fn set_path_from_token(&self, raw: &str) -> Result<SessionView> {
        let path = Path::from_url_token(raw).truncated(self.tree.max_depth() as usize);
        self.set_path_from_url(path).await
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Current state without mutating anything.
    pub async fn view(&self) -> SessionView {
        let inner = self.inner.lock().await;
        self.view_of(&inner)
    }

    /// URL token for the current path.
    pub async fn export_url_token(&self) -> String {
        let inner = self.inner.lock().await;
        inner.state.path().to_url_token()
    }

    /// Current tracker state (for surfaces that render the raw machine).
    pub async fn state(&self) -> TrackerState {
        let inner = self.inner.lock().await;
        inner.state.clone()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn check_depth(&self, path: &Path) -> Result<()> {
        if path.depth() > self.tree.max_depth() {
            return Err(EngineError::PathTooDeep {
                len: path.len(),
                max: self.tree.max_depth(),
            });
        }
        Ok(())
    }

    fn state_for(&self, path: Path) -> TrackerState {
        if self.tree.is_terminal(&path) {
            TrackerState::Terminal { path }
        } else {
            TrackerState::AtDepth { path }
        }
    }

    fn view_of(&self, inner: &TrackerInner) -> SessionView {
        let path = inner.state.path();
        let choices = self
            .tree
            .child_choices(&path)
            .map(|(a, b)| ChoicePair {
                a: a.clone(),
                b: b.clone(),
            });
        SessionView {
            story_id: self.story_id().to_string(),
            depth: path.depth(),
            terminal: self.tree.is_terminal(&path),
            url_token: path.to_url_token(),
            path,
            choices,
        }
    }

    /// Write progress, retrying per config. Failures never block the
    /// in-memory transition.
    async fn persist(&self, path: &Path) {
        let attempts = 1 + self.config.persist_retries;
        for attempt in 1..=attempts {
            match self
                .store
                .save(&self.reader_id, self.story_id(), path, chrono::Utc::now())
                .await
            {
                Ok(()) => return,
                Err(e) if attempt < attempts => {
                    debug!(
                        session_id = %self.session_id,
                        attempt,
                        error = %e,
                        "Progress write failed; retrying"
                    );
                }
                Err(e) => {
                    warn!(
                        session_id = %self.session_id,
                        reader_id = %self.reader_id,
                        story_id = %self.story_id(),
                        error = %e,
                        "Progress write failed; keeping in-memory state"
                    );
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
