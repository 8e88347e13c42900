//! Session registry
//!
//! Explicit session objects keyed by (reader, story) replace any notion of
//! a process-wide "current tracker". Concurrency control is per session
//! (each [`StorySession`] serializes its own transitions); the registry
//! only guarantees that concurrent callers for the same pair share one
//! instance.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::config::SessionConfig;
use crate::progress::ProgressStore;
use crate::tree::StoryTree;

use super::StorySession;

/// Shared registry of live (reader, story) sessions
pub struct SessionRegistry {
    store: Arc<dyn ProgressStore>,
    config: SessionConfig,
    sessions: DashMap<(String, String), Arc<StorySession>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn ProgressStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            sessions: DashMap::new(),
        }
    }

    /// Get or create the session for `(reader_id, tree.story)`.
    pub fn session(&self, reader_id: &str, tree: Arc<StoryTree>) -> Arc<StorySession> {
        let key = (reader_id.to_string(), tree.story().id.clone());
        let entry = self.sessions.entry(key).or_insert_with(|| {
            Arc::new(StorySession::new(
                reader_id,
                tree,
                Arc::clone(&self.store),
                self.config.clone(),
            ))
        });
        Arc::clone(entry.value())
    }

    /// Drop the live session object for a pair.
    ///
    /// Persisted progress is untouched; the next `session` call resumes
    /// from the store.
    pub fn end_session(&self, reader_id: &str, story_id: &str) {
        let key = (reader_id.to_string(), story_id.to_string());
        if self.sessions.remove(&key).is_some() {
            debug!(reader_id, story_id, "Session ended");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
