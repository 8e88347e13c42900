//! Reader progress persistence
//!
//! Progress is the per-(reader, story) record of where a reader currently
//! stands in a tree. It is created lazily on first navigation, updated on
//! every choice or URL-driven path change, and read on session resume. The
//! engine never deletes it; retention is the backing store's concern.
//!
//! The store itself is a collaborator behind [`ProgressStore`]; any backend
//! with equivalent load/save semantics plugs in. [`MemoryProgressStore`] is
//! the in-process reference implementation used by tests and single-node
//! deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::tree::Path;
use crate::types::Result;

// =============================================================================
// Types
// =============================================================================

/// Persisted (reader, story) → current path mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub reader_id: String,
    pub story_id: String,
    pub current_path: Path,
    pub last_viewed_at: DateTime<Utc>,
}

// =============================================================================
// Store collaborator
// =============================================================================

/// Storage collaborator for reader progress.
///
/// Implementations are expected to scope rows to the owning reader; the
/// engine never reads one reader's progress on behalf of another.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load the progress row for `(reader_id, story_id)`, if any.
    async fn load(&self, reader_id: &str, story_id: &str) -> Result<Option<Progress>>;

    /// Upsert the progress row for `(reader_id, story_id)`.
    async fn save(
        &self,
        reader_id: &str,
        story_id: &str,
        path: &Path,
        at: DateTime<Utc>,
    ) -> Result<()>;
}

// =============================================================================
// In-memory reference implementation
// =============================================================================

/// `DashMap`-backed progress store for tests and single-node deployments
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    rows: DashMap<(String, String), Progress>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn load(&self, reader_id: &str, story_id: &str) -> Result<Option<Progress>> {
        let key = (reader_id.to_string(), story_id.to_string());
        Ok(self.rows.get(&key).map(|row| row.clone()))
    }

    async fn save(
        &self,
        reader_id: &str,
        story_id: &str,
        path: &Path,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let key = (reader_id.to_string(), story_id.to_string());
        self.rows.insert(
            key,
            Progress {
                reader_id: reader_id.to_string(),
                story_id: story_id.to_string(),
                current_path: path.clone(),
                last_viewed_at: at,
            },
        );
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
