//! Signal source collaborator
//!
//! The ranking pipeline pulls weak signals (follow edges, likes,
//! bookmarks, popularity counts) through this trait. Any backend exposing
//! equivalent filtered-query operations plugs in; transport is out of
//! scope. Queries are independent reads, so the engine issues them
//! concurrently and degrades per pool when one fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Result;

// =============================================================================
// Snapshots
// =============================================================================

/// Profile fields the ranking surfaces need
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub followers_count: u64,
    pub stories_count: u64,
}

impl ProfileSnapshot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: None,
            display_name: None,
            followers_count: 0,
            stories_count: 0,
        }
    }

    pub fn with_counts(mut self, followers: u64, stories: u64) -> Self {
        self.followers_count = followers;
        self.stories_count = stories;
        self
    }
}

/// Story fields the ranking surfaces need
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySnapshot {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub likes: u64,
    pub views: u64,
}

impl StorySnapshot {
    pub fn new(id: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            title: String::new(),
            likes: 0,
            views: 0,
        }
    }

    pub fn with_engagement(mut self, likes: u64, views: u64) -> Self {
        self.likes = likes;
        self.views = views;
        self
    }
}

// =============================================================================
// Collaborator trait
// =============================================================================

/// Filtered-query surface over the relational backend.
///
/// Result ordering matters: tie-broken candidates keep the order a query
/// returned them in, so implementations should return rows in a stable
/// order (typically recency or store order).
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Profile ids `profile_id` follows
    async fn follows_of(&self, profile_id: &str) -> Result<Vec<String>>;

    /// Profile ids following `profile_id`
    async fn followers_of(&self, profile_id: &str) -> Result<Vec<String>>;

    /// Story ids `profile_id` liked
    async fn liked_story_ids(&self, profile_id: &str) -> Result<Vec<String>>;

    /// Story ids `profile_id` bookmarked
    async fn bookmarked_story_ids(&self, profile_id: &str) -> Result<Vec<String>>;

    /// Story snapshots for an id set (missing ids are simply absent)
    async fn stories_by_ids(&self, ids: &[String]) -> Result<Vec<StorySnapshot>>;

    /// Story snapshots authored by any of `author_ids`
    async fn stories_by_authors(&self, author_ids: &[String]) -> Result<Vec<StorySnapshot>>;

    /// Profile snapshots for an id set (missing ids are simply absent)
    async fn profiles_by_ids(&self, ids: &[String]) -> Result<Vec<ProfileSnapshot>>;

    /// Globally popular profiles with counts, most popular first
    async fn popular_profiles(&self, limit: usize) -> Result<Vec<ProfileSnapshot>>;

    /// Globally popular stories with counts, most popular first
    async fn popular_stories(&self, limit: usize) -> Result<Vec<StorySnapshot>>;
}
