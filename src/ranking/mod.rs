//! Multi-signal ranking engine
//!
//! One pipeline, two products: "recommended stories" for the feed and
//! "who to follow" for profile surfaces. Signals come from a
//! [`SignalSource`] collaborator as three weighted pools per product;
//! pools are fetched concurrently (they are independent reads), merged
//! first-write-wins in priority order, filtered against an exclusion set,
//! stably sorted by score, and truncated.
//!
//! ## Failure model
//!
//! A failed pool is logged and treated as empty - readers get partial
//! results, not errors. Only when every pool fails does a call return
//! [`EngineError::RankingUnavailable`], and the caller falls back to an
//! empty or cached list. Nothing is mutated, so cancelling a call
//! mid-flight just discards whatever was fetched.

pub mod candidate;
pub mod signals;

mod follows;
mod stories;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RankingConfig;
use crate::types::{EngineError, Result};

pub use candidate::{Candidate, CandidateSet, SuggestionReason};
pub use signals::{ProfileSnapshot, SignalSource, StorySnapshot};

// =============================================================================
// Engine
// =============================================================================

/// Deterministic weighted-heuristic ranker over a signal source
pub struct RankingEngine {
    source: Arc<dyn SignalSource>,
    config: RankingConfig,
}

impl RankingEngine {
    pub fn new(source: Arc<dyn SignalSource>) -> Self {
        Self::with_config(source, RankingConfig::default())
    }

    pub fn with_config(source: Arc<dyn SignalSource>, config: RankingConfig) -> Self {
        Self { source, config }
    }

    /// "Who to follow" suggestions for `reader_id`.
    ///
    /// The reader and every account they already follow are excluded from
    /// the output regardless of pool scores.
    pub async fn suggest_follows(&self, reader_id: &str, limit: usize) -> Result<Vec<Candidate>> {
        // The follow list feeds both the affinity pool and the exclusion
        // set, so it is fetched up front.
        let follows = match self.source.follows_of(reader_id).await {
            Ok(follows) => Some(follows),
            Err(e) => {
                warn!(reader_id, error = %e, "Follow-edge query failed; affinity pool unavailable");
                None
            }
        };

        let mut excluded: HashSet<String> = HashSet::new();
        excluded.insert(reader_id.to_string());
        if let Some(follows) = &follows {
            excluded.extend(follows.iter().cloned());
        }

        let source = self.source.as_ref();
        let weights = &self.config.weights;
        let (affinity, interest, popularity) = tokio::join!(
            async {
                match &follows {
                    Some(follows) => follows::mutual_connections(source, follows, weights).await,
                    None => Err(EngineError::SignalSource(
                        "follow edges unavailable".to_string(),
                    )),
                }
            },
            follows::engaged_authors(source, reader_id, weights),
            follows::popular_profiles(source, self.config.popular_fetch, weights),
        );

        merge_pools(
            "follow_suggestions",
            reader_id,
            excluded,
            [
                ("affinity", affinity),
                ("derived_interest", interest),
                ("popularity", popularity),
            ],
            limit,
        )
    }

    /// Recommended stories for `reader_id`'s feed.
    ///
    /// `exclude_story` is the story currently being viewed, if any; it and
    /// every story the reader already liked or bookmarked (already
    /// surfaced) never appear, and neither do the reader's own stories.
    pub async fn recommend_stories(
        &self,
        reader_id: &str,
        limit: usize,
        exclude_story: Option<&str>,
    ) -> Result<Vec<Candidate>> {
        let follows = match self.source.follows_of(reader_id).await {
            Ok(follows) => Some(follows),
            Err(e) => {
                warn!(reader_id, error = %e, "Follow-edge query failed; affinity pool unavailable");
                None
            }
        };

        // Liked/bookmarked ids feed the derived-interest pool and the
        // exclusion set. One of the two queries failing degrades to the
        // other; both failing disables the pool.
        let (liked, bookmarked) = tokio::join!(
            self.source.liked_story_ids(reader_id),
            self.source.bookmarked_story_ids(reader_id)
        );
        let interactions: Option<Vec<String>> = match (liked, bookmarked) {
            (Err(e1), Err(e2)) => {
                warn!(
                    reader_id,
                    likes_error = %e1,
                    bookmarks_error = %e2,
                    "Interaction queries failed; derived-interest pool unavailable"
                );
                None
            }
            (liked, bookmarked) => {
                let mut ids: Vec<String> = Vec::new();
                for outcome in [liked, bookmarked] {
                    match outcome {
                        Ok(more) => {
                            for id in more {
                                if !ids.contains(&id) {
                                    ids.push(id);
                                }
                            }
                        }
                        Err(e) => {
                            warn!(reader_id, error = %e, "Interaction query failed; continuing on the other")
                        }
                    }
                }
                Some(ids)
            }
        };

        let mut excluded: HashSet<String> = HashSet::new();
        if let Some(story_id) = exclude_story {
            excluded.insert(story_id.to_string());
        }
        if let Some(interacted) = &interactions {
            excluded.extend(interacted.iter().cloned());
        }

        let source = self.source.as_ref();
        let weights = &self.config.weights;
        let (affinity, interest, popularity) = tokio::join!(
            async {
                match &follows {
                    Some(follows) => {
                        stories::followed_authors(source, reader_id, follows, weights).await
                    }
                    None => Err(EngineError::SignalSource(
                        "follow edges unavailable".to_string(),
                    )),
                }
            },
            async {
                match &interactions {
                    Some(interacted) => {
                        stories::familiar_authors(source, reader_id, interacted, weights).await
                    }
                    None => Err(EngineError::SignalSource(
                        "interaction signals unavailable".to_string(),
                    )),
                }
            },
            stories::popular_stories(source, reader_id, self.config.popular_fetch, weights),
        );

        merge_pools(
            "story_recommendations",
            reader_id,
            excluded,
            [
                ("affinity", affinity),
                ("derived_interest", interest),
                ("popularity", popularity),
            ],
            limit,
        )
    }
}

// =============================================================================
// Merge
// =============================================================================

/// Fold the three pool outcomes into one ranked list.
///
/// Explicit ordered-pool iteration, never sort-then-dedup: the first pool
/// to claim an id keeps it.
fn merge_pools(
    surface: &str,
    reader_id: &str,
    excluded: HashSet<String>,
    pools: [(&'static str, Result<Vec<Candidate>>); 3],
    limit: usize,
) -> Result<Vec<Candidate>> {
    let mut set = CandidateSet::new(excluded);
    let mut failed = 0usize;

    for (pool, outcome) in pools {
        match outcome {
            Ok(candidates) => {
                debug!(surface, pool, count = candidates.len(), "Pool collected");
                for candidate in candidates {
                    set.offer(candidate);
                }
            }
            Err(e) => {
                failed += 1;
                warn!(surface, pool, error = %e, "Signal pool failed; continuing without it");
            }
        }
    }

    if failed == 3 {
        return Err(EngineError::RankingUnavailable(format!(
            "all signal pools failed for {} (reader {})",
            surface, reader_id
        )));
    }

    Ok(set.into_ranked(limit))
}

// =============================================================================
// Tests
// =============================================================================
