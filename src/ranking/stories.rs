//! Signal pools for story recommendations
//!
//! Same pool shape as follow suggestions, over stories:
//!
//! - **Affinity**: stories authored by people the reader follows.
//! - **Derived interest**: other stories by authors of content the reader
//!   liked or bookmarked.
//! - **Popularity**: globally popular stories as the fill.
//!
//! The reader's own stories never surface; each builder filters them out
//! by author before the merge sees them.

use tracing::warn;

use crate::config::RankingWeights;
use crate::types::Result;

use super::candidate::{Candidate, SuggestionReason};
use super::signals::{SignalSource, StorySnapshot};

/// Affinity pool: stories by followed authors, flat score.
pub(super) async fn followed_authors(
    source: &dyn SignalSource,
    reader_id: &str,
    follows: &[String],
    weights: &RankingWeights,
) -> Result<Vec<Candidate>> {
    if follows.is_empty() {
        return Ok(Vec::new());
    }
    let stories = source.stories_by_authors(follows).await?;
    Ok(stories
        .into_iter()
        .filter(|s| s.author_id != reader_id)
        .map(|story| {
            to_candidate(
                story,
                weights.story_followed_author,
                SuggestionReason::FollowedAuthor,
            )
        })
        .collect())
}

/// Derived-interest pool: other stories by authors the reader engaged with.
///
/// Score: `story_familiar_base + likes × story_familiar_per_like + views ×
/// story_familiar_per_view`. The interacted stories themselves are in the
/// exclusion set, so only the authors' other work can surface.
pub(super) async fn familiar_authors(
    source: &dyn SignalSource,
    reader_id: &str,
    interacted_story_ids: &[String],
    weights: &RankingWeights,
) -> Result<Vec<Candidate>> {
    if interacted_story_ids.is_empty() {
        return Ok(Vec::new());
    }

    let interacted = source.stories_by_ids(interacted_story_ids).await?;
    let mut authors: Vec<String> = Vec::new();
    for story in &interacted {
        if story.author_id != reader_id && !authors.contains(&story.author_id) {
            authors.push(story.author_id.clone());
        }
    }
    if authors.is_empty() {
        return Ok(Vec::new());
    }

    let stories = source.stories_by_authors(&authors).await?;
    Ok(stories
        .into_iter()
        .filter(|s| s.author_id != reader_id)
        .map(|story| {
            let score = weights.story_familiar_base
                + story.likes as f64 * weights.story_familiar_per_like
                + story.views as f64 * weights.story_familiar_per_view;
            to_candidate(story, score, SuggestionReason::FamiliarAuthor)
        })
        .collect())
}

/// Popularity fallback pool.
///
/// Score: `likes × story_popular_per_like + views × story_popular_per_view`.
pub(super) async fn popular_stories(
    source: &dyn SignalSource,
    reader_id: &str,
    fetch: usize,
    weights: &RankingWeights,
) -> Result<Vec<Candidate>> {
    let stories = source.popular_stories(fetch).await?;
    Ok(stories
        .into_iter()
        .filter(|s| s.author_id != reader_id)
        .map(|story| {
            let score = story.likes as f64 * weights.story_popular_per_like
                + story.views as f64 * weights.story_popular_per_view;
            to_candidate(story, score, SuggestionReason::Popular)
        })
        .collect())
}

// =============================================================================
// Helpers
// =============================================================================

fn to_candidate(story: StorySnapshot, score: f64, reason: SuggestionReason) -> Candidate {
    let mut candidate = Candidate::new(story.id.clone(), score, reason);
    match serde_json::to_value(&story) {
        Ok(snapshot) => candidate = candidate.with_snapshot(snapshot),
        Err(e) => warn!(story_id = %story.id, error = %e, "Story snapshot not serializable"),
    }
    candidate
}
