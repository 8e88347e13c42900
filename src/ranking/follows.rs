//! Signal pools for "who to follow" suggestions
//!
//! Three pools, highest priority first:
//!
//! - **Affinity**: accounts followed by accounts the reader already
//!   follows, weighted by mutual-connection count.
//! - **Derived interest**: authors of stories the reader liked or
//!   bookmarked, at a flat score.
//! - **Popularity**: globally popular accounts, used to fill remaining
//!   slots.
//!
//! Each builder returns `Err` only when the pool as a whole is
//! unavailable; partial sub-query failures degrade within the pool.

use futures::future::join_all;
use indexmap::IndexMap;
use tracing::warn;

use crate::config::RankingWeights;
use crate::types::{EngineError, Result};

use super::candidate::{Candidate, SuggestionReason};
use super::signals::{ProfileSnapshot, SignalSource};

/// Affinity pool: mutual connections of the reader's follow graph.
///
/// Score: `follow_mutual_base + follow_mutual_per_connection × mutuals`.
pub(super) async fn mutual_connections(
    source: &dyn SignalSource,
    follows: &[String],
    weights: &RankingWeights,
) -> Result<Vec<Candidate>> {
    if follows.is_empty() {
        return Ok(Vec::new());
    }

    // Independent reads: fan out one followers query per followee
    let results = join_all(follows.iter().map(|id| source.followers_of(id))).await;

    let mut failures = 0usize;
    let mut mutual_counts: IndexMap<String, u64> = IndexMap::new();
    for (followee, outcome) in follows.iter().zip(results) {
        match outcome {
            Ok(followers) => {
                for follower in followers {
                    *mutual_counts.entry(follower).or_insert(0) += 1;
                }
            }
            Err(e) => {
                failures += 1;
                warn!(followee = %followee, error = %e, "Followers query failed; skipping edge");
            }
        }
    }
    if failures == follows.len() {
        return Err(EngineError::SignalSource(
            "every followers query failed".to_string(),
        ));
    }

    let ids: Vec<String> = mutual_counts.keys().cloned().collect();
    let snapshots = fetch_snapshots(source, &ids).await;

    Ok(mutual_counts
        .into_iter()
        .map(|(id, mutuals)| {
            let score = weights.follow_mutual_base
                + weights.follow_mutual_per_connection * mutuals as f64;
            attach_snapshot(
                Candidate::new(id.clone(), score, SuggestionReason::MutualConnections),
                snapshots.as_ref(),
                &id,
            )
        })
        .collect())
}

/// Derived-interest pool: authors of liked/bookmarked stories.
///
/// Flat score `follow_engaged_author`.
pub(super) async fn engaged_authors(
    source: &dyn SignalSource,
    reader_id: &str,
    weights: &RankingWeights,
) -> Result<Vec<Candidate>> {
    let (liked, bookmarked) = tokio::join!(
        source.liked_story_ids(reader_id),
        source.bookmarked_story_ids(reader_id)
    );

    let story_ids = match (liked, bookmarked) {
        (Err(e1), Err(e2)) => {
            return Err(EngineError::SignalSource(format!(
                "likes and bookmarks both unavailable: {}; {}",
                e1, e2
            )))
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
                        warn!(reader_id, error = %e, "Interaction query failed; pool continues on the other")
                    }
                }
            }
            ids
        }
    };
    if story_ids.is_empty() {
        return Ok(Vec::new());
    }

    let stories = source.stories_by_ids(&story_ids).await?;
    let mut authors: Vec<String> = Vec::new();
    for story in &stories {
        if !authors.contains(&story.author_id) {
            authors.push(story.author_id.clone());
        }
    }

    let snapshots = fetch_snapshots(source, &authors).await;
    Ok(authors
        .into_iter()
        .map(|id| {
            attach_snapshot(
                Candidate::new(
                    id.clone(),
                    weights.follow_engaged_author,
                    SuggestionReason::EngagedAuthor,
                ),
                snapshots.as_ref(),
                &id,
            )
        })
        .collect())
}

/// Popularity fallback pool.
///
/// Score: `followers × follow_popular_per_follower + stories ×
/// follow_popular_per_story`.
pub(super) async fn popular_profiles(
    source: &dyn SignalSource,
    fetch: usize,
    weights: &RankingWeights,
) -> Result<Vec<Candidate>> {
    let profiles = source.popular_profiles(fetch).await?;
    Ok(profiles
        .into_iter()
        .map(|profile| {
            let score = profile.followers_count as f64 * weights.follow_popular_per_follower
                + profile.stories_count as f64 * weights.follow_popular_per_story;
            let mut candidate =
                Candidate::new(profile.id.clone(), score, SuggestionReason::Popular);
            if let Ok(snapshot) = serde_json::to_value(&profile) {
                candidate = candidate.with_snapshot(snapshot);
            }
            candidate
        })
        .collect())
}

// =============================================================================
// Helpers
// =============================================================================

/// Display metadata is best-effort: a failed snapshot fetch downgrades the
/// candidates, it does not fail the pool.
async fn fetch_snapshots(
    source: &dyn SignalSource,
    ids: &[String],
) -> Option<Vec<ProfileSnapshot>> {
    if ids.is_empty() {
        return None;
    }
    match source.profiles_by_ids(ids).await {
        Ok(profiles) => Some(profiles),
        Err(e) => {
            warn!(error = %e, "Profile snapshot fetch failed; emitting bare candidates");
            None
        }
    }
}

fn attach_snapshot(
    candidate: Candidate,
    snapshots: Option<&Vec<ProfileSnapshot>>,
    id: &str,
) -> Candidate {
    let snapshot = snapshots
        .and_then(|all| all.iter().find(|p| p.id == id))
        .and_then(|p| serde_json::to_value(p).ok());
    match snapshot {
        Some(value) => candidate.with_snapshot(value),
        None => candidate,
    }
}
