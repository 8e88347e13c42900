//! Ranking candidates and the priority merge
//!
//! The merge is a deliberate ordering contract: pools are offered in
//! priority order (affinity → derived interest → popularity) into one
//! id-keyed set, and the first write wins outright - a lower-priority
//! pool's entry for an id that is already present is discarded entirely,
//! never overwritten or averaged. Candidates keep their offer order, so
//! the final stable sort breaks score ties by pool priority and then by
//! signal-source order.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

// =============================================================================
// Types
// =============================================================================

/// Why an entity was surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionReason {
    /// Followed by accounts the reader already follows
    MutualConnections,
    /// Authors the reader liked or bookmarked
    EngagedAuthor,
    /// Story by an author the reader follows
    FollowedAuthor,
    /// Other story by an author the reader engaged with
    FamiliarAuthor,
    /// Globally popular fallback
    Popular,
}

/// Scored, ephemeral entity produced during one ranking computation.
///
/// Exists only within the call that created it; nothing here is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub entity_id: String,
    pub score: f64,
    pub reason: SuggestionReason,
    /// Raw snapshot for the rendering layer (counts, handles, titles)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<serde_json::Value>,
}

impl Candidate {
    pub fn new(entity_id: impl Into<String>, score: f64, reason: SuggestionReason) -> Self {
        Self {
            entity_id: entity_id.into(),
            score,
            reason,
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: serde_json::Value) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

// =============================================================================
// First-write-wins merge set
// =============================================================================

/// Id-keyed candidate set with first-write-wins semantics.
///
/// Offer candidates in pool priority order; excluded ids never get in
/// regardless of score.
pub struct CandidateSet {
    excluded: HashSet<String>,
    seen: HashSet<String>,
    ordered: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new(excluded: HashSet<String>) -> Self {
        Self {
            excluded,
            seen: HashSet::new(),
            ordered: Vec::new(),
        }
    }

    /// Offer one candidate. Dropped silently when its id is excluded or a
    /// higher-priority pool already claimed it.
    pub fn offer(&mut self, candidate: Candidate) {
        if self.excluded.contains(&candidate.entity_id) {
            debug!(entity_id = %candidate.entity_id, "Candidate excluded");
            return;
        }
        if !self.seen.insert(candidate.entity_id.clone()) {
            debug!(
                entity_id = %candidate.entity_id,
                "Candidate already claimed by a higher-priority pool"
            );
            return;
        }
        self.ordered.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Stable sort by score descending, then truncate.
    ///
    /// `Vec::sort_by` is stable, so equal scores keep offer order - pool
    /// priority first, signal-source order within a pool.
    pub fn into_ranked(self, limit: usize) -> Vec<Candidate> {
        let mut ranked = self.ordered;
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(limit);
        ranked
    }
}

// =============================================================================
// Tests
// =============================================================================
