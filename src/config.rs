//! Engine configuration
//!
//! Plain structs with `Default` impls. The default ranking weights are the
//! normative scoring constants; deployments tune them rather than patching
//! the pipeline.

/// Scoring weights for the ranking pipeline.
///
/// Follow-suggestion and story-recommendation formulas are kept side by
/// side so a tuning pass sees the whole surface at once.
#[derive(Debug, Clone)]
pub struct RankingWeights {
    /// Base score for a mutual-connection candidate
    pub follow_mutual_base: f64,
    /// Added per mutual connection
    pub follow_mutual_per_connection: f64,
    /// Flat score for authors the reader liked or bookmarked
    pub follow_engaged_author: f64,
    /// Popularity fallback: per follower
    pub follow_popular_per_follower: f64,
    /// Popularity fallback: per published story
    pub follow_popular_per_story: f64,

    /// Flat score for stories by authors the reader follows
    pub story_followed_author: f64,
    /// Base score for other stories by authors the reader engaged with
    pub story_familiar_base: f64,
    /// Familiar-author bonus per like
    pub story_familiar_per_like: f64,
    /// Familiar-author bonus per view
    pub story_familiar_per_view: f64,
    /// Popularity fallback: per like
    pub story_popular_per_like: f64,
    /// Popularity fallback: per view
    pub story_popular_per_view: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            follow_mutual_base: 100.0,
            follow_mutual_per_connection: 10.0,
            follow_engaged_author: 50.0,
            follow_popular_per_follower: 2.0,
            follow_popular_per_story: 5.0,

            story_followed_author: 100.0,
            story_familiar_base: 50.0,
            story_familiar_per_like: 0.1,
            story_familiar_per_view: 0.01,
            story_popular_per_like: 0.2,
            story_popular_per_view: 0.02,
        }
    }
}

/// Configuration for the ranking engine
#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Scoring weights
    pub weights: RankingWeights,
    /// How many globally popular entities to pull for the fallback pool
    pub popular_fetch: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            popular_fetch: 50,
        }
    }
}

/// Configuration for reader sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Extra attempts for a failed progress write before dropping it.
    /// Writes are never allowed to block the in-memory state machine.
    pub persist_retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { persist_retries: 1 }
    }
}
