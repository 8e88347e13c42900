//! Error types for the Taleweave core engine
//!
//! One taxonomy for the whole crate. Structural input errors (bad tokens,
//! out-of-range depth) are rejected synchronously before any state changes;
//! storage-layer errors are absorbed with degraded behavior wherever the
//! engine can still make forward progress, and only total failure is
//! surfaced to callers.

/// Main error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A choice token that is not 'A' or 'B' reached a strict parser.
    #[error("Invalid path token: {0}")]
    InvalidPathToken(String),

    /// A path longer than the story's `max_depth` was supplied, or a choice
    /// was attempted at the depth limit.
    #[error("Path too deep: {len} tokens exceeds max depth {max}")]
    PathTooDeep { len: usize, max: u32 },

    /// A choice was made against tree data that no longer matches the
    /// persisted structure. Surfaced to the caller; no local recovery.
    #[error("Stale tree: {0}")]
    StaleTree(String),

    /// Progress could not be written. Non-fatal to in-memory navigation.
    #[error("Persistence write failed: {0}")]
    PersistenceWriteFailed(String),

    /// Every signal pool failed; the caller falls back to an empty or
    /// cached list.
    #[error("Ranking unavailable: {0}")]
    RankingUnavailable(String),

    /// A single signal-source query failed. Absorbed at the pool level and
    /// only visible to callers through `RankingUnavailable`.
    #[error("Signal source error: {0}")]
    SignalSource(String),

    /// A progress-store read failed. Absorbed during session initialization.
    #[error("Progress store error: {0}")]
    ProgressStore(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
