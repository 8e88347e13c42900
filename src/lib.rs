//! Taleweave Core - domain engine for the branching-story platform
//!
//! A story on Taleweave is a root post followed by a binary tree of choice
//! nodes; readers walk a path through the tree and the platform ranks
//! stories and people to surface to each reader. This crate is the
//! algorithmic core behind that experience:
//!
//! - **tree**: the branching-tree domain model - stories, nodes, paths,
//!   and resolution. Pure data, no I/O.
//! - **session**: the per-(reader, story) path tracker - navigation state,
//!   depth limits, shareable URL tokens, and progress sync.
//! - **ranking**: the multi-signal ranking engine behind "recommended
//!   stories" and "who to follow".
//!
//! Storage, authentication, billing, media, and rendering live elsewhere;
//! this crate reaches them only through the [`progress::ProgressStore`]
//! and [`ranking::SignalSource`] collaborator traits.

pub mod config;
pub mod progress;
pub mod ranking;
pub mod session;
pub mod tree;
pub mod types;

pub use config::{RankingConfig, RankingWeights, SessionConfig};
pub use ranking::RankingEngine;
pub use session::{SessionRegistry, StorySession};
pub use tree::{Path, StoryTree};
pub use types::{EngineError, Result};
