//! Branching story trees
//!
//! A story is a root post followed by a binary tree of choice nodes. The
//! tree is stored as an arena keyed by the path prefix that reaches each
//! node, so resolution is an indexed lookup instead of pointer chasing and
//! there is no cyclic-reference bookkeeping.
//!
//! Tree data is authored by the story creator and immutable to readers;
//! this module does no I/O.
//!
//! ```text
//! Story (depth 0, carries the root choice pair)
//!   ├── A  → StoryNode (depth 1, path [A])
//!   │        ├── A → StoryNode (depth 2, path [A,A])
//!   │        └── B → (dangling - never authored)
//!   └── B  → StoryNode (depth 1, path [B])
//! ```

pub mod path;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use path::{ChoiceToken, Path};

use crate::types::{EngineError, Result};

/// Default branching depth limit for new stories
pub const DEFAULT_MAX_DEPTH: u32 = 5;

// =============================================================================
// Data model
// =============================================================================

/// One outgoing choice from a branch point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Short label shown on the choice button
    pub label: String,
    /// Optional body text revealed when the choice is taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Optional media reference (store-issued handle or URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

impl Choice {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: None,
            media: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }
}

/// Aggregate engagement counters on a story
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StoryCounters {
    pub likes: u64,
    pub views: u64,
    pub paths: u64,
    pub shares: u64,
}

/// Root content item and implicit root of its choice tree (depth 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    /// Media reference for the root post
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    /// Maximum tree depth readers can navigate to
    pub max_depth: u32,
    pub author_id: String,
    #[serde(default)]
    pub counters: StoryCounters,
    /// The root's own outgoing choice pair (virtual depth-0 node)
    pub choice_a: Choice,
    pub choice_b: Choice,
}

impl Story {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author_id: impl Into<String>,
        choice_a: Choice,
        choice_b: Choice,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            media: None,
            max_depth: DEFAULT_MAX_DEPTH,
            author_id: author_id.into(),
            counters: StoryCounters::default(),
            choice_a,
            choice_b,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// One branch point, reachable at a specific depth via a specific path prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryNode {
    pub id: String,
    pub story_id: String,
    /// `None` only for depth-1 nodes whose parent is the story root
    pub parent_node_id: Option<String>,
    /// Tree level, `1..=max_depth`; always equals the arrival path length
    pub depth: u32,
    pub choice_a: Choice,
    pub choice_b: Choice,
}

/// Position in a tree: the story root or a concrete node
#[derive(Debug, Clone, Copy)]
pub enum TreePosition<'a> {
    Root(&'a Story),
    Node(&'a StoryNode),
}

impl<'a> TreePosition<'a> {
    pub fn depth(&self) -> u32 {
        match self {
            Self::Root(_) => 0,
            Self::Node(n) => n.depth,
        }
    }

    /// The two outgoing choices from this position
    pub fn choices(&self) -> (&'a Choice, &'a Choice) {
        match self {
            Self::Root(s) => (&s.choice_a, &s.choice_b),
            Self::Node(n) => (&n.choice_a, &n.choice_b),
        }
    }
}

// =============================================================================
// Story tree arena
// =============================================================================

/// A story plus its authored nodes, indexed by arrival path.
///
/// The arena keeps prefix closure as an insertion invariant (a depth-N node
/// can only be inserted once its depth-N-1 parent exists), so `resolve` is
/// a single map lookup.
#[derive(Debug, Clone)]
pub struct StoryTree {
    story: Story,
    nodes: HashMap<Path, StoryNode>,
}

impl StoryTree {
    pub fn new(story: Story) -> Self {
        Self {
            story,
            nodes: HashMap::new(),
        }
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn max_depth(&self) -> u32 {
        self.story.max_depth
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert an authored node at its arrival path.
    ///
    /// Validates the depth invariant (`node.depth == path.len()`), the
    /// depth limit, and parent presence so the arena stays prefix-closed.
    pub fn insert_node(&mut self, path: &Path, node: StoryNode) -> Result<()> {
        if path.is_empty() {
            return Err(EngineError::StaleTree(
                "cannot insert a node at the root position".to_string(),
            ));
        }
        if path.depth() > self.story.max_depth {
            return Err(EngineError::PathTooDeep {
                len: path.len(),
                max: self.story.max_depth,
            });
        }
        if node.depth != path.depth() {
            return Err(EngineError::StaleTree(format!(
                "node {} declares depth {} but arrives via a {}-token path",
                node.id,
                node.depth,
                path.len()
            )));
        }
        if path.len() >= 2 {
            let parent = path.prefix(path.len() - 1);
            if !self.nodes.contains_key(&parent) {
                return Err(EngineError::StaleTree(format!(
                    "node {} has no parent at prefix '{}'",
                    node.id, parent
                )));
            }
        }
        self.nodes.insert(path.clone(), node);
        Ok(())
    }

    /// Resolve a path to the node it reaches.
    ///
    /// Dangling paths (no such child was ever authored) return `None`;
    /// that is a valid "past the edge" result, not an error. The empty
    /// path is the story root, which is not a `StoryNode`.
    pub fn resolve(&self, path: &Path) -> Option<&StoryNode> {
        if path.is_empty() {
            return None;
        }
        self.nodes.get(path)
    }

    /// Resolve a path to a position (root for the empty path).
    pub fn position(&self, path: &Path) -> Option<TreePosition<'_>> {
        if path.is_empty() {
            return Some(TreePosition::Root(&self.story));
        }
        self.resolve(path).map(TreePosition::Node)
    }

    /// Whether a reader at `path` may still descend.
    pub fn can_extend(&self, path: &Path) -> bool {
        path.depth() < self.story.max_depth
    }

    /// The two outgoing choices at the current position, or `None` when the
    /// path is dangling.
    pub fn child_choices(&self, path: &Path) -> Option<(&Choice, &Choice)> {
        self.position(path).map(|p| p.choices())
    }

    /// Whether a child node exists for `token` under `path`.
    pub fn has_child(&self, path: &Path, token: ChoiceToken) -> bool {
        self.nodes.contains_key(&path.child(token))
    }

    /// Terminal when the depth limit is reached, the position is dangling,
    /// or neither child node was ever authored.
    pub fn is_terminal(&self, path: &Path) -> bool {
        if path.depth() >= self.story.max_depth {
            return true;
        }
        if self.position(path).is_none() {
            return true;
        }
        !self.has_child(path, ChoiceToken::A) && !self.has_child(path, ChoiceToken::B)
    }

    /// Longest prefix of `path` that still resolves to a position.
    ///
    /// Used when persisted progress refers to a branch the author has since
    /// pruned: the reader resumes at the deepest surviving ancestor instead
    /// of a dead position.
    pub fn longest_resolvable_prefix(&self, path: &Path) -> Path {
        let mut len = path.len().min(self.story.max_depth as usize);
        while len > 0 {
            let prefix = path.prefix(len);
            if self.position(&prefix).is_some() {
                return prefix;
            }
            len -= 1;
        }
        Path::empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ChoiceToken::{A, B};

    fn choice(label: &str) -> Choice {
        Choice::new(label)
    }

    fn node(id: &str, depth: u32, parent: Option<&str>) -> StoryNode {
        StoryNode {
            id: id.to_string(),
            story_id: "s1".to_string(),
            parent_node_id: parent.map(str::to_string),
            depth,
            choice_a: choice("left"),
            choice_b: choice("right"),
        }
    }

    fn sample_tree() -> StoryTree {
        let story = Story::new("s1", "The Fork", "author-1", choice("go"), choice("stay"))
            .with_max_depth(3);
        let mut tree = StoryTree::new(story);
        tree.insert_node(&Path::new(vec![A]), node("n-a", 1, None))
            .unwrap();
        tree.insert_node(&Path::new(vec![B]), node("n-b", 1, None))
            .unwrap();
        tree.insert_node(&Path::new(vec![A, B]), node("n-ab", 2, Some("n-a")))
            .unwrap();
        tree
    }

    #[test]
    fn test_resolve_walk() {
        let tree = sample_tree();
        assert_eq!(tree.resolve(&Path::new(vec![A])).unwrap().id, "n-a");
        assert_eq!(tree.resolve(&Path::new(vec![A, B])).unwrap().id, "n-ab");
        // Dangling path is None, not an error
        assert!(tree.resolve(&Path::new(vec![A, A])).is_none());
        assert!(tree.resolve(&Path::new(vec![B, B])).is_none());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let tree = sample_tree();
        for path in [Path::new(vec![A]), Path::new(vec![A, B]), Path::new(vec![B, A])] {
            let first = tree.resolve(&path).map(|n| n.id.clone());
            let second = tree.resolve(&path).map(|n| n.id.clone());
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_depth_invariant() {
        let tree = sample_tree();
        for (path, _) in tree.nodes.iter() {
            let node = tree.resolve(path).unwrap();
            assert_eq!(node.depth, path.depth());
        }
    }

    #[test]
    fn test_insert_rejects_depth_mismatch() {
        let mut tree = sample_tree();
        let result = tree.insert_node(&Path::new(vec![B, A]), node("bad", 1, Some("n-b")));
        assert!(matches!(result, Err(EngineError::StaleTree(_))));
    }

    #[test]
    fn test_insert_rejects_missing_parent() {
        let mut tree = sample_tree();
        // Prefix [A,A] was never authored
        let result = tree.insert_node(&Path::new(vec![A, A, A]), node("orphan", 3, None));
        assert!(matches!(result, Err(EngineError::StaleTree(_))));
    }

    #[test]
    fn test_insert_rejects_past_max_depth() {
        let story = Story::new("s2", "Short", "author-1", choice("a"), choice("b"))
            .with_max_depth(1);
        let mut tree = StoryTree::new(story);
        tree.insert_node(&Path::new(vec![A]), node("ok", 1, None))
            .unwrap();
        let result = tree.insert_node(&Path::new(vec![A, A]), node("deep", 2, Some("ok")));
        assert!(matches!(result, Err(EngineError::PathTooDeep { .. })));
    }

    #[test]
    fn test_root_position_and_choices() {
        let tree = sample_tree();
        let (a, b) = tree.child_choices(&Path::empty()).unwrap();
        assert_eq!(a.label, "go");
        assert_eq!(b.label, "stay");
        assert_eq!(tree.position(&Path::empty()).unwrap().depth(), 0);
    }

    #[test]
    fn test_can_extend() {
        let tree = sample_tree();
        assert!(tree.can_extend(&Path::empty()));
        assert!(tree.can_extend(&Path::new(vec![A, B])));
        assert!(!tree.can_extend(&Path::new(vec![A, B, A])));
    }

    #[test]
    fn test_terminal_boundary() {
        let tree = sample_tree();
        // At max_depth
        assert!(tree.is_terminal(&Path::new(vec![A, B, A])));
        // No authored children under [A,B]
        assert!(tree.is_terminal(&Path::new(vec![A, B])));
        // Root and [A] both have children
        assert!(!tree.is_terminal(&Path::empty()));
        assert!(!tree.is_terminal(&Path::new(vec![A])));
        // [B] has no children either
        assert!(tree.is_terminal(&Path::new(vec![B])));
    }

    #[test]
    fn test_longest_resolvable_prefix() {
        let tree = sample_tree();
        let stale = Path::new(vec![A, B, A, B, B]);
        assert_eq!(tree.longest_resolvable_prefix(&stale), Path::new(vec![A, B]));
        assert_eq!(
            tree.longest_resolvable_prefix(&Path::new(vec![B, B])),
            Path::new(vec![B])
        );
        assert_eq!(tree.longest_resolvable_prefix(&Path::empty()), Path::empty());
    }
}
