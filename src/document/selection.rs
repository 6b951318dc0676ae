//! Selection as an explicit offset range.
//!
//! A selection is a plain value. It is resolved against the tree on every
//! query and clamped after every mutation, never kept as a live cursor.

use serde::{Deserialize, Serialize};

use super::tree::{Document, NodePath};

/// Range `[anchor, head)` over the offset space. `head` may precede `anchor`
/// for backwards selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

/// A selection resolved against a particular tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub selection: Selection,
    pub anchor_path: NodePath,
    pub head_path: NodePath,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Collapsed selection at `pos`.
    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Clamp both ends into the document's valid offsets.
    pub fn clamp(self, doc: &Document) -> Self {
        let end = doc.content_end();
        Self::new(self.anchor.min(end), self.head.min(end))
    }

    /// Clamp and resolve the node paths of both ends.
    pub fn resolve(self, doc: &Document) -> ResolvedSelection {
        let selection = self.clamp(doc);
        let path_of = |offset: usize| {
            doc.leaf_at(offset)
                .map(|leaf| leaf.path)
                .unwrap_or_default()
        };
        ResolvedSelection {
            anchor_path: path_of(selection.anchor),
            head_path: path_of(selection.head),
            selection,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
