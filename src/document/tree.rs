//! The document aggregate and its structural queries.
//!
//! Every other component talks to the tree through these queries: which leaf
//! sits at an offset, which nodes a text range spans, which ancestor of a
//! given kind encloses a node.
//!
//! # Offset space
//!
//! Leaves (textblocks and images) are enumerated in document order. A
//! textblock with `n` characters occupies positions `start..=start + n`, an
//! image the single position `start`, and the next leaf starts one past the
//! previous leaf's end. Wrapping or unwrapping blocks in lists therefore
//! never moves an offset.

use std::ops::Range;

use log::debug;

use super::node::{CssLength, Node, NodeKind};
use crate::error::{Error, Result};

/// Child-index path from the document root to a node.
pub type NodePath = Vec<usize>;

// ─────────────────────────────────────────────────────────────────────────────
// Leaves and Segments
// ─────────────────────────────────────────────────────────────────────────────

/// A node occupying positions in the offset space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub path: NodePath,
    /// First offset of the leaf
    pub start: usize,
    /// Character length (0 for images)
    pub len: usize,
    /// Paragraph or heading, as opposed to an image
    pub textblock: bool,
}

impl Leaf {
    /// Last offset inside the leaf.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end()
    }
}

/// Part of a textblock's text covered by a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub path: NodePath,
    /// Character range relative to the textblock
    pub range: Range<usize>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────────────────────────────────────

/// The root of the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Node,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: a single empty paragraph.
    pub fn new() -> Self {
        Self {
            root: Node {
                kind: NodeKind::Document,
                children: vec![Node::paragraph(Vec::new())],
                runs: Vec::new(),
            },
        }
    }

    /// Build a document from top-level blocks, enforcing the schema.
    pub fn from_blocks(blocks: Vec<Node>) -> Result<Self> {
        let doc = Self {
            root: Node::container(NodeKind::Document, blocks)?,
        };
        doc.validate()?;
        Ok(doc)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Top-level blocks.
    pub fn blocks(&self) -> &[Node] {
        &self.root.children
    }

    /// True when the document holds nothing but one empty paragraph.
    pub fn is_empty(&self) -> bool {
        match self.root.children.as_slice() {
            [only] => only.kind.is_textblock() && only.runs.is_empty(),
            _ => false,
        }
    }

    pub fn text_content(&self) -> String {
        self.root.text_content()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Path Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(&self.root, |node, &i| node.children.get(i))
    }

    pub(crate) fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = &mut self.root;
        for &i in path {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    pub(crate) fn node_at_mut_or_err(&mut self, path: &[usize]) -> Result<&mut Node> {
        self.node_at_mut(path)
            .ok_or_else(|| Error::InvalidNode(format!("no node at path {:?}", path)))
    }

    /// Nearest strict ancestor of the node at `path` whose kind satisfies
    /// `predicate`.
    pub fn ancestor_of_kind(
        &self,
        path: &[usize],
        predicate: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodePath> {
        (0..path.len())
            .rev()
            .map(|depth| &path[..depth])
            .find(|prefix| {
                self.node_at(prefix)
                    .map(|node| predicate(&node.kind))
                    .unwrap_or(false)
            })
            .map(|prefix| prefix.to_vec())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Offset Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// All leaves in document order with their offsets.
    pub fn leaves(&self) -> Vec<Leaf> {
        let mut out = Vec::new();
        let mut pos = 0;
        collect_leaves(&self.root, &mut Vec::new(), &mut pos, &mut out);
        out
    }

    /// Largest valid offset.
    pub fn content_end(&self) -> usize {
        self.leaves().last().map(Leaf::end).unwrap_or(0)
    }

    /// The leaf containing `offset`, if the offset is valid.
    pub fn leaf_at(&self, offset: usize) -> Option<Leaf> {
        self.leaves().into_iter().find(|leaf| leaf.contains(offset))
    }

    /// Paths of the leaves containing `from` and `to`.
    pub fn range_paths(&self, from: usize, to: usize) -> Option<(NodePath, NodePath)> {
        let start = self.leaf_at(from)?;
        let end = self.leaf_at(to)?;
        Some((start.path, end.path))
    }

    /// Leaves touched by `from..to`. A collapsed range touches the leaf
    /// containing it.
    pub fn blocks_in_range(&self, from: usize, to: usize) -> Vec<Leaf> {
        let leaves = self.leaves();
        if from >= to {
            return leaves.into_iter().filter(|l| l.contains(from)).take(1).collect();
        }
        leaves
            .into_iter()
            .filter(|leaf| leaf.start < to && from <= leaf.end())
            .collect()
    }

    /// Textblocks touched by `from..to`.
    pub fn textblocks_in_range(&self, from: usize, to: usize) -> Vec<Leaf> {
        self.blocks_in_range(from, to)
            .into_iter()
            .filter(|leaf| leaf.textblock)
            .collect()
    }

    /// Non-empty pieces of text covered by `from..to`.
    pub fn text_segments(&self, from: usize, to: usize) -> Vec<TextSegment> {
        self.leaves()
            .into_iter()
            .filter(|leaf| leaf.textblock)
            .filter_map(|leaf| {
                let start = from.max(leaf.start);
                let end = to.min(leaf.end());
                (start < end).then(|| TextSegment {
                    range: start - leaf.start..end - leaf.start,
                    path: leaf.path,
                })
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Structural Mutation (crate-internal, used by the command layer)
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace `remove` children of the node at `parent`, starting at `index`,
    /// with `insert`. Parent/child shape is checked before anything changes.
    pub(crate) fn splice(
        &mut self,
        parent: &[usize],
        index: usize,
        remove: usize,
        insert: Vec<Node>,
    ) -> Result<()> {
        let node = self.node_at_mut_or_err(parent)?;
        if let Some(bad) = insert.iter().find(|c| !node.kind.allows_child(&c.kind)) {
            return Err(Error::StructuralViolation {
                parent: node.kind.name().to_string(),
                child: bad.kind.name().to_string(),
            });
        }
        if index + remove > node.children.len() {
            return Err(Error::InvalidNode(format!(
                "splice {}..{} out of bounds for {} children",
                index,
                index + remove,
                node.children.len()
            )));
        }
        debug!(
            "splice at {:?}[{}]: -{} +{}",
            parent,
            index,
            remove,
            insert.len()
        );
        node.children.splice(index..index + remove, insert);
        Ok(())
    }

    /// Store `width` on the image at `path`. Returns whether it changed.
    pub(crate) fn set_image_width(&mut self, path: &[usize], width: CssLength) -> Result<bool> {
        let node = self.node_at_mut_or_err(path)?;
        match &mut node.kind {
            NodeKind::Image { width: current, .. } => {
                if *current == width {
                    return Ok(false);
                }
                *current = width;
                Ok(true)
            }
            other => Err(Error::InvalidNode(format!(
                "expected image at {:?}, found {}",
                path,
                other.name()
            ))),
        }
    }
}

fn collect_leaves(node: &Node, path: &mut NodePath, pos: &mut usize, out: &mut Vec<Leaf>) {
    if node.kind.is_textblock() || node.kind.is_image() {
        let len = node.text_len();
        out.push(Leaf {
            path: path.clone(),
            start: *pos,
            len,
            textblock: node.kind.is_textblock(),
        });
        *pos += len + 1;
        return;
    }
    for (i, child) in node.children.iter().enumerate() {
        path.push(i);
        collect_leaves(child, path, pos, out);
        path.pop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::HeadingLevel;
    use crate::document::TextRun;

    /// "Hello" / image / list["one", "two"]
    fn sample() -> Document {
        Document::from_blocks(vec![
            Node::heading(HeadingLevel::H1, vec![TextRun::plain("Hello")]),
            Node::image("a.png", CssLength::full()).unwrap(),
            Node::bullet_list(vec![
                Node::list_item(vec![Node::text("one")]).unwrap(),
                Node::list_item(vec![Node::text("two")]).unwrap(),
            ])
            .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_document_is_empty() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.content_end(), 0);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_leaf_offsets() {
        let leaves = sample().leaves();
        let starts: Vec<_> = leaves.iter().map(|l| (l.start, l.len)).collect();
        // Hello: 0..=5, image: 6, one: 7..=10, two: 11..=14
        assert_eq!(starts, vec![(0, 5), (6, 0), (7, 3), (11, 3)]);
        assert_eq!(leaves[2].path, vec![2, 0, 0]);
    }

    #[test]
    fn test_leaf_at() {
        let doc = sample();
        assert_eq!(doc.leaf_at(5).unwrap().path, vec![0]);
        assert!(!doc.leaf_at(6).unwrap().textblock);
        assert_eq!(doc.leaf_at(14).unwrap().path, vec![2, 1, 0]);
        assert!(doc.leaf_at(15).is_none());
    }

    #[test]
    fn test_text_segments_span_blocks() {
        let doc = sample();
        let segments = doc.text_segments(3, 9);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].range, 3..5);
        assert_eq!(segments[1].path, vec![2, 0, 0]);
        assert_eq!(segments[1].range, 0..2);
    }

    #[test]
    fn test_blocks_in_range_collapsed() {
        let doc = sample();
        let blocks = doc.blocks_in_range(8, 8);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].path, vec![2, 0, 0]);
    }

    #[test]
    fn test_blocks_in_range_excludes_block_starting_at_end() {
        let doc = sample();
        let blocks = doc.blocks_in_range(0, 6);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_ancestor_of_kind() {
        let doc = sample();
        assert_eq!(
            doc.ancestor_of_kind(&[2, 1, 0], NodeKind::is_list),
            Some(vec![2])
        );
        assert_eq!(doc.ancestor_of_kind(&[0], NodeKind::is_list), None);
    }

    #[test]
    fn test_range_paths() {
        let doc = sample();
        let (a, b) = doc.range_paths(1, 12).unwrap();
        assert_eq!(a, vec![0]);
        assert_eq!(b, vec![2, 1, 0]);
    }

    #[test]
    fn test_splice_rejects_row_in_document() {
        let mut doc = sample();
        let row = Node::table_row(vec![Node::table_cell(vec![Node::text("x")]).unwrap()]).unwrap();
        let err = doc.splice(&[], 0, 0, vec![row]).unwrap_err();
        assert!(matches!(err, Error::StructuralViolation { .. }));
        assert_eq!(doc, sample());
    }

    #[test]
    fn test_from_blocks_rejects_list_item_at_top_level() {
        let item = Node::list_item(vec![Node::text("x")]).unwrap();
        assert!(matches!(
            Document::from_blocks(vec![item]),
            Err(Error::StructuralViolation { .. })
        ));
    }

    #[test]
    fn test_set_image_width() {
        let mut doc = sample();
        assert!(doc.set_image_width(&[1], CssLength::pixels(150.0)).unwrap());
        assert!(!doc.set_image_width(&[1], CssLength::pixels(150.0)).unwrap());
        match doc.node_at(&[1]).unwrap().kind() {
            NodeKind::Image { width, .. } => assert_eq!(width.as_str(), "150px"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            doc.set_image_width(&[0], CssLength::full()),
            Err(Error::InvalidNode(_))
        ));
    }
}
