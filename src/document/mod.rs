//! Content tree: the typed document model
//!
//! This module holds the document structure (nodes, marks, text runs), its
//! structural invariants and the queries every other component relies on.
//!
//! # Example
//! ```ignore
//! use scribe::document::{Document, Node, HeadingLevel, TextRun};
//!
//! let doc = Document::from_blocks(vec![
//!     Node::heading(HeadingLevel::H1, vec![TextRun::plain("Title")]),
//!     Node::empty_table(3, 3, true)?,
//! ])?;
//! assert_eq!(doc.leaf_at(0).unwrap().path, vec![0]);
//! ```

mod marks;
mod node;
mod schema;
mod selection;
mod tree;

pub use marks::{Mark, MarkKind, MarkSet, TextRun};
pub use node::{CssLength, HeadingLevel, Node, NodeKind, TextAlign};
pub use selection::{ResolvedSelection, Selection};
pub use tree::{Document, Leaf, NodePath, TextSegment};

pub(crate) use marks::{
    delete_range, insert_text, marks_at, runs_in_range, update_marks,
};
