//! Editing Commands
//!
//! One operation per editing action. Every command runs against a draft copy
//! of the document; the draft is validated against the schema and only then
//! replaces the live tree, so a failing command never leaves a partial edit
//! behind.
//!
//! # Supported Commands
//! - **Inline**: toggle mark, set link, unset link
//! - **Blocks**: paragraph/heading/list toggles, text alignment
//! - **Insertion**: images, tables, typed text, block splits
//!
//! # Usage
//! ```ignore
//! use scribe::commands::{apply_command, EditCommand};
//! use scribe::document::{Document, Mark, Selection};
//!
//! let mut doc = Document::new();
//! let mut stored = None;
//! let outcome = apply_command(
//!     &mut doc,
//!     Selection::cursor(0),
//!     &mut stored,
//!     &EditCommand::InsertText { text: "Hello".into() },
//! )?;
//! assert_eq!(outcome.selection, Selection::cursor(5));
//! ```

mod blocks;
mod insert;
mod marks;
mod text;

pub(crate) use marks::segments_all_match;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::document::{
    marks_at, Document, HeadingLevel, Mark, MarkSet, NodeKind, Selection, TextAlign,
};
use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Block Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Block classification a textblock can be toggled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "level", rename_all = "camelCase")]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
    BulletList,
    OrderedList,
}

impl BlockKind {
    pub fn is_list(self) -> bool {
        matches!(self, BlockKind::BulletList | BlockKind::OrderedList)
    }

    /// Node kind of a list block kind.
    pub(crate) fn list_node_kind(self) -> Option<NodeKind> {
        match self {
            BlockKind::BulletList => Some(NodeKind::BulletList),
            BlockKind::OrderedList => Some(NodeKind::OrderedList),
            _ => None,
        }
    }

    /// Textblock node kind carrying `align`. List kinds map to a paragraph.
    pub(crate) fn textblock_kind(self, align: Option<TextAlign>) -> NodeKind {
        match self {
            BlockKind::Heading(level) => NodeKind::Heading { level, align },
            _ => NodeKind::Paragraph { align },
        }
    }

    /// Whether a textblock of `kind` is already of this (non-list) block kind.
    pub(crate) fn matches_textblock(self, kind: &NodeKind) -> bool {
        match (self, kind) {
            (BlockKind::Paragraph, NodeKind::Paragraph { .. }) => true,
            (BlockKind::Heading(want), NodeKind::Heading { level, .. }) => want == *level,
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command Enum
// ─────────────────────────────────────────────────────────────────────────────

/// An editing command, as dispatched by the toolbar or a host script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum EditCommand {
    /// Toggle an inline mark over the selection (or the stored marks)
    ToggleMark { mark: Mark },
    /// Toggle the block kind of the textblocks spanning the selection
    ToggleBlockKind { kind: BlockKind },
    /// Align every textblock spanning the selection
    SetTextAlign { align: TextAlign },
    /// Insert an image at the cursor
    InsertImage {
        src: String,
        #[serde(default)]
        width: Option<String>,
    },
    /// Insert an empty table at the cursor
    #[serde(rename_all = "camelCase")]
    InsertTable {
        rows: usize,
        cols: usize,
        #[serde(default)]
        with_header_row: bool,
    },
    /// Link the selected text
    SetLink { href: String },
    /// Remove links over the selection (or the link around the cursor)
    UnsetLink,
    /// Type text at the cursor
    InsertText { text: String },
    /// Split the textblock at the cursor
    SplitBlock,
}

impl EditCommand {
    /// Short name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::ToggleMark { .. } => "toggleMark",
            EditCommand::ToggleBlockKind { .. } => "toggleBlockKind",
            EditCommand::SetTextAlign { .. } => "setTextAlign",
            EditCommand::InsertImage { .. } => "insertImage",
            EditCommand::InsertTable { .. } => "insertTable",
            EditCommand::SetLink { .. } => "setLink",
            EditCommand::UnsetLink => "unsetLink",
            EditCommand::InsertText { .. } => "insertText",
            EditCommand::SplitBlock => "splitBlock",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Draft and Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Working copy a command mutates before it is committed.
#[derive(Debug, Clone)]
pub(crate) struct Draft {
    pub doc: Document,
    pub selection: Selection,
    pub stored_marks: Option<MarkSet>,
}

/// Result of a successfully applied command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Selection re-resolved against the new tree
    pub selection: Selection,
    /// Whether the document itself changed
    pub changed: bool,
}

/// Apply `command` atomically.
///
/// On success the document, selection and stored marks reflect the command.
/// On failure nothing is touched. A command that changes the document clears
/// the stored marks.
pub fn apply_command(
    doc: &mut Document,
    selection: Selection,
    stored_marks: &mut Option<MarkSet>,
    command: &EditCommand,
) -> Result<CommandOutcome> {
    let mut draft = Draft {
        doc: doc.clone(),
        selection: selection.clamp(doc),
        stored_marks: stored_marks.clone(),
    };

    let applied = run(&mut draft, command).and_then(|_| draft.doc.validate());
    if let Err(err) = applied {
        warn!("{} rejected: {}", command.name(), err);
        return Err(err);
    }

    let changed = draft.doc != *doc;
    let selection = draft.selection.clamp(&draft.doc);
    debug!(
        "{} applied (changed: {}, selection: {}..{})",
        command.name(),
        changed,
        selection.anchor,
        selection.head
    );
    if changed {
        *doc = draft.doc;
        *stored_marks = None;
    } else {
        *stored_marks = draft.stored_marks;
    }
    Ok(CommandOutcome { selection, changed })
}

fn run(draft: &mut Draft, command: &EditCommand) -> Result<()> {
    match command {
        EditCommand::ToggleMark { mark } => marks::toggle_mark(draft, mark),
        EditCommand::SetLink { href } => marks::set_link(draft, href),
        EditCommand::UnsetLink => marks::unset_link(draft),
        EditCommand::ToggleBlockKind { kind } => blocks::toggle_block_kind(draft, *kind),
        EditCommand::SetTextAlign { align } => blocks::set_text_align(draft, *align),
        EditCommand::InsertImage { src, width } => {
            insert::insert_image(draft, src, width.as_deref())
        }
        EditCommand::InsertTable {
            rows,
            cols,
            with_header_row,
        } => insert::insert_table(draft, *rows, *cols, *with_header_row),
        EditCommand::InsertText { text } => text::insert_text(draft, text),
        EditCommand::SplitBlock => text::split_block(draft),
    }
}

/// Marks the next typed character would carry at `pos`: the stored marks if
/// any, otherwise the marks inherited from the surrounding text.
pub(crate) fn effective_marks(doc: &Document, pos: usize, stored: &Option<MarkSet>) -> MarkSet {
    if let Some(stored) = stored {
        return stored.clone();
    }
    doc.leaf_at(pos)
        .filter(|leaf| leaf.textblock)
        .and_then(|leaf| {
            doc.node_at(&leaf.path)
                .map(|node| marks_at(node.runs(), pos - leaf.start))
        })
        .unwrap_or_default()
}

/// The textblock holding both ends of a non-empty selection, if there is one.
pub(crate) fn single_textblock_range(doc: &Document, selection: Selection) -> Option<(usize, usize)> {
    if selection.is_empty() {
        return None;
    }
    let leaf = doc.leaf_at(selection.from())?;
    (leaf.textblock && leaf.contains(selection.to()))
        .then(|| (selection.from() - leaf.start, selection.to() - leaf.start))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MarkKind, Node};
    use crate::error::Error;

    fn hello_world() -> Document {
        Document::from_blocks(vec![Node::text("Hello world")]).unwrap()
    }

    #[test]
    fn test_command_json_shape() {
        let cmd: EditCommand =
            serde_json::from_str(r#"{"command": "toggleMark", "mark": {"type": "bold"}}"#).unwrap();
        assert_eq!(cmd, EditCommand::ToggleMark { mark: Mark::Bold });

        let cmd: EditCommand = serde_json::from_str(
            r#"{"command": "insertTable", "rows": 2, "cols": 3, "withHeaderRow": true}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            EditCommand::InsertTable {
                rows: 2,
                cols: 3,
                with_header_row: true
            }
        );

        let cmd: EditCommand = serde_json::from_str(
            r#"{"command": "toggleBlockKind", "kind": {"type": "heading", "level": "H2"}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            EditCommand::ToggleBlockKind {
                kind: BlockKind::Heading(HeadingLevel::H2)
            }
        );
    }

    #[test]
    fn test_failed_command_leaves_everything_untouched() {
        let mut doc = hello_world();
        let mut stored = Some([Mark::Bold].into_iter().collect());
        let err = apply_command(
            &mut doc,
            Selection::cursor(3),
            &mut stored,
            &EditCommand::SetLink {
                href: "https://x".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::EmptySelection));
        assert_eq!(doc, hello_world());
        assert!(stored.is_some());
    }

    #[test]
    fn test_changing_command_clears_stored_marks() {
        let mut doc = hello_world();
        let mut stored = None;
        apply_command(
            &mut doc,
            Selection::cursor(11),
            &mut stored,
            &EditCommand::ToggleMark { mark: Mark::Bold },
        )
        .unwrap();
        assert!(stored.as_ref().unwrap().contains(MarkKind::Bold));

        let outcome = apply_command(
            &mut doc,
            Selection::cursor(11),
            &mut stored,
            &EditCommand::InsertText { text: "!".into() },
        )
        .unwrap();
        assert!(outcome.changed);
        assert!(stored.is_none());
        assert!(doc.blocks()[0].runs()[1].marks.contains(MarkKind::Bold));
    }

    #[test]
    fn test_selection_is_clamped_on_entry() {
        let mut doc = hello_world();
        let mut stored = None;
        let outcome = apply_command(
            &mut doc,
            Selection::cursor(500),
            &mut stored,
            &EditCommand::InsertText { text: "?".into() },
        )
        .unwrap();
        assert_eq!(doc.text_content(), "Hello world?");
        assert_eq!(outcome.selection, Selection::cursor(12));
    }

    #[test]
    fn test_effective_marks_prefers_stored() {
        let doc = hello_world();
        let stored = Some([Mark::Italic].into_iter().collect::<MarkSet>());
        assert!(effective_marks(&doc, 3, &stored).contains(MarkKind::Italic));
        assert!(effective_marks(&doc, 3, &None).is_empty());
    }

    #[test]
    fn test_single_textblock_range() {
        let doc = Document::from_blocks(vec![Node::text("ab"), Node::text("cd")]).unwrap();
        assert_eq!(single_textblock_range(&doc, Selection::new(2, 0)), Some((0, 2)));
        assert_eq!(single_textblock_range(&doc, Selection::new(1, 4)), None);
        assert_eq!(single_textblock_range(&doc, Selection::cursor(1)), None);
    }
}
