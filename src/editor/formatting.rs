//! Active-State Tracking
//!
//! Answers "is formatting F uniformly applied at the current selection?" for
//! the toolbar. Nothing in this module mutates the document.
//!
//! # Rules
//! - **Marks**: every text run intersecting the selection carries the mark.
//!   A collapsed selection looks at the stored marks, or the marks a typed
//!   character would inherit.
//! - **Blocks**: every textblock intersecting the selection matches. For list
//!   kinds the nearest enclosing list decides; unset alignment counts as left.

use crate::commands::{effective_marks, segments_all_match, BlockKind};
use crate::document::{
    runs_in_range, Document, HeadingLevel, Leaf, Mark, MarkKind, MarkSet, NodeKind, Selection,
    TextAlign,
};

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

/// Formatting that can be asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveQuery {
    /// Any mark of this kind
    Mark(MarkKind),
    /// A link pointing at exactly this href
    Link(String),
    /// Paragraph, heading level or list kind
    Block(BlockKind),
    /// Text alignment
    Align(TextAlign),
}

/// Evaluate `query` against `doc` at `selection`.
pub fn is_active(
    doc: &Document,
    selection: Selection,
    stored_marks: &Option<MarkSet>,
    query: &ActiveQuery,
) -> bool {
    let selection = selection.clamp(doc);
    match query {
        ActiveQuery::Mark(kind) => marks_active(doc, selection, stored_marks, |m| m.contains(*kind)),
        ActiveQuery::Link(href) => {
            let link = Mark::link(href.as_str());
            marks_active(doc, selection, stored_marks, |m| {
                m.get(MarkKind::Link) == Some(&link)
            })
        }
        ActiveQuery::Block(kind) => blocks_active(doc, selection, |leaf, node_kind| {
            match kind.list_node_kind() {
                Some(list_kind) => doc
                    .ancestor_of_kind(&leaf.path, NodeKind::is_list)
                    .and_then(|path| doc.node_at(&path))
                    .map(|list| *list.kind() == list_kind)
                    .unwrap_or(false),
                None => kind.matches_textblock(node_kind),
            }
        }),
        ActiveQuery::Align(align) => blocks_active(doc, selection, |_, node_kind| {
            node_kind.text_align().unwrap_or_default() == *align
        }),
    }
}

fn marks_active(
    doc: &Document,
    selection: Selection,
    stored_marks: &Option<MarkSet>,
    predicate: impl Fn(&MarkSet) -> bool,
) -> bool {
    if selection.is_empty() {
        return predicate(&effective_marks(doc, selection.head, stored_marks));
    }
    let segments = doc.text_segments(selection.from(), selection.to());
    segments_all_match(doc, &segments, predicate)
}

fn blocks_active(
    doc: &Document,
    selection: Selection,
    predicate: impl Fn(&Leaf, &NodeKind) -> bool,
) -> bool {
    let blocks = doc.textblocks_in_range(selection.from(), selection.to());
    !blocks.is_empty()
        && blocks.iter().all(|leaf| {
            doc.node_at(&leaf.path)
                .map(|node| predicate(leaf, node.kind()))
                .unwrap_or(false)
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Formatting State
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of every query at one selection.
/// Used for toolbar state reflection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattingState {
    pub is_bold: bool,
    pub is_italic: bool,
    pub is_underline: bool,
    pub is_subscript: bool,
    pub is_superscript: bool,
    /// Is the whole selection linked?
    pub is_link: bool,
    /// Common href when the selection is linked to a single target
    pub link_href: Option<String>,
    /// Heading level shared by all selected textblocks
    pub heading_level: Option<HeadingLevel>,
    pub is_paragraph: bool,
    pub is_bullet_list: bool,
    pub is_numbered_list: bool,
    /// Alignment shared by all selected textblocks
    pub align: Option<TextAlign>,
    /// Is an image selected?
    pub is_image: bool,
}

impl FormattingState {
    /// Detect the formatting state of `doc` at `selection`.
    pub fn detect(doc: &Document, selection: Selection, stored_marks: &Option<MarkSet>) -> Self {
        let active = |query: ActiveQuery| is_active(doc, selection, stored_marks, &query);

        let is_link = active(ActiveQuery::Mark(MarkKind::Link));
        let link_href = is_link
            .then(|| link_at(doc, selection, stored_marks))
            .flatten()
            .filter(|href| active(ActiveQuery::Link(href.clone())));

        let heading_level = [HeadingLevel::H1, HeadingLevel::H2]
            .into_iter()
            .find(|level| active(ActiveQuery::Block(BlockKind::Heading(*level))));
        let align = [TextAlign::Left, TextAlign::Center, TextAlign::Right]
            .into_iter()
            .find(|align| active(ActiveQuery::Align(*align)));

        let clamped = selection.clamp(doc);
        let is_image = doc
            .blocks_in_range(clamped.from(), clamped.to())
            .iter()
            .any(|leaf| !leaf.textblock);

        Self {
            is_bold: active(ActiveQuery::Mark(MarkKind::Bold)),
            is_italic: active(ActiveQuery::Mark(MarkKind::Italic)),
            is_underline: active(ActiveQuery::Mark(MarkKind::Underline)),
            is_subscript: active(ActiveQuery::Mark(MarkKind::Subscript)),
            is_superscript: active(ActiveQuery::Mark(MarkKind::Superscript)),
            is_link,
            link_href,
            heading_level,
            is_paragraph: active(ActiveQuery::Block(BlockKind::Paragraph)),
            is_bullet_list: active(ActiveQuery::Block(BlockKind::BulletList)),
            is_numbered_list: active(ActiveQuery::Block(BlockKind::OrderedList)),
            align,
            is_image,
        }
    }
}

/// Href of the link at the selection start.
fn link_at(doc: &Document, selection: Selection, stored_marks: &Option<MarkSet>) -> Option<String> {
    let selection = selection.clamp(doc);
    let marks = if selection.is_empty() {
        effective_marks(doc, selection.head, stored_marks)
    } else {
        let segment = doc
            .text_segments(selection.from(), selection.to())
            .into_iter()
            .next()?;
        let node = doc.node_at(&segment.path)?;
        let start = segment.range.start;
        runs_in_range(node.runs(), start..start + 1)
            .into_iter()
            .next()?
            .clone()
    };
    match marks.get(MarkKind::Link) {
        Some(Mark::Link { href }) => Some(href.clone()),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{apply_command, EditCommand};
    use crate::document::{Node, TextRun};

    fn doc_with_bold_word() -> Document {
        let bold: MarkSet = [Mark::Bold].into_iter().collect();
        Document::from_blocks(vec![
            Node::paragraph(vec![TextRun::plain("Hello "), TextRun::new("world", bold)]),
            Node::text("second"),
        ])
        .unwrap()
    }

    fn bold_active(doc: &Document, selection: Selection) -> bool {
        is_active(doc, selection, &None, &ActiveQuery::Mark(MarkKind::Bold))
    }

    #[test]
    fn test_mark_active_requires_every_run() {
        let doc = doc_with_bold_word();
        assert!(bold_active(&doc, Selection::new(6, 11)));
        assert!(!bold_active(&doc, Selection::new(4, 11)));
        // Crossing into an unmarked block
        assert!(!bold_active(&doc, Selection::new(8, 14)));
    }

    #[test]
    fn test_mark_active_at_cursor_uses_inherited_marks() {
        let doc = doc_with_bold_word();
        assert!(bold_active(&doc, Selection::cursor(11)));
        assert!(!bold_active(&doc, Selection::cursor(6)));
    }

    #[test]
    fn test_stored_marks_override_cursor_marks() {
        let doc = doc_with_bold_word();
        let stored = Some(MarkSet::new());
        assert!(!is_active(
            &doc,
            Selection::cursor(11),
            &stored,
            &ActiveQuery::Mark(MarkKind::Bold)
        ));
    }

    #[test]
    fn test_toggle_bold_round_trip_reflected() {
        let mut doc = Document::from_blocks(vec![Node::text("Hello world")]).unwrap();
        let sel = Selection::new(0, 5);
        let bold = EditCommand::ToggleMark { mark: Mark::Bold };
        apply_command(&mut doc, sel, &mut None, &bold).unwrap();
        assert!(bold_active(&doc, sel));
        apply_command(&mut doc, sel, &mut None, &bold).unwrap();
        assert!(!bold_active(&doc, sel));
    }

    #[test]
    fn test_no_text_covered_is_inactive() {
        let doc = Document::from_blocks(vec![
            Node::text("ab"),
            Node::image("a.png", Default::default()).unwrap(),
        ])
        .unwrap();
        assert!(!bold_active(&doc, Selection::new(2, 3)));
        assert!(!is_active(
            &doc,
            Selection::cursor(3),
            &None,
            &ActiveQuery::Block(BlockKind::Paragraph)
        ));
    }

    #[test]
    fn test_block_and_align_queries() {
        let mut doc = doc_with_bold_word();
        let all = Selection::new(0, 18);
        assert!(is_active(&doc, all, &None, &ActiveQuery::Block(BlockKind::Paragraph)));
        assert!(is_active(&doc, all, &None, &ActiveQuery::Align(TextAlign::Left)));

        apply_command(
            &mut doc,
            Selection::cursor(0),
            &mut None,
            &EditCommand::SetTextAlign {
                align: TextAlign::Center,
            },
        )
        .unwrap();
        assert!(!is_active(&doc, all, &None, &ActiveQuery::Align(TextAlign::Left)));
        assert!(is_active(
            &doc,
            Selection::cursor(2),
            &None,
            &ActiveQuery::Align(TextAlign::Center)
        ));
    }

    #[test]
    fn test_list_query_uses_nearest_list() {
        let inner = Node::ordered_list(vec![Node::list_item(vec![Node::text("inner")]).unwrap()])
            .unwrap();
        let doc = Document::from_blocks(vec![Node::bullet_list(vec![Node::list_item(vec![
            Node::text("outer"),
            inner,
        ])
        .unwrap()])
        .unwrap()])
        .unwrap();
        // "outer" 0..=5, "inner" 6..=11
        let bullet = ActiveQuery::Block(BlockKind::BulletList);
        let ordered = ActiveQuery::Block(BlockKind::OrderedList);
        assert!(is_active(&doc, Selection::cursor(2), &None, &bullet));
        assert!(is_active(&doc, Selection::cursor(8), &None, &ordered));
        assert!(!is_active(&doc, Selection::cursor(8), &None, &bullet));
    }

    #[test]
    fn test_link_href_query() {
        let link: MarkSet = [Mark::link("https://a")].into_iter().collect();
        let doc = Document::from_blocks(vec![Node::paragraph(vec![TextRun::new("site", link)])])
            .unwrap();
        let sel = Selection::new(0, 4);
        assert!(is_active(&doc, sel, &None, &ActiveQuery::Link("https://a".into())));
        assert!(!is_active(&doc, sel, &None, &ActiveQuery::Link("https://b".into())));

        let state = FormattingState::detect(&doc, sel, &None);
        assert!(state.is_link);
        assert_eq!(state.link_href.as_deref(), Some("https://a"));
    }

    #[test]
    fn test_formatting_state_snapshot() {
        let mut doc = doc_with_bold_word();
        apply_command(
            &mut doc,
            Selection::cursor(0),
            &mut None,
            &EditCommand::ToggleBlockKind {
                kind: BlockKind::Heading(HeadingLevel::H2),
            },
        )
        .unwrap();
        let state = FormattingState::detect(&doc, Selection::new(6, 11), &None);
        assert!(state.is_bold);
        assert!(!state.is_italic);
        assert_eq!(state.heading_level, Some(HeadingLevel::H2));
        assert!(!state.is_paragraph);
        assert_eq!(state.align, Some(TextAlign::Left));
        assert!(!state.is_image);
    }
}
