//! Text entry: typing and splitting blocks.

use super::insert::delete_selected_text;
use super::{effective_marks, Draft};
use crate::document::{
    insert_text as insert_runs, Document, MarkSet, Node, NodeKind, Selection, TextRun,
};
use crate::error::{Error, Result};
use crate::string_utils::char_len;

/// Type `text` at the cursor. Line breaks (`\n`, `\r\n` or `\r`) split the
/// block.
pub(crate) fn insert_text(draft: &mut Draft, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let marks = effective_marks(&draft.doc, draft.selection.from(), &draft.stored_marks);
    let mut pos = delete_selected_text(&mut draft.doc, draft.selection)?;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            pos = split_at(&mut draft.doc, pos)?;
        }
        pos = insert_line(&mut draft.doc, pos, line, &marks)?;
    }
    draft.stored_marks = None;
    draft.selection = Selection::cursor(pos);
    Ok(())
}

/// Split the textblock at the cursor (Enter).
pub(crate) fn split_block(draft: &mut Draft) -> Result<()> {
    let pos = delete_selected_text(&mut draft.doc, draft.selection)?;
    let pos = split_at(&mut draft.doc, pos)?;
    draft.selection = Selection::cursor(pos);
    Ok(())
}

/// Insert a newline-free `line` at `pos`, returning the offset after it.
fn insert_line(doc: &mut Document, pos: usize, line: &str, marks: &MarkSet) -> Result<usize> {
    if line.is_empty() {
        return Ok(pos);
    }
    let leaf = doc
        .leaf_at(pos)
        .ok_or_else(|| Error::InvalidNode(format!("offset {} outside document", pos)))?;
    let len = char_len(line);

    if leaf.textblock {
        let node = doc.node_at_mut_or_err(&leaf.path)?;
        insert_runs(&mut node.runs, pos - leaf.start, line, marks.clone());
        return Ok(pos + len);
    }

    // Typing on an image starts a new paragraph after it.
    let (&index, parent) = leaf
        .path
        .split_last()
        .ok_or_else(|| Error::InvalidNode("leaf at document root".to_string()))?;
    let paragraph = Node::paragraph(vec![TextRun::new(line, marks.clone())]);
    doc.splice(parent, index + 1, 0, vec![paragraph])?;
    Ok(leaf.start + 1 + len)
}

/// Split the leaf at `pos` and return the offset at the start of the new
/// block.
///
/// The end of a heading continues as a paragraph. Inside a list item the
/// item itself is split, so the new block becomes a new item.
fn split_at(doc: &mut Document, pos: usize) -> Result<usize> {
    let leaf = doc
        .leaf_at(pos)
        .ok_or_else(|| Error::InvalidNode(format!("offset {} outside document", pos)))?;
    let (&index, parent) = leaf
        .path
        .split_last()
        .ok_or_else(|| Error::InvalidNode("leaf at document root".to_string()))?;
    let parent = parent.to_vec();

    if !leaf.textblock {
        doc.splice(&parent, index + 1, 0, vec![Node::paragraph(Vec::new())])?;
        return Ok(leaf.start + 1);
    }

    let offset = pos - leaf.start;
    let node = doc.node_at_mut_or_err(&leaf.path)?;
    let (left, mut right) = node.split_text(offset);
    if offset == leaf.len && matches!(node.kind, NodeKind::Heading { .. }) {
        right.kind = NodeKind::Paragraph {
            align: node.kind.text_align(),
        };
    }

    let in_list_item = doc
        .node_at(&parent)
        .map(|p| *p.kind() == NodeKind::ListItem)
        .unwrap_or(false);
    match parent.split_last() {
        Some((&item_index, list)) if in_list_item => {
            let item = doc.node_at_mut_or_err(&parent)?.clone();
            let mut first = item.children[..index].to_vec();
            first.push(left);
            let mut second = vec![right];
            second.extend(item.children[index + 1..].iter().cloned());
            let items = vec![Node::list_item(first)?, Node::list_item(second)?];
            doc.splice(list, item_index, 1, items)?;
        }
        _ => doc.splice(&parent, index, 1, vec![left, right])?,
    }
    Ok(leaf.start + offset + 1)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
