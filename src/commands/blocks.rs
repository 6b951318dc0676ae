//! Block-level commands: paragraph/heading/list toggles and alignment.
//!
//! None of these commands move a leaf in the offset space. Wrapping blocks in
//! a list or lifting them out only changes node paths, so the selection stays
//! valid as-is.

use std::collections::BTreeMap;

use super::{BlockKind, Draft};
use crate::document::{Document, Leaf, Node, NodeKind, NodePath, TextAlign};
use crate::error::Result;

/// Toggle the block kind of every textblock spanning the selection.
pub(crate) fn toggle_block_kind(draft: &mut Draft, kind: BlockKind) -> Result<()> {
    let blocks = draft
        .doc
        .textblocks_in_range(draft.selection.from(), draft.selection.to());
    if blocks.is_empty() {
        return Ok(());
    }
    match kind.list_node_kind() {
        Some(list_kind) => toggle_list(&mut draft.doc, &blocks, list_kind),
        None => toggle_textblocks(&mut draft.doc, &blocks, kind),
    }
}

/// Set the alignment of every textblock spanning the selection.
pub(crate) fn set_text_align(draft: &mut Draft, align: TextAlign) -> Result<()> {
    let blocks = draft
        .doc
        .textblocks_in_range(draft.selection.from(), draft.selection.to());
    for leaf in blocks {
        draft
            .doc
            .node_at_mut_or_err(&leaf.path)?
            .set_text_align(Some(align));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Paragraph / Heading
// ─────────────────────────────────────────────────────────────────────────────

fn toggle_textblocks(doc: &mut Document, blocks: &[Leaf], kind: BlockKind) -> Result<()> {
    let all_match = blocks.iter().all(|leaf| {
        doc.node_at(&leaf.path)
            .map(|node| kind.matches_textblock(node.kind()))
            .unwrap_or(false)
    });
    let target = if all_match { BlockKind::Paragraph } else { kind };
    for leaf in blocks {
        let node = doc.node_at_mut_or_err(&leaf.path)?;
        node.kind = target.textblock_kind(node.kind.text_align());
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Lists
// ─────────────────────────────────────────────────────────────────────────────

fn toggle_list(doc: &mut Document, blocks: &[Leaf], list_kind: NodeKind) -> Result<()> {
    let enclosing: Vec<Option<NodePath>> = blocks
        .iter()
        .map(|leaf| doc.ancestor_of_kind(&leaf.path, NodeKind::is_list))
        .collect();

    let all_in_target = enclosing.iter().all(|list| {
        list.as_ref()
            .and_then(|path| doc.node_at(path))
            .map(|node| *node.kind() == list_kind)
            .unwrap_or(false)
    });
    if all_in_target {
        return lift_out_of_lists(doc, blocks, &enclosing);
    }

    // Convert enclosing lists of the other kind in place. Paths do not change.
    for path in enclosing.iter().flatten() {
        let list = doc.node_at_mut_or_err(path)?;
        list.kind = list_kind.clone();
    }

    let loose: Vec<&Leaf> = blocks
        .iter()
        .zip(&enclosing)
        .filter(|(_, list)| list.is_none())
        .map(|(leaf, _)| leaf)
        .collect();
    wrap_in_lists(doc, &loose, &list_kind)
}

/// Wrap loose textblocks in new lists, one list per run of siblings and one
/// list item per sibling.
fn wrap_in_lists(doc: &mut Document, loose: &[&Leaf], list_kind: &NodeKind) -> Result<()> {
    let mut groups: BTreeMap<NodePath, (usize, usize)> = BTreeMap::new();
    for leaf in loose {
        let Some((&index, parent)) = leaf.path.split_last() else {
            continue;
        };
        groups
            .entry(parent.to_vec())
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(index);
                *hi = (*hi).max(index);
            })
            .or_insert((index, index));
    }

    // Deepest and rightmost first, so earlier groups' paths stay valid.
    for (parent, (lo, hi)) in groups.into_iter().rev() {
        let siblings = doc.node_at_mut_or_err(&parent)?.children[lo..=hi].to_vec();
        let items = siblings
            .into_iter()
            .map(|block| Node::list_item(vec![block]))
            .collect::<Result<Vec<_>>>()?;
        let list = Node::container(list_kind.clone(), items)?;
        doc.splice(&parent, lo, hi - lo + 1, vec![list])?;
    }
    Ok(())
}

/// Move the items holding `blocks` out of their lists. What remains of each
/// list before and after the lifted items stays a list.
fn lift_out_of_lists(doc: &mut Document, blocks: &[Leaf], enclosing: &[Option<NodePath>]) -> Result<()> {
    let mut item_ranges: BTreeMap<NodePath, (usize, usize)> = BTreeMap::new();
    for (leaf, list) in blocks.iter().zip(enclosing) {
        let Some(list) = list else { continue };
        let Some(&item) = leaf.path.get(list.len()) else {
            continue;
        };
        item_ranges
            .entry(list.clone())
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(item);
                *hi = (*hi).max(item);
            })
            .or_insert((item, item));
    }

    for (list_path, (lo, hi)) in item_ranges.into_iter().rev() {
        let Some((&index, parent)) = list_path.split_last() else {
            continue;
        };
        let list = doc.node_at_mut_or_err(&list_path)?.clone();
        let mut replacement = Vec::new();
        if lo > 0 {
            replacement.push(Node::container(
                list.kind.clone(),
                list.children[..lo].to_vec(),
            )?);
        }
        for item in &list.children[lo..=hi] {
            replacement.extend(item.children.iter().cloned());
        }
        if hi + 1 < list.children.len() {
            replacement.push(Node::container(
                list.kind.clone(),
                list.children[hi + 1..].to_vec(),
            )?);
        }
        doc.splice(parent, index, 1, replacement)?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
