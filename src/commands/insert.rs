//! Block insertion commands: images and tables.

use log::debug;

use super::{single_textblock_range, Draft};
use crate::document::{delete_range, CssLength, Document, Node, NodePath, Selection};
use crate::error::{Error, Result};

/// Where a new block goes: `parent`'s child slot `index`, optionally
/// replacing the empty textblock that sits there.
#[derive(Debug)]
struct InsertAt {
    parent: NodePath,
    index: usize,
    replace: bool,
}

/// Insert an image at the cursor.
pub(crate) fn insert_image(draft: &mut Draft, src: &str, width: Option<&str>) -> Result<()> {
    let src = src.trim();
    if src.is_empty() {
        return Err(Error::InvalidSource);
    }
    let width = match width {
        Some(width) => CssLength::parse(width)?,
        None => CssLength::full(),
    };
    let image = Node::image(src, width)?;

    let path = insert_block(&mut draft.doc, draft.selection, image)?;
    let start = leaf_start(&draft.doc, &path)?;
    let cursor = if start < draft.doc.content_end() {
        start + 1
    } else {
        start
    };
    draft.selection = Selection::cursor(cursor);
    Ok(())
}

/// Insert an empty `rows` x `cols` table at the cursor and move the cursor
/// into its first cell.
pub(crate) fn insert_table(
    draft: &mut Draft,
    rows: usize,
    cols: usize,
    with_header_row: bool,
) -> Result<()> {
    let table = Node::empty_table(rows, cols, with_header_row)?;
    let path = insert_block(&mut draft.doc, draft.selection, table)?;
    let first_cell = draft
        .doc
        .leaves()
        .into_iter()
        .find(|leaf| leaf.path.starts_with(&path))
        .ok_or_else(|| Error::InvalidNode("inserted table has no cells".to_string()))?;
    draft.selection = Selection::cursor(first_cell.start);
    Ok(())
}

/// Insert `block` at the selection and return its path.
///
/// A selection inside one textblock is deleted first. A selection spanning
/// several blocks is left alone and the block goes after its end.
pub(crate) fn insert_block(doc: &mut Document, selection: Selection, block: Node) -> Result<NodePath> {
    let pos = delete_selected_text(doc, selection)?;
    let at = split_for_insert(doc, pos)?;
    debug!(
        "insert {} at {:?}[{}] (replace: {})",
        block.kind().name(),
        at.parent,
        at.index,
        at.replace
    );
    doc.splice(&at.parent, at.index, usize::from(at.replace), vec![block])?;
    let mut path = at.parent;
    path.push(at.index);
    Ok(path)
}

/// Delete the selected text when it lies in one textblock. Returns the
/// position insertion should happen at.
pub(crate) fn delete_selected_text(doc: &mut Document, selection: Selection) -> Result<usize> {
    let Some((from, to)) = single_textblock_range(doc, selection) else {
        return Ok(selection.to());
    };
    let leaf = doc
        .leaf_at(selection.from())
        .ok_or_else(|| Error::InvalidNode("selection outside document".to_string()))?;
    let node = doc.node_at_mut_or_err(&leaf.path)?;
    delete_range(&mut node.runs, from..to);
    Ok(selection.from())
}

/// Prepare the tree so a block can be inserted at offset `pos`, splitting
/// the textblock there if the offset is mid-text.
fn split_for_insert(doc: &mut Document, pos: usize) -> Result<InsertAt> {
    let leaf = doc
        .leaf_at(pos)
        .ok_or_else(|| Error::InvalidNode(format!("offset {} outside document", pos)))?;
    let (&index, parent) = leaf
        .path
        .split_last()
        .ok_or_else(|| Error::InvalidNode("leaf at document root".to_string()))?;
    let parent = parent.to_vec();

    if !leaf.textblock {
        return Ok(InsertAt {
            parent,
            index: index + 1,
            replace: false,
        });
    }

    let offset = pos - leaf.start;
    let at = if leaf.len == 0 {
        InsertAt {
            parent,
            index,
            replace: true,
        }
    } else if offset == 0 {
        InsertAt {
            parent,
            index,
            replace: false,
        }
    } else if offset == leaf.len {
        InsertAt {
            parent,
            index: index + 1,
            replace: false,
        }
    } else {
        let node = doc.node_at_mut_or_err(&leaf.path)?;
        let (left, right) = node.split_text(offset);
        doc.splice(&parent, index, 1, vec![left, right])?;
        InsertAt {
            parent,
            index: index + 1,
            replace: false,
        }
    };
    Ok(at)
}

fn leaf_start(doc: &Document, path: &[usize]) -> Result<usize> {
    doc.leaves()
        .into_iter()
        .find(|leaf| leaf.path == path)
        .map(|leaf| leaf.start)
        .ok_or_else(|| Error::InvalidNode(format!("no leaf at path {:?}", path)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::commands::{apply_command, EditCommand};
    use crate::document::{Document, NodeKind, Node, Selection};
    use crate::error::Error;

    fn image(src: &str) -> EditCommand {
        EditCommand::InsertImage {
            src: src.into(),
            width: None,
        }
    }

    fn table(rows: usize, cols: usize) -> EditCommand {
        EditCommand::InsertTable {
            rows,
            cols,
            with_header_row: true,
        }
    }

    #[test]
    fn test_insert_image_mid_text_splits_block() {
        let mut doc = Document::from_blocks(vec![Node::text("Hello world")]).unwrap();
        let outcome =
            apply_command(&mut doc, Selection::cursor(5), &mut None, &image("a.png")).unwrap();
        let kinds: Vec<_> = doc.blocks().iter().map(|b| b.kind().name()).collect();
        assert_eq!(kinds, vec!["paragraph", "image", "paragraph"]);
        assert_eq!(doc.blocks()[2].text_content(), " world");
        // "Hello" 0..=5, image 6, " world" from 7
        assert_eq!(outcome.selection, Selection::cursor(7));
        match doc.blocks()[1].kind() {
            NodeKind::Image { src, width } => {
                assert_eq!(src, "a.png");
                assert_eq!(width.as_str(), "100%");
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_image_replaces_empty_paragraph() {
        let mut doc = Document::new();
        let outcome =
            apply_command(&mut doc, Selection::cursor(0), &mut None, &image("a.png")).unwrap();
        assert_eq!(doc.blocks().len(), 1);
        assert!(doc.blocks()[0].kind().is_image());
        assert_eq!(outcome.selection, Selection::cursor(0));
    }

    #[test]
    fn test_insert_image_validation() {
        let mut doc = Document::from_blocks(vec![Node::text("abc")]).unwrap();
        let before = doc.clone();
        let err = apply_command(&mut doc, Selection::cursor(1), &mut None, &image("  ")).unwrap_err();
        assert!(matches!(err, Error::InvalidSource));

        let err = apply_command(
            &mut doc,
            Selection::cursor(1),
            &mut None,
            &EditCommand::InsertImage {
                src: "a.png".into(),
                width: Some("huge".into()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidWidth(_)));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_insert_table_shape_and_cursor() {
        let mut doc = Document::from_blocks(vec![Node::text("before")]).unwrap();
        let outcome =
            apply_command(&mut doc, Selection::cursor(6), &mut None, &table(3, 3)).unwrap();
        let table = &doc.blocks()[1];
        assert_eq!(*table.kind(), NodeKind::Table);
        assert_eq!(table.children().len(), 3);
        for (i, row) in table.children().iter().enumerate() {
            assert_eq!(row.children().len(), 3);
            let expected = if i == 0 {
                NodeKind::TableHeaderCell
            } else {
                NodeKind::TableCell
            };
            assert!(row.children().iter().all(|cell| *cell.kind() == expected));
        }
        assert_eq!(outcome.selection, Selection::cursor(7));
        assert_eq!(doc.leaf_at(7).unwrap().path, vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_insert_table_invalid_dimensions() {
        let mut doc = Document::from_blocks(vec![Node::text("abc")]).unwrap();
        let before = doc.clone();
        let err = apply_command(&mut doc, Selection::cursor(0), &mut None, &table(0, 3)).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { rows: 0, cols: 3 }));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_insert_replaces_selected_text() {
        let mut doc = Document::from_blocks(vec![Node::text("keep DROP keep")]).unwrap();
        apply_command(&mut doc, Selection::new(5, 9), &mut None, &image("a.png")).unwrap();
        let texts: Vec<_> = doc.blocks().iter().map(|b| b.text_content()).collect();
        assert_eq!(texts, vec!["keep ", "", " keep"]);
    }

    #[test]
    fn test_insert_after_image() {
        let mut doc = Document::from_blocks(vec![Node::image("a.png", Default::default()).unwrap()])
            .unwrap();
        apply_command(&mut doc, Selection::cursor(0), &mut None, &table(1, 1)).unwrap();
        assert!(doc.blocks()[0].kind().is_image());
        assert_eq!(*doc.blocks()[1].kind(), NodeKind::Table);
    }
}
