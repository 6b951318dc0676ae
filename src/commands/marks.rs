//! Inline mark commands.

use std::ops::Range;

use super::{effective_marks, Draft};
use crate::document::{
    runs_in_range, update_marks, Document, Mark, MarkKind, MarkSet, TextRun, TextSegment,
};
use crate::error::{Error, Result};

/// Toggle `mark` over the selection.
///
/// If every covered run already carries the mark's kind it is removed
/// everywhere, otherwise it is added everywhere. A collapsed selection
/// toggles the stored marks instead.
pub(crate) fn toggle_mark(draft: &mut Draft, mark: &Mark) -> Result<()> {
    let selection = draft.selection;
    if selection.is_empty() {
        let mut marks = effective_marks(&draft.doc, selection.head, &draft.stored_marks);
        marks.toggle(mark.clone());
        draft.stored_marks = Some(marks);
        return Ok(());
    }

    let segments = draft.doc.text_segments(selection.from(), selection.to());
    if segments.is_empty() {
        return Ok(());
    }
    let kind = mark.kind();
    let remove = segments_all_match(&draft.doc, &segments, |marks| marks.contains(kind));
    apply_to_segments(&mut draft.doc, segments, |marks| {
        if remove {
            marks.remove(kind);
        } else {
            marks.insert(mark.clone());
        }
    })
}

/// Link the selected text to `href`.
pub(crate) fn set_link(draft: &mut Draft, href: &str) -> Result<()> {
    let selection = draft.selection;
    if selection.is_empty() {
        return Err(Error::EmptySelection);
    }
    let href = href.trim();
    if href.is_empty() {
        return Err(Error::InvalidHref);
    }
    let segments = draft.doc.text_segments(selection.from(), selection.to());
    let link = Mark::link(href);
    apply_to_segments(&mut draft.doc, segments, |marks| marks.insert(link.clone()))
}

/// Remove links over the selection. With a collapsed selection the whole
/// link around the cursor is removed.
pub(crate) fn unset_link(draft: &mut Draft) -> Result<()> {
    let selection = draft.selection;
    let segments = if selection.is_empty() {
        link_segment_at(&draft.doc, selection.head)
            .into_iter()
            .collect()
    } else {
        draft.doc.text_segments(selection.from(), selection.to())
    };
    apply_to_segments(&mut draft.doc, segments, |marks| {
        marks.remove(MarkKind::Link);
    })
}

/// Whether every run covered by `segments` satisfies `predicate`. False when
/// the segments cover no text at all.
pub(crate) fn segments_all_match(
    doc: &Document,
    segments: &[TextSegment],
    predicate: impl Fn(&MarkSet) -> bool,
) -> bool {
    let mut any = false;
    for segment in segments {
        let Some(node) = doc.node_at(&segment.path) else {
            return false;
        };
        for marks in runs_in_range(node.runs(), segment.range.clone()) {
            if !predicate(marks) {
                return false;
            }
            any = true;
        }
    }
    any
}

fn apply_to_segments(
    doc: &mut Document,
    segments: Vec<TextSegment>,
    mut f: impl FnMut(&mut MarkSet),
) -> Result<()> {
    for segment in segments {
        let node = doc.node_at_mut_or_err(&segment.path)?;
        update_marks(&mut node.runs, segment.range, &mut f);
    }
    Ok(())
}

fn link_segment_at(doc: &Document, pos: usize) -> Option<TextSegment> {
    let leaf = doc.leaf_at(pos).filter(|leaf| leaf.textblock)?;
    let node = doc.node_at(&leaf.path)?;
    let range = link_extent(node.runs(), pos - leaf.start)?;
    Some(TextSegment {
        path: leaf.path,
        range,
    })
}

/// Character range of the contiguous link touching offset `at`.
fn link_extent(runs: &[TextRun], at: usize) -> Option<Range<usize>> {
    let mut spans: Vec<(Range<usize>, Option<&Mark>)> = Vec::with_capacity(runs.len());
    let mut pos = 0;
    for run in runs {
        let end = pos + run.len();
        spans.push((pos..end, run.marks.get(MarkKind::Link)));
        pos = end;
    }
    let hit = spans
        .iter()
        .position(|(range, link)| link.is_some() && range.start <= at && at <= range.end)?;
    let link = spans[hit].1;
    let mut first = hit;
    while first > 0 && spans[first - 1].1 == link {
        first -= 1;
    }
    let mut last = hit;
    while last + 1 < spans.len() && spans[last + 1].1 == link {
        last += 1;
    }
    Some(spans[first].0.start..spans[last].0.end)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
