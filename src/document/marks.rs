//! Inline marks and text runs.
//!
//! Marks are annotations over character ranges of a textblock, not tree
//! nodes. A textblock stores its text as a sequence of [`TextRun`]s, each
//! carrying a [`MarkSet`]. Runs are kept canonical: no empty runs, and no two
//! neighbouring runs with equal mark sets.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::string_utils::{char_len, split_at_char};

// ─────────────────────────────────────────────────────────────────────────────
// Marks
// ─────────────────────────────────────────────────────────────────────────────

/// Mark kind without attributes. The declaration order is the canonical
/// nesting order used when rendering (outermost first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkKind {
    Link,
    Bold,
    Italic,
    Underline,
    Subscript,
    Superscript,
}

impl MarkKind {
    /// All mark kinds in canonical order.
    pub const ALL: [MarkKind; 6] = [
        MarkKind::Link,
        MarkKind::Bold,
        MarkKind::Italic,
        MarkKind::Underline,
        MarkKind::Subscript,
        MarkKind::Superscript,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarkKind::Link => "link",
            MarkKind::Bold => "bold",
            MarkKind::Italic => "italic",
            MarkKind::Underline => "underline",
            MarkKind::Subscript => "subscript",
            MarkKind::Superscript => "superscript",
        }
    }
}

/// An inline mark with its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Subscript,
    Superscript,
    Link { href: String },
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Mark::Bold => MarkKind::Bold,
            Mark::Italic => MarkKind::Italic,
            Mark::Underline => MarkKind::Underline,
            Mark::Subscript => MarkKind::Subscript,
            Mark::Superscript => MarkKind::Superscript,
            Mark::Link { .. } => MarkKind::Link,
        }
    }

    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link { href: href.into() }
    }
}

/// A set of marks with at most one mark per kind, ordered by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, kind: MarkKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn get(&self, kind: MarkKind) -> Option<&Mark> {
        self.0.iter().find(|m| m.kind() == kind)
    }

    /// Add `mark`, replacing any mark of the same kind.
    pub fn insert(&mut self, mark: Mark) {
        let kind = mark.kind();
        match self.0.binary_search_by_key(&kind, Mark::kind) {
            Ok(i) => self.0[i] = mark,
            Err(i) => self.0.insert(i, mark),
        }
    }

    /// Remove the mark of `kind`. Returns whether one was present.
    pub fn remove(&mut self, kind: MarkKind) -> bool {
        match self.0.binary_search_by_key(&kind, Mark::kind) {
            Ok(i) => {
                self.0.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove the mark of `mark`'s kind if present, otherwise add `mark`.
    pub fn toggle(&mut self, mark: Mark) {
        if !self.remove(mark.kind()) {
            self.insert(mark);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut set = MarkSet::new();
        for mark in iter {
            set.insert(mark);
        }
        set
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Runs
// ─────────────────────────────────────────────────────────────────────────────

/// A run of text sharing one mark set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: MarkSet,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, MarkSet::new())
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Total character length of `runs`.
pub fn text_len(runs: &[TextRun]) -> usize {
    runs.iter().map(TextRun::len).sum()
}

/// Drop empty runs and merge neighbours with equal marks.
pub fn normalize(runs: &mut Vec<TextRun>) {
    runs.retain(|r| !r.is_empty());
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs.drain(..) {
        match merged.last_mut() {
            Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    *runs = merged;
}

/// Ensure a run boundary at character offset `at`, returning the index of the
/// first run starting at or after it.
fn split_at(runs: &mut Vec<TextRun>, at: usize) -> usize {
    let mut pos = 0;
    for i in 0..runs.len() {
        if at == pos {
            return i;
        }
        let len = runs[i].len();
        if at < pos + len {
            let (head, tail) = split_at_char(&runs[i].text, at - pos);
            let (head, tail) = (head.to_string(), tail.to_string());
            let tail = TextRun::new(tail, runs[i].marks.clone());
            runs[i].text = head;
            runs.insert(i + 1, tail);
            return i + 1;
        }
        pos += len;
    }
    runs.len()
}

/// Split runs at `at` into owned left and right halves.
pub fn split_runs(runs: &[TextRun], at: usize) -> (Vec<TextRun>, Vec<TextRun>) {
    let mut left = runs.to_vec();
    let index = split_at(&mut left, at);
    let right = left.split_off(index);
    (left, right)
}

/// Apply `f` to the marks of every character in `range`, then normalize.
pub fn update_marks(
    runs: &mut Vec<TextRun>,
    range: Range<usize>,
    mut f: impl FnMut(&mut MarkSet),
) {
    if range.start >= range.end {
        return;
    }
    let first = split_at(runs, range.start);
    let last = split_at(runs, range.end);
    for run in &mut runs[first..last] {
        f(&mut run.marks);
    }
    normalize(runs);
}

/// Mark sets of the runs overlapping `range`.
pub fn runs_in_range(runs: &[TextRun], range: Range<usize>) -> Vec<&MarkSet> {
    let mut out = Vec::new();
    let mut pos = 0;
    for run in runs {
        let end = pos + run.len();
        if pos < range.end && range.start < end {
            out.push(&run.marks);
        }
        pos = end;
    }
    out
}

/// Remove the characters in `range`.
pub fn delete_range(runs: &mut Vec<TextRun>, range: Range<usize>) {
    if range.start >= range.end {
        return;
    }
    let first = split_at(runs, range.start);
    let last = split_at(runs, range.end);
    runs.drain(first..last);
    normalize(runs);
}

/// Insert `text` carrying `marks` at character offset `at`.
pub fn insert_text(runs: &mut Vec<TextRun>, at: usize, text: &str, marks: MarkSet) {
    if text.is_empty() {
        return;
    }
    let index = split_at(runs, at);
    runs.insert(index, TextRun::new(text, marks));
    normalize(runs);
}

/// Marks a character typed at offset `at` would inherit.
///
/// Uses the character before the cursor (or after it at the start of the
/// block). Links are not inclusive: a link is only inherited when the cursor
/// sits strictly inside it.
pub fn marks_at(runs: &[TextRun], at: usize) -> MarkSet {
    let mut before: Option<&MarkSet> = None;
    let mut after: Option<&MarkSet> = None;
    let mut pos = 0;
    for run in runs {
        let end = pos + run.len();
        if pos < at && at <= end {
            before = Some(&run.marks);
        }
        if pos <= at && at < end {
            after = Some(&run.marks);
        }
        pos = end;
    }
    let mut marks = before.or(after).cloned().unwrap_or_default();
    let inside_link = match (before, after) {
        (Some(b), Some(a)) => {
            b.contains(MarkKind::Link) && b.get(MarkKind::Link) == a.get(MarkKind::Link)
        }
        _ => false,
    };
    if !inside_link {
        marks.remove(MarkKind::Link);
    }
    marks
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn set(marks: &[Mark]) -> MarkSet {
        marks.iter().cloned().collect()
    }

    #[test]
    fn test_mark_set_one_per_kind() {
        let mut marks = MarkSet::new();
        marks.insert(Mark::link("https://a"));
        marks.insert(Mark::Bold);
        marks.insert(Mark::link("https://b"));
        assert_eq!(marks.len(), 2);
        assert_eq!(marks.get(MarkKind::Link), Some(&Mark::link("https://b")));
    }

    #[test]
    fn test_mark_set_canonical_order() {
        let a = set(&[Mark::Italic, Mark::Bold]);
        let b = set(&[Mark::Bold, Mark::Italic]);
        assert_eq!(a, b);
        let kinds: Vec<_> = a.iter().map(Mark::kind).collect();
        assert_eq!(kinds, vec![MarkKind::Bold, MarkKind::Italic]);
    }

    #[test]
    fn test_toggle() {
        let mut marks = set(&[Mark::Bold]);
        marks.toggle(Mark::Bold);
        assert!(marks.is_empty());
        marks.toggle(Mark::Underline);
        assert!(marks.contains(MarkKind::Underline));
    }

    #[test]
    fn test_normalize_merges_and_drops_empty() {
        let mut runs = vec![
            TextRun::plain("Hel"),
            TextRun::plain(""),
            TextRun::plain("lo"),
            TextRun::new(" world", set(&[Mark::Bold])),
        ];
        normalize(&mut runs);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hello");
    }

    #[test]
    fn test_update_marks_middle_of_run() {
        let mut runs = vec![TextRun::plain("Hello world")];
        update_marks(&mut runs, 6..11, |m| m.insert(Mark::Bold));
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hello ");
        assert_eq!(runs[1].text, "world");
        assert!(runs[1].marks.contains(MarkKind::Bold));

        update_marks(&mut runs, 6..11, |m| {
            m.remove(MarkKind::Bold);
        });
        assert_eq!(runs, vec![TextRun::plain("Hello world")]);
    }

    #[test]
    fn test_update_marks_multibyte() {
        let mut runs = vec![TextRun::plain("Hei på deg")];
        update_marks(&mut runs, 4..6, |m| m.insert(Mark::Italic));
        assert_eq!(runs[1].text, "på");
    }

    #[test]
    fn test_split_runs() {
        let runs = vec![
            TextRun::new("ab", set(&[Mark::Bold])),
            TextRun::plain("cd"),
        ];
        let (left, right) = split_runs(&runs, 3);
        assert_eq!(text_len(&left), 3);
        assert_eq!(right, vec![TextRun::plain("d")]);
    }

    #[test]
    fn test_delete_and_insert() {
        let mut runs = vec![TextRun::plain("Hello cruel world")];
        delete_range(&mut runs, 5..11);
        assert_eq!(runs, vec![TextRun::plain("Hello world")]);
        insert_text(&mut runs, 5, ",", MarkSet::new());
        assert_eq!(runs, vec![TextRun::plain("Hello, world")]);
    }

    #[test]
    fn test_runs_in_range() {
        let runs = vec![
            TextRun::new("ab", set(&[Mark::Bold])),
            TextRun::plain("cd"),
        ];
        assert_eq!(runs_in_range(&runs, 0..2).len(), 1);
        assert_eq!(runs_in_range(&runs, 1..3).len(), 2);
        assert!(runs_in_range(&runs, 4..4).is_empty());
    }

    #[test]
    fn test_marks_at_inherits_from_previous_char() {
        let runs = vec![
            TextRun::new("bold", set(&[Mark::Bold])),
            TextRun::plain(" plain"),
        ];
        assert!(marks_at(&runs, 4).contains(MarkKind::Bold));
        assert!(!marks_at(&runs, 5).contains(MarkKind::Bold));
        assert!(marks_at(&runs, 0).contains(MarkKind::Bold));
    }

    #[test]
    fn test_marks_at_link_not_inclusive() {
        let link = set(&[Mark::link("https://x")]);
        let runs = vec![TextRun::new("link", link), TextRun::plain(" after")];
        assert!(marks_at(&runs, 2).contains(MarkKind::Link));
        assert!(!marks_at(&runs, 4).contains(MarkKind::Link));
        assert!(!marks_at(&runs, 0).contains(MarkKind::Link));
    }
}
