//! Node kinds and node-level attributes of the content tree.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::marks::{self, TextRun};
use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Attribute Types
// ─────────────────────────────────────────────────────────────────────────────

/// Heading level. Only two levels are offered by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
}

impl HeadingLevel {
    /// Numeric level, as used in `<h1>`/`<h2>`.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Map a numeric level, rejecting anything the editor doesn't offer.
    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            _ => None,
        }
    }
}

/// Block text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// CSS keyword for this alignment.
    pub fn as_css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }

    /// Parse a CSS `text-align` keyword. `justify`, `start` etc. are not offered.
    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            _ => None,
        }
    }
}

fn css_length_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:0|\d+(?:\.\d+)?(?:px|%|em|rem|vw|vh|pt|pc|cm|mm|in|ch|ex)|auto)$")
            .expect("CSS length pattern is valid")
    })
}

/// A syntactically valid CSS length such as `100%` or `240px`.
///
/// The only way to obtain one is through [`CssLength::parse`] or
/// [`CssLength::pixels`], so an image width can never hold garbage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CssLength(String);

impl CssLength {
    /// Default width of a freshly inserted image.
    pub const FULL: &'static str = "100%";

    /// Validate and normalize a CSS length string.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim().to_ascii_lowercase();
        if css_length_regex().is_match(&trimmed) {
            Ok(Self(trimmed))
        } else {
            Err(Error::InvalidWidth(value.to_string()))
        }
    }

    /// Largest pixel length [`CssLength::pixels`] produces.
    pub const MAX_PIXELS: f32 = 1_000_000.0;

    /// A pixel length, saturated to `0..=MAX_PIXELS`. Whole values render
    /// without a fraction (`150px`).
    pub fn pixels(px: f32) -> Self {
        let px = if px.is_nan() {
            0.0
        } else {
            px.clamp(0.0, Self::MAX_PIXELS)
        };
        let rounded = (px * 100.0).round() / 100.0;
        Self(format!("{}px", rounded))
    }

    /// `100%`
    pub fn full() -> Self {
        Self(Self::FULL.to_string())
    }

    /// The length in pixels, if it is expressed in pixels.
    pub fn as_pixels(&self) -> Option<f32> {
        self.0.strip_suffix("px").and_then(|n| n.parse().ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CssLength {
    fn default() -> Self {
        Self::full()
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CssLength {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        CssLength::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Kind
// ─────────────────────────────────────────────────────────────────────────────

/// The closed set of node kinds, with their kind-specific attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of the tree
    Document,
    /// Paragraph textblock
    Paragraph { align: Option<TextAlign> },
    /// Heading textblock
    Heading {
        level: HeadingLevel,
        align: Option<TextAlign>,
    },
    /// Unordered list
    BulletList,
    /// Numbered list
    OrderedList,
    /// Item of either list kind
    ListItem,
    Table,
    TableRow,
    TableCell,
    TableHeaderCell,
    /// Block-level embedded image
    Image { src: String, width: CssLength },
}

impl NodeKind {
    /// Schema name of the kind (camelCase, as in the editor's vocabulary).
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Paragraph { .. } => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableCell => "tableCell",
            NodeKind::TableHeaderCell => "tableHeaderCell",
            NodeKind::Image { .. } => "image",
        }
    }

    /// Paragraphs and headings hold text runs instead of child nodes.
    pub fn is_textblock(&self) -> bool {
        matches!(self, NodeKind::Paragraph { .. } | NodeKind::Heading { .. })
    }

    pub fn is_list(&self) -> bool {
        matches!(self, NodeKind::BulletList | NodeKind::OrderedList)
    }

    pub fn is_image(&self) -> bool {
        matches!(self, NodeKind::Image { .. })
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, NodeKind::TableCell | NodeKind::TableHeaderCell)
    }

    /// Kinds allowed wherever "block content" is expected.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph { .. }
                | NodeKind::Heading { .. }
                | NodeKind::BulletList
                | NodeKind::OrderedList
                | NodeKind::Table
                | NodeKind::Image { .. }
        )
    }

    /// Textblocks, images: nodes that occupy positions in the offset space.
    pub fn is_leaf(&self) -> bool {
        self.is_textblock() || self.is_image()
    }

    /// Whether a node of this kind may directly own a child of kind `child`.
    pub fn allows_child(&self, child: &NodeKind) -> bool {
        match self {
            NodeKind::Document
            | NodeKind::ListItem
            | NodeKind::TableCell
            | NodeKind::TableHeaderCell => child.is_block(),
            NodeKind::BulletList | NodeKind::OrderedList => *child == NodeKind::ListItem,
            NodeKind::Table => *child == NodeKind::TableRow,
            NodeKind::TableRow => child.is_cell(),
            NodeKind::Paragraph { .. } | NodeKind::Heading { .. } | NodeKind::Image { .. } => {
                false
            }
        }
    }

    /// Alignment of a textblock, `None` for other kinds or when unset.
    pub fn text_align(&self) -> Option<TextAlign> {
        match self {
            NodeKind::Paragraph { align } | NodeKind::Heading { align, .. } => *align,
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node
// ─────────────────────────────────────────────────────────────────────────────

/// A typed element of the document tree.
///
/// Containers own child nodes; textblocks own text runs; images own nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<Node>,
    pub(crate) runs: Vec<TextRun>,
}

impl Node {
    /// Build a container node, rejecting children the schema does not allow.
    pub fn container(kind: NodeKind, children: Vec<Node>) -> Result<Self> {
        if kind.is_leaf() {
            return match children.first() {
                Some(child) => Err(Error::StructuralViolation {
                    parent: kind.name().to_string(),
                    child: child.kind.name().to_string(),
                }),
                None => Err(Error::InvalidNode(format!(
                    "{} is not a container",
                    kind.name()
                ))),
            };
        }
        if let Some(bad) = children.iter().find(|c| !kind.allows_child(&c.kind)) {
            return Err(Error::StructuralViolation {
                parent: kind.name().to_string(),
                child: bad.kind.name().to_string(),
            });
        }
        if children.is_empty() {
            return Err(Error::InvalidNode(format!("{} must not be empty", kind.name())));
        }
        Ok(Self {
            kind,
            children,
            runs: Vec::new(),
        })
    }

    /// Paragraph holding `runs` (normalized).
    pub fn paragraph(runs: Vec<TextRun>) -> Self {
        Self::textblock(NodeKind::Paragraph { align: None }, runs)
    }

    /// Heading holding `runs` (normalized).
    pub fn heading(level: HeadingLevel, runs: Vec<TextRun>) -> Self {
        Self::textblock(NodeKind::Heading { level, align: None }, runs)
    }

    /// Paragraph with a single unmarked run.
    pub fn text(text: &str) -> Self {
        Self::paragraph(vec![TextRun::plain(text)])
    }

    pub(crate) fn textblock(kind: NodeKind, mut runs: Vec<TextRun>) -> Self {
        debug_assert!(kind.is_textblock());
        marks::normalize(&mut runs);
        Self {
            kind,
            children: Vec::new(),
            runs,
        }
    }

    /// Image node. `src` must be non-empty.
    pub fn image(src: &str, width: CssLength) -> Result<Self> {
        if src.trim().is_empty() {
            return Err(Error::InvalidSource);
        }
        Ok(Self {
            kind: NodeKind::Image {
                src: src.to_string(),
                width,
            },
            children: Vec::new(),
            runs: Vec::new(),
        })
    }

    pub fn list_item(blocks: Vec<Node>) -> Result<Self> {
        Self::container(NodeKind::ListItem, blocks)
    }

    pub fn bullet_list(items: Vec<Node>) -> Result<Self> {
        Self::container(NodeKind::BulletList, items)
    }

    pub fn ordered_list(items: Vec<Node>) -> Result<Self> {
        Self::container(NodeKind::OrderedList, items)
    }

    pub fn table(rows: Vec<Node>) -> Result<Self> {
        Self::container(NodeKind::Table, rows)
    }

    pub fn table_row(cells: Vec<Node>) -> Result<Self> {
        Self::container(NodeKind::TableRow, cells)
    }

    pub fn table_cell(blocks: Vec<Node>) -> Result<Self> {
        Self::container(NodeKind::TableCell, blocks)
    }

    pub fn table_header_cell(blocks: Vec<Node>) -> Result<Self> {
        Self::container(NodeKind::TableHeaderCell, blocks)
    }

    /// An empty `rows` x `cols` table whose cells each hold one empty paragraph.
    pub fn empty_table(rows: usize, cols: usize, with_header_row: bool) -> Result<Self> {
        if rows < 1 || cols < 1 {
            return Err(Error::InvalidDimensions { rows, cols });
        }
        let mut table_rows = Vec::with_capacity(rows);
        for row in 0..rows {
            let mut cells = Vec::with_capacity(cols);
            for _ in 0..cols {
                let content = vec![Node::paragraph(Vec::new())];
                cells.push(if with_header_row && row == 0 {
                    Node::table_header_cell(content)?
                } else {
                    Node::table_cell(content)?
                });
            }
            table_rows.push(Node::table_row(cells)?);
        }
        Node::table(table_rows)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Text runs of a textblock (empty for other kinds).
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, output: &mut String) {
        for run in &self.runs {
            output.push_str(&run.text);
        }
        for child in &self.children {
            child.collect_text(output);
        }
    }

    /// Character length of a textblock's text.
    pub fn text_len(&self) -> usize {
        marks::text_len(&self.runs)
    }

    /// Set the alignment of a textblock. No-op for other kinds.
    pub(crate) fn set_text_align(&mut self, value: Option<TextAlign>) {
        match &mut self.kind {
            NodeKind::Paragraph { align } | NodeKind::Heading { align, .. } => *align = value,
            _ => {}
        }
    }

    /// Split a textblock at a character offset into two blocks of the same kind.
    pub(crate) fn split_text(&self, at: usize) -> (Node, Node) {
        let (left, right) = marks::split_runs(&self.runs, at);
        (
            Node::textblock(self.kind.clone(), left),
            Node::textblock(self.kind.clone(), right),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::marks::Mark;

    #[test]
    fn test_css_length_accepts_common_units() {
        for value in ["100%", "240px", "12.5em", "0", "auto", " 50PX "] {
            assert!(CssLength::parse(value).is_ok(), "{} should parse", value);
        }
        assert_eq!(CssLength::parse(" 50PX ").unwrap().as_str(), "50px");
    }

    #[test]
    fn test_css_length_rejects_garbage() {
        for value in ["", "wide", "100", "-5px", "10 px", "100%;color:red"] {
            assert!(
                matches!(CssLength::parse(value), Err(Error::InvalidWidth(_))),
                "{} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_css_length_pixels() {
        assert_eq!(CssLength::pixels(150.0).as_str(), "150px");
        assert_eq!(CssLength::pixels(150.5).as_str(), "150.5px");
        assert_eq!(CssLength::pixels(150.0).as_pixels(), Some(150.0));
        assert_eq!(CssLength::full().as_pixels(), None);
    }

    #[test]
    fn test_css_length_pixels_saturate() {
        assert_eq!(CssLength::pixels(f32::INFINITY).as_str(), "1000000px");
        assert_eq!(CssLength::pixels(3e38).as_pixels(), Some(CssLength::MAX_PIXELS));
        assert_eq!(CssLength::pixels(-5.0).as_str(), "0px");
        assert_eq!(CssLength::pixels(f32::NAN).as_str(), "0px");
    }

    #[test]
    fn test_heading_level_bounds() {
        assert_eq!(HeadingLevel::from_u8(1), Some(HeadingLevel::H1));
        assert_eq!(HeadingLevel::from_u8(2), Some(HeadingLevel::H2));
        assert_eq!(HeadingLevel::from_u8(3), None);
        assert_eq!(HeadingLevel::H2.as_u8(), 2);
    }

    #[test]
    fn test_text_align_css() {
        assert_eq!(TextAlign::from_css(" Center "), Some(TextAlign::Center));
        assert_eq!(TextAlign::from_css("justify"), None);
        assert_eq!(TextAlign::Right.as_css(), "right");
    }

    #[test]
    fn test_row_outside_table_is_structural_violation() {
        let row = Node::table_row(vec![Node::table_cell(vec![Node::text("a")]).unwrap()]).unwrap();
        let err = Node::bullet_list(vec![row]).unwrap_err();
        assert!(matches!(
            err,
            Error::StructuralViolation { ref parent, ref child }
                if parent == "bulletList" && child == "tableRow"
        ));
    }

    #[test]
    fn test_table_row_rejects_paragraph() {
        let err = Node::table_row(vec![Node::text("loose")]).unwrap_err();
        assert!(matches!(err, Error::StructuralViolation { .. }));
    }

    #[test]
    fn test_empty_container_rejected() {
        assert!(matches!(
            Node::ordered_list(Vec::new()),
            Err(Error::InvalidNode(_))
        ));
    }

    #[test]
    fn test_image_requires_source() {
        assert!(matches!(
            Node::image("  ", CssLength::full()),
            Err(Error::InvalidSource)
        ));
        assert!(Node::image("https://cdn/a.png", CssLength::full()).is_ok());
    }

    #[test]
    fn test_empty_table_shape() {
        let table = Node::empty_table(2, 4, true).unwrap();
        assert_eq!(table.children().len(), 2);
        assert!(table.children()[0]
            .children()
            .iter()
            .all(|c| c.kind() == &NodeKind::TableHeaderCell));
        assert!(table.children()[1]
            .children()
            .iter()
            .all(|c| c.kind() == &NodeKind::TableCell));
        assert_eq!(table.children()[1].children().len(), 4);
    }

    #[test]
    fn test_split_text_keeps_kind_and_marks() {
        let mut heading = Node::heading(
            HeadingLevel::H2,
            vec![TextRun::new("Hello world", [Mark::Bold].into_iter().collect())],
        );
        heading.set_text_align(Some(TextAlign::Center));
        let (left, right) = heading.split_text(5);
        assert_eq!(left.text_content(), "Hello");
        assert_eq!(right.text_content(), " world");
        assert_eq!(left.kind(), right.kind());
        assert!(right.runs()[0].marks.contains(crate::document::MarkKind::Bold));
    }
}
