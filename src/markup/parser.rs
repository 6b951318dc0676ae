//! Element tree to document conversion.
//!
//! Known elements map onto node and mark kinds. Everything else is
//! transparent: unknown block elements contribute their children as blocks,
//! unknown inline elements contribute their text without marks.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::dom::{self, DomNode, Element};
use super::lexer;
use crate::document::{
    CssLength, Document, HeadingLevel, Mark, MarkSet, Node, NodeKind, TextAlign, TextRun,
};
use crate::error::Result;

/// Parse markup into a document. An input without any block content yields
/// an empty document.
pub fn parse(markup: &str) -> Result<Document> {
    let tree = dom::build(lexer::tokenize(markup));
    let mut blocks = Vec::new();
    convert_blocks(&tree, &mut blocks)?;
    if blocks.is_empty() {
        debug!("markup has no block content, starting empty");
        return Ok(Document::new());
    }
    Document::from_blocks(blocks)
}

/// Newlines and the spaces around them: source formatting, not content.
fn formatting_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[ \t]*[\r\n][ \t\r\n]*").expect("whitespace pattern is valid")
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Textblocks
// ─────────────────────────────────────────────────────────────────────────────

/// Collects inline content into textblocks of one kind. Images and line
/// breaks end the current textblock; text after them starts a new one.
struct TextblockBuilder {
    kind: NodeKind,
    runs: Vec<TextRun>,
    nodes: Vec<Node>,
}

impl TextblockBuilder {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            runs: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Append text. Formatting whitespace is kept as a single `\n` until
    /// the textblock is finished.
    fn push_text(&mut self, text: &str, marks: &MarkSet) {
        let text = formatting_whitespace().replace_all(text, "\n");
        if !text.is_empty() {
            self.runs.push(TextRun::new(text.into_owned(), marks.clone()));
        }
    }

    fn has_content(&self) -> bool {
        self.runs.iter().any(|run| run.text.chars().any(|c| c != '\n'))
    }

    fn break_block(&mut self) {
        let mut runs = std::mem::take(&mut self.runs);
        trim_formatting(&mut runs);
        if runs.is_empty() {
            return;
        }
        for run in &mut runs {
            run.text = run.text.replace('\n', " ");
        }
        self.nodes.push(Node::textblock(self.kind.clone(), runs));
    }

    fn push_block(&mut self, node: Node) {
        self.break_block();
        self.nodes.push(node);
    }

    /// The textblocks and images collected. With `keep_empty`, an element
    /// that produced nothing still yields one empty textblock.
    fn finish(mut self, keep_empty: bool) -> Vec<Node> {
        self.break_block();
        if self.nodes.is_empty() && keep_empty {
            self.nodes.push(Node::textblock(self.kind, Vec::new()));
        }
        self.nodes
    }
}

/// Drop formatting whitespace at both ends of a textblock.
fn trim_formatting(runs: &mut Vec<TextRun>) {
    while let Some(first) = runs.first_mut() {
        let trimmed = first.text.trim_start_matches('\n').len();
        first.text.drain(..first.text.len() - trimmed);
        if !first.text.is_empty() {
            break;
        }
        runs.remove(0);
    }
    while let Some(last) = runs.last_mut() {
        let keep = last.text.trim_end_matches('\n').len();
        last.text.truncate(keep);
        if !last.text.is_empty() {
            break;
        }
        runs.pop();
    }
}

fn collect_inline(node: &DomNode, marks: &MarkSet, builder: &mut TextblockBuilder) -> Result<()> {
    match node {
        DomNode::Text(text) => builder.push_text(text, marks),
        DomNode::Element(element) => match element.name.as_str() {
            "img" => {
                if let Some(image) = image_node(element)? {
                    builder.push_block(image);
                }
            }
            "br" => builder.break_block(),
            "script" | "style" => {}
            _ => {
                let marks = marks_for(element, marks);
                for child in &element.children {
                    collect_inline(child, &marks, builder)?;
                }
            }
        },
    }
    Ok(())
}

/// `marks` plus whatever `element` contributes.
fn marks_for(element: &Element, marks: &MarkSet) -> MarkSet {
    let mut marks = marks.clone();
    match element.name.as_str() {
        "strong" | "b" => marks.insert(Mark::Bold),
        "em" | "i" => marks.insert(Mark::Italic),
        "u" => marks.insert(Mark::Underline),
        "sub" => marks.insert(Mark::Subscript),
        "sup" => marks.insert(Mark::Superscript),
        "a" => match element.attr("href").map(str::trim) {
            Some(href) if !href.is_empty() => marks.insert(Mark::link(href)),
            _ => debug!("dropping link without href"),
        },
        _ => {}
    }

    if let Some(weight) = element.style("font-weight") {
        let bold = matches!(weight.as_str(), "bold" | "bolder")
            || weight.parse::<u32>().is_ok_and(|w| w >= 500);
        if bold {
            marks.insert(Mark::Bold);
        }
    }
    if element.style("font-style").as_deref() == Some("italic") {
        marks.insert(Mark::Italic);
    }
    if element
        .style("text-decoration")
        .is_some_and(|v| v.contains("underline"))
    {
        marks.insert(Mark::Underline);
    }
    marks
}

fn textblock(kind: NodeKind, element: &Element, out: &mut Vec<Node>) -> Result<()> {
    let mut builder = TextblockBuilder::new(kind);
    let marks = MarkSet::new();
    for child in &element.children {
        collect_inline(child, &marks, &mut builder)?;
    }
    out.extend(builder.finish(true));
    Ok(())
}

fn align_of(element: &Element) -> Option<TextAlign> {
    element
        .style("text-align")
        .as_deref()
        .or(element.attr("align"))
        .and_then(TextAlign::from_css)
}

// ─────────────────────────────────────────────────────────────────────────────
// Blocks
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a sequence of sibling nodes into blocks. Loose inline content is
/// gathered into paragraphs.
fn convert_blocks<'a>(
    nodes: impl IntoIterator<Item = &'a DomNode>,
    out: &mut Vec<Node>,
) -> Result<()> {
    let mut loose: Option<TextblockBuilder> = None;
    let no_marks = MarkSet::new();

    for node in nodes {
        match node {
            DomNode::Text(text) => {
                if text.trim().is_empty() && loose.is_none() {
                    continue;
                }
                loose
                    .get_or_insert_with(|| TextblockBuilder::new(NodeKind::Paragraph { align: None }))
                    .push_text(text, &no_marks);
            }
            DomNode::Element(element) if is_inline(element) => {
                let builder = loose.get_or_insert_with(|| {
                    TextblockBuilder::new(NodeKind::Paragraph { align: None })
                });
                collect_inline(node, &no_marks, builder)?;
            }
            DomNode::Element(element) => {
                if let Some(builder) = loose.take() {
                    out.extend(builder.finish(false));
                }
                convert_block(element, out)?;
            }
        }
    }

    if let Some(builder) = loose {
        out.extend(builder.finish(false));
    }
    Ok(())
}

fn is_inline(element: &Element) -> bool {
    !dom::is_block_element(&element.name) && !matches!(element.name.as_str(), "img" | "br")
}

fn convert_block(element: &Element, out: &mut Vec<Node>) -> Result<()> {
    let align = align_of(element);
    match element.name.as_str() {
        "p" | "h3" | "h4" | "h5" | "h6" => {
            textblock(NodeKind::Paragraph { align }, element, out)
        }
        "h1" => textblock(
            NodeKind::Heading {
                level: HeadingLevel::H1,
                align,
            },
            element,
            out,
        ),
        "h2" => textblock(
            NodeKind::Heading {
                level: HeadingLevel::H2,
                align,
            },
            element,
            out,
        ),
        "ul" | "ol" => list(element, out),
        "table" => table(element, out),
        "img" => {
            out.extend(image_node(element)?);
            Ok(())
        }
        "br" | "hr" => Ok(()),
        _ => convert_blocks(&element.children, out),
    }
}

fn blocks_or_empty_paragraph<'a>(nodes: impl IntoIterator<Item = &'a DomNode>) -> Result<Vec<Node>> {
    let mut blocks = Vec::new();
    convert_blocks(nodes, &mut blocks)?;
    if blocks.is_empty() {
        blocks.push(Node::paragraph(Vec::new()));
    }
    Ok(blocks)
}

fn list(element: &Element, out: &mut Vec<Node>) -> Result<()> {
    let mut items = Vec::new();
    let mut stray: Vec<&DomNode> = Vec::new();

    for child in &element.children {
        match child {
            DomNode::Element(li) if li.name == "li" => {
                if !stray.is_empty() {
                    items.push(Node::list_item(blocks_or_empty_paragraph(stray.drain(..))?)?);
                }
                items.push(Node::list_item(blocks_or_empty_paragraph(&li.children)?)?);
            }
            DomNode::Text(text) if text.trim().is_empty() => {}
            other => stray.push(other),
        }
    }
    if !stray.is_empty() {
        items.push(Node::list_item(blocks_or_empty_paragraph(stray)?)?);
    }

    if items.is_empty() {
        debug!("dropping empty <{}>", element.name);
        return Ok(());
    }
    out.push(if element.name == "ol" {
        Node::ordered_list(items)?
    } else {
        Node::bullet_list(items)?
    });
    Ok(())
}

fn table(element: &Element, out: &mut Vec<Node>) -> Result<()> {
    let mut rows = Vec::new();
    let mut fostered = Vec::new();
    collect_rows(&element.children, &mut rows, &mut fostered)?;

    // Content that doesn't belong in a table ends up in front of it
    out.extend(fostered);
    if rows.is_empty() {
        debug!("dropping table without rows");
        return Ok(());
    }
    out.push(Node::table(rows)?);
    Ok(())
}

fn collect_rows(children: &[DomNode], rows: &mut Vec<Node>, fostered: &mut Vec<Node>) -> Result<()> {
    for child in children {
        match child {
            DomNode::Element(e) if matches!(e.name.as_str(), "thead" | "tbody" | "tfoot") => {
                collect_rows(&e.children, rows, fostered)?;
            }
            DomNode::Element(e) if e.name == "tr" => {
                let mut cells = Vec::new();
                for cell in &e.children {
                    match cell {
                        DomNode::Element(c) if c.name == "td" => {
                            cells.push(Node::table_cell(blocks_or_empty_paragraph(&c.children)?)?);
                        }
                        DomNode::Element(c) if c.name == "th" => cells.push(
                            Node::table_header_cell(blocks_or_empty_paragraph(&c.children)?)?,
                        ),
                        DomNode::Text(text) if text.trim().is_empty() => {}
                        other => convert_blocks([other], fostered)?,
                    }
                }
                if !cells.is_empty() {
                    rows.push(Node::table_row(cells)?);
                }
            }
            DomNode::Element(e) if matches!(e.name.as_str(), "colgroup" | "col") => {}
            DomNode::Text(text) if text.trim().is_empty() => {}
            other => convert_blocks([other], fostered)?,
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Images
// ─────────────────────────────────────────────────────────────────────────────

/// Image node for an `<img>`, or `None` when it has no source.
fn image_node(element: &Element) -> Result<Option<Node>> {
    let src = match element.attr("src").map(str::trim) {
        Some(src) if !src.is_empty() => src,
        _ => {
            debug!("dropping image without src");
            return Ok(None);
        }
    };
    let width = element
        .attr("width")
        .and_then(parse_width)
        .or_else(|| element.style("width").as_deref().and_then(parse_width))
        .unwrap_or_default();
    Node::image(src, width).map(Some)
}

/// A CSS length, or else a bare number taken as pixels.
fn parse_width(value: &str) -> Option<CssLength> {
    CssLength::parse(value).ok().or_else(|| {
        value
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|px| px.is_finite() && *px >= 0.0)
            .map(CssLength::pixels)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MarkKind;

    fn image_width(doc: &Document, index: usize) -> String {
        match doc.blocks()[index].kind() {
            NodeKind::Image { width, .. } => width.to_string(),
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("").unwrap(), Document::new());
        assert_eq!(parse("   \n ").unwrap(), Document::new());
        assert_eq!(parse("<p></p>").unwrap(), Document::new());
    }

    #[test]
    fn test_paragraph_with_marks() {
        let doc = parse("<p>Hello <strong>bold <em>both</em></strong></p>").unwrap();
        let runs = doc.blocks()[0].runs();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].text, "Hello ");
        assert!(runs[1].marks.contains(MarkKind::Bold));
        assert!(!runs[1].marks.contains(MarkKind::Italic));
        assert!(runs[2].marks.contains(MarkKind::Bold));
        assert!(runs[2].marks.contains(MarkKind::Italic));
    }

    #[test]
    fn test_headings_and_alignment() {
        let doc = parse(r#"<h2 style="text-align: right">T</h2><h4>x</h4>"#).unwrap();
        assert_eq!(
            *doc.blocks()[0].kind(),
            NodeKind::Heading {
                level: HeadingLevel::H2,
                align: Some(TextAlign::Right)
            }
        );
        assert_eq!(*doc.blocks()[1].kind(), NodeKind::Paragraph { align: None });
    }

    #[test]
    fn test_unknown_tags_keep_text() {
        let doc = parse("<div><span class=x>plain</span> <blink>text</blink></div>").unwrap();
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.text_content(), "plain text");
        assert!(doc.blocks()[0].runs()[0].marks.is_empty());
    }

    #[test]
    fn test_formatting_whitespace_collapsed() {
        let doc = parse("<p>\n    Hello\n    world  again\n</p>\n<p>b</p>").unwrap();
        assert_eq!(doc.blocks()[0].runs()[0].text, "Hello world  again");
        assert_eq!(doc.blocks().len(), 2);
    }

    #[test]
    fn test_image_splits_paragraph() {
        let doc = parse(r#"<p>before<img src="a.png">after</p>"#).unwrap();
        let kinds: Vec<_> = doc.blocks().iter().map(|b| b.kind().name()).collect();
        assert_eq!(kinds, vec!["paragraph", "image", "paragraph"]);
        assert_eq!(doc.text_content(), "beforeafter");
    }

    #[test]
    fn test_image_widths() {
        let doc = parse(
            r#"<img src="a" width="240"><img src="b"><img src="c" width="bogus" style="width: 50%"><img src="d" width="120px"><img src="e" width="0">"#,
        )
        .unwrap();
        assert_eq!(image_width(&doc, 0), "240px");
        assert_eq!(image_width(&doc, 1), "100%");
        assert_eq!(image_width(&doc, 2), "50%");
        assert_eq!(image_width(&doc, 3), "120px");
        assert_eq!(image_width(&doc, 4), "0");
    }

    #[test]
    fn test_image_without_src_dropped() {
        let doc = parse(r#"<p>a</p><img alt="x"><img src="  ">"#).unwrap();
        assert_eq!(doc.blocks().len(), 1);
    }

    #[test]
    fn test_link_without_href_keeps_text() {
        let doc = parse(r#"<p><a>plain</a> <a href=" https://x ">linked</a></p>"#).unwrap();
        let runs = doc.blocks()[0].runs();
        assert_eq!(runs[0].text, "plain ");
        assert!(runs[0].marks.is_empty());
        assert_eq!(runs[1].marks.get(MarkKind::Link), Some(&Mark::link("https://x")));
    }

    #[test]
    fn test_lists() {
        let doc = parse("<ol><li>one</li><li><p>two</p><ul><li>nested</li></ul></li></ol>").unwrap();
        let list = &doc.blocks()[0];
        assert_eq!(*list.kind(), NodeKind::OrderedList);
        assert_eq!(list.children().len(), 2);
        let second = &list.children()[1];
        assert_eq!(second.children().len(), 2);
        assert_eq!(*second.children()[1].kind(), NodeKind::BulletList);
    }

    #[test]
    fn test_empty_list_item_gets_paragraph() {
        let doc = parse("<ul><li></li></ul>").unwrap();
        let item = &doc.blocks()[0].children()[0];
        assert_eq!(item.children().len(), 1);
        assert!(item.children()[0].kind().is_textblock());
    }

    #[test]
    fn test_table_with_sections() {
        let doc = parse(
            "<table><thead><tr><th>h</th></tr></thead><tbody><tr><td><p>c</p></td></tr></tbody></table>",
        )
        .unwrap();
        let table = &doc.blocks()[0];
        assert_eq!(table.children().len(), 2);
        assert_eq!(
            *table.children()[0].children()[0].kind(),
            NodeKind::TableHeaderCell
        );
        assert_eq!(*table.children()[1].children()[0].kind(), NodeKind::TableCell);
    }

    #[test]
    fn test_stray_table_content_fostered() {
        let doc = parse("<table>oops<tr><td>x</td></tr></table>").unwrap();
        assert_eq!(doc.blocks()[0].text_content(), "oops");
        assert_eq!(*doc.blocks()[1].kind(), NodeKind::Table);
    }

    #[test]
    fn test_style_marks() {
        let doc = parse(r#"<p><span style="font-weight: 700">b</span></p>"#).unwrap();
        assert!(doc.blocks()[0].runs()[0].marks.contains(MarkKind::Bold));
    }

    #[test]
    fn test_loose_text_becomes_paragraph() {
        let doc = parse("just text<p>p</p>").unwrap();
        assert_eq!(doc.blocks().len(), 2);
        assert_eq!(doc.blocks()[0].text_content(), "just text");
    }
}
