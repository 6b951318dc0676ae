//! Document to markup rendering.
//!
//! Output is deterministic: attributes in a fixed order, marks nested in
//! canonical order (link outermost), no whitespace between elements.

use std::fmt::Write;

use crate::document::{Document, Mark, Node, NodeKind, TextAlign, TextRun};

/// Attributes every link carries besides its href.
const LINK_ATTRS: &str = r#"target="_blank" rel="noopener noreferrer nofollow""#;

/// Render `doc` as markup.
pub fn render(doc: &Document) -> String {
    let mut out = String::new();
    for block in doc.blocks() {
        render_block(block, &mut out);
    }
    out
}

fn render_block(node: &Node, out: &mut String) {
    match node.kind() {
        NodeKind::Paragraph { align } => {
            out.push_str("<p");
            push_align(*align, out);
            out.push('>');
            render_runs(node.runs(), out);
            out.push_str("</p>");
        }
        NodeKind::Heading { level, align } => {
            let _ = write!(out, "<h{}", level.as_u8());
            push_align(*align, out);
            out.push('>');
            render_runs(node.runs(), out);
            let _ = write!(out, "</h{}>", level.as_u8());
        }
        NodeKind::Image { src, width } => {
            let width = html_escape(width.as_str());
            let _ = write!(
                out,
                r#"<img src="{}" width="{}" style="width: {}; cursor: nw-resize;">"#,
                html_escape(src),
                width,
                width
            );
        }
        NodeKind::BulletList => wrap("ul", "", node, out),
        NodeKind::OrderedList => wrap("ol", "", node, out),
        NodeKind::ListItem => wrap("li", "", node, out),
        NodeKind::Table => {
            out.push_str("<table><tbody>");
            render_children(node, out);
            out.push_str("</tbody></table>");
        }
        NodeKind::TableRow => wrap("tr", "", node, out),
        NodeKind::TableCell => wrap("td", r#" colspan="1" rowspan="1""#, node, out),
        NodeKind::TableHeaderCell => wrap("th", r#" colspan="1" rowspan="1""#, node, out),
        NodeKind::Document => render_children(node, out),
    }
}

fn wrap(tag: &str, attrs: &str, node: &Node, out: &mut String) {
    let _ = write!(out, "<{}{}>", tag, attrs);
    render_children(node, out);
    let _ = write!(out, "</{}>", tag);
}

fn render_children(node: &Node, out: &mut String) {
    for child in node.children() {
        render_block(child, out);
    }
}

fn push_align(align: Option<TextAlign>, out: &mut String) {
    if let Some(align) = align {
        let _ = write!(out, r#" style="text-align: {}""#, align.as_css());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Content
// ─────────────────────────────────────────────────────────────────────────────

/// Render runs, keeping marks shared by neighbouring runs open across them.
fn render_runs(runs: &[TextRun], out: &mut String) {
    let mut open: Vec<&Mark> = Vec::new();
    for run in runs {
        let wanted: Vec<&Mark> = run.marks.iter().collect();
        let shared = open
            .iter()
            .zip(&wanted)
            .take_while(|(a, b)| a == b)
            .count();
        while open.len() > shared {
            if let Some(mark) = open.pop() {
                close_mark(mark, out);
            }
        }
        for mark in &wanted[shared..] {
            open_mark(mark, out);
            open.push(*mark);
        }
        out.push_str(&html_escape(&run.text));
    }
    while let Some(mark) = open.pop() {
        close_mark(mark, out);
    }
}

fn open_mark(mark: &Mark, out: &mut String) {
    match mark {
        Mark::Link { href } => {
            let _ = write!(out, r#"<a href="{}" {}>"#, html_escape(href), LINK_ATTRS);
        }
        other => {
            let _ = write!(out, "<{}>", mark_tag(other));
        }
    }
}

fn close_mark(mark: &Mark, out: &mut String) {
    let _ = write!(out, "</{}>", mark_tag(mark));
}

fn mark_tag(mark: &Mark) -> &'static str {
    match mark {
        Mark::Bold => "strong",
        Mark::Italic => "em",
        Mark::Underline => "u",
        Mark::Subscript => "sub",
        Mark::Superscript => "sup",
        Mark::Link { .. } => "a",
    }
}

/// HTML-escape a string.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
