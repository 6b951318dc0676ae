//! Lenient element tree built from markup tokens.
//!
//! Mirrors the forgiving parts of browser tree construction that matter for
//! editor content: unclosed paragraphs, list items, rows and cells are closed
//! implicitly, stray close tags are ignored and every element still open at
//! the end of input is closed.

use super::lexer::Token;

/// A node of the element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DomNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<DomNode>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a declaration in the `style` attribute, lowercased.
    pub fn style(&self, property: &str) -> Option<String> {
        self.attr("style")?
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(property))
            .map(|(_, value)| value.trim().to_ascii_lowercase())
    }
}

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Textblock-like elements closed by any block-level start tag.
const TEXTBLOCK_ELEMENTS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Start tags that close an open paragraph or heading.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

pub(crate) fn is_block_element(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tree Construction
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct TreeBuilder {
    roots: Vec<DomNode>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn append(&mut self, node: DomNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    /// Close the innermost open element.
    fn pop(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(DomNode::Element(element));
        }
    }

    /// Close elements down to and including the innermost one named in
    /// `targets`, unless an element named in `boundaries` is reached first.
    fn close_nearest(&mut self, targets: &[&str], boundaries: &[&str]) {
        for depth in (0..self.open.len()).rev() {
            let name = self.open[depth].name.as_str();
            if targets.contains(&name) {
                while self.open.len() > depth {
                    self.pop();
                }
                return;
            }
            if boundaries.contains(&name) {
                return;
            }
        }
    }

    fn close_implied(&mut self, name: &str) {
        if is_block_element(name) {
            self.close_nearest(
                TEXTBLOCK_ELEMENTS,
                &["li", "td", "th", "ul", "ol", "table", "div", "blockquote"],
            );
        }
        match name {
            "li" => self.close_nearest(&["li"], &["ul", "ol", "table"]),
            "tr" => self.close_nearest(&["tr"], &["table"]),
            "td" | "th" => self.close_nearest(&["td", "th"], &["tr", "table"]),
            "thead" | "tbody" | "tfoot" => {
                self.close_nearest(&["thead", "tbody", "tfoot"], &["table"])
            }
            _ => {}
        }
    }

    fn open_element(&mut self, name: String, attrs: Vec<(String, String)>, self_closing: bool) {
        self.close_implied(&name);
        let element = Element {
            name,
            attrs,
            children: Vec::new(),
        };
        if self_closing || VOID_ELEMENTS.contains(&element.name.as_str()) {
            self.append(DomNode::Element(element));
        } else {
            self.open.push(element);
        }
    }

    fn close_element(&mut self, name: &str) {
        if let Some(depth) = self.open.iter().rposition(|e| e.name == name) {
            while self.open.len() > depth {
                self.pop();
            }
        }
    }

    fn finish(mut self) -> Vec<DomNode> {
        while !self.open.is_empty() {
            self.pop();
        }
        self.roots
    }
}

/// Build the element tree for `tokens`.
pub(crate) fn build(tokens: Vec<Token>) -> Vec<DomNode> {
    let mut builder = TreeBuilder::default();
    for token in tokens {
        match token {
            Token::Open {
                name,
                attrs,
                self_closing,
            } => builder.open_element(name, attrs, self_closing),
            Token::Close { name } => builder.close_element(&name),
            Token::Text(text) => builder.append(DomNode::Text(text)),
        }
    }
    builder.finish()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
