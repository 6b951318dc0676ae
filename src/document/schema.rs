//! Structural invariants of the content tree.
//!
//! `validate` is run on every document the crate hands out: after parsing,
//! and after every command before the new tree replaces the old one.

use super::marks::{Mark, TextRun};
use super::node::{Node, NodeKind};
use super::tree::Document;
use crate::error::{Error, Result};

impl Document {
    /// Check every schema rule, reporting the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.root().kind != NodeKind::Document {
            return Err(Error::InvalidNode(format!(
                "root must be a document, found {}",
                self.root().kind.name()
            )));
        }
        validate_node(self.root())
    }
}

fn validate_node(node: &Node) -> Result<()> {
    match &node.kind {
        NodeKind::Paragraph { .. } | NodeKind::Heading { .. } => {
            if let Some(child) = node.children.first() {
                return Err(Error::StructuralViolation {
                    parent: node.kind.name().to_string(),
                    child: child.kind.name().to_string(),
                });
            }
            validate_runs(&node.runs)
        }
        NodeKind::Image { src, .. } => {
            if src.trim().is_empty() {
                return Err(Error::InvalidSource);
            }
            if !node.children.is_empty() || !node.runs.is_empty() {
                return Err(Error::InvalidNode("image must not have content".to_string()));
            }
            Ok(())
        }
        _ => {
            if node.children.is_empty() {
                return Err(Error::InvalidNode(format!(
                    "{} must not be empty",
                    node.kind.name()
                )));
            }
            if !node.runs.is_empty() {
                return Err(Error::InvalidNode(format!(
                    "{} cannot hold text directly",
                    node.kind.name()
                )));
            }
            for child in &node.children {
                if !node.kind.allows_child(&child.kind) {
                    return Err(Error::StructuralViolation {
                        parent: node.kind.name().to_string(),
                        child: child.kind.name().to_string(),
                    });
                }
                validate_node(child)?;
            }
            Ok(())
        }
    }
}

fn validate_runs(runs: &[TextRun]) -> Result<()> {
    for (i, run) in runs.iter().enumerate() {
        if run.is_empty() {
            return Err(Error::InvalidNode("empty text run".to_string()));
        }
        if i > 0 && runs[i - 1].marks == run.marks {
            return Err(Error::InvalidNode(
                "adjacent text runs share the same marks".to_string(),
            ));
        }
        for mark in run.marks.iter() {
            if let Mark::Link { href } = mark {
                if href.trim().is_empty() {
                    return Err(Error::InvalidHref);
                }
            }
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
