//! Toolbar Controller
//!
//! Describes the editor toolbar: which buttons exist, how they are labelled,
//! whether each one shows as active, and what pressing it does. Rendering is
//! left to the host.

use serde::{Deserialize, Serialize};

use crate::commands::{BlockKind, EditCommand};
use crate::document::{HeadingLevel, Mark, TextAlign};

use super::formatting::{ActiveQuery, FormattingState};

// ─────────────────────────────────────────────────────────────────────────────
// Table Shape
// ─────────────────────────────────────────────────────────────────────────────

/// Shape of a table inserted from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableShape {
    pub rows: usize,
    pub cols: usize,
    pub with_header_row: bool,
}

impl Default for TableShape {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 3,
            with_header_row: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Buttons
// ─────────────────────────────────────────────────────────────────────────────

/// Toolbar buttons, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolbarButton {
    Heading1,
    Heading2,
    Bold,
    Italic,
    Underline,
    BulletList,
    NumberedList,
    AlignLeft,
    AlignCenter,
    AlignRight,
    Subscript,
    Superscript,
    Image,
    Table,
    Link,
}

impl ToolbarButton {
    /// Every button, in display order.
    pub const ALL: [ToolbarButton; 15] = [
        ToolbarButton::Heading1,
        ToolbarButton::Heading2,
        ToolbarButton::Bold,
        ToolbarButton::Italic,
        ToolbarButton::Underline,
        ToolbarButton::BulletList,
        ToolbarButton::NumberedList,
        ToolbarButton::AlignLeft,
        ToolbarButton::AlignCenter,
        ToolbarButton::AlignRight,
        ToolbarButton::Subscript,
        ToolbarButton::Superscript,
        ToolbarButton::Image,
        ToolbarButton::Table,
        ToolbarButton::Link,
    ];

    /// Button title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Heading1 => "Heading 1",
            Self::Heading2 => "Heading 2",
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::Underline => "Underline",
            Self::BulletList => "Bullet List",
            Self::NumberedList => "Numbered List",
            Self::AlignLeft => "Align Left",
            Self::AlignCenter => "Align Center",
            Self::AlignRight => "Align Right",
            Self::Subscript => "Subscript",
            Self::Superscript => "Superscript",
            Self::Image => "Insert Image",
            Self::Table => "Insert Table",
            Self::Link => "Insert Link",
        }
    }

    /// Get the icon for this button.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Heading1 => "H1",
            Self::Heading2 => "H2",
            Self::Bold => "𝐁",
            Self::Italic => "𝐼",
            Self::Underline => "U̲",
            Self::BulletList => "\u{2022}", // bullet •
            Self::NumberedList => "1.",
            Self::AlignLeft => "\u{21E4}",   // ⇤
            Self::AlignCenter => "\u{2194}", // ↔
            Self::AlignRight => "\u{21E5}",  // ⇥
            Self::Subscript => "X\u{2082}",
            Self::Superscript => "X\u{00B2}",
            Self::Image => "🖼",
            Self::Table => "\u{25A6}", // ▦
            Self::Link => "🔗",
        }
    }

    /// Keyboard shortcut shown in the tooltip, if the button has one.
    pub fn shortcut_label(&self) -> Option<&'static str> {
        match self {
            Self::Heading1 => Some("Ctrl+Alt+1"),
            Self::Heading2 => Some("Ctrl+Alt+2"),
            Self::Bold => Some("Ctrl+B"),
            Self::Italic => Some("Ctrl+I"),
            Self::Underline => Some("Ctrl+U"),
            Self::BulletList => Some("Ctrl+Shift+8"),
            Self::NumberedList => Some("Ctrl+Shift+7"),
            Self::AlignLeft => Some("Ctrl+Shift+L"),
            Self::AlignCenter => Some("Ctrl+Shift+E"),
            Self::AlignRight => Some("Ctrl+Shift+R"),
            Self::Subscript => Some("Ctrl+,"),
            Self::Superscript => Some("Ctrl+."),
            Self::Link => Some("Ctrl+K"),
            Self::Image | Self::Table => None,
        }
    }

    /// Get the tooltip text for this button.
    pub fn tooltip(&self) -> String {
        match self.shortcut_label() {
            Some(shortcut) => format!("{} ({})", self.title(), shortcut),
            None => self.title().to_string(),
        }
    }

    /// The formatting this button reflects. Insert buttons reflect nothing.
    pub fn active_query(&self) -> Option<ActiveQuery> {
        use crate::document::MarkKind;

        Some(match self {
            Self::Heading1 => ActiveQuery::Block(BlockKind::Heading(HeadingLevel::H1)),
            Self::Heading2 => ActiveQuery::Block(BlockKind::Heading(HeadingLevel::H2)),
            Self::Bold => ActiveQuery::Mark(MarkKind::Bold),
            Self::Italic => ActiveQuery::Mark(MarkKind::Italic),
            Self::Underline => ActiveQuery::Mark(MarkKind::Underline),
            Self::BulletList => ActiveQuery::Block(BlockKind::BulletList),
            Self::NumberedList => ActiveQuery::Block(BlockKind::OrderedList),
            Self::AlignLeft => ActiveQuery::Align(TextAlign::Left),
            Self::AlignCenter => ActiveQuery::Align(TextAlign::Center),
            Self::AlignRight => ActiveQuery::Align(TextAlign::Right),
            Self::Subscript => ActiveQuery::Mark(MarkKind::Subscript),
            Self::Superscript => ActiveQuery::Mark(MarkKind::Superscript),
            Self::Link => ActiveQuery::Mark(MarkKind::Link),
            Self::Image | Self::Table => return None,
        })
    }

    /// Whether the button shows as active for `state`.
    pub fn is_active(&self, state: &FormattingState) -> bool {
        match self {
            Self::Heading1 => state.heading_level == Some(HeadingLevel::H1),
            Self::Heading2 => state.heading_level == Some(HeadingLevel::H2),
            Self::Bold => state.is_bold,
            Self::Italic => state.is_italic,
            Self::Underline => state.is_underline,
            Self::BulletList => state.is_bullet_list,
            Self::NumberedList => state.is_numbered_list,
            Self::AlignLeft => state.align == Some(TextAlign::Left),
            Self::AlignCenter => state.align == Some(TextAlign::Center),
            Self::AlignRight => state.align == Some(TextAlign::Right),
            Self::Subscript => state.is_subscript,
            Self::Superscript => state.is_superscript,
            Self::Link => state.is_link,
            Self::Image | Self::Table => false,
        }
    }

    /// What pressing the button does.
    pub fn action(&self, table: TableShape) -> ToolbarAction {
        let command = match self {
            Self::Heading1 => EditCommand::ToggleBlockKind {
                kind: BlockKind::Heading(HeadingLevel::H1),
            },
            Self::Heading2 => EditCommand::ToggleBlockKind {
                kind: BlockKind::Heading(HeadingLevel::H2),
            },
            Self::Bold => EditCommand::ToggleMark { mark: Mark::Bold },
            Self::Italic => EditCommand::ToggleMark { mark: Mark::Italic },
            Self::Underline => EditCommand::ToggleMark {
                mark: Mark::Underline,
            },
            Self::BulletList => EditCommand::ToggleBlockKind {
                kind: BlockKind::BulletList,
            },
            Self::NumberedList => EditCommand::ToggleBlockKind {
                kind: BlockKind::OrderedList,
            },
            Self::AlignLeft => EditCommand::SetTextAlign {
                align: TextAlign::Left,
            },
            Self::AlignCenter => EditCommand::SetTextAlign {
                align: TextAlign::Center,
            },
            Self::AlignRight => EditCommand::SetTextAlign {
                align: TextAlign::Right,
            },
            Self::Subscript => EditCommand::ToggleMark {
                mark: Mark::Subscript,
            },
            Self::Superscript => EditCommand::ToggleMark {
                mark: Mark::Superscript,
            },
            Self::Table => EditCommand::InsertTable {
                rows: table.rows,
                cols: table.cols,
                with_header_row: table.with_header_row,
            },
            Self::Image => return ToolbarAction::PickImage,
            Self::Link => return ToolbarAction::PromptLink,
        };
        ToolbarAction::Run(command)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Actions and Items
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of pressing a toolbar button.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    /// Run this command right away
    Run(EditCommand),
    /// The host must let the user pick an image file, then upload it
    PickImage,
    /// The host must prompt for a link URL, then call `submit_link`
    PromptLink,
}

/// Build the command for a URL typed into the link prompt.
///
/// A cancelled prompt (`None`) or a blank URL yields no command.
pub fn link_command(url: Option<&str>) -> Option<EditCommand> {
    let url = url?.trim();
    (!url.is_empty()).then(|| EditCommand::SetLink {
        href: url.to_string(),
    })
}

/// One button as the host should draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarItem {
    pub button: ToolbarButton,
    pub title: &'static str,
    pub icon: &'static str,
    pub tooltip: String,
    pub active: bool,
}

/// Every toolbar item for `state`, in display order.
pub fn toolbar_items(state: &FormattingState) -> Vec<ToolbarItem> {
    ToolbarButton::ALL
        .iter()
        .map(|button| ToolbarItem {
            button: *button,
            title: button.title(),
            icon: button.icon(),
            tooltip: button.tooltip(),
            active: button.is_active(state),
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
