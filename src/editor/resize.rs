//! Image Resize Interaction
//!
//! Pointer-driven drag resizing of embedded images. The controller only
//! interprets pointer events; it never touches the document. The editor
//! shows [`ResizeEffect::Preview`] widths as presentational state and writes
//! the width into the image node on [`ResizeEffect::Commit`].
//!
//! Malformed event sequences (a move without a press, a second press while
//! dragging, a release while idle) are ignored.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::document::{CssLength, NodePath};

/// Smallest width, in pixels, an image can be dragged to.
pub const DEFAULT_MIN_WIDTH: f32 = 100.0;

// ─────────────────────────────────────────────────────────────────────────────
// Events and Effects
// ─────────────────────────────────────────────────────────────────────────────

/// An image under the pointer at press time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTarget {
    /// Path of the image node
    pub path: NodePath,
    /// Width the image is currently rendered at, in pixels
    pub rendered_width: f32,
}

/// Pointer input, in the host's horizontal coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerEvent {
    /// Button pressed. `target` is the image under the pointer, if any.
    Down {
        x: f32,
        #[serde(default)]
        target: Option<ImageTarget>,
    },
    Move { x: f32 },
    Up,
    Leave,
}

/// What the editor should do in response to a pointer event.
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeEffect {
    /// Show the image at `width` pixels without changing the document
    Preview { path: NodePath, width: f32 },
    /// Store `width` pixels as the image's width attribute
    Commit { path: NodePath, width: f32 },
}

// ─────────────────────────────────────────────────────────────────────────────
// State Machine
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum ResizeState {
    Idle,
    Dragging {
        path: NodePath,
        origin_x: f32,
        origin_width: f32,
        current_width: f32,
    },
}

/// Tracks at most one image drag at a time.
#[derive(Debug, Clone)]
pub struct ResizeController {
    state: ResizeState,
    min_width: f32,
}

impl Default for ResizeController {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_WIDTH)
    }
}

impl ResizeController {
    pub fn new(min_width: f32) -> Self {
        Self {
            state: ResizeState::Idle,
            min_width,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ResizeState::Dragging { .. })
    }

    /// Path of the image being dragged.
    pub fn active_image(&self) -> Option<&NodePath> {
        match &self.state {
            ResizeState::Dragging { path, .. } => Some(path),
            ResizeState::Idle => None,
        }
    }

    /// Preview width of the image being dragged.
    pub fn preview_width(&self) -> Option<f32> {
        match &self.state {
            ResizeState::Dragging { current_width, .. } => Some(*current_width),
            ResizeState::Idle => None,
        }
    }

    /// Drop any drag in progress without committing it.
    pub fn cancel(&mut self) {
        self.state = ResizeState::Idle;
    }

    /// Feed one pointer event.
    pub fn handle(&mut self, event: &PointerEvent) -> Option<ResizeEffect> {
        match (&mut self.state, event) {
            (ResizeState::Idle, PointerEvent::Down { x, target: Some(target) }) => {
                if !x.is_finite() || !target.rendered_width.is_finite() {
                    return None;
                }
                debug!(
                    "resize start on {:?} at x={} (width {})",
                    target.path, x, target.rendered_width
                );
                self.state = ResizeState::Dragging {
                    path: target.path.clone(),
                    origin_x: *x,
                    origin_width: target.rendered_width,
                    current_width: target.rendered_width,
                };
                None
            }
            (
                ResizeState::Dragging {
                    path,
                    origin_x,
                    origin_width,
                    current_width,
                },
                PointerEvent::Move { x },
            ) => {
                if !x.is_finite() {
                    return None;
                }
                *current_width = (*origin_width + (x - *origin_x))
                    .min(CssLength::MAX_PIXELS)
                    .max(self.min_width);
                Some(ResizeEffect::Preview {
                    path: path.clone(),
                    width: *current_width,
                })
            }
            (
                ResizeState::Dragging {
                    path,
                    current_width,
                    ..
                },
                PointerEvent::Up | PointerEvent::Leave,
            ) => {
                let effect = ResizeEffect::Commit {
                    path: std::mem::take(path),
                    width: *current_width,
                };
                debug!("resize commit: {:?}", effect);
                self.state = ResizeState::Idle;
                Some(effect)
            }
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
