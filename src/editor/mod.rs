//! Editor module for Scribe
//!
//! This module ties the document, the command layer and the serializer
//! together into one editor instance per open document, and hosts the
//! interactive pieces around it: active-state tracking for the toolbar,
//! image drag-resizing and the image upload boundary.

mod formatting;
mod resize;
mod toolbar;
mod upload;

pub use formatting::{is_active, ActiveQuery, FormattingState};
pub use resize::{ImageTarget, PointerEvent, ResizeController, ResizeEffect, DEFAULT_MIN_WIDTH};
pub use toolbar::{link_command, toolbar_items, TableShape, ToolbarAction, ToolbarButton, ToolbarItem};
pub use upload::{DirectoryStore, ImageStore, PendingUploads, UploadFile, UploadTicket};

use std::fmt;

use log::{debug, info, warn};

use crate::commands::{apply_command, CommandOutcome, EditCommand};
use crate::document::{CssLength, Document, MarkSet, NodePath, Selection};
use crate::error::{Error, Result};
use crate::markup;

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Options an editor is constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorOptions {
    /// Text shown while the document is empty
    pub placeholder: String,
    /// Width given to uploaded images
    pub default_image_width: CssLength,
    /// Smallest width an image can be dragged to, in pixels
    pub min_resize_width: f32,
    /// Shape of tables inserted from the toolbar
    pub table: TableShape,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            placeholder: String::from("Start writing..."),
            default_image_width: CssLength::full(),
            min_resize_width: DEFAULT_MIN_WIDTH,
            table: TableShape::default(),
        }
    }
}

/// Callback receiving the serialized document after every change.
pub type ChangeHandler = Box<dyn FnMut(&str)>;

// ─────────────────────────────────────────────────────────────────────────────
// Editor
// ─────────────────────────────────────────────────────────────────────────────

/// One editor instance: exclusively owns its document, selection and
/// stored marks.
pub struct Editor {
    doc: Document,
    selection: Selection,
    stored_marks: Option<MarkSet>,
    resize: ResizeController,
    uploads: PendingUploads,
    options: EditorOptions,
    on_change: Option<ChangeHandler>,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .field("stored_marks", &self.stored_marks)
            .field("resize", &self.resize)
            .field("uploads", &self.uploads)
            .field("options", &self.options)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

impl Editor {
    /// Create an editor from initial markup.
    pub fn new(initial_markup: &str, options: EditorOptions) -> Result<Self> {
        let doc = markup::parse(initial_markup)?;
        Ok(Self::with_document(doc, options))
    }

    /// Create an editor around an already built document.
    pub fn with_document(doc: Document, options: EditorOptions) -> Self {
        debug!(
            "editor created ({} leaves, content end {})",
            doc.leaves().len(),
            doc.content_end()
        );
        Self {
            doc,
            selection: Selection::cursor(0),
            stored_marks: None,
            resize: ResizeController::new(options.min_resize_width),
            uploads: PendingUploads::default(),
            options,
            on_change: None,
        }
    }

    /// Register the callback fired after every change to the document.
    pub fn set_on_change(&mut self, handler: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(handler));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Marks the next typed character will carry, if set explicitly.
    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Serialized document.
    pub fn html(&self) -> String {
        markup::render(&self.doc)
    }

    /// Placeholder text, while the document is empty.
    pub fn placeholder(&self) -> Option<&str> {
        (self.doc.is_empty() && !self.options.placeholder.is_empty())
            .then_some(self.options.placeholder.as_str())
    }

    /// Move the selection. Clamped to the document; clears stored marks.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(&self.doc);
        self.stored_marks = None;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    /// Run `command` at the current selection.
    pub fn execute(&mut self, command: &EditCommand) -> Result<CommandOutcome> {
        let outcome = apply_command(
            &mut self.doc,
            self.selection,
            &mut self.stored_marks,
            command,
        )?;
        self.selection = outcome.selection;
        if outcome.changed {
            if self.resize.is_dragging() {
                debug!("document changed mid-drag, dropping resize");
                self.resize.cancel();
            }
            self.emit_change();
        }
        Ok(outcome)
    }

    /// Evaluate an active-state query at the current selection.
    pub fn is_active(&self, query: &ActiveQuery) -> bool {
        is_active(&self.doc, self.selection, &self.stored_marks, query)
    }

    /// Formatting snapshot at the current selection.
    pub fn formatting_state(&self) -> FormattingState {
        FormattingState::detect(&self.doc, self.selection, &self.stored_marks)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Toolbar
    // ─────────────────────────────────────────────────────────────────────────

    /// Toolbar items reflecting the current selection.
    pub fn toolbar(&self) -> Vec<ToolbarItem> {
        toolbar_items(&self.formatting_state())
    }

    /// Press a toolbar button.
    ///
    /// Buttons backed by a command run it immediately. Buttons needing input
    /// from the user return the action the host has to carry out.
    pub fn press(&mut self, button: ToolbarButton) -> Result<ToolbarAction> {
        let action = button.action(self.options.table);
        if let ToolbarAction::Run(command) = &action {
            self.execute(command)?;
        }
        Ok(action)
    }

    /// Complete a link prompt. A cancelled or blank prompt does nothing.
    pub fn submit_link(&mut self, url: Option<&str>) -> Result<Option<CommandOutcome>> {
        match link_command(url) {
            Some(command) => self.execute(&command).map(Some),
            None => {
                debug!("link prompt dismissed");
                Ok(None)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Image Resize
    // ─────────────────────────────────────────────────────────────────────────

    /// Feed a pointer event to the resize interaction.
    ///
    /// Only a press on an image starts a drag. A commit stores the final
    /// pixel width on the image and notifies the change handler. Any document
    /// change while dragging drops the drag.
    pub fn pointer(&mut self, event: &PointerEvent) -> Option<ResizeEffect> {
        if let PointerEvent::Down {
            target: Some(target),
            ..
        } = event
        {
            let on_image = self
                .doc
                .node_at(&target.path)
                .is_some_and(|node| node.kind().is_image());
            if !self.resize.is_dragging() && !on_image {
                debug!("press on {:?} is not on an image", target.path);
                return None;
            }
        }
        let effect = self.resize.handle(event)?;
        if let ResizeEffect::Commit { path, width } = &effect {
            self.commit_resize(path, *width);
        }
        Some(effect)
    }

    /// Width the image at `path` is being previewed at, while dragged.
    pub fn preview_width(&self, path: &[usize]) -> Option<f32> {
        match self.resize.active_image() {
            Some(active) if active.as_slice() == path => self.resize.preview_width(),
            _ => None,
        }
    }

    fn commit_resize(&mut self, path: &NodePath, width: f32) {
        let mut draft = self.doc.clone();
        let applied = draft
            .set_image_width(path, CssLength::pixels(width))
            .and_then(|changed| draft.validate().map(|_| changed));
        match applied {
            Ok(true) => {
                self.doc = draft;
                self.emit_change();
            }
            Ok(false) => debug!("resize of {:?} left width unchanged", path),
            Err(e) => warn!("Dropping resize commit for {:?}: {}", path, e),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Image Upload
    // ─────────────────────────────────────────────────────────────────────────

    /// Start uploading `file`. The editor stays usable until the ticket is
    /// finished.
    pub fn begin_upload(&mut self, file: &UploadFile) -> Result<UploadTicket> {
        self.uploads.begin(file)
    }

    /// Report the outcome of an upload. On success the image is inserted at
    /// the current cursor; on failure the document is left untouched.
    pub fn finish_upload(&mut self, id: u64, outcome: Result<String>) -> Result<CommandOutcome> {
        let storage_path = self.uploads.finish(id)?;
        let url = outcome.map_err(|e| {
            warn!("Upload {} ({}) failed: {}", id, storage_path, e);
            match e {
                Error::UploadFailure(_) => e,
                other => Error::UploadFailure(other.to_string()),
            }
        })?;
        info!("Upload {} stored at {}", id, url);
        self.execute(&EditCommand::InsertImage {
            src: url,
            width: Some(self.options.default_image_width.to_string()),
        })
    }

    /// Upload `file` through `store` and insert it, in one step.
    pub fn upload_image(
        &mut self,
        store: &mut dyn ImageStore,
        file: &UploadFile,
    ) -> Result<CommandOutcome> {
        let ticket = self.begin_upload(file)?;
        let outcome = store.upload(&ticket.storage_path, file);
        self.finish_upload(ticket.id, outcome)
    }

    /// Number of uploads started but not finished.
    pub fn pending_uploads(&self) -> usize {
        self.uploads.len()
    }

    fn emit_change(&mut self) {
        if let Some(handler) = self.on_change.as_mut() {
            let html = markup::render(&self.doc);
            handler(&html);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
