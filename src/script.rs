//! Editing scripts
//!
//! A script is a JSON array of steps replayed against an editor the way a
//! user session would drive it: selection changes, commands, toolbar
//! presses, link prompts, pointer events and image uploads.
//!
//! ```json
//! [
//!   { "step": "select", "anchor": 0, "head": 5 },
//!   { "step": "press", "button": "bold" },
//!   { "step": "command", "command": "insertText", "text": "!" },
//!   { "step": "pointer", "type": "down", "x": 100, "target": { "path": [1], "renderedWidth": 200 } },
//!   { "step": "upload", "path": "cat.png" }
//! ]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::commands::EditCommand;
use crate::document::Selection;
use crate::editor::{Editor, ImageStore, PointerEvent, ToolbarAction, ToolbarButton, UploadFile};
use crate::error::{Error, Result};

/// One step of an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum ScriptStep {
    /// Move the selection. Without `head` the selection is collapsed.
    Select {
        anchor: usize,
        #[serde(default)]
        head: Option<usize>,
    },
    /// Run an editing command
    Command(EditCommand),
    /// Press a toolbar button
    Press { button: ToolbarButton },
    /// Answer the link prompt. `null` cancels it.
    Link {
        #[serde(default)]
        url: Option<String>,
    },
    /// Feed a pointer event to the image resize interaction
    Pointer(PointerEvent),
    /// Upload an image file and insert it at the cursor
    Upload { path: PathBuf },
}

/// What happened while running a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    /// Steps that ran successfully
    pub applied: usize,
    /// Steps refused with a user-facing error (document left unchanged)
    pub rejected: usize,
}

/// Load a script from a JSON file.
pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let contents = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let steps: Vec<ScriptStep> = serde_json::from_str(&contents)?;
    debug!("Loaded {} script steps from {}", steps.len(), path.display());
    Ok(steps)
}

/// Replay `steps` against `editor`.
///
/// Command rejections and upload failures are logged and counted, as a user
/// would see them and carry on. Any other error stops the script.
pub fn run_script(
    editor: &mut Editor,
    steps: &[ScriptStep],
    store: &mut dyn ImageStore,
) -> Result<ScriptReport> {
    let mut report = ScriptReport::default();
    for (index, step) in steps.iter().enumerate() {
        match run_step(editor, step, store) {
            Ok(()) => report.applied += 1,
            Err(err) if is_recoverable(&err) => {
                warn!("Step {} rejected: {}", index + 1, err);
                report.rejected += 1;
            }
            Err(err) => return Err(err),
        }
    }
    info!(
        "Script finished: {} applied, {} rejected",
        report.applied, report.rejected
    );
    Ok(report)
}

fn is_recoverable(err: &Error) -> bool {
    err.is_command_rejection() || matches!(err, Error::UploadFailure(_))
}

fn run_step(editor: &mut Editor, step: &ScriptStep, store: &mut dyn ImageStore) -> Result<()> {
    match step {
        ScriptStep::Select { anchor, head } => {
            editor.set_selection(Selection::new(*anchor, head.unwrap_or(*anchor)));
        }
        ScriptStep::Command(command) => {
            editor.execute(command)?;
        }
        ScriptStep::Press { button } => match editor.press(*button)? {
            ToolbarAction::Run(_) => {}
            ToolbarAction::PickImage => debug!("image button pressed, waiting for an upload step"),
            ToolbarAction::PromptLink => debug!("link button pressed, waiting for a link step"),
        },
        ScriptStep::Link { url } => {
            editor.submit_link(url.as_deref())?;
        }
        ScriptStep::Pointer(event) => {
            editor.pointer(event);
        }
        ScriptStep::Upload { path } => {
            let file = UploadFile::from_path(path)?;
            editor.upload_image(store, &file)?;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
