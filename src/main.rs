//! Scribe - Main Entry Point
//!
//! Headless host for the editor core: loads a document, replays an editing
//! script against it and writes the resulting markup.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};
use scribe::config::{load_config, update_config, FontSize, Settings, Theme};
use scribe::editor::{DirectoryStore, Editor};
use scribe::error::{Error, Result};
use scribe::script::{load_script, run_script};

/// Application name constant.
const APP_NAME: &str = "Scribe";

// ─────────────────────────────────────────────────────────────────────────────
// Arguments
// ─────────────────────────────────────────────────────────────────────────────

/// Scribe - open a document, replay an editing script, write the markup
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Markup file to open (an empty document when omitted)
    input: Option<PathBuf>,

    /// JSON array of editing steps to replay
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Where to write the resulting markup (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory uploaded images are stored in
    #[arg(long, default_value = "images")]
    images: PathBuf,

    /// URL prefix uploaded images are linked with
    #[arg(long, default_value = "images")]
    image_url: String,

    /// Set and save the color theme (light, dark)
    #[arg(long)]
    theme: Option<Theme>,

    /// Set and save the text size (small, medium, large)
    #[arg(long)]
    font_size: Option<FontSize>,

    /// Set and save whether rejected steps are reported
    #[arg(long)]
    notifications: Option<bool>,

    /// Set and save whether the output is rewritten after every change
    #[arg(long)]
    auto_save: Option<bool>,
}

impl Args {
    fn changes_preferences(&self) -> bool {
        self.theme.is_some()
            || self.font_size.is_some()
            || self.notifications.is_some()
            || self.auto_save.is_some()
    }

    fn apply_preferences(&self, settings: &mut Settings) {
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(font_size) = self.font_size {
            settings.font_size = font_size;
        }
        if let Some(notifications) = self.notifications {
            settings.notifications = notifications;
        }
        if let Some(auto_save) = self.auto_save {
            settings.auto_save = auto_save;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting {}", APP_NAME);

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let settings = if args.changes_preferences() {
        update_config(|settings| args.apply_preferences(settings))?
    } else {
        load_config()
    };

    let markup = match &args.input {
        Some(path) => fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.clone(),
            source: e,
        })?,
        None => String::new(),
    };
    let mut editor = Editor::new(&markup, settings.editor_options())?;

    // Keep the output file current while the script runs
    if settings.auto_save {
        if let Some(output) = args.output.clone() {
            editor.set_on_change(move |html| {
                if let Err(e) = write_output(&output, html) {
                    warn!("Auto-save failed: {}", e);
                }
            });
        }
    }

    if let Some(script) = &args.script {
        let steps = load_script(script)?;
        let mut store = DirectoryStore::new(args.images.clone(), args.image_url.clone());
        let report = run_script(&mut editor, &steps, &mut store)?;
        if settings.notifications && report.rejected > 0 {
            eprintln!("{} step(s) were rejected, see the log for details", report.rejected);
        }
    }

    let html = editor.html();
    match &args.output {
        Some(path) => {
            write_output(path, &html)?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}

fn write_output(path: &Path, html: &str) -> Result<()> {
    fs::write(path, html).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
