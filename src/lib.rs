//! Scribe - structured rich-text document editor core
//!
//! The crate keeps a typed content tree (paragraphs, headings, lists,
//! tables, images, inline marks), applies atomic editing commands to it,
//! reports which formatting is active for a toolbar, drives drag-resizing of
//! images and converts documents to and from an HTML subset.
//!
//! # Modules
//! - [`document`]: content tree, marks, selection and schema validation
//! - [`commands`]: atomic editing commands
//! - [`editor`]: editor instance, active state, toolbar, resize and upload
//! - [`markup`]: HTML parsing and rendering
//! - [`config`]: persisted user settings
//! - [`script`]: replaying editing sessions from JSON

pub mod commands;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod markup;
pub mod script;
mod string_utils;

pub use editor::{Editor, EditorOptions};
pub use error::{Error, Result};
