//! Centralized error handling for Scribe
//!
//! This module provides a unified error type that covers every failure the
//! editor core can report: structural violations of the content tree,
//! rejected editing commands, image upload failures, file I/O and
//! configuration persistence.

use log::warn;
use std::fmt;
use std::io;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the editor.
pub type Result<T> = std::result::Result<T, Error>;

/// The centralized error type for the editor.
#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Content Tree Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// A node was placed where the document schema does not allow it.
    /// This is a programming error and is never silently repaired.
    StructuralViolation { parent: String, child: String },

    /// A node or attribute broke a schema rule other than parent/child shape
    /// (empty container, empty `src`, ...)
    InvalidNode(String),

    // ─────────────────────────────────────────────────────────────────────────
    // Command Validation Errors (document left unchanged)
    // ─────────────────────────────────────────────────────────────────────────
    /// `insert_image` was called with an empty source
    InvalidSource,

    /// An image width that is not a CSS length
    InvalidWidth(String),

    /// `insert_table` was called with zero rows or columns
    InvalidDimensions { rows: usize, cols: usize },

    /// A command that needs selected text was run on a collapsed selection
    EmptySelection,

    /// A link command was given an empty `href`
    InvalidHref,

    // ─────────────────────────────────────────────────────────────────────────
    // Upload Errors (document left unchanged, caller may retry)
    // ─────────────────────────────────────────────────────────────────────────
    /// The image storage collaborator rejected or failed the upload
    UploadFailure(String),

    /// An upload completion arrived for a ticket the editor never issued
    UnknownUpload(u64),

    // ─────────────────────────────────────────────────────────────────────────
    // File I/O Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic I/O error wrapper
    Io(io::Error),

    /// Failed to read file contents
    FileRead { path: PathBuf, source: io::Error },

    /// Failed to write file contents
    FileWrite { path: PathBuf, source: io::Error },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to load configuration file
    ConfigLoad {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to save configuration file
    ConfigSave {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse configuration or a command script (invalid JSON)
    ConfigParse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration directory not found or inaccessible
    ConfigDirNotFound,

    // ─────────────────────────────────────────────────────────────────────────
    // Application Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic application error with a message
    Application(String),
}

impl Error {
    /// Whether this error is a caller-input rejection of an editing command.
    ///
    /// These leave the document untouched and are safe to surface to the
    /// user as-is.
    pub fn is_command_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidSource
                | Error::InvalidWidth(_)
                | Error::InvalidDimensions { .. }
                | Error::EmptySelection
                | Error::InvalidHref
        )
    }
}

// Implement From traits for convenient error conversion
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display trait implementation for user-friendly error messages
// ─────────────────────────────────────────────────────────────────────────────
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Content Tree Errors
            Error::StructuralViolation { parent, child } => {
                write!(f, "Structural violation: {} cannot contain {}", parent, child)
            }
            Error::InvalidNode(msg) => write!(f, "Invalid node: {}", msg),

            // Command Validation Errors
            Error::InvalidSource => write!(f, "Image source must not be empty"),
            Error::InvalidWidth(width) => {
                write!(f, "'{}' is not a valid CSS length", width)
            }
            Error::InvalidDimensions { rows, cols } => {
                write!(
                    f,
                    "Invalid table dimensions {}x{}: rows and columns must be at least 1",
                    rows, cols
                )
            }
            Error::EmptySelection => write!(f, "This command needs a non-empty selection"),
            Error::InvalidHref => write!(f, "Link target must not be empty"),

            // Upload Errors
            Error::UploadFailure(msg) => write!(f, "Image upload failed: {}", msg),
            Error::UnknownUpload(ticket) => write!(f, "Unknown upload ticket #{}", ticket),

            // File I/O Errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::FileRead { path, source } => {
                write!(f, "Failed to read '{}': {}", path.display(), source)
            }
            Error::FileWrite { path, source } => {
                write!(f, "Failed to write '{}': {}", path.display(), source)
            }

            // Configuration Errors
            Error::ConfigLoad { path, source } => {
                write!(
                    f,
                    "Failed to load configuration from '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigSave { path, source } => {
                write!(
                    f,
                    "Failed to save configuration to '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigParse { message, .. } => {
                write!(f, "Invalid configuration format: {}", message)
            }
            Error::ConfigDirNotFound => {
                write!(f, "Configuration directory not found")
            }

            // Application Errors
            Error::Application(msg) => write!(f, "{}", msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// std::error::Error trait implementation for error chaining
// ─────────────────────────────────────────────────────────────────────────────
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::FileRead { source, .. } => Some(source),
            Error::FileWrite { source, .. } => Some(source),
            Error::ConfigLoad { source, .. } => Some(source.as_ref()),
            Error::ConfigSave { source, .. } => Some(source.as_ref()),
            Error::ConfigParse { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            Error::StructuralViolation { .. }
            | Error::InvalidNode(_)
            | Error::InvalidSource
            | Error::InvalidWidth(_)
            | Error::InvalidDimensions { .. }
            | Error::EmptySelection
            | Error::InvalidHref
            | Error::UploadFailure(_)
            | Error::UnknownUpload(_)
            | Error::ConfigDirNotFound
            | Error::Application(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for Result to support graceful degradation.
pub trait ResultExt<T> {
    /// If the result is an error, log it at warning level and return the provided default.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {}. Using default.", context, err);
                default
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_creation() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test error");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_structural_violation_display() {
        let err = Error::StructuralViolation {
            parent: "document".to_string(),
            child: "tableRow".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Structural violation: document cannot contain tableRow"
        );
    }

    #[test]
    fn test_invalid_dimensions_display() {
        let err = Error::InvalidDimensions { rows: 0, cols: 3 };
        let msg = err.to_string();
        assert!(msg.contains("0x3"));
    }

    #[test]
    fn test_command_rejections() {
        assert!(Error::EmptySelection.is_command_rejection());
        assert!(Error::InvalidSource.is_command_rejection());
        assert!(Error::InvalidDimensions { rows: 0, cols: 0 }.is_command_rejection());
        assert!(!Error::UploadFailure("offline".to_string()).is_command_rejection());
        assert!(!Error::StructuralViolation {
            parent: "table".to_string(),
            child: "paragraph".to_string(),
        }
        .is_command_rejection());
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_result: std::result::Result<String, _> = serde_json::from_str("invalid json");
        let err = Error::from(json_result.unwrap_err());
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_display_upload_failure() {
        let err = Error::UploadFailure("bucket not found".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("upload failed"));
        assert!(msg.contains("bucket not found"));
    }

    #[test]
    fn test_display_config_dir_not_found() {
        let err = Error::ConfigDirNotFound;
        assert_eq!(format!("{}", err), "Configuration directory not found");
    }

    #[test]
    fn test_error_source_io() {
        use std::error::Error as StdError;
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let err = Error::FileRead {
            path: PathBuf::from("/doc.html"),
            source: io_err,
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_source_none_for_simple_variants() {
        use std::error::Error as StdError;
        assert!(Error::EmptySelection.source().is_none());
        assert!(Error::Application("test".to_string()).source().is_none());
        assert!(Error::ConfigDirNotFound.source().is_none());
    }

    #[test]
    fn test_unwrap_or_warn_default_ok() {
        let result: super::Result<i32> = Ok(42);
        assert_eq!(result.unwrap_or_warn_default(0, "test context"), 42);
    }

    #[test]
    fn test_unwrap_or_warn_default_err() {
        let result: super::Result<i32> = Err(Error::Application("test".to_string()));
        assert_eq!(result.unwrap_or_warn_default(0, "test context"), 0);
    }
}
