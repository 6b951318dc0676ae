//! Image Upload
//!
//! Image upload is the editor's only asynchronous boundary. The editor hands
//! out an [`UploadTicket`] when an upload starts, keeps accepting input while
//! the host talks to its storage, and inserts the image only when the host
//! reports the ticket's outcome.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::error::{Error, Result};

/// File extensions accepted when a file carries no usable content type.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "avif"];

// ─────────────────────────────────────────────────────────────────────────────
// Files and Storage
// ─────────────────────────────────────────────────────────────────────────────

/// A file picked by the user for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name, used for its extension
    pub name: String,
    /// MIME type reported by the host, if any
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes,
        }
    }

    /// Read a file from disk. The content type is left to extension sniffing.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, None, bytes))
    }

    /// Lowercased extension of the file name.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// Whether the file is an image, by content type or else by extension.
    pub fn is_image(&self) -> bool {
        match self.content_type.as_deref().map(str::trim) {
            Some(ct) if !ct.is_empty() => ct.to_ascii_lowercase().starts_with("image/"),
            _ => self
                .extension()
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
                .unwrap_or(false),
        }
    }
}

/// Image storage collaborator. Returns the public URL of the stored file.
pub trait ImageStore {
    fn upload(&mut self, storage_path: &str, file: &UploadFile) -> Result<String>;
}

/// Stores images in a local directory and links them by a URL prefix.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    base_url: String,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }
}

impl ImageStore for DirectoryStore {
    fn upload(&mut self, storage_path: &str, file: &UploadFile) -> Result<String> {
        fs::create_dir_all(&self.root)
            .map_err(|e| Error::UploadFailure(format!("cannot create {}: {}", self.root.display(), e)))?;
        let target = self.root.join(storage_path);
        fs::write(&target, &file.bytes).map_err(|e| Error::FileWrite {
            path: target.clone(),
            source: e,
        })?;
        info!("Stored image {} ({} bytes)", target.display(), file.bytes.len());
        let base = self.base_url.trim_end_matches('/');
        Ok(if base.is_empty() {
            storage_path.to_string()
        } else {
            format!("{}/{}", base, storage_path)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tickets
// ─────────────────────────────────────────────────────────────────────────────

/// Handle for an upload in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub id: u64,
    /// Unique storage name, carrying the original extension
    pub storage_path: String,
}

/// Uploads started but not yet finished.
#[derive(Debug, Default)]
pub struct PendingUploads {
    next_id: u64,
    pending: HashMap<u64, String>,
}

impl PendingUploads {
    /// Register `file` and hand out a ticket. Non-image files are refused.
    pub fn begin(&mut self, file: &UploadFile) -> Result<UploadTicket> {
        if !file.is_image() {
            return Err(Error::UploadFailure(format!("{} is not an image", file.name)));
        }
        self.next_id += 1;
        let id = self.next_id;
        let storage_path = storage_name(id, file.extension().as_deref());
        debug!("upload {} started as {}", id, storage_path);
        self.pending.insert(id, storage_path.clone());
        Ok(UploadTicket { id, storage_path })
    }

    /// Retire ticket `id`, failing if it was never issued or already finished.
    pub fn finish(&mut self, id: u64) -> Result<String> {
        self.pending.remove(&id).ok_or(Error::UnknownUpload(id))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn storage_name(id: u64, extension: Option<&str>) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    match extension {
        Some(ext) => format!("{:x}-{}.{}", nanos, id, ext),
        None => format!("{:x}-{}", nanos, id),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
