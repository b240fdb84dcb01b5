//! # Media Store Module
//!
//! Writes uploaded attachments under one folder per content kind and
//! resolves stored paths back to files at read time.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::content::{CollectionKind, ContentKind};
use crate::errors::{BotError, BotResult};

/// Extension given to every stored photo
pub const PHOTO_EXTENSION: &str = ".jpg";
/// Extension used when a document has no usable extension of its own
pub const FALLBACK_EXTENSION: &str = ".bin";
/// Longest original extension (dot included) kept for documents
pub const MAX_EXTENSION_LEN: usize = 10;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Generated unique file name for a photo
pub fn photo_file_name() -> String {
    format!("{}{}", Uuid::new_v4(), PHOTO_EXTENSION)
}

/// Generated unique file name for a document, keeping its extension
/// when it is short enough
pub fn document_file_name(original_name: Option<&str>) -> String {
    format!("{}{}", Uuid::new_v4(), document_extension(original_name))
}

/// Extension (with leading dot) kept for a document upload
pub fn document_extension(original_name: Option<&str>) -> String {
    let ext = original_name
        .map(Path::new)
        .and_then(|path| path.extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{ext}"));

    match ext {
        Some(ext) if ext.chars().count() <= MAX_EXTENSION_LEN => ext,
        _ => FALLBACK_EXTENSION.to_string(),
    }
}

/// Whether a stored file should be sent as a photo
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Customer section that may carry a banner image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Reviews,
    Gifts,
    Services,
    Contacts,
}

impl From<CollectionKind> for Section {
    fn from(kind: CollectionKind) -> Self {
        match kind {
            CollectionKind::Reviews => Section::Reviews,
            CollectionKind::Services => Section::Services,
            CollectionKind::Gifts => Section::Gifts,
        }
    }
}

impl Section {
    fn banner_name(self) -> &'static str {
        match self {
            Section::Reviews => "reviews.png",
            Section::Gifts => "gifts.png",
            Section::Services => "services.png",
            Section::Contacts => "contacts.png",
        }
    }
}

/// File storage rooted at the configured media directory
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder receiving uploads for `kind`
    pub fn folder(&self, kind: ContentKind) -> Option<PathBuf> {
        kind.media_folder().map(|folder| self.root.join(folder))
    }

    pub async fn ensure_folder(&self, kind: ContentKind) -> BotResult<()> {
        if let Some(folder) = self.folder(kind) {
            tokio::fs::create_dir_all(&folder).await?;
        }
        Ok(())
    }

    /// Write `bytes` under `file_name` in the folder for `kind` and return
    /// the stored path
    pub async fn save(&self, kind: ContentKind, file_name: &str, bytes: &[u8]) -> BotResult<PathBuf> {
        let folder = self.folder(kind).ok_or_else(|| {
            BotError::Media(format!("{} content has no media folder", kind.name()))
        })?;
        tokio::fs::create_dir_all(&folder).await?;

        let path = folder.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Stored media file");
        Ok(path)
    }

    /// Best-effort removal of a file written by a step that later failed
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove orphaned media file");
        }
    }

    /// The stored path, if the file is still there
    pub fn existing(&self, stored: Option<&str>) -> Option<PathBuf> {
        let path = PathBuf::from(stored?);
        path.is_file().then_some(path)
    }

    /// Banner image for a customer section, if one was provided
    pub fn section_banner(&self, section: Section) -> Option<PathBuf> {
        let path = self.root.join("img").join(section.banner_name());
        path.is_file().then_some(path)
    }
}
