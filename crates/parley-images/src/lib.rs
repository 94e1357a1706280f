//! Short-lived local storage for rehosted inline images
//!
//! The upstream only accepts image URLs, so images that arrive inline as
//! data URIs are written here and served back over HTTP. Files are swept
//! once they outlive the retention window.

#![allow(clippy::must_use_candidate)]

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Image store errors
#[derive(Debug, Error)]
pub enum ImageStoreError {
    /// The storage directory could not be created
    #[error("failed to create image directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: std::io::Error },
    /// The image file could not be written
    #[error("failed to write image {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
}

/// File extension chosen from the declared MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageExtension {
    Png,
    Jpg,
}

impl ImageExtension {
    /// `png` for `image/png`, `jpg` for anything else
    pub fn from_mime(mime: &str) -> Self {
        if mime.trim().eq_ignore_ascii_case("image/png") {
            Self::Png
        } else {
            Self::Jpg
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

/// A saved image, addressable through its public URL until swept
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub id: Uuid,
    pub extension: ImageExtension,
    pub path: PathBuf,
    pub url: String,
    pub created_at: SystemTime,
}

/// Directory-backed image store
#[derive(Debug, Clone)]
pub struct ImageStore {
    directory: PathBuf,
    public_base: String,
    retention: Duration,
}

impl ImageStore {
    /// Create a store writing into `directory` and linking under `public_base`
    pub fn new(directory: impl Into<PathBuf>, public_base: &Url, retention: Duration) -> Self {
        Self {
            directory: directory.into(),
            public_base: public_base.as_str().trim_end_matches('/').to_owned(),
            retention,
        }
    }

    /// Directory files are written to and served from
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Persist an image and return its public location
    ///
    /// Stale files are swept first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written
    pub async fn save(&self, bytes: &[u8], mime: &str) -> Result<ImageAsset, ImageStoreError> {
        self.sweep().await;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| ImageStoreError::CreateDir {
                path: self.directory.clone(),
                source,
            })?;

        let id = Uuid::new_v4();
        let extension = ImageExtension::from_mime(mime);
        let file_name = format!("{id}.{}", extension.as_str());
        let path = self.directory.join(&file_name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| ImageStoreError::Write {
                path: path.clone(),
                source,
            })?;

        let url = format!("{}/images/{file_name}", self.public_base);
        tracing::debug!(%id, size = bytes.len(), %url, "image saved");

        Ok(ImageAsset {
            id,
            extension,
            path,
            url,
            created_at: SystemTime::now(),
        })
    }

    /// Delete regular files older than the retention window
    ///
    /// Best-effort: every failure is logged and skipped. Returns the
    /// number of files removed.
    pub async fn sweep(&self) -> usize {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(directory = %self.directory.display(), error = %e, "failed to read image directory");
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read image directory entry");
                    break;
                }
            };

            let path = entry.path();
            let modified = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta.modified(),
                Ok(_) => continue,
                Err(e) => Err(e),
            };

            let expired = match modified {
                Ok(modified) => now.duration_since(modified).is_ok_and(|age| age > self.retention),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to stat image file");
                    continue;
                }
            };

            if !expired {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                // lost a race with another sweep
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove stale image"),
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "swept stale images");
        }

        removed
    }
}
