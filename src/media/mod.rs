//! Durable storage for uploaded images behind a trait.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// Reference to a stored payload, `<folder>/<name>`. Every successful
/// store yields a fresh one, existing payloads are never overwritten.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct MediaRef {
    pub folder: String,
    pub name: String,
}

impl MediaRef {
    pub fn as_string(&self) -> String {
        format!("{}/{}", self.folder, self.name)
    }
}

pub trait MediaStore: Send + Sync {
    /// Persists an image payload under the folder, returning a fresh
    /// reference. Empty and non-image payloads are rejected.
    fn store(&self, payload: &[u8], folder: &str) -> Result<MediaRef, DomainError>;

    /// Reads a stored payload back. Unknown references are NotFound.
    fn load(&self, folder: &str, name: &str) -> Result<Vec<u8>, DomainError>;
}

pub struct LocalMediaStore {
    root: PathBuf,
}

/// Path segments come from the client, keep them strictly one level deep.
fn is_clean_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains('/')
        && !segment.contains('\\')
}

impl LocalMediaStore {
    pub fn new<T: AsRef<Path>>(root: T) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl MediaStore for LocalMediaStore {
    fn store(&self, payload: &[u8], folder: &str) -> Result<MediaRef, DomainError> {
        if payload.is_empty() || !is_clean_segment(folder) {
            return Err(DomainError::Upload);
        }
        let kind = infer::get(payload).ok_or(DomainError::Upload)?;
        if !kind.mime_type().starts_with("image/") {
            return Err(DomainError::Upload);
        }

        let name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        let dir = self.root.join(folder);
        std::fs::create_dir_all(&dir).map_err(|err| {
            warn!("Failed to create media dir {}: {}", dir.display(), err);
            DomainError::Upload
        })?;
        let path = dir.join(&name);
        std::fs::write(&path, payload).map_err(|err| {
            warn!("Failed to write media file {}: {}", path.display(), err);
            DomainError::Upload
        })?;

        Ok(MediaRef {
            folder: folder.to_string(),
            name,
        })
    }

    fn load(&self, folder: &str, name: &str) -> Result<Vec<u8>, DomainError> {
        if !is_clean_segment(folder) || !is_clean_segment(name) {
            return Err(DomainError::NotFound);
        }
        let path = self.root.join(folder).join(name);
        std::fs::read(path).map_err(|_| DomainError::NotFound)
    }
}
