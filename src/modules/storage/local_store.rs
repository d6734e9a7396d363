use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};

/// Metadata persisted alongside an uploaded file (JSONB in `posts.files` and
/// `users.profile_picture`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileDescriptor {
    /// Generated on-disk filename (unique)
    pub filename: String,
    /// Full on-disk path
    pub path: String,
    /// Size in bytes
    pub size: i64,
    /// MIME type reported by the client
    pub mimetype: String,
}

/// Which of the two storage directories a file lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Uploads,
    ProfilePictures,
}

/// Local-disk file store.
///
/// Serving goes through [`LocalStore::resolve`], which guarantees the
/// resolved path stays inside the designated directory.
pub struct LocalStore {
    uploads_dir: PathBuf,
    profile_pictures_dir: PathBuf,
}

impl LocalStore {
    pub fn new(config: &StorageConfig) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.uploads_dir)?;
        std::fs::create_dir_all(&config.profile_pictures_dir)?;

        Ok(Self {
            uploads_dir: config.uploads_dir.clone(),
            profile_pictures_dir: config.profile_pictures_dir.clone(),
        })
    }

    fn dir(&self, kind: StorageKind) -> &Path {
        match kind {
            StorageKind::Uploads => &self.uploads_dir,
            StorageKind::ProfilePictures => &self.profile_pictures_dir,
        }
    }

    /// Write file content under a generated unique name and return its
    /// descriptor.
    pub async fn save(
        &self,
        kind: StorageKind,
        original_filename: &str,
        mimetype: &str,
        data: &[u8],
    ) -> Result<FileDescriptor> {
        let filename = unique_filename(original_filename);
        let path = self.dir(kind).join(&filename);

        tokio::fs::write(&path, data).await.map_err(|e| {
            AppError::Internal(format!("Failed to store file '{}': {}", filename, e))
        })?;

        debug!("Stored file: {}", path.display());

        Ok(FileDescriptor {
            filename,
            path: path.to_string_lossy().into_owned(),
            size: data.len() as i64,
            mimetype: mimetype.to_string(),
        })
    }

    /// Best-effort removal of a stored file. Used for cleanup after rejected
    /// uploads and when replacing a profile picture; a missing file only
    /// warrants a warning.
    pub async fn remove(&self, kind: StorageKind, filename: &str) {
        let path = self.dir(kind).join(filename);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove stored file {}: {}", path.display(), e);
        }
    }

    /// Resolve a client-supplied filename to an on-disk path.
    ///
    /// The canonicalized result must stay within the storage directory;
    /// anything that escapes (".." components, symlinks out) is Forbidden,
    /// and a file that does not exist is NotFound.
    pub fn resolve(&self, kind: StorageKind, filename: &str) -> Result<PathBuf> {
        let base = self
            .dir(kind)
            .canonicalize()
            .map_err(|e| AppError::Internal(format!("Storage directory unavailable: {}", e)))?;

        let resolved = base
            .join(filename)
            .canonicalize()
            .map_err(|_| AppError::NotFound("File not found".to_string()))?;

        if !resolved.starts_with(&base) {
            return Err(AppError::Forbidden("Invalid filename".to_string()));
        }

        if !resolved.is_file() {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        Ok(resolved)
    }
}

/// Unique on-disk name: random UUID plus the original extension.
fn unique_filename(original: &str) -> String {
    match Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(ext) if !ext.is_empty() => format!("{}.{}", Uuid::new_v4(), ext),
        _ => Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> LocalStore {
        let config = StorageConfig {
            uploads_dir: dir.path().join("uploads"),
            profile_pictures_dir: dir.path().join("profilePictures"),
        };
        LocalStore::new(&config).unwrap()
    }

    #[test]
    fn unique_filename_keeps_extension() {
        let name = unique_filename("photo.png");
        assert!(name.ends_with(".png"));
        assert_ne!(name, unique_filename("photo.png"));
    }

    #[test]
    fn unique_filename_without_extension() {
        let name = unique_filename("README");
        assert!(!name.contains('.'));
    }

    #[tokio::test]
    async fn save_and_resolve_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let descriptor = store
            .save(StorageKind::Uploads, "doc.pdf", "application/pdf", b"data")
            .await
            .unwrap();
        assert_eq!(descriptor.size, 4);
        assert_eq!(descriptor.mimetype, "application/pdf");

        let resolved = store
            .resolve(StorageKind::Uploads, &descriptor.filename)
            .unwrap();
        assert_eq!(std::fs::read(resolved).unwrap(), b"data");
    }

    #[tokio::test]
    async fn resolve_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        // Plant a file outside the uploads directory
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        let err = store
            .resolve(StorageKind::Uploads, "../secret.txt")
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn resolve_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let err = store.resolve(StorageKind::Uploads, "nope.png").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        // Removing a file that was never stored must not panic or error
        store.remove(StorageKind::Uploads, "ghost.bin").await;
    }
}
