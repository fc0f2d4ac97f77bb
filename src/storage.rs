// src/storage.rs

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::error::AppError;

/// Image storage addressed by generated filename.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persists `bytes` and returns the reference to store in the database.
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<String, AppError>;

    /// Removes a previously stored file.
    async fn delete(&self, filename: &str) -> Result<(), AppError>;
}

/// Stores files in a single directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, AppError> {
        if filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename.starts_with('.')
        {
            return Err(AppError::BadRequest(format!(
                "Invalid file reference: {}",
                filename
            )));
        }
        Ok(self.root.join(filename))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        let filename = generate_filename(extension);
        let path = self.path_for(&filename)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        tracing::info!("Stored upload {} ({} bytes)", filename, bytes.len());
        Ok(filename)
    }

    async fn delete(&self, filename: &str) -> Result<(), AppError> {
        let path = self.path_for(filename)?;
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("File {} not found", filename))
            } else {
                AppError::InternalServerError(e.to_string())
            }
        })
    }
}

/// Deletes each file, logging failures instead of returning them.
/// Stored files are never allowed to block a database deletion.
pub async fn delete_files_best_effort<I, S>(files: &dyn FileStore, filenames: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for filename in filenames {
        let filename = filename.as_ref();
        if let Err(e) = files.delete(filename).await {
            tracing::warn!("Failed to delete stored file {}: {}", filename, e);
        }
    }
}

/// `<unix millis>-<uuid v4>.<ext>`
fn generate_filename(extension: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{}-{}.{}", millis, uuid::Uuid::new_v4(), extension)
}

/// Maps an accepted image content type to the file extension it is stored with.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn store_then_delete() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());

        let name = store.store(b"\x89PNG", "png").await.unwrap();
        assert!(name.ends_with(".png"));
        assert!(dir.path().join(&name).exists());

        store.delete(&name).await.unwrap();
        assert!(!dir.path().join(&name).exists());
    }

    #[tokio::test]
    async fn deleting_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());

        let err = store.delete("nope.png").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());

        for bad in ["../secret", "a/b.png", "", ".env"] {
            let err = store.delete(bad).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{bad}");
        }
    }

    #[tokio::test]
    async fn best_effort_delete_continues_past_failures() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());
        let kept = store.store(b"x", "jpg").await.unwrap();

        delete_files_best_effort(&store, ["missing.jpg".to_string(), kept.clone()]).await;

        assert!(!dir.path().join(&kept).exists());
    }

    #[test]
    fn only_png_and_jpeg_are_accepted() {
        assert_eq!(extension_for_content_type("image/png"), Some("png"));
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_content_type("IMAGE/JPEG; charset=x"), Some("jpg"));
        assert_eq!(extension_for_content_type("image/gif"), None);
        assert_eq!(extension_for_content_type("text/plain"), None);
    }

    #[test]
    fn generated_names_are_unique() {
        assert_ne!(generate_filename("png"), generate_filename("png"));
    }
}
