//! Object Storage
//!
//! Image uploads land behind the [`ObjectStorage`] trait so the engine
//! stays agnostic of the storage vendor. The bundled implementation
//! keeps objects on the local filesystem under the work directory,
//! reusing the platform's upload pipeline: validate, re-encode to JPEG,
//! store under a fresh UUID reference.

use async_trait::async_trait;
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::utils::{AppError, ErrorCode};

/// Maximum file size (5MB)
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Supported image formats
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// JPEG quality for listing images
const JPEG_QUALITY: u8 = 85;

/// Storage error types (infrastructure failures, distinct from domain errors)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File too large ({0} bytes, max {MAX_FILE_SIZE})")]
    TooLarge(usize),

    #[error("Unsupported file format '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("No filename provided")]
    NoFilename,

    #[error("Empty file provided")]
    EmptyFile,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let code = match &err {
            StorageError::TooLarge(_) => ErrorCode::FileTooLarge,
            StorageError::UnsupportedFormat(_) => ErrorCode::UnsupportedFileFormat,
            StorageError::InvalidImage(_) => ErrorCode::InvalidImageFile,
            StorageError::NoFilename => ErrorCode::NoFilename,
            StorageError::EmptyFile => ErrorCode::EmptyFile,
            StorageError::Io(_) => ErrorCode::FileStorageFailed,
        };
        AppError::with_message(code, err.to_string())
    }
}

/// An image file received from a client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Storage backend for listing images
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store an upload under the given path; returns the object reference
    async fn upload(&self, path: &str, upload: ImageUpload) -> Result<String, StorageError>;

    /// Remove one object. Idempotent.
    async fn delete_one(&self, path: &str, reference: &str) -> Result<(), StorageError>;

    /// Remove a batch of objects. Idempotent.
    async fn delete_many(&self, path: &str, references: &[String]) -> Result<(), StorageError>;
}

/// Calculate SHA256 hash of data (content-addressed log field)
fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Validate an upload before touching the disk
fn validate_image(upload: &ImageUpload) -> Result<String, StorageError> {
    if upload.data.is_empty() {
        return Err(StorageError::EmptyFile);
    }
    if upload.data.len() > MAX_FILE_SIZE {
        return Err(StorageError::TooLarge(upload.data.len()));
    }

    let ext = Path::new(&upload.filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .ok_or(StorageError::NoFilename)?;

    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(StorageError::UnsupportedFormat(ext));
    }

    Ok(ext)
}

/// Decode and re-encode as JPEG with the platform quality setting
fn process_and_compress_image(data: &[u8]) -> Result<(DynamicImage, Vec<u8>), StorageError> {
    let img = image::load_from_memory(data)
        .map_err(|e| StorageError::InvalidImage(e.to_string()))?;

    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let rgb_img = img.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        rgb_img
            .write_with_encoder(encoder)
            .map_err(|e| StorageError::InvalidImage(format!("Failed to compress image: {}", e)))?;
    }

    Ok((img, buffer))
}

/// Local-filesystem object storage rooted at the work directory
#[derive(Clone, Debug)]
pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, path: &str, reference: &str) -> PathBuf {
        self.root.join(path).join(reference)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(&self, path: &str, upload: ImageUpload) -> Result<String, StorageError> {
        validate_image(&upload)?;
        let (_, compressed) = process_and_compress_image(&upload.data)?;

        let dir = self.root.join(path);
        std::fs::create_dir_all(&dir)?;

        let reference = format!("{}.jpg", Uuid::new_v4());
        std::fs::write(dir.join(&reference), &compressed)?;

        tracing::info!(
            original_name = %upload.filename,
            size = compressed.len(),
            hash = %calculate_hash(&compressed),
            reference = %reference,
            "Image stored"
        );

        Ok(reference)
    }

    async fn delete_one(&self, path: &str, reference: &str) -> Result<(), StorageError> {
        let file = self.object_path(path, reference);
        match std::fs::remove_file(&file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_many(&self, path: &str, references: &[String]) -> Result<(), StorageError> {
        for reference in references {
            self.delete_one(path, reference).await?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::png_upload;
    use super::*;

    #[tokio::test]
    async fn test_upload_stores_jpeg_reference() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path());

        let reference = storage
            .upload("r1/images", png_upload("photo.png"))
            .await
            .unwrap();

        assert!(reference.ends_with(".jpg"));
        assert!(dir.path().join("r1/images").join(&reference).exists());
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path());

        let mut upload = png_upload("photo.gif");
        let result = storage.upload("r1/images", upload.clone()).await;
        assert!(matches!(result, Err(StorageError::UnsupportedFormat(_))));

        upload.filename = "noext".to_string();
        let result = storage.upload("r1/images", upload).await;
        assert!(matches!(result, Err(StorageError::NoFilename)));
    }

    #[tokio::test]
    async fn test_upload_rejects_garbage_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path());

        let upload = ImageUpload {
            filename: "photo.png".to_string(),
            data: vec![0u8; 64],
        };
        let result = storage.upload("r1/images", upload).await;
        assert!(matches!(result, Err(StorageError::InvalidImage(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path());

        let reference = storage
            .upload("r1/images", png_upload("photo.png"))
            .await
            .unwrap();

        storage.delete_one("r1/images", &reference).await.unwrap();
        storage.delete_one("r1/images", &reference).await.unwrap();
        assert!(!dir.path().join("r1/images").join(&reference).exists());
    }

    #[tokio::test]
    async fn test_delete_many() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path());

        let a = storage
            .upload("r1/images", png_upload("a.png"))
            .await
            .unwrap();
        let b = storage
            .upload("r1/images", png_upload("b.png"))
            .await
            .unwrap();

        storage
            .delete_many("r1/images", &[a.clone(), b.clone()])
            .await
            .unwrap();
        assert!(!dir.path().join("r1/images").join(&a).exists());
        assert!(!dir.path().join("r1/images").join(&b).exists());
    }
}
