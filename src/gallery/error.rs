/*
 * Responsibility
 * - gallery core の失敗の分類 (transport 非依存)
 * - HTTP status への対応付けは crate::error::AppError 側
 */
use thiserror::Error;

use crate::repos::RepoError;
use crate::services::blob::BlobError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Repo(RepoError),
    #[error(transparent)]
    Blob(BlobError),
}

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("image not found")]
    NotFound,
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("storage failure: {0}")]
    StorageFailure(#[source] StorageError),
}

impl GalleryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }

    // Storage failures are transient from the caller's point of view; nothing here retries them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageFailure(_))
    }
}

impl From<RepoError> for GalleryError {
    fn from(e: RepoError) -> Self {
        match e {
            // the record vanished between the ownership check and the write
            RepoError::NotFound => GalleryError::NotFound,
            other => GalleryError::StorageFailure(StorageError::Repo(other)),
        }
    }
}

impl From<BlobError> for GalleryError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::TooLarge { size, max } => GalleryError::ValidationFailed(format!(
                "image is {size} bytes, the limit is {max} bytes"
            )),
            other => GalleryError::StorageFailure(StorageError::Blob(other)),
        }
    }
}
