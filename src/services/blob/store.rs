//! Blob store interface used by the gallery handlers (image payloads).
use async_trait::async_trait;
use thiserror::Error;

/// Result type for blob operations.
pub type BlobResult<T> = Result<T, BlobError>;

/// Blob-layer errors.
///
/// Note:
/// - Kept independent from `GalleryError`; the dispatcher decides what a failure means
///   (validation vs. retryable storage failure).
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
    #[error("invalid blob name: {0}")]
    InvalidName(String),
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("blob io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable storage for uploaded image payloads, keyed by a generated name.
///
/// `store` is all-or-nothing: a failed store never leaves a name that `read` resolves.
/// Failures are reported, never retried here.
#[async_trait]
pub trait BlobStore: Send + Sync {
    // Largest payload `store` accepts.
    fn max_bytes(&self) -> usize;

    // Writes `bytes` under a freshly generated unique name and returns that name.
    async fn store(&self, bytes: &[u8]) -> BlobResult<String>;

    async fn read(&self, name: &str) -> BlobResult<Vec<u8>>;

    async fn remove(&self, name: &str) -> BlobResult<()>;
}
