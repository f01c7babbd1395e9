/*
 * Responsibility
 * - image record の型と repository 契約 (unit of work)
 * - record を変更できるのはこの契約経由のみ
 *
 * Notes
 * - begin() で unit of work を開き、変更は commit() まで他のリクエストから見えない
 * - commit せずに drop した unit of work の変更は全て破棄される
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::repos::error::RepoResult;

/// A persisted image.
///
/// `id`, `file_name`, `owner_id` and `created_at` are fixed at creation;
/// only `title` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: Uuid,
    pub title: String,
    pub file_name: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn begin(&self) -> RepoResult<Box<dyn ImageUnitOfWork>>;
}

/// One unit of work against the image store.
///
/// Reads see committed state plus whatever this unit of work has staged.
#[async_trait]
pub trait ImageUnitOfWork: Send {
    // Ids are server generated, so no collision check.
    async fn add(&mut self, image: ImageRecord) -> RepoResult<()>;

    async fn get(&mut self, id: Uuid) -> RepoResult<Option<ImageRecord>>;

    async fn list_by_owner(&mut self, owner_id: &str) -> RepoResult<Vec<ImageRecord>>;

    // Replaces the record with the same id. `RepoError::NotFound` if there is none.
    async fn update(&mut self, image: &ImageRecord) -> RepoResult<()>;

    // `RepoError::NotFound` if there is nothing to delete.
    async fn delete(&mut self, image: &ImageRecord) -> RepoResult<()>;

    /// Makes every staged change durable at once. After a failed commit none of
    /// them are visible. The unit of work is closed afterwards either way.
    async fn commit(&mut self) -> RepoResult<()>;
}
