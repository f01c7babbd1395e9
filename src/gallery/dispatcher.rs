/*
 * Responsibility
 * - ImageCommand を 1 つの handler に振り分ける (closed な match, 実行時の型 lookup はしない)
 * - 流れ: principal 解決 → validation → (id 指定なら) 所有者チェック → handler → commit
 * - 副作用の順序: blob 書き込み → repository 変更 → commit。失敗経路は GalleryError 1 本
 *
 * Notes
 * - handler は他の handler を呼ばない。retry もしない (1 request = 1 attempt)
 * - commit 前に失敗した unit of work は drop で破棄される
 */
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::gallery::{
    command::{ImageCommand, ImageOutcome},
    error::GalleryError,
    guard::{self, Authorization},
    identity::{self, ClaimSet, Principal},
};
use crate::repos::{ImageRecord, ImageRepository, ImageUnitOfWork};
use crate::services::blob::BlobStore;

pub struct Dispatcher {
    repo: Arc<dyn ImageRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("max_image_bytes", &self.blobs.max_bytes())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(repo: Arc<dyn ImageRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { repo, blobs }
    }

    pub fn max_image_bytes(&self) -> usize {
        self.blobs.max_bytes()
    }

    /// Entry point for a request carrying a verified claim set.
    pub async fn dispatch(
        &self,
        claims: &ClaimSet,
        command: ImageCommand,
    ) -> Result<ImageOutcome, GalleryError> {
        let Some(principal) = identity::resolve(claims) else {
            tracing::warn!(operation = %command.kind(), "no subject claim in credential");
            return Err(GalleryError::Unauthenticated);
        };

        self.execute(&principal, command).await
    }

    /// Runs `command` for an already resolved principal.
    pub async fn execute(
        &self,
        principal: &Principal,
        command: ImageCommand,
    ) -> Result<ImageOutcome, GalleryError> {
        let operation = command.kind();
        let target = command.target();

        if let Err(err) = command.validate(self.blobs.max_bytes()) {
            tracing::info!(%operation, sub = principal.subject(), error = %err, "rejected");
            return Err(err);
        }

        let result = match command {
            ImageCommand::List => self.list_images(principal).await,
            ImageCommand::Get { id } => self.get_image(principal, id).await,
            ImageCommand::Download { id } => self.download_image(principal, id).await,
            ImageCommand::Create { title, bytes } => {
                self.create_image(principal, title, &bytes).await
            }
            ImageCommand::Update { id, title } => self.update_image(principal, id, title).await,
            ImageCommand::Delete { id } => self.delete_image(principal, id).await,
        };

        match &result {
            Ok(_) => tracing::debug!(%operation, ?target, sub = principal.subject(), "completed"),
            Err(err) if err.is_retryable() => {
                tracing::error!(%operation, ?target, sub = principal.subject(), error = ?err, "failed")
            }
            Err(err) => {
                tracing::info!(%operation, ?target, sub = principal.subject(), error = %err, "rejected")
            }
        }
        result
    }

    // Ownership guard for id-targeted operations.
    async fn authorized(
        &self,
        uow: &mut dyn ImageUnitOfWork,
        id: Uuid,
        principal: &Principal,
    ) -> Result<ImageRecord, GalleryError> {
        match guard::authorize(uow, id, principal).await? {
            Authorization::Allow(image) => Ok(image),
            Authorization::Deny => {
                tracing::warn!(image_id = %id, sub = principal.subject(), "not the owner");
                Err(GalleryError::Forbidden)
            }
            Authorization::NotFound => Err(GalleryError::NotFound),
        }
    }

    async fn list_images(&self, principal: &Principal) -> Result<ImageOutcome, GalleryError> {
        let mut uow = self.repo.begin().await?;
        let images = uow.list_by_owner(principal.subject()).await?;
        Ok(ImageOutcome::Listed(images))
    }

    async fn get_image(&self, principal: &Principal, id: Uuid) -> Result<ImageOutcome, GalleryError> {
        let mut uow = self.repo.begin().await?;
        let image = self.authorized(uow.as_mut(), id, principal).await?;
        Ok(ImageOutcome::Found(image))
    }

    async fn download_image(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<ImageOutcome, GalleryError> {
        let mut uow = self.repo.begin().await?;
        let image = self.authorized(uow.as_mut(), id, principal).await?;
        let bytes = self.blobs.read(&image.file_name).await?;
        Ok(ImageOutcome::Content { image, bytes })
    }

    async fn create_image(
        &self,
        principal: &Principal,
        title: String,
        bytes: &[u8],
    ) -> Result<ImageOutcome, GalleryError> {
        // no record is staged unless the blob is durably written
        let file_name = self.blobs.store(bytes).await?;
        let image = new_image(title, file_name, principal);
        let id = image.id;

        if let Err(err) = self.persist_new(image.clone()).await {
            // record never became visible; drop the blob it would have referenced
            if let Err(cleanup) = self.blobs.remove(&image.file_name).await {
                tracing::error!(blob = %image.file_name, error = %cleanup, "orphaned blob after failed create");
            }
            return Err(err);
        }

        tracing::info!(image_id = %id, sub = principal.subject(), "image created");
        Ok(ImageOutcome::Created(id))
    }

    async fn persist_new(&self, image: ImageRecord) -> Result<(), GalleryError> {
        let mut uow = self.repo.begin().await?;
        uow.add(image).await?;
        uow.commit().await?;
        Ok(())
    }

    async fn update_image(
        &self,
        principal: &Principal,
        id: Uuid,
        title: String,
    ) -> Result<ImageOutcome, GalleryError> {
        let mut uow = self.repo.begin().await?;
        let mut image = self.authorized(uow.as_mut(), id, principal).await?;

        apply_update(&mut image, title);
        uow.update(&image).await?;
        uow.commit().await?;
        Ok(ImageOutcome::Updated)
    }

    async fn delete_image(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<ImageOutcome, GalleryError> {
        let mut uow = self.repo.begin().await?;
        let image = self.authorized(uow.as_mut(), id, principal).await?;

        uow.delete(&image).await?;
        uow.commit().await?;

        // the record is gone either way; a leftover blob is only logged
        if let Err(err) = self.blobs.remove(&image.file_name).await {
            tracing::warn!(blob = %image.file_name, error = %err, "blob cleanup after delete failed");
        }

        tracing::info!(image_id = %id, sub = principal.subject(), "image deleted");
        Ok(ImageOutcome::Deleted)
    }
}

// request -> record. id / owner / created_at are always server side.
fn new_image(title: String, file_name: String, principal: &Principal) -> ImageRecord {
    ImageRecord {
        id: Uuid::new_v4(),
        title,
        file_name,
        owner_id: principal.subject().to_string(),
        created_at: Utc::now(),
    }
}

// Only the title is mutable.
fn apply_update(image: &mut ImageRecord, title: String) {
    image.title = title;
}
