/*
 * Responsibility
 * - 単一リソースを対象にする操作 (get / download / update / delete) の所有者チェック
 * - list / create には使わない (対象リソースが無い)
 */
use uuid::Uuid;

use crate::gallery::identity::Principal;
use crate::repos::{ImageRecord, ImageUnitOfWork, RepoResult};

/// Outcome of an ownership check.
///
/// `NotFound` and `Deny` stay distinct here; collapsing them (to hide existence)
/// is left to the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allow(ImageRecord),
    Deny,
    NotFound,
}

pub async fn authorize(
    uow: &mut dyn ImageUnitOfWork,
    id: Uuid,
    principal: &Principal,
) -> RepoResult<Authorization> {
    let Some(image) = uow.get(id).await? else {
        return Ok(Authorization::NotFound);
    };

    if principal.owns(&image.owner_id) {
        Ok(Authorization::Allow(image))
    } else {
        Ok(Authorization::Deny)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::identity::principal;
    use crate::repos::{ImageRepository, InMemoryImageRepository};
    use chrono::Utc;

    async fn seeded(owner: &str) -> (InMemoryImageRepository, ImageRecord) {
        let repo = InMemoryImageRepository::new();
        let image = ImageRecord {
            id: Uuid::new_v4(),
            title: "harbour".to_string(),
            file_name: format!("{}.jpg", Uuid::new_v4()),
            owner_id: owner.to_string(),
            created_at: Utc::now(),
        };
        let mut uow = repo.begin().await.unwrap();
        uow.add(image.clone()).await.unwrap();
        uow.commit().await.unwrap();
        (repo, image)
    }

    #[tokio::test]
    async fn owner_is_allowed() {
        let (repo, image) = seeded("alice").await;
        let mut uow = repo.begin().await.unwrap();

        let decision = authorize(uow.as_mut(), image.id, &principal("alice"))
            .await
            .unwrap();
        assert_eq!(decision, Authorization::Allow(image));
    }

    #[tokio::test]
    async fn other_principal_is_denied() {
        let (repo, image) = seeded("alice").await;
        let mut uow = repo.begin().await.unwrap();

        let decision = authorize(uow.as_mut(), image.id, &principal("bob"))
            .await
            .unwrap();
        assert_eq!(decision, Authorization::Deny);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (repo, _) = seeded("alice").await;
        let mut uow = repo.begin().await.unwrap();

        let decision = authorize(uow.as_mut(), Uuid::new_v4(), &principal("alice"))
            .await
            .unwrap();
        assert_eq!(decision, Authorization::NotFound);
    }
}
