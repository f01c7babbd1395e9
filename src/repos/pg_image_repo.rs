/*
 * Responsibility
 * - images テーブル向け SQLx 操作
 * - unit of work = 1 transaction (commit しなければ drop 時に rollback)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::repos::{
    error::{RepoError, RepoResult},
    image_repo::{ImageRecord, ImageRepository, ImageUnitOfWork},
};

#[derive(Debug, Clone, sqlx::FromRow)]
struct ImageRow {
    #[sqlx(rename = "imageId")]
    image_id: Uuid,

    title: String,

    #[sqlx(rename = "fileName")]
    file_name: String,

    #[sqlx(rename = "ownerId")]
    owner_id: String,

    #[sqlx(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

impl From<ImageRow> for ImageRecord {
    fn from(row: ImageRow) -> Self {
        Self {
            id: row.image_id,
            title: row.title,
            file_name: row.file_name,
            owner_id: row.owner_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn begin(&self) -> RepoResult<Box<dyn ImageUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }
}

struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> RepoResult<&mut PgConnection> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(RepoError::Closed),
        }
    }
}

#[async_trait]
impl ImageUnitOfWork for PgUnitOfWork {
    async fn add(&mut self, image: ImageRecord) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO images ("imageId", title, "fileName", "ownerId", "createdAt")
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(image.id)
        .bind(&image.title)
        .bind(&image.file_name)
        .bind(&image.owner_id)
        .bind(image.created_at)
        .execute(self.conn()?)
        .await?;

        Ok(())
    }

    async fn get(&mut self, id: Uuid) -> RepoResult<Option<ImageRecord>> {
        let row = sqlx::query_as::<_, ImageRow>(
            r#"
            SELECT
                "imageId", title, "fileName", "ownerId", "createdAt"
            FROM images
            WHERE "imageId" = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;

        Ok(row.map(ImageRecord::from))
    }

    async fn list_by_owner(&mut self, owner_id: &str) -> RepoResult<Vec<ImageRecord>> {
        let rows = sqlx::query_as::<_, ImageRow>(
            r#"
            SELECT
                "imageId", title, "fileName", "ownerId", "createdAt"
            FROM images
            WHERE "ownerId" = $1
            ORDER BY "createdAt" DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.conn()?)
        .await?;

        Ok(rows.into_iter().map(ImageRecord::from).collect())
    }

    async fn update(&mut self, image: &ImageRecord) -> RepoResult<()> {
        // id / fileName / ownerId / createdAt は不変なので title だけ書く
        let result = sqlx::query(
            r#"
            UPDATE images
            SET title = $2
            WHERE "imageId" = $1
            "#,
        )
        .bind(image.id)
        .bind(&image.title)
        .execute(self.conn()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete(&mut self, image: &ImageRecord) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM images
            WHERE "imageId" = $1
            "#,
        )
        .bind(image.id)
        .execute(self.conn()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn commit(&mut self) -> RepoResult<()> {
        let tx = self.tx.take().ok_or(RepoError::Closed)?;
        tx.commit().await?;
        Ok(())
    }
}
