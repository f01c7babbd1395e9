/*
 * Responsibility
 * - images の永続化 (unit of work 単位)
 * - 実装: Postgres (sqlx) / in-memory
 */
pub mod error;
pub mod image_repo;
pub mod memory_image_repo;
pub mod pg_image_repo;

pub use error::{RepoError, RepoResult};
pub use image_repo::{ImageRecord, ImageRepository, ImageUnitOfWork};
pub use memory_image_repo::InMemoryImageRepository;
pub use pg_image_repo::PgImageRepository;
