/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("image record not found")]
    NotFound,
    // commit 済み (or commit 失敗後) の unit of work を再利用しようとした
    #[error("unit of work already closed")]
    Closed,
}
