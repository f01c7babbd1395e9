/*
 * Responsibility
 * - Path の String を公開 ID として受け、内部 ID 型 (UUID) へ変換する
 * - 失敗時は AppError::bad_request (JSON error body) へ変換
 * 主な責務
 *  - 公開ID → 内部ID への変換ロジック
 *  - Axum の FromRequestParts 実装
 * 置かないもの
 *  - Image といった具体リソース名 (types 側)
 * 変更理由
 *  - ID の形式が変わった
 *  - エラー方針を変えたい
 */
use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Clone, Copy)]
pub struct PublicId<T> {
    pub id: Uuid,
    _marker: PhantomData<T>,
}

impl<T> PublicId<T> {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }
}

fn parse_or_bad_request(public_id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(public_id).map_err(|_| AppError::bad_request("INVALID_ID", "invalid id"))
}

impl<T> FromRequestParts<AppState> for PublicId<T>
where
    T: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(public_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("INVALID_ID", "invalid id"))?;
        let id = parse_or_bad_request(&public_id)?;
        Ok(Self::new(id))
    }
}

impl<T> std::fmt::Debug for PublicId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicId").field("id", &self.id).finish()
    }
}
