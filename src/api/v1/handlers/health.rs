/*
 * Responsibility
 * - GET /health (疎通用, 認証なし)
 * - client 向けに upload 上限も返す
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "max_image_bytes": state.dispatcher.max_image_bytes(),
        })),
    )
}
