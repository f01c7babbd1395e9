/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health (認証なし) と /images (Bearer 必須) を merge
 * - Bearer が必要な範囲はここで access::apply を掛けて決める
 */
use axum::{Router, routing::get};

use crate::middleware::auth::access;
use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    images::{
        create_image, delete_image, download_image, get_image, list_images, update_image,
    },
};

pub fn routes(state: AppState) -> Router<AppState> {
    let images = Router::new()
        .route("/images", get(list_images).post(create_image))
        .route(
            "/images/{id}",
            get(get_image).put(update_image).delete(delete_image),
        )
        .route("/images/{id}/file", get(download_image));

    Router::new()
        .route("/health", get(health))
        .merge(access::apply(images, state))
}
