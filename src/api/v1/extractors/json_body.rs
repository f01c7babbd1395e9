/*
 * Responsibility
 * - JSON request body の extractor
 * - axum::Json の rejection (欠けた field / 型違い / Content-Type 違い) を
 *   AppError::bad_request (JSON error body, 400) に揃える
 */
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug)]
pub struct JsonBody<T>(pub T);

fn invalid_body(rejection: JsonRejection) -> AppError {
    tracing::debug!(error = %rejection, "rejected request body");
    AppError::bad_request("INVALID_BODY", rejection.body_text())
}

impl<T> FromRequest<AppState> for JsonBody<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(invalid_body)?;
        Ok(Self(value))
    }
}
