/*
 * Responsibility
 * - /images 系 handler (transport 層のみ)
 * - request → ImageCommand に詰め替えて Dispatcher に渡し、ImageOutcome → response に戻す
 * - 認可 (所有者チェック) は Dispatcher 側。ここでは claim set を渡すだけ
 *
 * Notes
 * - dispatch は tokio::spawn した task で走らせる
 *   client 切断 / timeout で future が drop されても、blob 書き込み → commit の途中で止まらない
 */
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    api::v1::{
        dto::images::{CreateImageRequest, CreatedImageResponse, ImageResponse, UpdateImageRequest},
        extractors::{AuthCtx, AuthCtxExtractor, ImageId, JsonBody},
    },
    error::AppError,
    gallery::{ImageCommand, ImageOutcome},
    state::AppState,
};

async fn run(state: &AppState, ctx: AuthCtx, command: ImageCommand) -> Result<ImageOutcome, AppError> {
    let dispatcher = state.dispatcher.clone();
    let task = tokio::spawn(async move { dispatcher.dispatch(&ctx.claims, command).await });

    match task.await {
        Ok(result) => Ok(result?),
        Err(err) => {
            tracing::error!(error = %err, "gallery task aborted");
            Err(AppError::Internal)
        }
    }
}

fn unexpected(outcome: ImageOutcome) -> AppError {
    tracing::error!(?outcome, "dispatcher returned an outcome for another operation");
    AppError::Internal
}

pub async fn list_images(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<Vec<ImageResponse>>, AppError> {
    match run(&state, ctx, ImageCommand::List).await? {
        ImageOutcome::Listed(images) => {
            Ok(Json(images.into_iter().map(ImageResponse::from).collect()))
        }
        other => Err(unexpected(other)),
    }
}

pub async fn create_image(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    JsonBody(req): JsonBody<CreateImageRequest>,
) -> Result<Response, AppError> {
    let command = req.into_command()?;

    match run(&state, ctx, command).await? {
        ImageOutcome::Created(id) => Ok((
            StatusCode::CREATED,
            [(header::LOCATION, format!("/api/v1/images/{id}"))],
            Json(CreatedImageResponse { id }),
        )
            .into_response()),
        other => Err(unexpected(other)),
    }
}

pub async fn get_image(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    image_id: ImageId,
) -> Result<Json<ImageResponse>, AppError> {
    match run(&state, ctx, ImageCommand::Get { id: image_id.id }).await? {
        ImageOutcome::Found(image) => Ok(Json(ImageResponse::from(image))),
        other => Err(unexpected(other)),
    }
}

pub async fn download_image(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    image_id: ImageId,
) -> Result<Response, AppError> {
    match run(&state, ctx, ImageCommand::Download { id: image_id.id }).await? {
        ImageOutcome::Content { image, bytes } => Ok((
            [
                (header::CONTENT_TYPE, "image/jpeg".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{}\"", image.file_name),
                ),
            ],
            bytes,
        )
            .into_response()),
        other => Err(unexpected(other)),
    }
}

pub async fn update_image(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    image_id: ImageId,
    JsonBody(req): JsonBody<UpdateImageRequest>,
) -> Result<StatusCode, AppError> {
    match run(&state, ctx, req.into_command(image_id.id)).await? {
        ImageOutcome::Updated => Ok(StatusCode::NO_CONTENT),
        other => Err(unexpected(other)),
    }
}

pub async fn delete_image(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    image_id: ImageId,
) -> Result<StatusCode, AppError> {
    match run(&state, ctx, ImageCommand::Delete { id: image_id.id }).await? {
        ImageOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        other => Err(unexpected(other)),
    }
}
