/*
 * Responsibility
 * - Images の request/response DTO
 * - request → ImageCommand, ImageRecord → response の詰め替え (手書き、field ごと)
 * - owner id は request から受け取らない (principal からのみ決まる)
 */
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::gallery::ImageCommand;
use crate::repos::ImageRecord;

#[derive(Debug, Deserialize)]
pub struct CreateImageRequest {
    pub title: String,
    pub bytes: String, // base64
}

impl CreateImageRequest {
    pub fn into_command(self) -> Result<ImageCommand, AppError> {
        let bytes = STANDARD
            .decode(self.bytes.trim())
            .map_err(|_| AppError::bad_request("INVALID_IMAGE_BYTES", "bytes must be base64"))?;

        Ok(ImageCommand::Create {
            title: self.title,
            bytes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateImageRequest {
    pub title: String,
}

impl UpdateImageRequest {
    pub fn into_command(self, id: Uuid) -> ImageCommand {
        ImageCommand::Update {
            id,
            title: self.title,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: Uuid,
    pub title: String,
    pub file_name: String,
}

impl From<ImageRecord> for ImageResponse {
    fn from(image: ImageRecord) -> Self {
        Self {
            id: image.id,
            title: image.title,
            file_name: image.file_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedImageResponse {
    pub id: Uuid,
}
