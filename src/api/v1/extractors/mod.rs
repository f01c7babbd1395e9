/*
 * Responsibility
 * - handler が使う extractor の公開
 */
pub mod auth_ctx;
pub mod json_body;
pub mod public_id;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use json_body::JsonBody;
pub use public_id::ImageId;
