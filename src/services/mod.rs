/*
 * Responsibility
 * - 外部との境界になる service (access token 検証, blob 保存)
 */
pub mod auth;
pub mod blob;
