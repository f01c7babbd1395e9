/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - dispatcher: 画像操作の core, auth: access token 検証
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::gallery::Dispatcher;
use crate::services::auth::AuthService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, auth: Arc<AuthService>) -> Self {
        Self { dispatcher, auth }
    }
}
