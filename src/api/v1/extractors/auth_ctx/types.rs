/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックは middleware/services 側の責務
 * - claim set から principal を取り出すのは gallery::identity (ここでは解釈しない)
 */

use crate::gallery::ClaimSet;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `claims` は検証済み access token の claim set (順序付き)
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub claims: ClaimSet,
}

impl AuthCtx {
    pub fn new(claims: ClaimSet) -> Self {
        Self { claims }
    }
}
