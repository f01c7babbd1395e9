/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use anyhow::anyhow;

use crate::config::{AccessKey, Config};
use crate::services::auth::AuthService;

pub fn build_auth_service(config: &Config) -> anyhow::Result<Arc<AuthService>> {
    let auth = match &config.access_jwt_key {
        AccessKey::PublicKeyPem(pem) => AuthService::from_public_key_pem(
            pem,
            config.access_jwt_algorithm,
            &config.auth_issuer,
            &config.auth_audience,
            config.access_token_leeway_seconds,
        )
        .map_err(|e| anyhow!(e))?,
        AccessKey::Secret(secret) => AuthService::from_secret(
            secret.as_bytes(),
            &config.auth_issuer,
            &config.auth_audience,
            config.access_token_leeway_seconds,
        ),
    };

    Ok(Arc::new(auth))
}
