/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, 画像ディレクトリ, CORS 許可、Auth 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Key material used to verify access tokens.
#[derive(Clone)]
pub enum AccessKey {
    // EdDSA / RS256
    PublicKeyPem(String),
    // HS256
    Secret(String),
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        match self {
            AccessKey::PublicKeyPem(_) => f.write_str("PublicKeyPem(..)"),
            AccessKey::Secret(_) => f.write_str("Secret(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,

    // None => in-memory repository (dev only)
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub images_dir: PathBuf,
    pub max_image_bytes: usize,

    pub auth_issuer: String,
    pub auth_audience: String,
    pub access_token_leeway_seconds: u64,
    pub access_jwt_algorithm: Algorithm,
    pub access_jwt_key: AccessKey,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let images_dir = std::env::var("IMAGES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("wwwroot/images"));

        let max_image_bytes = match std::env::var("MAX_IMAGE_BYTES") {
            Ok(v) => v
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid("MAX_IMAGE_BYTES"))?,
            Err(_) => 10 * 1024 * 1024,
        };

        let auth_issuer =
            std::env::var("AUTH_ISSUER").map_err(|_| ConfigError::Missing("AUTH_ISSUER"))?;

        let auth_audience =
            std::env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "imagegalleryapi".to_string());

        let access_token_leeway_seconds = std::env::var("ACCESS_TOKEN_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let access_jwt_algorithm = match std::env::var("ACCESS_JWT_ALGORITHM") {
            Ok(v) => parse_algorithm(&v).ok_or(ConfigError::Invalid("ACCESS_JWT_ALGORITHM"))?,
            Err(_) => Algorithm::EdDSA,
        };

        let access_jwt_key = match access_jwt_algorithm {
            Algorithm::HS256 => AccessKey::Secret(
                std::env::var("ACCESS_JWT_SECRET")
                    .map_err(|_| ConfigError::Missing("ACCESS_JWT_SECRET"))?,
            ),
            _ => AccessKey::PublicKeyPem(
                std::env::var("ACCESS_JWT_PUBLIC_KEY_PEM")
                    .map_err(|_| ConfigError::Missing("ACCESS_JWT_PUBLIC_KEY_PEM"))?
                    .replace("\\n", "\n"),
            ),
        };

        Ok(Self {
            addr,
            database_url,
            database_max_connections,
            app_env,
            cors_allowed_origins,
            images_dir,
            max_image_bytes,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            access_jwt_algorithm,
            access_jwt_key,
        })
    }
}

fn parse_algorithm(value: &str) -> Option<Algorithm> {
    match value.trim().to_ascii_uppercase().as_str() {
        "EDDSA" => Some(Algorithm::EdDSA),
        "RS256" => Some(Algorithm::RS256),
        "HS256" => Some(Algorithm::HS256),
        _ => None,
    }
}
