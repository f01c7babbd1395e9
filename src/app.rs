/*
 * Responsibility
 * - tracing 初期化 / panic hook
 * - Config読み込み → 依存生成 (repository, blob store, auth) → Router 組み立て
 * - Middleware の適用 (HTTP / CORS / security headers / Bearer)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::gallery::Dispatcher;
use crate::middleware;
use crate::repos::{ImageRepository, InMemoryImageRepository, PgImageRepository};
use crate::services::{auth::build_auth_service, blob::LocalBlobStore};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,image_gallery=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost".
        tracing::error!(?info, "panic");

        // In development, fail fast: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting image gallery API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_repository(config: &Config) -> Result<Arc<dyn ImageRepository>> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set; images are kept in memory and lost on restart");
        return Ok(Arc::new(InMemoryImageRepository::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await
        .context("connecting to DATABASE_URL")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("running database migrations")?;

    Ok(Arc::new(PgImageRepository::new(pool)))
}

async fn build_state(config: &Config) -> Result<AppState> {
    let repo = build_repository(config).await?;

    let blobs = LocalBlobStore::new(&config.images_dir, config.max_image_bytes)
        .await
        .with_context(|| format!("preparing images dir {}", config.images_dir.display()))?;
    tracing::info!(
        dir = %blobs.root().display(),
        max_bytes = config.max_image_bytes,
        "blob store ready"
    );

    let dispatcher = Arc::new(Dispatcher::new(repo, Arc::new(blobs)));
    let auth = build_auth_service(config)?;

    Ok(AppState::new(dispatcher, auth))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let body_limit = middleware::http::body_limit_for(config.max_image_bytes);

    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, body_limit)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use jsonwebtoken::Algorithm;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{AccessKey, AppEnv};
    use crate::services::auth::access_jwt::tests::{
        AUDIENCE, ISSUER, SECRET, sign, test_auth_service, token_for,
    };

    struct TestApp {
        router: Router,
        _images: TempDir,
    }

    async fn test_app() -> TestApp {
        let images = TempDir::new().unwrap();
        let config = Config {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: None,
            database_max_connections: 1,
            app_env: AppEnv::Development,
            cors_allowed_origins: Vec::new(),
            images_dir: images.path().to_path_buf(),
            max_image_bytes: 1024,
            auth_issuer: ISSUER.to_string(),
            auth_audience: AUDIENCE.to_string(),
            access_token_leeway_seconds: 0,
            access_jwt_algorithm: Algorithm::HS256,
            access_jwt_key: AccessKey::Secret(String::from_utf8(SECRET.to_vec()).unwrap()),
        };

        let blobs = LocalBlobStore::new(&config.images_dir, config.max_image_bytes)
            .await
            .unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(InMemoryImageRepository::new()),
            Arc::new(blobs),
        ));
        let state = AppState::new(dispatcher, Arc::new(test_auth_service()));

        TestApp {
            router: build_router(state, &config),
            _images: images,
        }
    }

    impl TestApp {
        async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let req = match body {
                Some(json) => req
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => req.body(Body::empty()).unwrap(),
            };
            self.router.clone().oneshot(req).await.unwrap()
        }

        async fn create(&self, token: &str, title: &str, bytes: &[u8]) -> String {
            let res = self
                .send(
                    "POST",
                    "/api/v1/images",
                    Some(token),
                    Some(json!({ "title": title, "bytes": STANDARD.encode(bytes) })),
                )
                .await;
            assert_eq!(res.status(), StatusCode::CREATED);
            let location = res.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string();
            let body = json_body(res).await;
            let id = body["id"].as_str().unwrap().to_string();
            assert_eq!(location, format!("/api/v1/images/{id}"));
            id
        }
    }

    async fn json_body(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app().await;
        let res = app.send("GET", "/api/v1/health", None, None).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["max_image_bytes"], 1024);
    }

    #[tokio::test]
    async fn images_require_a_valid_bearer_token() {
        let app = test_app().await;

        let res = app.send("GET", "/api/v1/images", None, None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app.send("GET", "/api/v1/images", Some("garbage"), None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn verified_token_without_subject_is_unauthorized() {
        let app = test_app().await;
        let token = sign(json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "exp": chrono::Utc::now().timestamp() + 600,
            "client_id": "imagegalleryclient",
        }));

        let res = app.send("GET", "/api/v1/images", Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(res).await["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn create_get_download_round_trip() {
        let app = test_app().await;
        let alice = token_for("alice");

        let id = app.create(&alice, "Tulips", b"\xff\xd8jpeg").await;

        let res = app.send("GET", &format!("/api/v1/images/{id}"), Some(&alice), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["title"], "Tulips");
        assert!(body["file_name"].as_str().unwrap().ends_with(".jpg"));

        let res = app
            .send("GET", &format!("/api/v1/images/{id}/file"), Some(&alice), None)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/jpeg");
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\xff\xd8jpeg");
    }

    #[tokio::test]
    async fn list_is_scoped_to_caller() {
        let app = test_app().await;
        let (alice, bob) = (token_for("alice"), token_for("bob"));

        app.create(&alice, "a1", b"1").await;
        app.create(&alice, "a2", b"2").await;
        app.create(&bob, "b1", b"3").await;

        let res = app.send("GET", "/api/v1/images", Some(&alice), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.iter().all(|t| t.starts_with('a')));
    }

    #[tokio::test]
    async fn forbidden_and_not_found_are_distinct() {
        let app = test_app().await;
        let id = app.create(&token_for("alice"), "mine", b"x").await;
        let bob = token_for("bob");

        let res = app.send("GET", &format!("/api/v1/images/{id}"), Some(&bob), None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = app
            .send(
                "PUT",
                &format!("/api/v1/images/{id}"),
                Some(&bob),
                Some(json!({ "title": "defaced" })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let missing = uuid::Uuid::new_v4();
        let res = app
            .send("GET", &format!("/api/v1/images/{missing}"), Some(&bob), None)
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app.send("GET", "/api/v1/images/not-a-uuid", Some(&bob), None).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_then_delete_twice() {
        let app = test_app().await;
        let alice = token_for("alice");
        let id = app.create(&alice, "before", b"x").await;
        let uri = format!("/api/v1/images/{id}");

        let res = app
            .send("PUT", &uri, Some(&alice), Some(json!({ "title": "after" })))
            .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = app.send("GET", &uri, Some(&alice), None).await;
        assert_eq!(json_body(res).await["title"], "after");

        let res = app.send("DELETE", &uri, Some(&alice), None).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = app.send("DELETE", &uri, Some(&alice), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_uploads_are_bad_requests() {
        let app = test_app().await;
        let alice = token_for("alice");

        let long_title = "x".repeat(151);
        let res = app
            .send(
                "POST",
                "/api/v1/images",
                Some(&alice),
                Some(json!({ "title": long_title, "bytes": STANDARD.encode(b"x") })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"]["code"], "VALIDATION_FAILED");

        let res = app
            .send(
                "POST",
                "/api/v1/images",
                Some(&alice),
                Some(json!({ "title": "t", "bytes": "%%%" })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let too_big = vec![0u8; 1025];
        let res = app
            .send(
                "POST",
                "/api/v1/images",
                Some(&alice),
                Some(json!({ "title": "t", "bytes": STANDARD.encode(&too_big) })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app.send("GET", "/api/v1/images", Some(&alice), None).await;
        assert_eq!(json_body(res).await.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn malformed_bodies_get_the_error_envelope() {
        let app = test_app().await;
        let alice = token_for("alice");

        let res = app
            .send("POST", "/api/v1/images", Some(&alice), Some(json!({ "title": "t" })))
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = json_body(res).await;
        assert_eq!(body["error"]["code"], "INVALID_BODY");
        assert!(body["error"]["message"].as_str().unwrap().contains("bytes"));

        let id = app.create(&alice, "keep", b"x").await;
        let res = app
            .send("PUT", &format!("/api/v1/images/{id}"), Some(&alice), Some(json!({})))
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"]["code"], "INVALID_BODY");

        let res = app.send("GET", "/api/v1/images", Some(&alice), None).await;
        assert_eq!(json_body(res).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn responses_carry_request_id_and_security_headers() {
        let app = test_app().await;
        let res = app.send("GET", "/api/v1/health", None, None).await;

        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");
        assert_eq!(res.headers()[header::CACHE_CONTROL], "private, no-store");
    }
}
