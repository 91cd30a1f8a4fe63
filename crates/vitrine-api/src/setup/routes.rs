//! Route configuration and setup

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use vitrine_core::Config;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Auth is enforced per handler through extractors, so one router
    // carries public and protected routes alike.
    let api = Router::new()
        .route("/api/products", get(handlers::products::list_products))
        .route("/api/products", post(handlers::products::create_product))
        .route("/api/products/{id}", get(handlers::products::get_product))
        .route("/api/products/{id}", put(handlers::products::update_product))
        .route(
            "/api/products/{id}",
            delete(handlers::products::delete_product),
        )
        .route(
            "/api/products/{id}/status",
            patch(handlers::products::set_status),
        )
        .route(
            "/api/products/{id}/discount",
            patch(handlers::products::set_discount),
        )
        .route("/api/favorites", get(handlers::favorites::list_favorites))
        .route(
            "/api/favorites/{productId}/toggle",
            post(handlers::favorites::toggle_favorite),
        )
        .route(
            "/api/favorites/{productId}/check",
            get(handlers::favorites::check_favorite),
        )
        .route("/api/users/me", get(handlers::users::me))
        .route("/api/users/activities", get(handlers::users::my_activities))
        .route("/api/admin/dashboard", get(handlers::admin::dashboard))
        .route("/api/admin/products", get(handlers::admin::list_products))
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route("/api/admin/activities", get(handlers::admin::list_activities))
        .route("/images/{id}", get(handlers::images::serve_image))
        .route("/health", get(handlers::health::health))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );

    // Body limit covers a full multipart create: every image slot at the
    // configured max, plus headroom for the text fields. The framework's
    // own default limit is disabled so this budget is the only one.
    let body_limit =
        config.max_image_size_bytes * config.max_images_per_product + 1024 * 1024;

    let app = api
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins?)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any)
    };

    Ok(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use sqlx::PgPool;
    use tower::ServiceExt;
    use uuid::Uuid;

    use vitrine_storage::PgBlobStore;

    use crate::auth::JwtClaims;

    fn test_config() -> Config {
        Config {
            server_port: 0,
            database_url: "postgresql://localhost/vitrine_test".to_string(),
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            public_base_url: "http://localhost:4000".to_string(),
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            db_max_connections: 1,
            db_timeout_seconds: 5,
            max_image_size_bytes: 10 * 1024 * 1024,
            max_images_per_product: 10,
            request_timeout_secs: 60,
            http_concurrency_limit: 16,
        }
    }

    // A lazy pool never connects, so routes that stop before touching the
    // database can be exercised without a server.
    fn test_router(config: &Config) -> Router {
        let pool = PgPool::connect_lazy(&config.database_url).expect("lazy pool");
        let storage = Arc::new(PgBlobStore::new(pool.clone()));
        let state = Arc::new(AppState::new(config.clone(), pool, storage));
        setup_routes(config, state).expect("router")
    }

    fn admin_token(secret: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            sub: Uuid::new_v4(),
            role: "admin".to_string(),
            exp: now + 3600,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode token")
    }

    #[tokio::test]
    async fn test_docs_routes_are_mounted() {
        let config = test_config();
        let router = test_router(&config);

        let response = router
            .clone()
            .oneshot(Request::get("/docs").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert!(response.status().is_success());

        let response = router
            .oneshot(
                Request::get("/api/openapi.json")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_large_multipart_body_reaches_field_validation() {
        // A 3 MiB image sits inside the configured per-image cap and must
        // not be cut off by a smaller framework default. The form omits the
        // text fields, so fully reading the body ends in the missing-field
        // error rather than a truncated-multipart error.
        let config = test_config();
        let router = test_router(&config);
        let token = admin_token(&config.jwt_secret);

        let boundary = "vitrine-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"images\"; \
                 filename=\"a.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend(std::iter::repeat(0xabu8).take(3 * 1024 * 1024));
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::post("/api/products")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request");

        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("required"), "unexpected error body: {text}");
    }

    #[tokio::test]
    async fn test_body_over_budget_is_rejected() {
        let config = test_config();
        let router = test_router(&config);
        let token = admin_token(&config.jwt_secret);

        let budget =
            config.max_image_size_bytes * config.max_images_per_product + 1024 * 1024;
        let request = Request::post("/api/products")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x")
            .header(header::CONTENT_LENGTH, budget + 1)
            .body(Body::empty())
            .expect("request");

        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
