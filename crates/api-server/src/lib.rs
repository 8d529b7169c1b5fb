//! HTTP API over the flip database.
//!
//! Read-only views of evaluated opportunities plus watchlist management for
//! the scanner. Bodies are plain JSON documents; errors use `{"detail": ..}`.

mod opportunity_routes;
mod request_id;
mod security_headers;
mod watchlist_routes;

use std::env;

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use flipper_core::env_or;
use flipper_db::FlipperDb;
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use opportunity_routes::opportunity_routes;
pub use request_id::{request_id_middleware, RequestId};
pub use security_headers::security_headers_middleware;
pub use watchlist_routes::watchlist_routes;

pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            host: env_or("API_HOST", "0.0.0.0".to_string())?,
            port: env_or("API_PORT", 8000)?,
            database_url: env_or("DATABASE_URL", "sqlite:steamflipper.db".to_string())?,
            cors_origins,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: FlipperDb,
}

/// Error returned by handlers.
///
/// Anything convertible to `anyhow::Error` becomes a 500, so handlers can use `?`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!(detail.into()))
    }

    /// Re-wrap an extractor rejection so clients still get `{"detail": ..}`.
    pub fn rejected(status: StatusCode, body_text: String) -> Self {
        Self::with_status(status, anyhow::anyhow!(body_text))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let detail = if self.status.is_server_error() {
            tracing::error!(status = %self.status, "request failed: {:#}", self.error);
            "Internal server error".to_string()
        } else {
            self.error.to_string()
        };

        (self.status, Json(json!({ "detail": detail }))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    // Credentials rule out wildcards, so methods and headers mirror the preflight.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(health))
        .merge(opportunity_routes())
        .merge(watchlist_routes())
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace)
        .layer(cors_layer(cors_origins))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn"));

    let json_logging = env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

pub async fn run_server() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;

    tracing::info!("🚀 Starting SteamFlipper API");
    if !FlipperDb::exists(&config.database_url) {
        tracing::info!("Creating new database at {}", config.database_url);
    }

    let db = FlipperDb::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    tracing::info!("✅ Database ready: {}", config.database_url);
    tracing::info!("CORS origins: {}", config.cors_origins.join(", "));

    let app = build_router(AppState { db }, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    tracing::info!("📡 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 API server stopped");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_server_config_blank_port_and_hostname() {
        env::set_var("API_HOST", "localhost");
        env::set_var("API_PORT", "  ");
        let config = ServerConfig::from_env();
        env::remove_var("API_HOST");
        env::remove_var("API_PORT");

        let config = config.unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8000);

        let listener = tokio::net::TcpListener::bind((config.host.as_str(), 0))
            .await
            .unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _db) = test_app().await;
        let (status, body) = send(&app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (app, _db) = test_app().await;
        let response = app.oneshot(get_request("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let (app, _db) = test_app().await;
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/watchlist")
            .header("origin", DEFAULT_CORS_ORIGIN)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            DEFAULT_CORS_ORIGIN
        );
        assert_eq!(
            headers.get("access-control-allow-credentials").unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_rejects_unknown_origin() {
        let (app, _db) = test_app().await;
        let request = Request::builder()
            .uri("/health")
            .header("origin", "http://evil.example")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let err: AppError = anyhow::anyhow!("database is on fire").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "detail": "Internal server error" }));
    }

    #[test]
    fn test_bad_request_keeps_detail() {
        let err = AppError::bad_request("Invalid Steam Market URL");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "Invalid Steam Market URL");
    }
}
