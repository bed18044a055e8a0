//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, CORS, access control)
//! - Keep every error response, timeouts included, in the JSON error shape
//! - Bind server to listener
//! - Stop gracefully on the shutdown broadcast

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::handlers::*;
use crate::http::request::{MakeRequestUuid, RequestIdExt};
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::playlist::PlaylistService;
use crate::routing::PatternError;
use crate::security::{
    access_control_middleware, cors_guard_middleware, AccessControlState, AccessPolicy, CorsPolicy,
    TokenStore,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: PlaylistService,
}

/// HTTP server for the curation API.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, service: PlaylistService) -> Result<Self, PatternError> {
        let policy = Arc::new(AccessPolicy::curation_api()?);
        for rule in policy.rules() {
            tracing::debug!(rule = %rule, "Access rule");
        }

        let tokens = Arc::new(TokenStore::from_config(&config.auth));
        if tokens.is_empty() {
            tracing::warn!("No bearer tokens configured; authenticated routes will reject every request");
        }

        let access = AccessControlState { policy, tokens };
        let cors = Arc::new(CorsPolicy::from_config(&config.cors));
        let state = AppState { service };

        let router = Self::build_router(&config, state, access, cors);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: request id → trace → metrics → timeout → CORS guard
    /// → CORS headers/preflight → access control → handlers.
    fn build_router(
        config: &AppConfig,
        state: AppState,
        access: AccessControlState,
        cors: Arc<CorsPolicy>,
    ) -> Router {
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %req.request_id()
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn(track_requests))
            .layer(middleware::from_fn_with_state(
                Duration::from_secs(config.timeouts.request_secs),
                request_timeout,
            ))
            .layer(middleware::from_fn_with_state(cors.clone(), cors_guard_middleware))
            .layer(cors.layer())
            .layer(middleware::from_fn_with_state(access, access_control_middleware));

        Router::new()
            .route("/api/v1/playlists", get(list_playlists).post(create_playlist))
            .route(
                "/api/v1/playlists/{id}",
                get(get_playlist).put(update_playlist).delete(delete_playlist),
            )
            .route("/api/v1/playlists/{id}/recommendation", get(recommend_playlists))
            .route("/v3/api-docs", get(api_docs))
            .route("/health", get(get_status))
            .fallback(fallback)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(layers)
    }

    /// Run the server until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Bound the whole request, answering 408 with the usual JSON error body.
async fn request_timeout(State(limit): State<Duration>, req: Request<Body>, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(timeout_secs = limit.as_secs_f64(), "Request timed out");
            ApiError::Timeout(format!("request exceeded {:?}", limit)).into_response()
        }
    }
}

async fn track_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let response = next.run(req).await;
    metrics::record_request(method.as_str(), response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use crate::playlist::SqliteStore;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    async fn server() -> HttpServer {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".into();
        config.auth.tokens.push(TokenConfig {
            token: "secret".into(),
            principal: "tester".into(),
        });
        let store = SqliteStore::connect(&config.database).await.unwrap();
        HttpServer::new(config, PlaylistService::new(Arc::new(store))).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_public_list_sets_request_id() {
        let res = server().await.router.oneshot(get("/api/v1/playlists")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(crate::http::X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_create_without_token_is_unauthorized() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/playlists")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"Mix"}"#))
            .unwrap();
        let res = server().await.router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn test_create_with_token() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/playlists")
            .header(header::AUTHORIZATION, "Bearer secret")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"Mix","tags":["pop"]}"#))
            .unwrap();
        let res = server().await.router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_unknown_public_path_is_not_found() {
        let res = server().await.router.oneshot(get("/api/v1/curation/42")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    async fn json_body(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_non_numeric_id_gets_json_error() {
        let res = server().await.router.oneshot(get("/api/v1/playlists/abc")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(json_body(res).await["error"], "validation");
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/playlists")
            .header(header::AUTHORIZATION, "Bearer secret")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title": "#))
            .unwrap();
        let res = server().await.router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = json_body(res).await;
        assert_eq!(body["error"], "validation");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_slow_request_times_out_with_json_error() {
        let app = Router::new()
            .route(
                "/slow",
                axum::routing::get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .layer(middleware::from_fn_with_state(
                Duration::from_millis(20),
                request_timeout,
            ));

        let res = app.oneshot(get("/slow")).await.unwrap();
        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(json_body(res).await["error"], "timeout");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let server = server().await;
        let limit = server.config().security.max_body_size;
        let title = "x".repeat(limit + 1);
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/playlists")
            .header(header::AUTHORIZATION, "Bearer secret")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"title":"{}"}}"#, title)))
            .unwrap();
        let res = server.router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(res).await["error"], "payload_too_large");
    }
}
