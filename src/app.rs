use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{categories, platforms, system};
use crate::state::AppState;

/// Build the full router over the given state.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(platform_routes())
        .merge(part_routes())
        .merge(category_routes())
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config));

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    router.with_state(state)
}

fn platform_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/platforms",
            get(platforms::platforms_get)
                .post(platforms::platforms_post)
                .delete(platforms::platforms_delete),
        )
        .route(
            "/api/platforms/:id",
            get(platforms::platform_get)
                .put(platforms::platform_put)
                .delete(platforms::platform_delete),
        )
}

fn part_routes() -> Router<AppState> {
    Router::new()
        // Part definitions
        .route("/api/platforms/:id/part", post(platforms::part_post))
        .route("/api/platforms/:id/parts/:part_id", put(platforms::part_put))
        .route(
            "/api/platforms/:id/part/:part_id",
            axum::routing::delete(platforms::part_delete),
        )
        // Part groups
        .route("/api/platforms/:id/group", post(platforms::group_post))
        .route("/api/platforms/:id/group/:group_id", put(platforms::group_put))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(categories::tree))
        .route("/api/categories/:id", get(categories::show))
        .route("/api/categories/:id/tree", get(categories::subtree))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if config.is_development() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::StoreBackend;
    use crate::database::MemoryStore;

    fn router(config: AppConfig) -> Router {
        app(AppState::new(Arc::new(MemoryStore::new()), config))
    }

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::development();
        config.store = StoreBackend::Memory;
        config
    }

    async fn json_of(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = router(memory_config())
            .oneshot(Request::get("/api/nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_then_list_through_router() {
        let app = router(memory_config());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/platforms")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"balls"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_of(response).await["data"]["name"], "balls");

        let response = app
            .oneshot(Request::get("/api/platforms").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_of(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mut config = memory_config();
        config.api.max_request_size_bytes = 16;

        let response = router(config)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/platforms")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(format!(r#"{{"name":"{}"}}"#, "x".repeat(64))))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(response).await["code"], "INVALID_JSON");
    }

    #[tokio::test]
    async fn serves_without_request_logging() {
        let mut config = memory_config();
        config.api.enable_request_logging = false;

        let response = router(config)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_disabled_sends_no_allow_origin() {
        let mut config = memory_config();
        config.security.enable_cors = false;

        let response = router(config)
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
