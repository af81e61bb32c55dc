use axum::{
    Json, Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers::orchestrate;

// 3000 is the dashboard dev server.
fn build_localhost_cors(api_port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", api_port),
        format!("http://localhost:{}", api_port),
        "http://127.0.0.1:3000".to_string(),
        "http://localhost:3000".to_string(),
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_api_router(state: AppState, api_port: u16) -> Router {
    Router::new()
        .route("/api/orchestrate", post(orchestrate::orchestrate_endpoint))
        .route("/api/health", get(health_endpoint))
        .route("/api/logs/stream", get(super::sse_logs_endpoint))
        .layer(build_localhost_cors(api_port))
        .with_state(state)
}

async fn health_endpoint() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "careerpilot",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::llm::testing::script;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn empty_state() -> AppState {
        let (log_tx, _) = tokio::sync::broadcast::channel(16);
        AppState {
            llm: Arc::new(script(vec![])),
            log_tx,
        }
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = build_api_router(empty_state(), 8700);
        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "careerpilot");
    }

    #[tokio::test]
    async fn api_route_contract_has_all_expected_paths() {
        let paths = ["/api/orchestrate", "/api/health", "/api/logs/stream"];
        let app = build_api_router(empty_state(), 8700);
        for path in paths {
            let req = Request::builder()
                .method(Method::PUT)
                .uri(path)
                .body(Body::empty())
                .expect("request should build");
            let resp = app
                .clone()
                .oneshot(req)
                .await
                .expect("router oneshot should succeed");
            assert_ne!(
                resp.status(),
                StatusCode::NOT_FOUND,
                "Route missing from router: {}",
                path
            );
        }
    }

    #[tokio::test]
    async fn orchestrate_rejects_get() {
        let app = build_api_router(empty_state(), 8700);
        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/orchestrate")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
