//! Insight REST API
//!
//! HTTP API layer for Insight, built with Axum.
//!
//! # Endpoints
//!
//! ## Datasets
//! - `PUT /api/v1/datasets/:id/:kind` - Ingest a dataset payload
//! - `DELETE /api/v1/datasets/:id` - Remove a dataset
//! - `GET /api/v1/datasets` - List registered datasets
//!
//! ## Query
//! - `POST /api/v1/query` - Evaluate a structured query
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use insight::api::{serve, ApiConfig, AppState};
//! use insight::dataset::DatasetStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(DatasetStore::open("./insight_data").await?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;

    let api_routes = Router::new()
        // Dataset routes
        .route("/datasets", get(routes::datasets::list_datasets))
        .route("/datasets/:id/:kind", put(routes::datasets::put_dataset))
        .route("/datasets/:id", delete(routes::datasets::delete_dataset))
        // Query routes
        .route("/query", post(routes::query::execute_query))
        .layer(DefaultBodyLimit::max(max_body_size));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // Configure properly in production
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Insight API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Insight API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use tower::util::ServiceExt;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    async fn create_test_app() -> (Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(DatasetStore::open(dir.path()).await.unwrap());
        let api_config = ApiConfig::default();

        let state = AppState::new(store, api_config);
        let router = build_router(state);

        (router, dir)
    }

    fn sections_zip() -> Vec<u8> {
        let records = json!({"result": [
            {
                "id": 1, "Course": "310", "Title": "software eng",
                "Professor": "smith", "Subject": "cpsc",
                "Avg": 82.5, "Pass": 100, "Fail": 4, "Audit": 1, "Year": "2019"
            },
            {
                "id": 2, "Course": "100", "Title": "calculus",
                "Professor": "chan", "Subject": "math",
                "Avg": 70.0, "Pass": 200, "Fail": 30, "Audit": 0, "Year": "2019"
            }
        ]});
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("courses/ALL", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(records.to_string().as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    async fn put_sections(app: &Router, id: &str) -> StatusCode {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/v1/datasets/{}/sections", id))
                    .body(Body::from(sections_zip()))
                    .unwrap(),
            )
            .await
            .unwrap();
        response.status()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _dir) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _dir) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["dataset_count"], 0);
    }

    #[tokio::test]
    async fn test_put_and_list_datasets() {
        let (app, _dir) = create_test_app().await;

        assert_eq!(put_sections(&app, "courses").await, StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/datasets")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(
            body["result"],
            json!([{"id": "courses", "kind": "sections", "numRows": 2}])
        );
    }

    #[tokio::test]
    async fn test_put_invalid_payload() {
        let (app, _dir) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/datasets/courses/sections")
                    .body(Body::from("not a zip"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INGEST_ERROR");
    }

    #[tokio::test]
    async fn test_put_unknown_kind() {
        let (app, _dir) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/datasets/courses/lectures")
                    .body(Body::from(sections_zip()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_missing_dataset() {
        let (app, _dir) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/datasets/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query_end_to_end() {
        let (app, _dir) = create_test_app().await;
        assert_eq!(put_sections(&app, "courses").await, StatusCode::OK);

        let query = json!({
            "WHERE": {"GT": {"courses_avg": 75}},
            "OPTIONS": {"COLUMNS": ["courses_dept", "courses_avg"]}
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/query")
                    .header("Content-Type", "application/json")
                    .body(Body::from(query.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["result"],
            json!([{"courses_dept": "cpsc", "courses_avg": 82.5}])
        );
    }

    #[tokio::test]
    async fn test_rooms_dataset_query_end_to_end() {
        let (app, _dir) = create_test_app().await;

        let rooms = json!({"rooms": [
            {
                "fullname": "Hugh Dempster Pavilion", "shortname": "DMP",
                "number": "310", "address": "6245 Agronomy Road V6T 1Z4",
                "type": "Tiered Large Group", "furniture": "Fixed Tables",
                "href": "http://example.test/DMP-310",
                "lat": 49.26125, "lon": -123.24807, "seats": 160
            },
            {
                "fullname": "Hugh Dempster Pavilion", "shortname": "DMP",
                "number": "101", "address": "6245 Agronomy Road V6T 1Z4",
                "type": "Small Group", "furniture": "Movable Tables",
                "href": "http://example.test/DMP-101",
                "lat": 49.26125, "lon": -123.24807, "seats": 40
            }
        ]});
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/datasets/rooms/rooms")
                    .body(Body::from(rooms.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let query = json!({
            "WHERE": {"GT": {"rooms_seats": 100}},
            "OPTIONS": {"COLUMNS": ["rooms_name", "rooms_seats"]}
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/query")
                    .header("Content-Type", "application/json")
                    .body(Body::from(query.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["result"],
            json!([{"rooms_name": "DMP_310", "rooms_seats": 160.0}])
        );
    }

    #[tokio::test]
    async fn test_query_unknown_dataset() {
        let (app, _dir) = create_test_app().await;

        let query = json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["ghost_avg"]}
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/query")
                    .header("Content-Type", "application/json")
                    .body(Body::from(query.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "DATASET_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_query_invalid_shape() {
        let (app, _dir) = create_test_app().await;
        assert_eq!(put_sections(&app, "courses").await, StatusCode::OK);

        let query = json!({
            "WHERE": {"GT": {"courses_avg": "eighty"}},
            "OPTIONS": {"COLUMNS": ["courses_avg"]}
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/query")
                    .header("Content-Type", "application/json")
                    .body(Body::from(query.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "QUERY_ERROR");
    }

    #[tokio::test]
    async fn test_duplicate_dataset_rejected() {
        let (app, _dir) = create_test_app().await;
        assert_eq!(put_sections(&app, "courses").await, StatusCode::OK);
        assert_eq!(put_sections(&app, "courses").await, StatusCode::BAD_REQUEST);
    }
}
