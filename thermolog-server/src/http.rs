//! Thermolog HTTP surface
//!
//! Axum server for the three read views. Each endpoint has a thin axum
//! handler that delegates to an inner function taking the Query Service
//! directly, so the status mapping is testable without the router.
//!
//! Endpoints:
//! - GET /             latest reading (HTML)
//! - GET /history      all readings, newest first (HTML table)
//! - GET /graph        all readings, oldest first (HTML chart)
//! - GET /graph/data   chart series as JSON
//! - GET /health       store status
//! - GET /version      server version info
//!
//! No data yet is 404, a storage failure is 500. Unknown paths are 404.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono_tz::Tz;
use thermolog_core::{SortOrder, StoreError, ThermologConfig};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::query::{Lookup, QueryService};
use crate::views;

pub const NOT_FOUND_BODY: &str = "404 - Not Found";
pub const NO_DATA_BODY: &str = "No temperature data available";
pub const SERVER_ERROR_BODY: &str = "500 - Internal Server Error";

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub query: QueryService,
    pub display_tz: Tz,
}

impl HttpState {
    pub fn new(query: QueryService, config: &ThermologConfig) -> Self {
        let display_tz = config.display.tz().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to UTC for displayed timestamps");
            Tz::UTC
        });
        Self { query, display_tz }
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/", get(current_handler))
        .route("/history", get(history_handler))
        .route("/graph", get(graph_handler))
        .route("/graph/data", get(graph_data_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: HttpState,
    config: &ThermologConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Thermolog listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

fn no_data() -> Response {
    (StatusCode::NOT_FOUND, NO_DATA_BODY).into_response()
}

fn storage_failure(view: &str, e: &StoreError) -> Response {
    tracing::error!(view = view, error = %e, "Error retrieving temperature data");
    (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY).into_response()
}

pub async fn current_inner(query: &QueryService) -> Response {
    match query.latest().await {
        Ok(Lookup::Found(reading)) => Html(views::render_current(&reading)).into_response(),
        Ok(Lookup::Empty) => no_data(),
        Err(e) => storage_failure("current", &e),
    }
}

pub async fn history_inner(query: &QueryService, zone: &Tz) -> Response {
    match query.history(SortOrder::Descending).await {
        Ok(Lookup::Found(readings)) => {
            Html(views::render_history(&readings, zone)).into_response()
        }
        Ok(Lookup::Empty) => no_data(),
        Err(e) => storage_failure("history", &e),
    }
}

pub async fn graph_inner(query: &QueryService) -> Response {
    match query.history(SortOrder::Ascending).await {
        Ok(Lookup::Found(readings)) => {
            let series = views::graph_series(&readings);
            Html(views::render_graph(&series)).into_response()
        }
        Ok(Lookup::Empty) => no_data(),
        Err(e) => storage_failure("graph", &e),
    }
}

pub async fn graph_data_inner(query: &QueryService) -> Response {
    match query.history(SortOrder::Ascending).await {
        Ok(Lookup::Found(readings)) => {
            let series = views::graph_series(&readings);
            Json(serde_json::json!({
                "count": series.len(),
                "series": series,
            }))
            .into_response()
        }
        Ok(Lookup::Empty) => no_data(),
        Err(e) => storage_failure("graph-data", &e),
    }
}

/// Inner health check: queries the store and returns (status_code, json_body).
pub async fn health_inner(query: &QueryService) -> (StatusCode, serde_json::Value) {
    let store = query.store();
    let sqlite = match store.health_check().await {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                }),
            );
        }
    };

    let readings = match store.count().await {
        Ok(n) => serde_json::json!(n),
        Err(e) => serde_json::json!(format!("unavailable: {}", e)),
    };

    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "sqlite": sqlite,
            "readings": readings,
        }),
    )
}

/// Inner version: returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Axum handler wrappers (thin, delegate to inner functions)
// ============================================================================

pub async fn current_handler(State(state): State<Arc<HttpState>>) -> Response {
    current_inner(&state.query).await
}

pub async fn history_handler(State(state): State<Arc<HttpState>>) -> Response {
    history_inner(&state.query, &state.display_tz).await
}

pub async fn graph_handler(State(state): State<Arc<HttpState>>) -> Response {
    graph_inner(&state.query).await
}

pub async fn graph_data_handler(State(state): State<Arc<HttpState>>) -> Response {
    graph_data_inner(&state.query).await
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.query).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}
