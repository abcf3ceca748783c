//! HTTP API over the pipeline.
//!
//! `POST /query` accepts `{"query": "..."}` and returns the resolution as
//! JSON. Resolution is blocking work and runs on the blocking thread pool.
//! CORS is permissive so browser clients on any origin can call the API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::pipeline::{Pipeline, PipelineError, QueryResult};

/// Body of the 500 response when no page yielded content.
pub const RETRIEVAL_FAILED_DETAIL: &str = "Failed to extract usable content.";

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Errors a handler turns into an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    Task(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match &self {
            ApiError::Pipeline(PipelineError::RetrievalExhausted { query }) => {
                error!(query, "retrieval exhausted");
                RETRIEVAL_FAILED_DETAIL.to_string()
            }
            ApiError::Task(message) => {
                error!(error = %message, "query task failed");
                "Internal server error.".to_string()
            }
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Builds the router.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/query", post(query_handler))
        .with_state(pipeline)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to the sift query API" }))
}

async fn query_handler(
    State(pipeline): State<Arc<Pipeline>>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResult>, ApiError> {
    info!(query = %payload.query, "query received");
    let result = tokio::task::spawn_blocking(move || pipeline.resolve(&payload.query))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .map_err(ApiError::Pipeline)?;
    Ok(Json(result))
}

/// Serves the API on `addr` until Ctrl-C.
pub async fn serve(pipeline: Arc<Pipeline>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "server started");

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
