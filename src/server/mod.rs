use anyhow::{Context, Result};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::output::{BatchResponse, TranscriptResponse};
use crate::transcribe::TranscriptPipeline;

#[derive(Debug, Default, Deserialize)]
pub struct TranscriptRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TranscriptBatchRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

pub fn router(pipeline: Arc<TranscriptPipeline>) -> Router {
    Router::new()
        .route("/get-transcript", post(get_transcript))
        .route("/get-transcripts", post(get_transcripts))
        .route("/health", get(health))
        .with_state(pipeline)
}

/// Serve until the process receives Ctrl-C
pub async fn serve(pipeline: Arc<TranscriptPipeline>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Failures are reported in the body with `success: false`, not through the status code
async fn get_transcript(
    State(pipeline): State<Arc<TranscriptPipeline>>,
    Json(request): Json<TranscriptRequest>,
) -> Json<TranscriptResponse> {
    let result = pipeline.run(&request.url).await;
    Json(TranscriptResponse::from(&result))
}

/// Videos are fetched one after another; each gets its own entry, failed or not
async fn get_transcripts(
    State(pipeline): State<Arc<TranscriptPipeline>>,
    Json(request): Json<TranscriptBatchRequest>,
) -> Json<BatchResponse> {
    let results = pipeline.run_batch(request.urls.as_slice()).await;
    Json(BatchResponse::new(request.urls.as_slice(), &results))
}

async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
