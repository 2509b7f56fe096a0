//! API routes for the Q&A server

pub mod ask;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload - with larger body limit for file uploads
        .route(
            "/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/ask", post(ask::ask_question))
        .route("/info", get(info))
}

/// Reduce a client-supplied filename to its final path component.
///
/// Returns `None` for names that would not address a file inside the upload directory.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match name {
        "" | "." | ".." => None,
        _ => Some(name.to_string()),
    }
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    let pipeline = state.pipeline();

    Json(serde_json::json!({
        "name": "docqa-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Upload a document, then ask questions answered from its content",
        "backend": pipeline.backend().describe(),
        "chunking": {
            "chunk_size": config.chunking.chunk_size,
            "chunk_overlap": config.chunking.chunk_overlap,
        },
        "top_k": config.retrieval.top_k,
        "cache": pipeline.store().stats(),
        "endpoints": {
            "POST /upload": "Upload a document (multipart field 'file')",
            "POST /ask": "Ask a question about an uploaded document",
            "GET /health": "Liveness check",
            "GET /ready": "Backend availability check"
        }
    }))
}
