//! Question answering endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

use super::sanitize_filename;

/// POST /ask - Answer a question about a previously uploaded file
pub async fn ask_question(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>> {
    let Json(request) = payload.map_err(|e| Error::bad_request(e.body_text()))?;
    let (filename, question) = request.required_fields()?;

    let not_found = || Error::DocumentNotFound(filename.to_string());
    let stored_name = sanitize_filename(filename).ok_or_else(not_found)?;
    let path = state.upload_path(&stored_name);
    if !tokio::fs::try_exists(&path).await? {
        return Err(not_found());
    }

    let start = Instant::now();
    tracing::info!("Question on {}: \"{}\"", stored_name, question);

    let answer = state.pipeline().ask(&path, question).await?;

    tracing::info!(
        "Answered in {}ms from {} chunks",
        start.elapsed().as_millis(),
        answer.chunks.len()
    );

    Ok(Json(AskResponse {
        message: answer.text,
    }))
}
