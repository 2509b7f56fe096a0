//! Document upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::UploadResponse;

use super::sanitize_filename;

/// POST /upload - Store a document and index it
///
/// The file is written under the upload directory by its original name, replacing
/// any earlier upload with that name. A replaced file with different content has
/// its cached index invalidated.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .and_then(sanitize_filename)
            .ok_or_else(|| Error::bad_request("Uploaded file has no usable filename"))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::bad_request(format!("Failed to read upload: {}", e)))?;

        upload = Some((filename, data));
        break;
    }

    let Some((filename, data)) = upload else {
        return Err(Error::bad_request("No file uploaded"));
    };

    tracing::info!("Received upload: {} ({} bytes)", filename, data.len());

    tokio::fs::create_dir_all(&state.config().server.upload_dir).await?;
    let path = state.upload_path(&filename);
    tokio::fs::write(&path, &data).await?;

    if !tokio::fs::try_exists(&path).await? {
        return Err(Error::DocumentNotFound(filename));
    }

    let pipeline = state.pipeline();
    if state.config().server.index_on_upload {
        let index = pipeline.refresh_file(&path).await?;
        tracing::info!("Indexed {} ({} chunks)", filename, index.len());
        Ok(Json(UploadResponse::indexed(filename)))
    } else {
        pipeline.invalidate_if_changed(&path).await?;
        Ok(Json(UploadResponse::stored(filename)))
    }
}
