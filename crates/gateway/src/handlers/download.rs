//! Artifact file download handler

use crate::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use studyforge_common::errors::{AppError, Result};

/// Download a generated artifact file from the outputs directory.
/// The filename must be a bare name; anything that could traverse out
/// of the outputs directory is rejected.
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::Validation {
            message: "invalid filename".to_string(),
            field: Some("filename".to_string()),
        });
    }

    let path = std::path::Path::new(&state.config.storage.outputs_dir).join(&filename);

    let bytes = tokio::fs::read(&path).await.map_err(|_| AppError::FileNotFound {
        name: filename.clone(),
    })?;

    tracing::info!(filename = %filename, bytes = bytes.len(), "Artifact downloaded");

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
