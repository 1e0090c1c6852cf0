//! PDF upload and ingestion handler

use crate::AppState;
use axum::{extract::Multipart, extract::State, Json};
use serde::Serialize;
use std::path::PathBuf;
use studyforge_common::errors::{AppError, Result};
use studyforge_common::{MAX_CLASS_NUM, MIN_CLASS_NUM};
use studyforge_ingestion::PdfIngestor;

#[derive(Serialize)]
pub struct PdfUploadResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub chunks_extracted: usize,
    pub chunks_added: usize,
}

fn missing(field: &str) -> AppError {
    AppError::MissingField {
        field: field.to_string(),
    }
}

/// Strip any path components from a client-supplied filename
fn sanitize_filename(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .replace("..", "_")
}

/// Upload and process a PDF textbook: save it under the uploads
/// directory, extract and classify chunks, embed them, and persist them
/// to the content store.
pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PdfUploadResponse>> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut class_num: Option<i32> = None;
    let mut subject: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::InvalidFormat {
        message: format!("invalid multipart payload: {}", e),
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                filename = field.file_name().map(sanitize_filename);
                let bytes = field.bytes().await.map_err(|e| AppError::InvalidFormat {
                    message: format!("failed to read file field: {}", e),
                })?;
                file_bytes = Some(bytes.to_vec());
            }
            Some("class_num") => {
                let text = field.text().await.map_err(|e| AppError::InvalidFormat {
                    message: format!("failed to read class_num: {}", e),
                })?;
                class_num = Some(text.trim().parse().map_err(|_| AppError::InvalidFormat {
                    message: format!("class_num is not a number: {}", text),
                })?);
            }
            Some("subject") => {
                let text = field.text().await.map_err(|e| AppError::InvalidFormat {
                    message: format!("failed to read subject: {}", e),
                })?;
                subject = Some(text.trim().to_string());
            }
            _ => {}
        }
    }

    let file_bytes = file_bytes.ok_or_else(|| missing("file"))?;
    let filename = filename.filter(|f| !f.is_empty()).ok_or_else(|| missing("file"))?;
    let class_num = class_num.ok_or_else(|| missing("class_num"))?;
    let subject = subject.filter(|s| !s.is_empty()).ok_or_else(|| missing("subject"))?;

    if !(MIN_CLASS_NUM..=MAX_CLASS_NUM).contains(&class_num) {
        return Err(AppError::Validation {
            message: format!(
                "class_num must be between {} and {}",
                MIN_CLASS_NUM, MAX_CLASS_NUM
            ),
            field: Some("class_num".to_string()),
        });
    }

    // Save the upload
    let stored_name = format!("{}_{}_{}", class_num, subject, filename);
    let file_path = PathBuf::from(&state.config.storage.uploads_dir).join(&stored_name);
    tokio::fs::create_dir_all(&state.config.storage.uploads_dir).await?;
    tokio::fs::write(&file_path, &file_bytes).await?;

    tracing::info!(path = %file_path.display(), "Uploaded file saved");

    // Parse and classify off the async runtime
    let started = std::time::Instant::now();
    let ingestion_config = state.config.ingestion.clone();
    let parse_subject = subject.clone();
    let chunks = tokio::task::spawn_blocking(move || {
        let ingestor = PdfIngestor::new(ingestion_config);
        ingestor.parse_pdf(&file_path, class_num, &parse_subject)
    })
    .await
    .map_err(|e| AppError::Internal {
        message: format!("ingestion task failed: {}", e),
    })??;

    // Embed and persist
    let added = state
        .store
        .add_chunks(&chunks, state.config.ingestion.batch_size)
        .await?;

    studyforge_common::metrics::record_ingestion(
        started.elapsed().as_secs_f64(),
        added,
        &subject,
    );

    tracing::info!(
        filename = %filename,
        extracted = chunks.len(),
        added,
        "PDF processed"
    );

    Ok(Json(PdfUploadResponse {
        success: true,
        message: "Successfully processed and added to database".to_string(),
        filename,
        chunks_extracted: chunks.len(),
        chunks_added: added,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("book.pdf"), "book.pdf");
        assert_eq!(sanitize_filename("/etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("..\\..\\book.pdf"), "book.pdf");
        assert_eq!(sanitize_filename("a..b.pdf"), "a_b.pdf");
    }
}
