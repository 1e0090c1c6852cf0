//! Ingestion error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error for {path}: {message}")]
    PdfParseError { path: String, message: String },

    #[error("No text content extracted from {path}")]
    EmptyDocument { path: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<studyforge_common::errors::AppError> for IngestionError {
    fn from(e: studyforge_common::errors::AppError) -> Self {
        IngestionError::StoreError(e.to_string())
    }
}

impl From<IngestionError> for studyforge_common::errors::AppError {
    fn from(e: IngestionError) -> Self {
        studyforge_common::errors::AppError::Ingestion {
            message: e.to_string(),
        }
    }
}
