//! StudyForge ingestion library
//!
//! Turns textbook PDFs into classified chunks ready for the content store:
//! per-page text extraction, chapter/topic outline tracking, paragraph
//! segmentation, content-type and difficulty classification.

pub mod classify;
pub mod errors;
pub mod pdf;
pub mod processor;

pub use errors::IngestionError;
pub use processor::{OutlineCursor, PdfIngestor};
