//! StudyForge Common Library
//!
//! Shared code for the StudyForge services including:
//! - Domain models (chunks, classification enums, flashcards)
//! - Content Store over Postgres + pgvector
//! - Embedding client abstraction
//! - Text-generation client abstraction (Gemini / Anthropic)
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use embeddings::Embedder;
pub use llm::TextGenerator;
pub use models::{ChunkMetadata, ContentType, Difficulty, Flashcard, NewChunk, ScoredChunk};
pub use store::{ChunkSource, ContentStore, QueryFilters};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// Lowest class (grade) level with ingested material
pub const MIN_CLASS_NUM: i32 = 5;

/// Highest class (grade) level with ingested material
pub const MAX_CLASS_NUM: i32 = 10;
