//! StudyForge generation core
//!
//! Turns a noisy chunk store into bounded, trusted context windows and
//! renders deterministic prompts whose output follows a fixed per-item
//! grammar. The pipeline per artifact:
//!
//! 1. Retrieval: topic + artifact hint words, fetch volume scaled to the
//!    requested count, trust filtering, context truncation
//! 2. Prompt composition: one fixed template per artifact type
//! 3. Orchestration: single-call artifacts, or multi-call assembly for
//!    worksheets (one call per topic) and exam papers (one call per
//!    difficulty section)

pub mod artifact;
pub mod flashcards;
pub mod generator;
pub mod prompts;
pub mod retrieval;

pub use artifact::ArtifactKind;
pub use flashcards::{parse_flashcard_response, FlashcardBatch};
pub use generator::ContentGenerator;
pub use retrieval::{context_limit, fetch_volume, filter_trusted, ContextWindow};
