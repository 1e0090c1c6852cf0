//! Artifact generation handlers, one endpoint per artifact type
//!
//! Each handler validates the request, runs the generation pipeline,
//! persists the artifact under the outputs directory, and returns the
//! content together with the output file reference.

use crate::{outputs, AppState};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use studyforge_common::errors::{AppError, Result};
use studyforge_common::models::{Difficulty, Flashcard};
use validator::Validate;

fn validate<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })
}

fn default_mcq_questions() -> usize {
    10
}

fn default_question_count() -> usize {
    20
}

fn default_num_cards() -> usize {
    20
}

fn default_worksheet_questions() -> usize {
    15
}

fn default_total_marks() -> i32 {
    100
}

fn default_duration_minutes() -> i32 {
    180
}

/// Response for text-grammar artifacts
#[derive(Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub content: String,
    pub output_file: String,
    pub metadata: serde_json::Value,
}

// ============================================================================
// MCQ
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct McqRequest {
    #[validate(range(min = 5, max = 10))]
    pub class_num: i32,

    #[validate(length(min = 1))]
    pub subject: String,

    #[validate(length(min = 1))]
    pub topic: String,

    #[serde(default)]
    pub difficulty: Difficulty,

    #[serde(default = "default_mcq_questions")]
    #[validate(range(min = 1, max = 50))]
    pub num_questions: usize,
}

/// Generate MCQ questions
pub async fn generate_mcq(
    State(state): State<AppState>,
    Json(request): Json<McqRequest>,
) -> Result<Json<GenerateResponse>> {
    validate(&request)?;

    tracing::info!(
        class_num = request.class_num,
        subject = %request.subject,
        topic = %request.topic,
        num_questions = request.num_questions,
        "Generating MCQs"
    );

    let content = state
        .generator
        .generate_mcq(
            request.class_num,
            &request.subject,
            &request.topic,
            request.difficulty,
            request.num_questions,
        )
        .await?;

    let output_file =
        outputs::write_text(&state.config.storage.outputs_dir, "mcq", &content).await?;

    Ok(Json(GenerateResponse {
        success: true,
        content,
        output_file,
        metadata: json!({
            "class": request.class_num,
            "subject": request.subject,
            "topic": request.topic,
            "difficulty": request.difficulty,
            "num_questions": request.num_questions,
        }),
    }))
}

// ============================================================================
// Question sets (fill-blank, short, long, very-short)
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct QuestionSetRequest {
    #[validate(range(min = 5, max = 10))]
    pub class_num: i32,

    #[validate(length(min = 1))]
    pub subject: String,

    #[validate(length(min = 1))]
    pub topic: String,

    #[serde(default)]
    pub difficulty: Difficulty,

    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, max = 50))]
    pub num_questions: usize,
}

impl QuestionSetRequest {
    fn metadata(&self) -> serde_json::Value {
        json!({
            "class": self.class_num,
            "subject": self.subject,
            "topic": self.topic,
            "difficulty": self.difficulty,
            "num_questions": self.num_questions,
        })
    }
}

/// Generate fill-in-the-blank questions
pub async fn generate_fill_blanks(
    State(state): State<AppState>,
    Json(request): Json<QuestionSetRequest>,
) -> Result<Json<GenerateResponse>> {
    validate(&request)?;

    let content = state
        .generator
        .generate_fill_blanks(
            request.class_num,
            &request.subject,
            &request.topic,
            request.difficulty,
            request.num_questions,
        )
        .await?;

    let output_file =
        outputs::write_text(&state.config.storage.outputs_dir, "fill_blanks", &content).await?;

    Ok(Json(GenerateResponse {
        success: true,
        content,
        output_file,
        metadata: request.metadata(),
    }))
}

/// Generate short-answer questions
pub async fn generate_short_answer(
    State(state): State<AppState>,
    Json(request): Json<QuestionSetRequest>,
) -> Result<Json<GenerateResponse>> {
    validate(&request)?;

    let content = state
        .generator
        .generate_short_answer(
            request.class_num,
            &request.subject,
            &request.topic,
            request.difficulty,
            request.num_questions,
        )
        .await?;

    let output_file =
        outputs::write_text(&state.config.storage.outputs_dir, "short_answer", &content).await?;

    Ok(Json(GenerateResponse {
        success: true,
        content,
        output_file,
        metadata: request.metadata(),
    }))
}

/// Generate long-answer questions
pub async fn generate_long_answer(
    State(state): State<AppState>,
    Json(request): Json<QuestionSetRequest>,
) -> Result<Json<GenerateResponse>> {
    validate(&request)?;

    let content = state
        .generator
        .generate_long_answer(
            request.class_num,
            &request.subject,
            &request.topic,
            request.difficulty,
            request.num_questions,
        )
        .await?;

    let output_file =
        outputs::write_text(&state.config.storage.outputs_dir, "long_answer", &content).await?;

    Ok(Json(GenerateResponse {
        success: true,
        content,
        output_file,
        metadata: request.metadata(),
    }))
}

/// Generate very-short-answer questions
pub async fn generate_very_short_answer(
    State(state): State<AppState>,
    Json(request): Json<QuestionSetRequest>,
) -> Result<Json<GenerateResponse>> {
    validate(&request)?;

    let content = state
        .generator
        .generate_very_short_answer(
            request.class_num,
            &request.subject,
            &request.topic,
            request.difficulty,
            request.num_questions,
        )
        .await?;

    let output_file = outputs::write_text(
        &state.config.storage.outputs_dir,
        "very_short_answer",
        &content,
    )
    .await?;

    Ok(Json(GenerateResponse {
        success: true,
        content,
        output_file,
        metadata: request.metadata(),
    }))
}

// ============================================================================
// Flashcards
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct FlashcardRequest {
    #[validate(range(min = 5, max = 10))]
    pub class_num: i32,

    #[validate(length(min = 1))]
    pub subject: String,

    #[validate(length(min = 1))]
    pub topic: String,

    #[serde(default = "default_num_cards")]
    #[validate(range(min = 1, max = 100))]
    pub num_cards: usize,
}

#[derive(Serialize)]
pub struct FlashcardResponse {
    pub success: bool,
    pub flashcards: Vec<Flashcard>,
    pub count: usize,
    /// Present when the model response could not be decoded and the set
    /// degraded to empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_warning: Option<String>,
    pub output_file: String,
}

/// Generate flashcards
pub async fn generate_flashcards(
    State(state): State<AppState>,
    Json(request): Json<FlashcardRequest>,
) -> Result<Json<FlashcardResponse>> {
    validate(&request)?;

    tracing::info!(
        class_num = request.class_num,
        subject = %request.subject,
        topic = %request.topic,
        num_cards = request.num_cards,
        "Generating flashcards"
    );

    let batch = state
        .generator
        .generate_flashcards(
            request.class_num,
            &request.subject,
            &request.topic,
            request.num_cards,
        )
        .await?;

    let output_file =
        outputs::write_json(&state.config.storage.outputs_dir, "flashcards", &batch.cards).await?;

    Ok(Json(FlashcardResponse {
        success: true,
        count: batch.cards.len(),
        flashcards: batch.cards,
        parse_warning: batch.parse_warning,
        output_file,
    }))
}

// ============================================================================
// Notes
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct NotesRequest {
    #[validate(range(min = 5, max = 10))]
    pub class_num: i32,

    #[validate(length(min = 1))]
    pub subject: String,

    #[validate(length(min = 1))]
    pub chapter: String,
}

/// Generate chapter revision notes
pub async fn generate_notes(
    State(state): State<AppState>,
    Json(request): Json<NotesRequest>,
) -> Result<Json<GenerateResponse>> {
    validate(&request)?;

    let content = state
        .generator
        .generate_short_notes(request.class_num, &request.subject, &request.chapter)
        .await?;

    let output_file =
        outputs::write_text(&state.config.storage.outputs_dir, "notes", &content).await?;

    Ok(Json(GenerateResponse {
        success: true,
        content,
        output_file,
        metadata: json!({
            "class": request.class_num,
            "subject": request.subject,
            "chapter": request.chapter,
        }),
    }))
}

// ============================================================================
// Worksheet
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct WorksheetRequest {
    #[validate(range(min = 5, max = 10))]
    pub class_num: i32,

    #[validate(length(min = 1))]
    pub subject: String,

    #[validate(length(min = 1))]
    pub topics: Vec<String>,

    #[serde(default)]
    pub difficulty: Difficulty,

    #[serde(default = "default_worksheet_questions")]
    #[validate(range(min = 5, max = 50))]
    pub num_questions: usize,
}

/// Generate a multi-topic worksheet
pub async fn generate_worksheet(
    State(state): State<AppState>,
    Json(request): Json<WorksheetRequest>,
) -> Result<Json<GenerateResponse>> {
    validate(&request)?;

    tracing::info!(
        class_num = request.class_num,
        subject = %request.subject,
        topics = request.topics.len(),
        num_questions = request.num_questions,
        "Generating worksheet"
    );

    let content = state
        .generator
        .generate_worksheet(
            request.class_num,
            &request.subject,
            &request.topics,
            request.difficulty,
            request.num_questions,
        )
        .await?;

    let output_file =
        outputs::write_text(&state.config.storage.outputs_dir, "worksheet", &content).await?;

    Ok(Json(GenerateResponse {
        success: true,
        content,
        output_file,
        metadata: json!({
            "class": request.class_num,
            "subject": request.subject,
            "topics": request.topics,
            "difficulty": request.difficulty,
            "num_questions": request.num_questions,
        }),
    }))
}

// ============================================================================
// Exam paper
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ExamRequest {
    #[validate(range(min = 5, max = 10))]
    pub class_num: i32,

    #[validate(length(min = 1))]
    pub subject: String,

    /// Only the first chapter drives retrieval; the rest are recorded in
    /// the response metadata
    #[validate(length(min = 1))]
    pub chapters: Vec<String>,

    #[serde(default = "default_total_marks")]
    #[validate(range(min = 10, max = 200))]
    pub total_marks: i32,

    #[serde(default = "default_duration_minutes")]
    #[validate(range(min = 30, max = 300))]
    pub duration_minutes: i32,
}

/// Generate a complete exam paper
pub async fn generate_exam(
    State(state): State<AppState>,
    Json(request): Json<ExamRequest>,
) -> Result<Json<GenerateResponse>> {
    validate(&request)?;

    tracing::info!(
        class_num = request.class_num,
        subject = %request.subject,
        total_marks = request.total_marks,
        "Generating exam paper"
    );

    let content = state
        .generator
        .generate_exam_paper(
            request.class_num,
            &request.subject,
            &request.chapters,
            request.total_marks,
            request.duration_minutes,
        )
        .await?;

    let output_file =
        outputs::write_text(&state.config.storage.outputs_dir, "exam", &content).await?;

    Ok(Json(GenerateResponse {
        success: true,
        content,
        output_file,
        metadata: json!({
            "class": request.class_num,
            "subject": request.subject,
            "chapters": request.chapters,
            "total_marks": request.total_marks,
            "duration": request.duration_minutes,
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mcq_request_bounds() {
        let ok: McqRequest = serde_json::from_str(
            r#"{"class_num": 6, "subject": "Science", "topic": "Temperature"}"#,
        )
        .unwrap();
        assert_eq!(ok.num_questions, 10);
        assert_eq!(ok.difficulty, Difficulty::Medium);
        assert!(ok.validate().is_ok());

        let out_of_class: McqRequest = serde_json::from_str(
            r#"{"class_num": 4, "subject": "Science", "topic": "Temperature"}"#,
        )
        .unwrap();
        assert!(out_of_class.validate().is_err());

        let too_many: McqRequest = serde_json::from_str(
            r#"{"class_num": 6, "subject": "Science", "topic": "T", "num_questions": 51}"#,
        )
        .unwrap();
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn test_difficulty_parses_from_lowercase() {
        let request: McqRequest = serde_json::from_str(
            r#"{"class_num": 6, "subject": "Science", "topic": "T", "difficulty": "hard"}"#,
        )
        .unwrap();
        assert_eq!(request.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_worksheet_requires_topics() {
        let request: WorksheetRequest = serde_json::from_str(
            r#"{"class_num": 6, "subject": "Science", "topics": []}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_exam_defaults() {
        let request: ExamRequest = serde_json::from_str(
            r#"{"class_num": 8, "subject": "Mathematics", "chapters": ["Algebra"]}"#,
        )
        .unwrap();
        assert_eq!(request.total_marks, 100);
        assert_eq!(request.duration_minutes, 180);
        assert!(request.validate().is_ok());
    }
}
