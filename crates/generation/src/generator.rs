//! Generation Orchestrator
//!
//! Sequences retrieval, prompt composition, and text-generation calls into
//! finished artifacts. Single-call artifacts go retrieve → compose → send;
//! composite artifacts issue one sub-call per topic (worksheets) or per
//! difficulty section (exam papers) and concatenate the results. Every
//! call is stateless request→response: no sessions, no caching, no
//! parallelism across sub-calls.

use crate::artifact::ArtifactKind;
use crate::flashcards::{parse_flashcard_response, FlashcardBatch};
use crate::prompts;
use crate::retrieval::retrieve_context;
use std::sync::Arc;
use std::time::Instant;
use studyforge_common::errors::{AppError, Result};
use studyforge_common::llm::TextGenerator;
use studyforge_common::metrics;
use studyforge_common::models::Difficulty;
use studyforge_common::store::ChunkSource;
use tracing::{info, instrument};

/// Allowed question counts per generation call
pub const QUESTION_RANGE: (usize, usize) = (1, 50);

/// Allowed flashcard counts per generation call
pub const FLASHCARD_RANGE: (usize, usize) = (1, 100);

/// Allowed worksheet question counts
pub const WORKSHEET_RANGE: (usize, usize) = (5, 50);

/// Allowed exam totals
pub const EXAM_MARKS_RANGE: (i32, i32) = (10, 200);
pub const EXAM_DURATION_RANGE: (i32, i32) = (30, 300);

/// Marks per question in each exam section
const EASY_MARKS_PER_QUESTION: i32 = 2;
const MEDIUM_MARKS_PER_QUESTION: i32 = 3;
const HARD_MARKS_PER_QUESTION: i32 = 5;

fn ensure_range<T: PartialOrd + std::fmt::Display + Copy>(
    field: &str,
    value: T,
    (min, max): (T, T),
) -> Result<()> {
    if value < min || value > max {
        return Err(AppError::Validation {
            message: format!("{} must be between {} and {}, got {}", field, min, max, value),
            field: Some(field.to_string()),
        });
    }
    Ok(())
}

/// Orchestrates artifact generation against a chunk source and a
/// text-generation backend
pub struct ContentGenerator {
    source: Arc<dyn ChunkSource>,
    llm: Arc<dyn TextGenerator>,
    max_tokens: u32,
}

impl ContentGenerator {
    pub fn new(source: Arc<dyn ChunkSource>, llm: Arc<dyn TextGenerator>, max_tokens: u32) -> Self {
        Self {
            source,
            llm,
            max_tokens,
        }
    }

    async fn timed_generate(&self, kind: ArtifactKind, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let result = self.llm.generate(prompt, self.max_tokens).await;
        metrics::record_generation(
            start.elapsed().as_secs_f64(),
            kind.label(),
            result.is_ok(),
        );
        result
    }

    /// Generate a multiple-choice question set.
    #[instrument(skip(self), fields(artifact = "mcq"))]
    pub async fn generate_mcq(
        &self,
        class_num: i32,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        ensure_range("num_questions", num_questions, QUESTION_RANGE)?;

        info!(num_questions, %difficulty, "Generating MCQs");

        let context = retrieve_context(
            self.source.as_ref(),
            ArtifactKind::Mcq,
            class_num,
            subject,
            topic,
            num_questions,
        )
        .await?;

        let prompt = prompts::mcq(class_num, subject, topic, difficulty, num_questions, &context);
        self.timed_generate(ArtifactKind::Mcq, &prompt).await
    }

    /// Generate a fill-in-the-blank question set.
    #[instrument(skip(self), fields(artifact = "fill_blanks"))]
    pub async fn generate_fill_blanks(
        &self,
        class_num: i32,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        ensure_range("num_questions", num_questions, QUESTION_RANGE)?;

        info!(num_questions, %difficulty, "Generating fill in the blanks");

        let context = retrieve_context(
            self.source.as_ref(),
            ArtifactKind::FillBlank,
            class_num,
            subject,
            topic,
            num_questions,
        )
        .await?;

        let prompt =
            prompts::fill_blanks(class_num, subject, topic, difficulty, num_questions, &context);
        self.timed_generate(ArtifactKind::FillBlank, &prompt).await
    }

    /// Generate a short-answer question set (questions only).
    #[instrument(skip(self), fields(artifact = "short_answer"))]
    pub async fn generate_short_answer(
        &self,
        class_num: i32,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        ensure_range("num_questions", num_questions, QUESTION_RANGE)?;

        info!(num_questions, %difficulty, "Generating short answer questions");

        let context = retrieve_context(
            self.source.as_ref(),
            ArtifactKind::ShortAnswer,
            class_num,
            subject,
            topic,
            num_questions,
        )
        .await?;

        let prompt =
            prompts::short_answer(class_num, subject, topic, difficulty, num_questions, &context);
        self.timed_generate(ArtifactKind::ShortAnswer, &prompt).await
    }

    /// Generate a long-answer question set (questions only).
    #[instrument(skip(self), fields(artifact = "long_answer"))]
    pub async fn generate_long_answer(
        &self,
        class_num: i32,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        ensure_range("num_questions", num_questions, QUESTION_RANGE)?;

        info!(num_questions, %difficulty, "Generating long answer questions");

        let context = retrieve_context(
            self.source.as_ref(),
            ArtifactKind::LongAnswer,
            class_num,
            subject,
            topic,
            num_questions,
        )
        .await?;

        let prompt =
            prompts::long_answer(class_num, subject, topic, difficulty, num_questions, &context);
        self.timed_generate(ArtifactKind::LongAnswer, &prompt).await
    }

    /// Generate a very-short-answer question set (questions only).
    #[instrument(skip(self), fields(artifact = "very_short_answer"))]
    pub async fn generate_very_short_answer(
        &self,
        class_num: i32,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        ensure_range("num_questions", num_questions, QUESTION_RANGE)?;

        info!(num_questions, %difficulty, "Generating very short answer questions");

        let context = retrieve_context(
            self.source.as_ref(),
            ArtifactKind::VeryShortAnswer,
            class_num,
            subject,
            topic,
            num_questions,
        )
        .await?;

        let prompt = prompts::very_short_answer(
            class_num,
            subject,
            topic,
            difficulty,
            num_questions,
            &context,
        );
        self.timed_generate(ArtifactKind::VeryShortAnswer, &prompt)
            .await
    }

    /// Generate flashcards. A response the model mangles degrades to an
    /// empty batch carrying a parse warning, never an error.
    #[instrument(skip(self), fields(artifact = "flashcards"))]
    pub async fn generate_flashcards(
        &self,
        class_num: i32,
        subject: &str,
        topic: &str,
        num_cards: usize,
    ) -> Result<FlashcardBatch> {
        ensure_range("num_cards", num_cards, FLASHCARD_RANGE)?;

        info!(num_cards, "Generating flashcards");

        let context = retrieve_context(
            self.source.as_ref(),
            ArtifactKind::Flashcards,
            class_num,
            subject,
            topic,
            num_cards,
        )
        .await?;

        let prompt = prompts::flashcards(class_num, subject, topic, num_cards, &context);
        let response = self.timed_generate(ArtifactKind::Flashcards, &prompt).await?;

        Ok(parse_flashcard_response(&response))
    }

    /// Generate revision notes for a chapter.
    #[instrument(skip(self), fields(artifact = "notes"))]
    pub async fn generate_short_notes(
        &self,
        class_num: i32,
        subject: &str,
        chapter: &str,
    ) -> Result<String> {
        info!("Generating short notes");

        let context = retrieve_context(
            self.source.as_ref(),
            ArtifactKind::Notes,
            class_num,
            subject,
            chapter,
            0,
        )
        .await?;

        let prompt = prompts::notes(class_num, &context);
        self.timed_generate(ArtifactKind::Notes, &prompt).await
    }

    /// Generate a mixed worksheet covering multiple topics.
    ///
    /// Questions split evenly: `max(1, num_questions / topics)` MCQs per
    /// topic, one generation call per topic in sequence. The shortfall
    /// from integer division (10 questions over 3 topics yields 9) is
    /// expected. A failing sub-call fails the worksheet; there is no
    /// rebalancing.
    #[instrument(skip(self), fields(artifact = "worksheet"))]
    pub async fn generate_worksheet(
        &self,
        class_num: i32,
        subject: &str,
        topics: &[String],
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        ensure_range("num_questions", num_questions, WORKSHEET_RANGE)?;

        if topics.is_empty() {
            return Err(AppError::Validation {
                message: "worksheet requires at least one topic".to_string(),
                field: Some("topics".to_string()),
            });
        }

        info!(
            num_questions,
            topics = topics.len(),
            "Generating worksheet"
        );

        let questions_per_topic = (num_questions / topics.len()).max(1);

        let mut sections = Vec::with_capacity(topics.len());
        for topic in topics {
            let mcqs = self
                .generate_mcq(class_num, subject, topic, difficulty, questions_per_topic)
                .await?;
            sections.push(mcqs);
        }

        let rule = "=".repeat(60);
        let mut worksheet = format!(
            "\n{rule}\nWORKSHEET - CLASS {class_num} {subject}\nDifficulty: {difficulty}\nTotal Questions: {num_questions}\nTopics: {topics}\n{rule}\n\n\
             Instructions:\n\
             - Answer all questions\n\
             - Each question carries equal marks\n\
             - Select the most appropriate answer from the given options\n\n{rule}\n\n",
            subject = subject.to_uppercase(),
            difficulty = difficulty.as_str().to_uppercase(),
            topics = topics.join(", "),
        );
        worksheet.push_str(&sections.join("\n\n"));
        worksheet.push_str(&format!("\n\n{rule}\nEND OF WORKSHEET\n{rule}"));

        Ok(worksheet)
    }

    /// Generate a complete exam paper.
    ///
    /// Marks split 30%/50%/20% across easy/medium/hard sections (hard takes
    /// the remainder); each section holds `section_marks / marks_per_question`
    /// MCQs (2/3/5 marks per question). Only the first chapter is used even
    /// when several are supplied; the section count floors at one question
    /// so small papers still render every section.
    #[instrument(skip(self), fields(artifact = "exam"))]
    pub async fn generate_exam_paper(
        &self,
        class_num: i32,
        subject: &str,
        chapters: &[String],
        total_marks: i32,
        duration_minutes: i32,
    ) -> Result<String> {
        ensure_range("total_marks", total_marks, EXAM_MARKS_RANGE)?;
        ensure_range("duration_minutes", duration_minutes, EXAM_DURATION_RANGE)?;

        info!(total_marks, duration_minutes, "Generating exam paper");

        let easy_marks = total_marks * 3 / 10;
        let medium_marks = total_marks / 2;
        let hard_marks = total_marks - easy_marks - medium_marks;

        let topic = chapters
            .first()
            .cloned()
            .unwrap_or_else(|| "General".to_string());

        let rule = "=".repeat(70);
        let mut exam_paper = format!(
            "\n{rule}\nCLASS {class_num} - {subject}\nEXAMINATION PAPER\n{rule}\n\n\
             Time Allowed: {duration_minutes} minutes\nMaximum Marks: {total_marks}\n\n\
             General Instructions:\n\
             1. All questions are compulsory\n\
             2. The paper consists of sections with varying difficulty levels\n\
             3. Read each question carefully before answering\n\
             4. Write your answers neatly and legibly\n\n{rule}\n\n",
            subject = subject.to_uppercase(),
        );

        let sections = [
            ("A", "EASY", Difficulty::Easy, easy_marks, EASY_MARKS_PER_QUESTION),
            ("B", "MEDIUM", Difficulty::Medium, medium_marks, MEDIUM_MARKS_PER_QUESTION),
            ("C", "HARD", Difficulty::Hard, hard_marks, HARD_MARKS_PER_QUESTION),
        ];

        for (label, name, difficulty, marks, marks_per_question) in sections {
            let num_questions = ((marks / marks_per_question) as usize).max(1);

            exam_paper.push_str(&format!("\nSECTION {label} - {name} ({marks} marks)\n"));
            exam_paper.push_str(&rule);
            exam_paper.push_str("\n\n");

            let questions = self
                .generate_mcq(class_num, subject, &topic, difficulty, num_questions)
                .await?;
            exam_paper.push_str(&questions);
            exam_paper.push_str("\n\n");
        }

        exam_paper.push_str(&format!("{rule}\nEND OF EXAMINATION\n{rule}"));

        Ok(exam_paper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use studyforge_common::models::{ChunkMetadata, ContentType, ScoredChunk};
    use studyforge_common::store::QueryFilters;

    fn chunk(i: usize, source_file: &str, subject: &str) -> ScoredChunk {
        ScoredChunk {
            id: format!("doc_20260806_120000_{}_abcd1234", i),
            content: format!("passage {}", i),
            metadata: ChunkMetadata {
                class_num: 6,
                subject: subject.to_string(),
                chapter: "Chapter 3: Heat".to_string(),
                topic: "Temperature".to_string(),
                content_type: ContentType::Explanation,
                difficulty: Difficulty::Easy,
                source_file: source_file.to_string(),
                page: 1,
                paragraph_index: i as i32,
            },
            distance: 0.1 + i as f64 * 0.01,
        }
    }

    fn trusted_chunks(n: usize) -> Vec<ScoredChunk> {
        (0..n).map(|i| chunk(i, "science6.pdf", "Science")).collect()
    }

    struct CountingSource {
        chunks: Vec<ScoredChunk>,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(chunks: Vec<ScoredChunk>) -> Arc<Self> {
            Arc::new(Self {
                chunks,
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChunkSource for CountingSource {
        async fn query(
            &self,
            _text: &str,
            _filters: &QueryFilters,
            limit: usize,
        ) -> studyforge_common::errors::Result<Vec<ScoredChunk>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.chunks.iter().take(limit).cloned().collect())
        }
    }

    struct RecordingGenerator {
        response: String,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingGenerator {
        fn new(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: response.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _max_tokens: u32,
        ) -> studyforge_common::errors::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.response.clone())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn generator(
        source: Arc<CountingSource>,
        llm: Arc<RecordingGenerator>,
    ) -> ContentGenerator {
        ContentGenerator::new(source, llm, 4000)
    }

    #[tokio::test]
    async fn test_mcq_happy_path() {
        let source = CountingSource::new(trusted_chunks(20));
        let llm = RecordingGenerator::new("Question 1: ...");
        let gen = generator(source.clone(), llm.clone());

        let out = gen
            .generate_mcq(6, "Science", "Temperature", Difficulty::Easy, 3)
            .await
            .unwrap();

        assert_eq!(out, "Question 1: ...");
        assert_eq!(source.call_count(), 1);

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Create 3 multiple-choice questions (MCQs) about Temperature"));
    }

    #[tokio::test]
    async fn test_no_trusted_content_never_reaches_the_model() {
        let untrusted = vec![chunk(0, "", "Science"), chunk(1, "seed.pdf", "Test")];
        let source = CountingSource::new(untrusted);
        let llm = RecordingGenerator::new("should never appear");
        let gen = generator(source, llm.clone());

        let err = gen
            .generate_mcq(6, "Science", "Temperature", Difficulty::Easy, 10)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoContent { .. }));
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_count_bounds_checked_before_retrieval() {
        let source = CountingSource::new(trusted_chunks(20));
        let llm = RecordingGenerator::new("x");
        let gen = generator(source.clone(), llm.clone());

        for bad in [0usize, 51] {
            let err = gen
                .generate_mcq(6, "Science", "Temperature", Difficulty::Easy, bad)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
        }

        // Neither the store nor the model saw anything
        assert_eq!(source.call_count(), 0);
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_shortfall_context_uses_all_available() {
        let source = CountingSource::new(trusted_chunks(5));
        let llm = RecordingGenerator::new("x");
        let gen = generator(source, llm.clone());

        gen.generate_mcq(6, "Science", "Temperature", Difficulty::Easy, 10)
            .await
            .unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("[Context 5]: passage 4"));
        assert!(!prompt.contains("[Context 6]"));
    }

    #[tokio::test]
    async fn test_worksheet_splits_questions_across_topics() {
        let source = CountingSource::new(trusted_chunks(20));
        let llm = RecordingGenerator::new("Question 1: ...");
        let gen = generator(source, llm.clone());

        let topics = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let out = gen
            .generate_worksheet(6, "Science", &topics, Difficulty::Medium, 10)
            .await
            .unwrap();

        // 10 questions over 3 topics: 3 per topic, 3 sub-calls, 9 total
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 3);
        for (prompt, topic) in prompts.iter().zip(["A", "B", "C"]) {
            assert!(prompt
                .contains(&format!("Create 3 multiple-choice questions (MCQs) about {topic}")));
        }

        assert!(out.contains("WORKSHEET - CLASS 6 SCIENCE"));
        assert!(out.contains("Difficulty: MEDIUM"));
        assert!(out.contains("Total Questions: 10"));
        assert!(out.contains("Topics: A, B, C"));
        assert!(out.contains("END OF WORKSHEET"));
    }

    #[tokio::test]
    async fn test_worksheet_floors_at_one_question_per_topic() {
        let source = CountingSource::new(trusted_chunks(20));
        let llm = RecordingGenerator::new("Question 1: ...");
        let gen = generator(source, llm.clone());

        let topics: Vec<String> = (0..8).map(|i| format!("T{i}")).collect();
        gen.generate_worksheet(6, "Science", &topics, Difficulty::Easy, 5)
            .await
            .unwrap();

        // 5 / 8 topics floors to 1 per topic
        for prompt in llm.prompts() {
            assert!(prompt.contains("Create 1 multiple-choice"));
        }
    }

    #[tokio::test]
    async fn test_worksheet_rejects_empty_topics() {
        let source = CountingSource::new(trusted_chunks(20));
        let llm = RecordingGenerator::new("x");
        let gen = generator(source.clone(), llm);

        let err = gen
            .generate_worksheet(6, "Science", &[], Difficulty::Easy, 10)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_exam_mark_distribution() {
        let source = CountingSource::new(trusted_chunks(40));
        let llm = RecordingGenerator::new("Question 1: ...");
        let gen = generator(source, llm.clone());

        let chapters = vec!["Heat".to_string(), "Light".to_string()];
        let out = gen
            .generate_exam_paper(6, "Science", &chapters, 100, 180)
            .await
            .unwrap();

        // 30/50/20 marks at 2/3/5 marks per question: 15, 16, 4
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("Create 15 multiple-choice"));
        assert!(prompts[1].contains("Create 16 multiple-choice"));
        assert!(prompts[2].contains("Create 4 multiple-choice"));

        // Only the first chapter feeds the sections
        for prompt in &prompts {
            assert!(prompt.contains("about Heat"));
            assert!(!prompt.contains("about Light"));
        }

        assert!(out.contains("CLASS 6 - SCIENCE"));
        assert!(out.contains("SECTION A - EASY (30 marks)"));
        assert!(out.contains("SECTION B - MEDIUM (50 marks)"));
        assert!(out.contains("SECTION C - HARD (20 marks)"));
        assert!(out.contains("Time Allowed: 180 minutes"));
        assert!(out.contains("Maximum Marks: 100"));
        assert!(out.contains("END OF EXAMINATION"));
    }

    #[tokio::test]
    async fn test_exam_small_total_still_renders_every_section() {
        let source = CountingSource::new(trusted_chunks(40));
        let llm = RecordingGenerator::new("Question 1: ...");
        let gen = generator(source, llm.clone());

        // 10 marks: easy 3, medium 5, hard 2; hard would divide to zero
        // questions and floors at one
        gen.generate_exam_paper(6, "Science", &[], 10, 60)
            .await
            .unwrap();

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[2].contains("Create 1 multiple-choice"));
        // Empty chapter list falls back to the General topic
        assert!(prompts[0].contains("about General"));
    }

    #[tokio::test]
    async fn test_flashcards_parse_from_prose() {
        let source = CountingSource::new(trusted_chunks(25));
        let llm = RecordingGenerator::new(
            "Here you go:\n{\"flashcards\":[{\"front\":\"Q\",\"back\":\"A\",\"hint\":\"H\"}]}\nEnjoy!",
        );
        let gen = generator(source, llm.clone());

        let batch = gen
            .generate_flashcards(6, "Science", "Temperature", 5)
            .await
            .unwrap();

        assert!(batch.parse_warning.is_none());
        assert_eq!(batch.cards.len(), 1);
        assert_eq!(batch.cards[0].front, "Q");

        // The flashcard window is capped at 20 chunks of the 25 available
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("passage 19"));
        assert!(!prompt.contains("passage 20"));
    }

    #[tokio::test]
    async fn test_flashcards_degrade_with_warning() {
        let source = CountingSource::new(trusted_chunks(5));
        let llm = RecordingGenerator::new("I am unable to produce JSON today.");
        let gen = generator(source, llm);

        let batch = gen
            .generate_flashcards(6, "Science", "Temperature", 5)
            .await
            .unwrap();

        assert!(batch.cards.is_empty());
        assert!(batch.parse_warning.is_some());
    }

    #[tokio::test]
    async fn test_notes_embed_every_trusted_chunk() {
        let source = CountingSource::new(trusted_chunks(45));
        let llm = RecordingGenerator::new("KEY CONCEPTS ...");
        let gen = generator(source, llm.clone());

        gen.generate_short_notes(6, "Science", "Heat").await.unwrap();

        // Notes take the whole trusted set: all 45 fetched chunks appear
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("passage 44"));
    }
}
