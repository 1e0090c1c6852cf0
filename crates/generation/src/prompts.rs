//! Prompt Composer: deterministic instruction templates per artifact type
//!
//! Each renderer produces the full natural-language instruction for one
//! generation call: a role-setting preamble naming class and subject, the
//! embedded context block, a requirements list, and the exact output
//! grammar the model must reproduce. The grammar is the central invariant:
//! a downstream parser must be able to split the raw response back into
//! discrete items. Renderers are one-shot; they never validate or retry.

use crate::retrieval::ContextWindow;
use studyforge_common::models::Difficulty;

/// What each difficulty level demands from fill-in-the-blank items
fn fill_blank_depth(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "basic recall",
        Difficulty::Medium => "moderate understanding",
        Difficulty::Hard => "deep analysis",
    }
}

fn short_answer_depth(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "simple recall",
        Difficulty::Medium => "application of concepts",
        Difficulty::Hard => "analysis and evaluation",
    }
}

fn long_answer_depth(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "straightforward explanations",
        Difficulty::Medium => "connections and applications",
        Difficulty::Hard => "critical thinking and synthesis",
    }
}

fn very_short_answer_depth(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "common terms",
        Difficulty::Medium => "moderate vocabulary",
        Difficulty::Hard => "specialized terminology",
    }
}

/// Multiple-choice question set
pub fn mcq(
    class_num: i32,
    subject: &str,
    topic: &str,
    difficulty: Difficulty,
    num_questions: usize,
    context: &ContextWindow,
) -> String {
    format!(
        r#"You are an expert educational content creator for Class {class_num} {subject}.

RETRIEVED TEXTBOOK CONTENT:
{context}

TASK: Create {num_questions} multiple-choice questions (MCQs) about {topic}.

REQUIREMENTS:
- Difficulty level: {difficulty}
- Each question must have exactly 4 options (A, B, C, D)
- Only ONE option should be correct
- Questions should test understanding and application, not just memorization
- Base all questions on the provided textbook content above
- Make questions clear and unambiguous
- Ensure wrong options are plausible but clearly incorrect
- Include variety: some conceptual, some numerical, some application-based

FORMAT (strictly follow this):
Question 1: [Clear, specific question text]
A) [First option]
B) [Second option]
C) [Third option]
D) [Fourth option]
Correct Answer: [A/B/C/D]
Explanation: [Brief 1-2 sentence explanation of why this is correct]

[Blank line between questions]

Generate all {num_questions} questions now following this exact format:"#,
        context = context.numbered_block(),
    )
}

/// Fill-in-the-blank question set
pub fn fill_blanks(
    class_num: i32,
    subject: &str,
    topic: &str,
    difficulty: Difficulty,
    num_questions: usize,
    context: &ContextWindow,
) -> String {
    format!(
        r#"You are an expert educational content creator for Class {class_num} {subject}.

RETRIEVED TEXTBOOK CONTENT:
{context}

TASK: Create {num_questions} fill in the blanks questions about {topic}.

REQUIREMENTS:
- Difficulty level: {difficulty}
- Base all questions on the provided textbook content above
- Each question should have ONE blank marked with ________
- The blank should test key concepts, terms, or important facts
- Provide the correct answer after each question
- Questions must be UNIQUE and not repeat the same concept
- Make questions clear and unambiguous
- Include variety: definitions, facts, concepts, and relationships
- {difficulty} difficulty means: {depth}

FORMAT (strictly follow this):
1. [Statement with ________ representing the blank]
   Answer: [Correct word/phrase]

2. [Statement with ________ representing the blank]
   Answer: [Correct word/phrase]

Generate all {num_questions} UNIQUE fill in the blanks questions now:"#,
        context = context.numbered_block(),
        depth = fill_blank_depth(difficulty),
    )
}

/// Short-answer question set (questions only, no answers)
pub fn short_answer(
    class_num: i32,
    subject: &str,
    topic: &str,
    difficulty: Difficulty,
    num_questions: usize,
    context: &ContextWindow,
) -> String {
    format!(
        r#"You are an expert educational content creator for Class {class_num} {subject}.

RETRIEVED TEXTBOOK CONTENT:
{context}

TASK: Create {num_questions} short answer questions about {topic}.

REQUIREMENTS:
- Difficulty level: {difficulty}
- Base all questions on the provided textbook content above
- Each question should require 2-3 sentences to answer (50-80 words)
- Questions should test understanding, not just recall
- Questions must be UNIQUE and cover different aspects of the topic
- Use question words: What, Why, How, Explain, Describe, Define
- DO NOT provide answers - only questions
- Make questions clear and specific
- {difficulty} difficulty means: {depth}

FORMAT (strictly follow this):
1. [Clear, specific question]

2. [Clear, specific question]

3. [Clear, specific question]

Generate all {num_questions} UNIQUE short answer questions now (QUESTIONS ONLY, NO ANSWERS):"#,
        context = context.numbered_block(),
        depth = short_answer_depth(difficulty),
    )
}

/// Long-answer question set (questions only, no answers)
pub fn long_answer(
    class_num: i32,
    subject: &str,
    topic: &str,
    difficulty: Difficulty,
    num_questions: usize,
    context: &ContextWindow,
) -> String {
    format!(
        r#"You are an expert educational content creator for Class {class_num} {subject}.

RETRIEVED TEXTBOOK CONTENT:
{context}

TASK: Create {num_questions} long answer questions about {topic}.

REQUIREMENTS:
- Difficulty level: {difficulty}
- Base all questions on the provided textbook content above
- Each question should require detailed answers (150-200 words or more)
- Questions should test deep understanding, analysis, and application
- Questions must be UNIQUE and cover different major aspects
- Use prompts like: Explain in detail, Describe with examples, Analyze, Compare and contrast, Evaluate, Discuss
- DO NOT provide answers - only questions
- Make questions comprehensive and thought-provoking
- {difficulty} difficulty means: {depth}

FORMAT (strictly follow this):
1. [Comprehensive, detailed question]

2. [Comprehensive, detailed question]

3. [Comprehensive, detailed question]

Generate all {num_questions} UNIQUE long answer questions now (QUESTIONS ONLY, NO ANSWERS):"#,
        context = context.numbered_block(),
        depth = long_answer_depth(difficulty),
    )
}

/// Very-short-answer question set (questions only, no answers)
pub fn very_short_answer(
    class_num: i32,
    subject: &str,
    topic: &str,
    difficulty: Difficulty,
    num_questions: usize,
    context: &ContextWindow,
) -> String {
    format!(
        r#"You are an expert educational content creator for Class {class_num} {subject}.

RETRIEVED TEXTBOOK CONTENT:
{context}

TASK: Create {num_questions} very short answer questions about {topic}.

REQUIREMENTS:
- Difficulty level: {difficulty}
- Base all questions on the provided textbook content above
- Each question should require 1-2 word or one sentence answers (10-20 words max)
- Questions should be direct and specific
- Questions must be UNIQUE and not repeat concepts
- Focus on: definitions, names, terms, simple facts, dates, formulas
- DO NOT provide answers - only questions
- Make questions clear and concise
- {difficulty} difficulty means: {depth}

FORMAT (strictly follow this):
1. [Brief, specific question]

2. [Brief, specific question]

3. [Brief, specific question]

Generate all {num_questions} UNIQUE very short answer questions now (QUESTIONS ONLY, NO ANSWERS):"#,
        context = context.numbered_block(),
        depth = very_short_answer_depth(difficulty),
    )
}

/// Flashcard set; the response must be the JSON object shown in the prompt
pub fn flashcards(
    class_num: i32,
    subject: &str,
    topic: &str,
    num_cards: usize,
    context: &ContextWindow,
) -> String {
    format!(
        r#"Based on this Class {class_num} {subject} content about {topic}:

{context}

Create {num_cards} flashcards for students to study.

Each flashcard should have:
- Front: A clear, specific question or term
- Back: Complete but concise answer or definition
- Hint (optional): A helpful memory aid or connection

Return as a JSON array in this exact format:
{{
  "flashcards": [
    {{
      "front": "What is the Pythagorean theorem?",
      "back": "In a right triangle, a² + b² = c² where c is the hypotenuse",
      "hint": "Think: 3-4-5 triangle"
    }}
  ]
}}

Generate all {num_cards} flashcards now:"#,
        context = context.joined_block(),
    )
}

/// Chapter revision notes
pub fn notes(class_num: i32, context: &ContextWindow) -> String {
    format!(
        r#"Create comprehensive but concise revision notes for Class {class_num} students.

CHAPTER CONTENT:
{context}

Create structured notes covering:

1. KEY CONCEPTS (3-5 main ideas with brief explanations)
2. IMPORTANT DEFINITIONS (key terms with clear definitions)
3. FORMULAS & THEOREMS (list all important formulas)
4. QUICK TIPS (exam tips and memory aids)
5. COMMON MISTAKES (typical errors students make)

Keep it focused and exam-oriented. Maximum 2 pages. Use bullet points where appropriate.

Generate the complete notes now:"#,
        context = context.joined_block(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_common::models::{ChunkMetadata, ContentType, ScoredChunk};

    fn window() -> ContextWindow {
        ContextWindow {
            chunks: vec![ScoredChunk {
                id: "science6_20260806_120000_0_abcd1234".to_string(),
                content: "Temperature is the degree of hotness of a body.".to_string(),
                metadata: ChunkMetadata {
                    class_num: 6,
                    subject: "Science".to_string(),
                    chapter: "Chapter 3: Heat".to_string(),
                    topic: "Temperature".to_string(),
                    content_type: ContentType::Definition,
                    difficulty: Difficulty::Easy,
                    source_file: "science6.pdf".to_string(),
                    page: 41,
                    paragraph_index: 2,
                },
                distance: 0.1,
            }],
        }
    }

    #[test]
    fn test_mcq_prompt_carries_grammar_anchors() {
        let prompt = mcq(6, "Science", "Temperature", Difficulty::Easy, 10, &window());

        assert!(prompt.contains("Class 6 Science"));
        assert!(prompt.contains("Create 10 multiple-choice questions"));
        assert!(prompt.contains("[Context 1]: Temperature is the degree"));
        assert!(prompt.contains("Question 1:"));
        assert!(prompt.contains("Correct Answer: [A/B/C/D]"));
        assert!(prompt.contains("Explanation:"));
        assert!(prompt.contains("exactly 4 options (A, B, C, D)"));
        assert!(prompt.contains("Difficulty level: easy"));
    }

    #[test]
    fn test_fill_blanks_prompt_includes_answer_lines() {
        let prompt = fill_blanks(8, "Mathematics", "Algebra", Difficulty::Hard, 20, &window());

        assert!(prompt.contains("________"));
        assert!(prompt.contains("Answer: [Correct word/phrase]"));
        assert!(prompt.contains("hard difficulty means: deep analysis"));
    }

    #[test]
    fn test_question_only_prompts_forbid_answers() {
        let w = window();
        for prompt in [
            short_answer(7, "Science", "Light", Difficulty::Medium, 15, &w),
            long_answer(7, "Science", "Light", Difficulty::Medium, 15, &w),
            very_short_answer(7, "Science", "Light", Difficulty::Medium, 15, &w),
        ] {
            assert!(prompt.contains("DO NOT provide answers - only questions"));
            assert!(prompt.contains("QUESTIONS ONLY, NO ANSWERS"));
        }
    }

    #[test]
    fn test_difficulty_depth_varies_by_template() {
        let w = window();
        let short = short_answer(7, "Science", "Light", Difficulty::Medium, 15, &w);
        assert!(short.contains("medium difficulty means: application of concepts"));

        let long = long_answer(7, "Science", "Light", Difficulty::Easy, 15, &w);
        assert!(long.contains("easy difficulty means: straightforward explanations"));

        let very_short = very_short_answer(7, "Science", "Light", Difficulty::Hard, 15, &w);
        assert!(very_short.contains("hard difficulty means: specialized terminology"));
    }

    #[test]
    fn test_flashcards_prompt_shows_json_shape() {
        let prompt = flashcards(6, "Science", "Temperature", 5, &window());

        assert!(prompt.contains("\"flashcards\": ["));
        assert!(prompt.contains("\"front\":"));
        assert!(prompt.contains("\"back\":"));
        assert!(prompt.contains("\"hint\":"));
        // Flashcards embed raw context, not the numbered block
        assert!(!prompt.contains("[Context 1]"));
    }

    #[test]
    fn test_notes_prompt_outline() {
        let prompt = notes(9, &window());

        assert!(prompt.contains("Class 9"));
        assert!(prompt.contains("1. KEY CONCEPTS"));
        assert!(prompt.contains("5. COMMON MISTAKES"));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let w = window();
        let a = mcq(6, "Science", "Temperature", Difficulty::Easy, 10, &w);
        let b = mcq(6, "Science", "Temperature", Difficulty::Easy, 10, &w);
        assert_eq!(a, b);
    }
}
