//! Chunk classification heuristics
//!
//! Heading extraction (chapter/topic), content-type tagging, and
//! difficulty estimation for extracted passages. All of this is keyword
//! and shape matching tuned for school textbooks; it prefers a wrong
//! guess over no guess, since every chunk needs a label.

use regex_lite::Regex;
use std::sync::OnceLock;
use studyforge_common::models::{ContentType, Difficulty};

fn chapter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:chapter|unit|lesson)\s+(\d+)\s*[:.\-]?\s+(\S.*)$").unwrap()
    })
}

fn numbered_section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+\.\d+)\s+(\S.*)$").unwrap())
}

fn labeled_topic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(?:topic|section)\s*[:\-]\s*(\S.*)$").unwrap())
}

fn math_notation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[∫∑∂√²³⁴]|\\frac|\\sqrt").unwrap())
}

/// Find a chapter heading in page text. Returns the normalized
/// `Chapter N: Title` label, or None when no heading line matches.
pub fn extract_chapter(text: &str) -> Option<String> {
    for line in text.lines() {
        if let Some(caps) = chapter_re().captures(line) {
            let number = caps.get(1)?.as_str();
            let title = caps.get(2)?.as_str().trim();
            return Some(format!("Chapter {}: {}", number, title));
        }
    }
    None
}

/// Find a topic/section heading in page text (numbered sections like
/// `3.2 Heat Transfer` or explicit `Topic:` / `Section:` labels).
pub fn extract_topic(text: &str) -> Option<String> {
    for line in text.lines() {
        if let Some(caps) = numbered_section_re().captures(line) {
            return Some(caps.get(2)?.as_str().trim().to_string());
        }
        if let Some(caps) = labeled_topic_re().captures(line) {
            return Some(caps.get(1)?.as_str().trim().to_string());
        }
    }
    None
}

/// Tag a passage with its content type
pub fn classify_content_type(text: &str) -> ContentType {
    let lower = text.to_lowercase();

    let definition_keywords = [
        "definition:",
        "is defined as",
        "refers to",
        "means that",
        "is called",
    ];
    if definition_keywords.iter().any(|k| lower.contains(k)) {
        return ContentType::Definition;
    }

    let formula_symbols = ['=', '+', '×', '÷', '−', '∫', '∑', '√', '²', '³', '∂'];
    if text.chars().any(|c| formula_symbols.contains(&c)) {
        return ContentType::Formula;
    }

    let example_keywords = ["example", "for instance", "solve:", "solution:", "let us"];
    if example_keywords.iter().any(|k| lower.contains(k)) {
        return ContentType::Example;
    }

    let question_starters = ["what", "why", "how", "when", "where"];
    if text.contains('?') || question_starters.iter().any(|s| lower.trim_start().starts_with(s)) {
        return ContentType::Question;
    }

    let theorem_keywords = ["theorem", "rule", "law", "principle", "property"];
    if theorem_keywords.iter().any(|k| lower.contains(k)) {
        return ContentType::Theorem;
    }

    ContentType::Explanation
}

/// Estimate passage difficulty from text complexity and class level.
/// Longer words, longer sentences, mathematical notation, and higher
/// classes each add a point; 0-1 easy, 2 medium, 3+ hard.
pub fn estimate_difficulty(text: &str, class_num: i32) -> Difficulty {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Difficulty::Easy;
    }

    let avg_word_length =
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64;

    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    let avg_sentence_length = words.len() as f64 / sentence_count as f64;

    let has_complex_math = math_notation_re().is_match(text);

    let mut score = 0;
    if avg_word_length > 6.0 {
        score += 1;
    }
    if avg_sentence_length > 15.0 {
        score += 1;
    }
    if has_complex_math {
        score += 1;
    }
    if class_num >= 9 {
        score += 1;
    }

    match score {
        0 | 1 => Difficulty::Easy,
        2 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

/// Clean an extracted paragraph: collapse whitespace and strip a trailing
/// bare page number (1-3 digits) left over from headers/footers.
pub fn clean_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some((head, tail)) = collapsed.rsplit_once(' ') {
        if tail.len() <= 3 && tail.chars().all(|c| c.is_ascii_digit()) {
            return head.trim_end().to_string();
        }
    }

    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_chapter_variants() {
        assert_eq!(
            extract_chapter("Chapter 3: Heat and Temperature\nmore text"),
            Some("Chapter 3: Heat and Temperature".to_string())
        );
        assert_eq!(
            extract_chapter("UNIT 12 - Electricity"),
            Some("Chapter 12: Electricity".to_string())
        );
        assert_eq!(
            extract_chapter("Lesson 1. The Cell"),
            Some("Chapter 1: The Cell".to_string())
        );
        assert_eq!(extract_chapter("plain paragraph text"), None);
    }

    #[test]
    fn test_extract_topic_variants() {
        assert_eq!(
            extract_topic("3.2 Heat Transfer\nbody"),
            Some("Heat Transfer".to_string())
        );
        assert_eq!(
            extract_topic("Topic: Conduction"),
            Some("Conduction".to_string())
        );
        assert_eq!(
            extract_topic("Section - States of Matter"),
            Some("States of Matter".to_string())
        );
        assert_eq!(extract_topic("no headings here"), None);
    }

    #[test]
    fn test_classify_definitions_win_over_questions() {
        assert_eq!(
            classify_content_type("Temperature is defined as the degree of hotness."),
            ContentType::Definition
        );
    }

    #[test]
    fn test_classify_formula_example_question_theorem() {
        assert_eq!(classify_content_type("c² = a² + b²"), ContentType::Formula);
        assert_eq!(
            classify_content_type("Example: a train travels 60 km in one hour."),
            ContentType::Example
        );
        assert_eq!(
            classify_content_type("Why does ice float on water?"),
            ContentType::Question
        );
        assert_eq!(
            classify_content_type("The law of conservation of energy states this."),
            ContentType::Theorem
        );
        assert_eq!(
            classify_content_type("Plants make food using sunlight."),
            ContentType::Explanation
        );
    }

    #[test]
    fn test_difficulty_scales_with_class_and_notation() {
        let simple = "The sun is hot. It gives us light.";
        assert_eq!(estimate_difficulty(simple, 5), Difficulty::Easy);
        // Same passage, higher class still stays easy at one point
        assert_eq!(estimate_difficulty(simple, 10), Difficulty::Easy);

        let math = "Therefore ∫f(x)dx represents accumulated quantities computed precisely";
        assert_eq!(estimate_difficulty(math, 10), Difficulty::Hard);
    }

    #[test]
    fn test_clean_text_strips_trailing_page_number() {
        assert_eq!(clean_text("Heat flows  from hot\nto cold. 42"), "Heat flows from hot to cold.");
        assert_eq!(clean_text("The year 1947 mattered"), "The year 1947 mattered");
        assert_eq!(clean_text("ends with big number 1234"), "ends with big number 1234");
    }
}
