//! Flashcard response parsing
//!
//! The model is asked for a JSON object but often wraps it in prose. The
//! parser takes the slice between the first `{` and the last `}` and
//! decodes only that. A response that cannot be decoded degrades to an
//! empty card list with the failure carried as an explicit warning, so
//! callers can tell "no cards" apart from "unparseable response".

use serde::{Deserialize, Serialize};
use studyforge_common::models::Flashcard;
use tracing::warn;

/// Result of one flashcard generation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardBatch {
    pub cards: Vec<Flashcard>,

    /// Present when the model response could not be decoded and the card
    /// list degraded to empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_warning: Option<String>,
}

impl FlashcardBatch {
    fn degraded(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(warning = %message, "Flashcard response degraded to empty set");
        Self {
            cards: Vec::new(),
            parse_warning: Some(message),
        }
    }
}

#[derive(Deserialize)]
struct FlashcardEnvelope {
    #[serde(default)]
    flashcards: Vec<Flashcard>,
}

/// Parse the raw model response into flashcards, tolerating leading and
/// trailing prose around the JSON object.
pub fn parse_flashcard_response(raw: &str) -> FlashcardBatch {
    let Some(start) = raw.find('{') else {
        return FlashcardBatch::degraded("no JSON object found in response");
    };
    let Some(end) = raw.rfind('}') else {
        return FlashcardBatch::degraded("no JSON object found in response");
    };
    if end < start {
        return FlashcardBatch::degraded("no JSON object found in response");
    }

    match serde_json::from_str::<FlashcardEnvelope>(&raw[start..=end]) {
        Ok(envelope) => FlashcardBatch {
            cards: envelope.flashcards,
            parse_warning: None,
        },
        Err(e) => FlashcardBatch::degraded(format!("invalid flashcard JSON: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_embedded_in_prose() {
        let raw = concat!(
            "Sure! Here are your flashcards:\n\n",
            r#"{"flashcards":[{"front":"Q","back":"A","hint":"H"}]}"#,
            "\n\nLet me know if you need more."
        );

        let batch = parse_flashcard_response(raw);

        assert!(batch.parse_warning.is_none());
        assert_eq!(batch.cards.len(), 1);
        assert_eq!(batch.cards[0].front, "Q");
        assert_eq!(batch.cards[0].back, "A");
        assert_eq!(batch.cards[0].hint.as_deref(), Some("H"));
    }

    #[test]
    fn test_hint_is_optional() {
        let raw = r#"{"flashcards":[{"front":"Q","back":"A"}]}"#;
        let batch = parse_flashcard_response(raw);
        assert_eq!(batch.cards.len(), 1);
        assert!(batch.cards[0].hint.is_none());
    }

    #[test]
    fn test_no_braces_degrades_without_panicking() {
        let batch = parse_flashcard_response("I could not produce any cards.");
        assert!(batch.cards.is_empty());
        assert!(batch.parse_warning.is_some());
    }

    #[test]
    fn test_mismatched_braces_degrade() {
        let batch = parse_flashcard_response("} nothing useful {");
        assert!(batch.cards.is_empty());
        assert!(batch.parse_warning.is_some());
    }

    #[test]
    fn test_invalid_json_carries_warning() {
        let batch = parse_flashcard_response(r#"{"flashcards": [{"front": }]}"#);
        assert!(batch.cards.is_empty());
        assert!(batch
            .parse_warning
            .as_deref()
            .unwrap()
            .starts_with("invalid flashcard JSON"));
    }

    #[test]
    fn test_missing_flashcards_key_is_empty_not_warning() {
        let batch = parse_flashcard_response(r#"{"cards": []}"#);
        assert!(batch.cards.is_empty());
        assert!(batch.parse_warning.is_none());
    }

    #[test]
    fn test_multiple_cards_keep_order() {
        let raw = r#"{"flashcards":[
            {"front":"first","back":"1"},
            {"front":"second","back":"2","hint":"two"},
            {"front":"third","back":"3"}
        ]}"#;

        let batch = parse_flashcard_response(raw);
        let fronts: Vec<&str> = batch.cards.iter().map(|c| c.front.as_str()).collect();
        assert_eq!(fronts, vec!["first", "second", "third"]);
    }
}
