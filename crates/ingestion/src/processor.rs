//! Ingestion processor
//!
//! Walks a PDF page by page, tracks the chapter/topic outline, segments
//! paragraphs, and emits classified chunks ready for the content store.

use crate::classify::{
    classify_content_type, clean_text, estimate_difficulty, extract_chapter, extract_topic,
};
use crate::errors::IngestionError;
use crate::pdf::extract_pages;
use std::path::Path;
use studyforge_common::config::IngestionConfig;
use studyforge_common::models::{ChunkMetadata, NewChunk};
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Chapter label for pages before the first recognized heading
const UNKNOWN_CHAPTER: &str = "Unknown";

/// Topic label for pages before the first recognized heading
const GENERAL_TOPIC: &str = "General";

/// Pages with less text than this are skipped entirely
const MIN_PAGE_CHARS: usize = 50;

/// Paragraphs shorter than this are not worth chunking
const MIN_PARAGRAPH_CHARS: usize = 50;

/// Chapter/topic position within a document.
///
/// Headings appear once and then apply to every following page, so the
/// cursor carries the last seen labels forward. It is owned by a single
/// parse run and threaded through the page loop; nothing about it is
/// shared between documents.
#[derive(Debug, Clone)]
pub struct OutlineCursor {
    pub chapter: String,
    pub topic: String,
}

impl OutlineCursor {
    pub fn new() -> Self {
        Self {
            chapter: UNKNOWN_CHAPTER.to_string(),
            topic: GENERAL_TOPIC.to_string(),
        }
    }

    /// Update the cursor from one page of text. Labels only move forward:
    /// a page without headings keeps the current position.
    pub fn observe(&mut self, page_text: &str) {
        if let Some(chapter) = extract_chapter(page_text) {
            self.chapter = chapter;
        }
        if let Some(topic) = extract_topic(page_text) {
            self.topic = topic;
        }
    }
}

impl Default for OutlineCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// PDF-to-chunks processor
pub struct PdfIngestor {
    config: IngestionConfig,
}

impl PdfIngestor {
    pub fn new(config: IngestionConfig) -> Self {
        Self { config }
    }

    /// Parse one PDF into classified chunks.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn parse_pdf(
        &self,
        path: &Path,
        class_num: i32,
        subject: &str,
    ) -> Result<Vec<NewChunk>, IngestionError> {
        info!("Parsing PDF");

        let source_file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let pages = extract_pages(path)?;
        let total_pages = pages.len();

        let mut cursor = OutlineCursor::new();
        let mut chunks = Vec::new();

        for page in &pages {
            if page.text.trim().len() < MIN_PAGE_CHARS {
                warn!(page = page.number, "Page has insufficient text, skipping");
                continue;
            }

            cursor.observe(&page.text);

            let paragraphs: Vec<&str> = page
                .text
                .split("\n\n")
                .map(str::trim)
                .filter(|p| p.len() > MIN_PARAGRAPH_CHARS)
                .collect();

            for (paragraph_index, paragraph) in paragraphs.iter().enumerate() {
                for piece in self.split_oversized(paragraph) {
                    let cleaned = clean_text(&piece);
                    if cleaned.len() < self.config.min_chunk_chars {
                        continue;
                    }

                    let content_type = classify_content_type(&cleaned);
                    let difficulty = estimate_difficulty(&cleaned, class_num);

                    chunks.push(NewChunk {
                        content: cleaned,
                        metadata: ChunkMetadata {
                            class_num,
                            subject: subject.to_string(),
                            chapter: cursor.chapter.clone(),
                            topic: cursor.topic.clone(),
                            content_type,
                            difficulty,
                            source_file: source_file.clone(),
                            page: page.number,
                            paragraph_index: paragraph_index as i32,
                        },
                    });
                }
            }
        }

        info!(
            chunks = chunks.len(),
            pages = total_pages,
            "PDF parsed into chunks"
        );

        Ok(chunks)
    }

    /// Split a paragraph that exceeds the configured chunk size into
    /// sentence-aligned pieces; short paragraphs pass through whole.
    fn split_oversized(&self, paragraph: &str) -> Vec<String> {
        if paragraph.len() <= self.config.chunk_size {
            return vec![paragraph.to_string()];
        }

        let splitter = TextSplitter::new(ChunkConfig::new(self.config.chunk_size));
        splitter.chunks(paragraph).map(str::to_string).collect()
    }

    /// Parse every PDF in a directory. Individual file failures are
    /// logged and skipped; the successes are returned.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn parse_directory(
        &self,
        dir: &Path,
        class_num: i32,
        subject: &str,
    ) -> Result<Vec<NewChunk>, IngestionError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Parsing directory of PDFs");

        let mut all_chunks = Vec::new();
        let mut parsed_files = 0usize;

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map(|e| e == "pdf").unwrap_or(false) {
                match self.parse_pdf(&path, class_num, subject) {
                    Ok(chunks) => {
                        debug!(
                            path = %path.display(),
                            chunks = chunks.len(),
                            "PDF parsed"
                        );
                        parsed_files += 1;
                        all_chunks.extend(chunks);
                    }
                    Err(e) => {
                        error!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse PDF"
                        );
                    }
                }
            }
        }

        info!(
            %run_id,
            files = parsed_files,
            chunks = all_chunks.len(),
            "Directory parsing complete"
        );

        Ok(all_chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_common::models::ContentType;

    fn ingestor() -> PdfIngestor {
        PdfIngestor::new(IngestionConfig {
            chunk_size: 500,
            chunk_overlap: 50,
            min_chunk_chars: 30,
            batch_size: 100,
        })
    }

    #[test]
    fn test_cursor_carries_headings_forward() {
        let mut cursor = OutlineCursor::new();
        assert_eq!(cursor.chapter, "Unknown");
        assert_eq!(cursor.topic, "General");

        cursor.observe("Chapter 3: Heat\n3.1 Temperature\nbody text");
        assert_eq!(cursor.chapter, "Chapter 3: Heat");
        assert_eq!(cursor.topic, "Temperature");

        // A page without headings keeps the position
        cursor.observe("just more prose about thermometers");
        assert_eq!(cursor.chapter, "Chapter 3: Heat");
        assert_eq!(cursor.topic, "Temperature");

        // A new topic moves only the topic
        cursor.observe("3.2 Heat Transfer\nmore text");
        assert_eq!(cursor.chapter, "Chapter 3: Heat");
        assert_eq!(cursor.topic, "Heat Transfer");
    }

    #[test]
    fn test_split_oversized_passes_short_paragraphs_through() {
        let ing = ingestor();
        let short = "A short paragraph about heat.";
        assert_eq!(ing.split_oversized(short), vec![short.to_string()]);
    }

    #[test]
    fn test_split_oversized_breaks_long_paragraphs() {
        let ing = ingestor();
        let long = "This sentence repeats to exceed the limit. ".repeat(30);
        let pieces = ing.split_oversized(&long);
        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.len() <= 500);
        }
    }

    #[test]
    fn test_classification_feeds_metadata() {
        // Exercise the same helpers parse_pdf wires together
        let text = "Temperature is defined as the degree of hotness of a body.";
        assert_eq!(classify_content_type(text), ContentType::Definition);
        let cleaned = clean_text("Temperature is defined as   the degree of hotness. 17");
        assert_eq!(cleaned, "Temperature is defined as the degree of hotness.");
    }
}
