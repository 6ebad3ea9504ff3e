use std::sync::Arc;

use crate::application::ports::Tokenizer;
use crate::application::ports::document_extractor::ExtractedPage;

#[derive(Debug, Clone)]
pub struct ChunkingOptions {
    /// Upper bound on tokens per fragment (`T`).
    pub fragment_token_budget: usize,
    /// Accepted for configuration compatibility; fragments never overlap.
    pub fragment_overlap: usize,
    /// Minimum fragment length (`L`).
    pub min_fragment_length: usize,
    /// Cap on fragments kept per page (`M`).
    pub max_fragments_per_page: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            fragment_token_budget: 1000,
            fragment_overlap: 200,
            min_fragment_length: 50,
            max_fragments_per_page: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageFragment {
    pub content: String,
    pub page_number: i32,
    pub token_count: usize,
}

/// Splits page text into token-bounded fragments, paragraph first and
/// sentence second. A sentence is never cut, so a single sentence longer
/// than the budget becomes one oversized fragment.
pub struct Chunker {
    tokenizer: Arc<dyn Tokenizer>,
    options: ChunkingOptions,
}

impl Chunker {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, options: ChunkingOptions) -> Self {
        if options.fragment_overlap > 0 {
            tracing::debug!(
                overlap = options.fragment_overlap,
                "fragment overlap is configured but not applied"
            );
        }

        Self { tokenizer, options }
    }

    pub fn chunk_pages(&self, pages: &[ExtractedPage]) -> Vec<PageFragment> {
        pages
            .iter()
            .flat_map(|page| self.chunk_page(page.number, &page.text))
            .collect()
    }

    pub fn chunk_page(&self, page_number: i32, text: &str) -> Vec<PageFragment> {
        let mut fragments = Vec::new();

        for paragraph in normalize_paragraphs(text) {
            if paragraph.chars().count() < self.options.min_fragment_length {
                continue;
            }

            let tokens = self.tokenizer.count_tokens(&paragraph);
            if tokens <= self.options.fragment_token_budget {
                self.push_fragment(&mut fragments, page_number, paragraph, tokens);
            } else {
                self.split_by_sentences(&mut fragments, page_number, &paragraph);
            }
        }

        if fragments.len() > self.options.max_fragments_per_page {
            tracing::debug!(
                page = page_number,
                produced = fragments.len(),
                kept = self.options.max_fragments_per_page,
                "truncating page fragments"
            );
            fragments.truncate(self.options.max_fragments_per_page);
        }

        fragments
    }

    fn split_by_sentences(&self, fragments: &mut Vec<PageFragment>, page_number: i32, paragraph: &str) {
        let budget = self.options.fragment_token_budget;
        let mut running = String::new();

        for sentence in split_sentences(paragraph) {
            let candidate = if running.is_empty() {
                sentence.clone()
            } else {
                format!("{} {}", running, sentence)
            };

            if self.tokenizer.count_tokens(&candidate) <= budget {
                running = candidate;
                continue;
            }

            self.flush(fragments, page_number, std::mem::take(&mut running));
            running = sentence;
        }

        self.flush(fragments, page_number, running);
    }

    fn flush(&self, fragments: &mut Vec<PageFragment>, page_number: i32, running: String) {
        if running.is_empty() {
            return;
        }
        let tokens = self.tokenizer.count_tokens(&running);
        self.push_fragment(fragments, page_number, running, tokens);
    }

    fn push_fragment(
        &self,
        fragments: &mut Vec<PageFragment>,
        page_number: i32,
        content: String,
        token_count: usize,
    ) {
        if token_count < self.options.min_fragment_length {
            return;
        }

        fragments.push(PageFragment {
            content,
            page_number,
            token_count,
        });
    }
}

/// Paragraphs are separated by one or more blank lines. Inside a paragraph,
/// line breaks and runs of whitespace collapse to single spaces; punctuation
/// is left alone.
pub fn normalize_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(collapse_whitespace(&current.join(" ")));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        paragraphs.push(collapse_whitespace(&current.join(" ")));
    }

    paragraphs
}

/// Sentences end at `.`; each returned sentence keeps its terminating period.
pub fn split_sentences(paragraph: &str) -> Vec<String> {
    paragraph
        .split('.')
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(|sentence| format!("{}.", sentence))
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
