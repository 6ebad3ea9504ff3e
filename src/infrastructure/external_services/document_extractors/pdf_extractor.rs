use async_trait::async_trait;
use lopdf::{Dictionary, Document, Object};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use regex::Regex;

use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedDocument, ExtractedPage,
};
use crate::domain::value_objects::DocumentMetadata;

const ISBN_PATTERN: &str = r"\b(?:ISBN(?:: ?| ))?((?:97[89])?\d{9}[\dxX])\b";

const INFO_FIELDS: &[(&[u8], &str)] = &[
    (b"Title", "pdf_title"),
    (b"Author", "pdf_author"),
    (b"Subject", "pdf_subject"),
    (b"Keywords", "pdf_keywords"),
    (b"Creator", "pdf_creator"),
    (b"Producer", "pdf_producer"),
    (b"CreationDate", "pdf_creation_date"),
];

const ENGLISH_MARKERS: &[&str] = &["the", "and", "of", "to", "is", "that", "with", "for"];
const SPANISH_MARKERS: &[&str] = &["el", "la", "de", "que", "los", "las", "para", "con", "una"];

/// Page-by-page PDF text extraction with lopdf. Pages are decoded in parallel
/// on a blocking thread.
pub struct PdfExtractor {
    password: String,
    isbn: Regex,
}

impl PdfExtractor {
    pub fn new() -> Result<Self, DocumentExtractionError> {
        let isbn = Regex::new(ISBN_PATTERN)
            .map_err(|e| DocumentExtractionError::ExtractionFailed(e.to_string()))?;
        Ok(Self {
            password: String::new(),
            isbn,
        })
    }

    fn decrypt_if_needed(&self, doc: &mut Document) -> Result<(), DocumentExtractionError> {
        if doc.is_encrypted() {
            doc.decrypt(&self.password).map_err(|_e| {
                DocumentExtractionError::ExtractionFailed(
                    "Failed to decrypt PDF - invalid password".to_string(),
                )
            })?;
        }
        Ok(())
    }

    async fn extract(&self, doc: Document) -> Result<ExtractedDocument, DocumentExtractionError> {
        let (pages, errors, info) = tokio::task::spawn_blocking(move || {
            let (pages, errors) = extract_pages(&doc);
            let info = read_info(&doc);
            (pages, errors, info)
        })
        .await
        .map_err(|e| DocumentExtractionError::ExtractionFailed(e.to_string()))?;

        let mut metadata = DocumentMetadata::new();
        for (key, value) in &info {
            metadata.set_text(key, value);
        }

        let full_text = pages
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        metadata.set_property(
            "word_count",
            serde_json::Value::from(full_text.split_whitespace().count()),
        );
        if let Some(isbn) = self.detect_isbn(&full_text) {
            metadata.set_text("isbn", &isbn);
        }
        if let Some(language) = detect_language(&full_text) {
            metadata.set_language(language);
        }
        if !errors.is_empty() {
            tracing::warn!(failed_pages = errors.len(), "some pages could not be decoded");
            metadata.set_property(
                "extraction_errors",
                serde_json::Value::Array(errors.into_iter().map(serde_json::Value::String).collect()),
            );
        }

        let title = info
            .iter()
            .find(|(key, _)| *key == "pdf_title")
            .map(|(_, value)| value.clone());
        let author = info
            .iter()
            .find(|(key, _)| *key == "pdf_author")
            .map(|(_, value)| value.clone());

        Ok(ExtractedDocument {
            page_count: pages.len() as i32,
            pages,
            title,
            author,
            metadata,
        })
    }

    fn detect_isbn(&self, text: &str) -> Option<String> {
        self.isbn
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract_pages_from_bytes(
        &self,
        data: &[u8],
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        let mut doc = Document::load_mem(data)
            .map_err(|e| DocumentExtractionError::CorruptedFile(e.to_string()))?;
        self.decrypt_if_needed(&mut doc)?;
        self.extract(doc).await
    }
}

/// Text of every page in page order. A page that fails to decode yields
/// empty text and an entry in the error list.
fn extract_pages(doc: &Document) -> (Vec<ExtractedPage>, Vec<String>) {
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

    let results: Vec<(u32, Result<String, String>)> = page_numbers
        .into_par_iter()
        .map(|page_num| {
            let text = doc
                .extract_text(&[page_num])
                .map_err(|e| format!("Failed to extract text from page {}: {}", page_num, e));
            (page_num, text)
        })
        .collect();

    let mut pages = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (page_num, result) in results {
        let text = match result {
            Ok(text) => text
                .lines()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                errors.push(e);
                String::new()
            }
        };
        pages.push(ExtractedPage {
            number: page_num as i32,
            text,
        });
    }

    (pages, errors)
}

fn read_info(doc: &Document) -> Vec<(&'static str, String)> {
    let Some(info) = info_dictionary(doc) else {
        return Vec::new();
    };

    INFO_FIELDS
        .iter()
        .filter_map(|(field, key)| {
            let bytes = info.get(field).ok()?.as_str().ok()?;
            let value = decode_pdf_string(bytes);
            let value = value.trim();
            (!value.is_empty()).then(|| (*key, value.to_string()))
        })
        .collect()
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// PDF text strings are UTF-16BE when they start with a byte-order mark,
/// otherwise treated as UTF-8 with a Latin-1 fallback.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Crude stopword vote between English and Spanish; `None` when neither
/// language dominates.
fn detect_language(text: &str) -> Option<&'static str> {
    let mut english = 0usize;
    let mut spanish = 0usize;

    for word in text.split_whitespace().take(5000) {
        let word = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        if ENGLISH_MARKERS.contains(&word.as_str()) {
            english += 1;
        }
        if SPANISH_MARKERS.contains(&word.as_str()) {
            spanish += 1;
        }
    }

    if english + spanish < 5 {
        return None;
    }
    if english >= spanish * 2 {
        Some("en")
    } else if spanish >= english * 2 {
        Some("es")
    } else {
        None
    }
}
