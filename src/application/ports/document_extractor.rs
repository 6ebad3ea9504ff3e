use async_trait::async_trait;

use crate::domain::value_objects::DocumentMetadata;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentExtractionError {
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// 1-based page number.
    pub number: i32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub pages: Vec<ExtractedPage>,
    pub page_count: i32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub metadata: DocumentMetadata,
}

impl ExtractedDocument {
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|page| !page.text.trim().is_empty())
    }
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_pages_from_bytes(
        &self,
        data: &[u8],
    ) -> Result<ExtractedDocument, DocumentExtractionError>;
}
