use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::use_cases::IngestDocumentResponse;
use crate::domain::entities::Document;
use crate::domain::value_objects::DocumentMetadata;

#[derive(Debug, Serialize)]
pub struct DocumentResponseDto {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub page_count: i32,
    pub fragment_count: i32,
    pub processed_at: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponseDto {
    pub documents: Vec<DocumentResponseDto>,
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentSearchParams {
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportDocumentRequestDto {
    pub path: String,
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponseDto {
    pub document_id: Uuid,
    pub title: String,
    pub page_count: i32,
    pub fragments_created: usize,
    pub embeddings_created: usize,
    pub processing_time_ms: u64,
    pub message: String,
}

impl From<Document> for DocumentResponseDto {
    fn from(document: Document) -> Self {
        Self {
            id: document.id(),
            title: document.title().to_string(),
            author: document.author().map(str::to_string),
            page_count: document.page_count(),
            fragment_count: document.fragment_count(),
            processed_at: document.processed_at().to_rfc3339(),
            metadata: document.metadata().clone(),
        }
    }
}

impl From<IngestDocumentResponse> for IngestResponseDto {
    fn from(response: IngestDocumentResponse) -> Self {
        let message = if response.embeddings_created < response.fragments_created {
            format!(
                "Ingested with {} of {} fragments embedded",
                response.embeddings_created, response.fragments_created
            )
        } else {
            "Document ingested".to_string()
        };

        Self {
            document_id: response.document_id,
            title: response.title,
            page_count: response.page_count,
            fragments_created: response.fragments_created,
            embeddings_created: response.embeddings_created,
            processing_time_ms: response.processing_time_ms,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_embedding_is_reported() {
        let dto = IngestResponseDto::from(IngestDocumentResponse {
            document_id: Uuid::new_v4(),
            title: "Notes".to_string(),
            page_count: 2,
            fragments_created: 20,
            embeddings_created: 10,
            processing_time_ms: 5,
        });
        assert_eq!(dto.message, "Ingested with 10 of 20 fragments embedded");
    }
}
