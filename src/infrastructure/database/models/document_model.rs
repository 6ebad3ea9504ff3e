use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::repositories::NewDocument;
use crate::domain::value_objects::DocumentMetadata;
use crate::infrastructure::database::schema::documents;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentModel {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub page_count: i32,
    pub fragment_count: i32,
    pub file_hash: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDocumentModel {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub page_count: i32,
    pub fragment_count: i32,
    pub file_hash: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

impl From<&Document> for NewDocumentModel {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id(),
            title: document.title().to_string(),
            author: document.author().map(str::to_string),
            page_count: document.page_count(),
            fragment_count: document.fragment_count(),
            file_hash: document.metadata().file_hash().map(str::to_string),
            processed_at: document.processed_at(),
            metadata: document.metadata().clone().into(),
        }
    }
}

impl From<DocumentModel> for Document {
    fn from(model: DocumentModel) -> Self {
        Document::restore(
            model.id,
            model.title,
            model.author,
            model.page_count,
            model.fragment_count,
            model.processed_at,
            DocumentMetadata::from(model.metadata),
        )
    }
}

/// Builds the domain document a gateway is about to insert.
pub fn document_from_request(request: NewDocument) -> Document {
    Document::new(
        request.title,
        request.author,
        request.page_count,
        request.metadata,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_model_round_trip() {
        let mut metadata = DocumentMetadata::new();
        metadata.set_file_hash("ab".repeat(32).as_str());
        metadata.set_text("pdf_subject", "Biology");
        let document = Document::new("Cells".to_string(), Some("Ann".to_string()), 12, metadata);

        let insert = NewDocumentModel::from(&document);
        assert_eq!(insert.file_hash.as_deref(), document.metadata().file_hash());

        let model = DocumentModel {
            id: insert.id,
            title: insert.title,
            author: insert.author,
            page_count: insert.page_count,
            fragment_count: insert.fragment_count,
            file_hash: insert.file_hash,
            processed_at: insert.processed_at,
            metadata: insert.metadata,
        };

        assert_eq!(Document::from(model), document);
    }
}
