use std::sync::Arc;

use crate::domain::entities::Document;
use crate::domain::repositories::{DocumentSearch, StorageError, StorageGateway};

#[derive(Debug, Clone, Default)]
pub struct ListDocumentsRequest {
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListDocumentsResponse {
    pub documents: Vec<Document>,
    pub total_count: usize,
}

pub struct ListDocumentsUseCase {
    storage: Arc<dyn StorageGateway>,
}

impl ListDocumentsUseCase {
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self { storage }
    }

    /// Lists every document, or searches when a title or author filter is set.
    pub async fn execute(
        &self,
        request: ListDocumentsRequest,
    ) -> Result<ListDocumentsResponse, StorageError> {
        let criteria = DocumentSearch {
            title: blank_to_none(request.title),
            author: blank_to_none(request.author),
        };

        let documents = if criteria.is_empty() {
            self.storage.list_documents().await?
        } else {
            self.storage.search_documents(&criteria).await?
        };

        Ok(ListDocumentsResponse {
            total_count: documents.len(),
            documents,
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
