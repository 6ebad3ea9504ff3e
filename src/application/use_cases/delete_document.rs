use std::sync::Arc;

use uuid::Uuid;

use crate::domain::repositories::{StorageError, StorageGateway};

pub struct DeleteDocumentUseCase {
    storage: Arc<dyn StorageGateway>,
}

impl DeleteDocumentUseCase {
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self { storage }
    }

    /// Removes the document with all of its fragments.
    pub async fn execute(&self, document_id: Uuid) -> Result<(), StorageError> {
        if !self.storage.delete_document(document_id).await? {
            return Err(StorageError::DocumentNotFound(document_id));
        }

        tracing::info!(document = %document_id, "document deleted");
        Ok(())
    }
}
