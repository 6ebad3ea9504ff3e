use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{Document, NewFragment, QueryRecord, StoredFragment};
use crate::domain::value_objects::DocumentMetadata;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub author: Option<String>,
    pub page_count: i32,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentSearch {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl DocumentSearch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryStatistics {
    pub total_documents: i64,
    pub total_fragments: i64,
    pub embedded_fragments: i64,
    pub total_queries: i64,
    pub total_tokens: i64,
    pub last_activity: Option<DateTime<Utc>>,
    pub backend: String,
}

/// Persistence contract consumed by ingestion and retrieval. Implementations
/// own their embedding (de)serialization; callers never branch on backend.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn create_document(&self, document: NewDocument) -> Result<Uuid, StorageError>;

    /// Writes all fragments of a document and sets its fragment count.
    async fn save_fragments(
        &self,
        document_id: Uuid,
        fragments: &[NewFragment],
    ) -> Result<usize, StorageError>;

    /// `None` means every fragment in the library.
    async fn get_fragments(
        &self,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<StoredFragment>, StorageError>;

    async fn log_query(&self, record: &QueryRecord) -> Result<(), StorageError>;

    async fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, StorageError>;

    async fn list_documents(&self) -> Result<Vec<Document>, StorageError>;

    async fn search_documents(&self, criteria: &DocumentSearch) -> Result<Vec<Document>, StorageError>;

    async fn delete_document(&self, document_id: Uuid) -> Result<bool, StorageError>;

    async fn recent_queries(&self, limit: i64) -> Result<Vec<QueryRecord>, StorageError>;

    async fn purge_queries(&self) -> Result<i64, StorageError>;

    async fn statistics(&self) -> Result<LibraryStatistics, StorageError>;

    async fn ping(&self) -> Result<(), StorageError>;
}
