use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Document, NewFragment, QueryRecord, StoredFragment};
use crate::domain::repositories::{
    DocumentSearch, LibraryStatistics, NewDocument, StorageError, StorageGateway,
};

struct CachedDocuments {
    documents: Vec<Document>,
    loaded_at: Instant,
}

/// Keeps the full document listing in memory for `ttl`. Any write that can
/// change the listing drops the cached copy.
pub struct CachedStorageGateway {
    inner: Arc<dyn StorageGateway>,
    ttl: Duration,
    documents: RwLock<Option<CachedDocuments>>,
    /// Bumped by every invalidation; a listing read under an older
    /// generation is never stored.
    generation: AtomicU64,
}

impl CachedStorageGateway {
    pub fn new(inner: Arc<dyn StorageGateway>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            documents: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    async fn invalidate(&self) {
        let mut cached = self.documents.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        if cached.take().is_some() {
            tracing::debug!("document listing cache invalidated");
        }
    }

    async fn store_listing(&self, generation: u64, documents: &[Document]) {
        let mut cached = self.documents.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("document listing changed while loading, not cached");
            return;
        }
        *cached = Some(CachedDocuments {
            documents: documents.to_vec(),
            loaded_at: Instant::now(),
        });
        tracing::debug!(count = documents.len(), "document listing cached");
    }
}

#[async_trait]
impl StorageGateway for CachedStorageGateway {
    async fn create_document(&self, document: NewDocument) -> Result<Uuid, StorageError> {
        let id = self.inner.create_document(document).await?;
        self.invalidate().await;
        Ok(id)
    }

    async fn save_fragments(
        &self,
        document_id: Uuid,
        fragments: &[NewFragment],
    ) -> Result<usize, StorageError> {
        let saved = self.inner.save_fragments(document_id, fragments).await?;
        self.invalidate().await;
        Ok(saved)
    }

    async fn get_fragments(
        &self,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<StoredFragment>, StorageError> {
        self.inner.get_fragments(document_ids).await
    }

    async fn log_query(&self, record: &QueryRecord) -> Result<(), StorageError> {
        self.inner.log_query(record).await
    }

    async fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, StorageError> {
        self.inner.find_document_by_hash(hash).await
    }

    async fn list_documents(&self) -> Result<Vec<Document>, StorageError> {
        {
            let cached = self.documents.read().await;
            if let Some(entry) = cached.as_ref().filter(|e| e.loaded_at.elapsed() < self.ttl) {
                return Ok(entry.documents.clone());
            }
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let documents = self.inner.list_documents().await?;
        self.store_listing(generation, &documents).await;

        Ok(documents)
    }

    /// Filters a fresh cached listing in memory; otherwise asks the backend.
    async fn search_documents(&self, criteria: &DocumentSearch) -> Result<Vec<Document>, StorageError> {
        {
            let cached = self.documents.read().await;
            if let Some(entry) = cached.as_ref().filter(|e| e.loaded_at.elapsed() < self.ttl) {
                return Ok(entry
                    .documents
                    .iter()
                    .filter(|d| d.matches(criteria.title.as_deref(), criteria.author.as_deref()))
                    .cloned()
                    .collect());
            }
        }

        self.inner.search_documents(criteria).await
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<bool, StorageError> {
        let deleted = self.inner.delete_document(document_id).await?;
        self.invalidate().await;
        Ok(deleted)
    }

    async fn recent_queries(&self, limit: i64) -> Result<Vec<QueryRecord>, StorageError> {
        self.inner.recent_queries(limit).await
    }

    async fn purge_queries(&self) -> Result<i64, StorageError> {
        self.inner.purge_queries().await
    }

    async fn statistics(&self) -> Result<LibraryStatistics, StorageError> {
        self.inner.statistics().await
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.inner.ping().await
    }
}
