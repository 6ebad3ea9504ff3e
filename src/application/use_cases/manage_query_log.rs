use std::sync::Arc;

use crate::domain::entities::QueryRecord;
use crate::domain::repositories::{StorageError, StorageGateway};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 500;

/// Read and purge access to the append-only query log.
pub struct ManageQueryLogUseCase {
    storage: Arc<dyn StorageGateway>,
}

impl ManageQueryLogUseCase {
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self { storage }
    }

    pub async fn recent(&self, limit: Option<i64>) -> Result<Vec<QueryRecord>, StorageError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        self.storage.recent_queries(limit).await
    }

    pub async fn purge(&self) -> Result<i64, StorageError> {
        let removed = self.storage.purge_queries().await?;
        tracing::info!(removed, "query log purged");
        Ok(removed)
    }
}
