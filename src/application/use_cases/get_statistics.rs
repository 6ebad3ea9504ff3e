use std::sync::Arc;

use crate::domain::repositories::{LibraryStatistics, StorageError, StorageGateway};

pub struct GetStatisticsUseCase {
    storage: Arc<dyn StorageGateway>,
}

impl GetStatisticsUseCase {
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self { storage }
    }

    pub async fn execute(&self) -> Result<LibraryStatistics, StorageError> {
        self.storage.statistics().await
    }

    pub async fn health_check(&self) -> Result<(), StorageError> {
        self.storage.ping().await
    }
}
