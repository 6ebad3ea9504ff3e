use std::sync::Arc;
use std::time::Duration;

use crate::{
    application::{
        ports::{ChatProvider, DocumentExtractor, EmbeddingProvider, Tokenizer},
        services::{AnswerSynthesizer, Chunker, EmbeddingService, SimilarityRanker},
        use_cases::{
            AnswerQuestionUseCase, DeleteDocumentUseCase, GetStatisticsUseCase,
            IngestDocumentUseCase, ListDocumentsUseCase, ManageQueryLogUseCase,
        },
    },
    domain::repositories::StorageGateway,
    infrastructure::{
        config::{LibraryConfig, StorageBackend},
        database::{
            CachedStorageGateway, DatabaseError, PostgresStorageGateway, SqliteStorageGateway,
            create_connection_pool, create_sqlite_pool, run_migrations, run_sqlite_migrations,
        },
        external_services::{
            OpenAiChatProvider, OpenAiClient, OpenAiClientConfig, OpenAiEmbeddingProvider,
            PdfExtractor, TiktokenTokenizer,
        },
    },
    presentation::http::{
        HttpServer,
        handlers::{DocumentHandler, LibraryHandler, QueryHandler},
    },
};

pub struct AppContainer {
    pub config: LibraryConfig,

    // HTTP Handlers
    pub document_handler: Arc<DocumentHandler>,
    pub query_handler: Arc<QueryHandler>,
    pub library_handler: Arc<LibraryHandler>,
}

impl AppContainer {
    pub fn new(config: LibraryConfig) -> Result<Self, Box<dyn std::error::Error>> {
        // Storage, wrapped in the listing cache
        let backend_storage = build_storage(&config)?;
        let storage: Arc<dyn StorageGateway> = Arc::new(CachedStorageGateway::new(
            backend_storage,
            Duration::from_secs(config.cache.documents_ttl_secs),
        ));

        // External services
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(TiktokenTokenizer::cl100k()?);

        let client = OpenAiClient::new(OpenAiClientConfig {
            api_key: config.openai.api_key.clone(),
            base_url: config.openai.base_url.clone(),
            timeout_secs: config.openai.timeout_secs,
        })?;
        let embedding_provider: Arc<dyn EmbeddingProvider> =
            Arc::new(OpenAiEmbeddingProvider::new(client.clone()));
        let chat_provider: Arc<dyn ChatProvider> = Arc::new(OpenAiChatProvider::new(client));

        let document_extractor: Arc<dyn DocumentExtractor> = Arc::new(
            PdfExtractor::new().map_err(|e| format!("Failed to create PDF extractor: {}", e))?,
        );

        // Application services
        let chunker = Arc::new(Chunker::new(tokenizer.clone(), config.chunking_options()));
        let embedding_service = Arc::new(EmbeddingService::new(
            embedding_provider,
            config.embedding_options(),
        ));
        let ranker = Arc::new(SimilarityRanker::new(config.ranking_options()));
        let synthesizer = Arc::new(AnswerSynthesizer::new(
            chat_provider,
            config.synthesis_options(),
        ));

        // Use cases
        let ingest_use_case = Arc::new(IngestDocumentUseCase::new(
            storage.clone(),
            document_extractor,
            chunker,
            embedding_service.clone(),
        ));
        let answer_use_case = Arc::new(AnswerQuestionUseCase::new(
            storage.clone(),
            embedding_service.clone(),
            ranker,
            synthesizer.clone(),
        ));
        let list_use_case = Arc::new(ListDocumentsUseCase::new(storage.clone()));
        let delete_use_case = Arc::new(DeleteDocumentUseCase::new(storage.clone()));
        let statistics_use_case = Arc::new(GetStatisticsUseCase::new(storage.clone()));
        let query_log_use_case = Arc::new(ManageQueryLogUseCase::new(storage));

        // HTTP handlers
        let document_handler = Arc::new(DocumentHandler::new(
            ingest_use_case,
            list_use_case,
            delete_use_case,
        ));
        let query_handler = Arc::new(QueryHandler::new(answer_use_case, query_log_use_case));
        let library_handler = Arc::new(LibraryHandler::new(statistics_use_case));

        tracing::info!(
            backend = ?config.database.backend,
            tokenizer = tokenizer.encoding_name(),
            embedding_model = embedding_service.model(),
            embedding_dimensions = config.embeddings.dimensions,
            chat_model = synthesizer.model(),
            "container ready"
        );

        Ok(Self {
            config,
            document_handler,
            query_handler,
            library_handler,
        })
    }

    pub fn create_http_server(&self) -> HttpServer {
        HttpServer::new(
            self.document_handler.clone(),
            self.query_handler.clone(),
            self.library_handler.clone(),
            self.config.server.port,
        )
    }
}

/// Opens the configured backend and brings its schema up to date.
fn build_storage(config: &LibraryConfig) -> Result<Arc<dyn StorageGateway>, DatabaseError> {
    match config.database.backend {
        StorageBackend::Postgresql => {
            let pool = create_connection_pool(&config.database.postgresql)?;
            run_migrations(&pool)?;
            Ok(Arc::new(PostgresStorageGateway::new(pool)))
        }
        StorageBackend::Sqlite => {
            let pool = create_sqlite_pool(&config.database.sqlite)?;
            run_sqlite_migrations(&pool)?;
            tracing::info!(path = %config.database.sqlite.path.display(), "using sqlite storage");
            Ok(Arc::new(SqliteStorageGateway::new(pool)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_storage_is_migrated() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = LibraryConfig::default();
        config.database.backend = StorageBackend::Sqlite;
        config.database.sqlite.path = dir.path().join("nested").join("library.db");

        let storage = build_storage(&config).unwrap();
        storage.ping().await.unwrap();
        assert_eq!(storage.statistics().await.unwrap().backend, "sqlite");
    }

    #[test]
    fn test_postgres_without_url_fails() {
        let mut config = LibraryConfig::default();
        config.database.backend = StorageBackend::Postgresql;
        config.database.postgresql.url = None;

        assert!(matches!(
            build_storage(&config),
            Err(DatabaseError::ConfigurationError(_))
        ));
    }
}
