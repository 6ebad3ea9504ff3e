use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::presentation::http::{
    handlers::{DocumentHandler, LibraryHandler, QueryHandler},
    routes::{document_routes, library_routes, query_routes},
};

const MAX_UPLOAD_BYTES: usize = 250 * 1024 * 1024;

pub struct HttpServer {
    document_handler: Arc<DocumentHandler>,
    query_handler: Arc<QueryHandler>,
    library_handler: Arc<LibraryHandler>,
    port: u16,
}

impl HttpServer {
    pub fn new(
        document_handler: Arc<DocumentHandler>,
        query_handler: Arc<QueryHandler>,
        library_handler: Arc<LibraryHandler>,
        port: u16,
    ) -> Self {
        Self {
            document_handler,
            query_handler,
            library_handler,
            port,
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(library_routes(self.library_handler.clone()))
            .merge(document_routes(self.document_handler.clone()))
            .merge(query_routes(self.query_handler.clone()))
            .layer(cors)
            // Multipart otherwise stops at axum's 2MB default.
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
            .layer(
                TraceLayer::new_for_http()
                    .on_request(
                        |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                            tracing::info!(
                                "Received request: {} {}",
                                request.method(),
                                request.uri()
                            );
                        },
                    )
                    .on_response(
                        |response: &axum::http::Response<axum::body::Body>,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::info!(
                                "Response: {} (took {} ms)",
                                response.status(),
                                latency.as_millis()
                            );
                        },
                    )
                    .on_failure(
                        |error: ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                "Request failed: {:?} (took {} ms)",
                                error,
                                latency.as_millis()
                            );
                        },
                    ),
            )
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Librarian listening on {}", addr);
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{
        AnswerSynthesizer, Chunker, ChunkingOptions, EmbeddingBatchOptions, EmbeddingService,
        RankingOptions, SimilarityRanker, SynthesisOptions,
    };
    use crate::application::test_support::{
        InMemoryStorageGateway, StubChatProvider, StubEmbeddingProvider, StubExtractor,
        WhitespaceTokenizer,
    };
    use crate::application::use_cases::{
        AnswerQuestionUseCase, DeleteDocumentUseCase, GetStatisticsUseCase, IngestDocumentUseCase,
        ListDocumentsUseCase, ManageQueryLogUseCase,
    };
    use crate::domain::repositories::StorageGateway;
    use serde_json::Value;

    async fn spawn_library() -> String {
        let storage: Arc<dyn StorageGateway> = Arc::new(InMemoryStorageGateway::new());
        let embedding_service = Arc::new(EmbeddingService::new(
            Arc::new(StubEmbeddingProvider::new()),
            EmbeddingBatchOptions::default(),
        ));
        let chunker = Arc::new(Chunker::new(
            Arc::new(WhitespaceTokenizer),
            ChunkingOptions {
                min_fragment_length: 5,
                ..ChunkingOptions::default()
            },
        ));
        let extractor = Arc::new(StubExtractor::with_pages(&[
            "Chlorophyll absorbs red and blue light in the leaf.",
        ]));

        let document_handler = Arc::new(DocumentHandler::new(
            Arc::new(IngestDocumentUseCase::new(
                storage.clone(),
                extractor,
                chunker,
                embedding_service.clone(),
            )),
            Arc::new(ListDocumentsUseCase::new(storage.clone())),
            Arc::new(DeleteDocumentUseCase::new(storage.clone())),
        ));
        let query_handler = Arc::new(QueryHandler::new(
            Arc::new(AnswerQuestionUseCase::new(
                storage.clone(),
                embedding_service,
                Arc::new(SimilarityRanker::new(RankingOptions {
                    threshold: -1.0,
                    top_k: 5,
                })),
                Arc::new(AnswerSynthesizer::new(
                    Arc::new(StubChatProvider::answering("Leaves absorb red and blue light.")),
                    SynthesisOptions::default(),
                )),
            )),
            Arc::new(ManageQueryLogUseCase::new(storage.clone())),
        ));
        let library_handler = Arc::new(LibraryHandler::new(Arc::new(GetStatisticsUseCase::new(
            storage,
        ))));

        let router = HttpServer::new(document_handler, query_handler, library_handler, 0).router();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health_and_empty_stats() {
        let base = spawn_library().await;
        let client = reqwest::Client::new();

        let health: Value = client
            .get(format!("{}/health", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["data"]["status"], "healthy");

        let stats: Value = client
            .get(format!("{}/stats", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats["data"]["total_documents"], 0);
        assert_eq!(stats["data"]["backend"], "memory");
    }

    #[tokio::test]
    async fn test_import_then_ask() {
        let base = spawn_library().await;
        let client = reqwest::Client::new();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("leaves.pdf");
        std::fs::write(&path, b"%PDF-1.5 stub").unwrap();

        let imported = client
            .post(format!("{}/documents/import", base))
            .json(&serde_json::json!({ "path": path, "title": "Leaves" }))
            .send()
            .await
            .unwrap();
        assert_eq!(imported.status(), reqwest::StatusCode::CREATED);
        let imported: Value = imported.json().await.unwrap();
        assert_eq!(imported["data"]["fragments_created"], 1);

        let duplicate = client
            .post(format!("{}/documents/import", base))
            .json(&serde_json::json!({ "path": path }))
            .send()
            .await
            .unwrap();
        assert_eq!(duplicate.status(), reqwest::StatusCode::CONFLICT);

        let answer: Value = client
            .post(format!("{}/queries", base))
            .json(&serde_json::json!({ "question": "What does chlorophyll absorb?" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(answer["data"]["answer"], "Leaves absorb red and blue light.");
        assert_eq!(answer["data"]["phase"]["phase"], "done");
        assert_eq!(answer["data"]["fragments"].as_array().unwrap().len(), 1);

        let recent: Value = client
            .get(format!("{}/queries?limit=5", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(recent["data"].as_array().unwrap().len(), 1);

        let documents: Value = client
            .get(format!("{}/documents?title=leav", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(documents["data"]["total"], 1);
    }

    #[tokio::test]
    async fn test_client_errors() {
        let base = spawn_library().await;
        let client = reqwest::Client::new();

        let empty = client
            .post(format!("{}/queries", base))
            .json(&serde_json::json!({ "question": "   " }))
            .send()
            .await
            .unwrap();
        assert_eq!(empty.status(), reqwest::StatusCode::BAD_REQUEST);

        let missing_file = client
            .post(format!("{}/documents/import", base))
            .json(&serde_json::json!({ "path": "/nonexistent/book.pdf" }))
            .send()
            .await
            .unwrap();
        assert_eq!(missing_file.status(), reqwest::StatusCode::BAD_REQUEST);

        let unknown = client
            .delete(format!("{}/documents/{}", base, uuid::Uuid::new_v4()))
            .send()
            .await
            .unwrap();
        assert_eq!(unknown.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
