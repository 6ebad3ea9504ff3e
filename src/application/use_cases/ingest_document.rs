use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::application::ports::DocumentExtractor;
use crate::application::services::{Chunker, EmbeddingService};
use crate::domain::entities::NewFragment;
use crate::domain::repositories::{NewDocument, StorageError, StorageGateway};
use crate::domain::value_objects::FileHash;

#[derive(Debug, thiserror::Error)]
pub enum IngestDocumentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Document already ingested as {0}")]
    AlreadyIngested(Uuid),
    #[error("No text extracted: {0}")]
    NoTextExtracted(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub enum IngestSource {
    Upload { file_name: String, data: Vec<u8> },
    LocalFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct IngestDocumentRequest {
    pub source: IngestSource,
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IngestDocumentResponse {
    pub document_id: Uuid,
    pub title: String,
    pub page_count: i32,
    pub fragments_created: usize,
    pub embeddings_created: usize,
    pub processing_time_ms: u64,
}

pub struct IngestDocumentUseCase {
    storage: Arc<dyn StorageGateway>,
    extractor: Arc<dyn DocumentExtractor>,
    chunker: Arc<Chunker>,
    embedding_service: Arc<EmbeddingService>,
}

impl IngestDocumentUseCase {
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        extractor: Arc<dyn DocumentExtractor>,
        chunker: Arc<Chunker>,
        embedding_service: Arc<EmbeddingService>,
    ) -> Self {
        Self {
            storage,
            extractor,
            chunker,
            embedding_service,
        }
    }

    pub async fn execute(
        &self,
        request: IngestDocumentRequest,
    ) -> Result<IngestDocumentResponse, IngestDocumentError> {
        let start_time = std::time::Instant::now();

        let (file_name, data) = match &request.source {
            IngestSource::Upload { file_name, data } => (file_name.clone(), data.clone()),
            IngestSource::LocalFile(path) => {
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|e| IngestDocumentError::IoError(format!("{}: {}", path.display(), e)))?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (file_name, data)
            }
        };

        if data.is_empty() {
            return Err(IngestDocumentError::ValidationError("File is empty".to_string()));
        }

        let hash = FileHash::of(&data);
        if let Some(existing) = self.storage.find_document_by_hash(hash.as_str()).await? {
            tracing::info!(hash = %hash.short(), document = %existing.id(), "document already ingested");
            return Err(IngestDocumentError::AlreadyIngested(existing.id()));
        }

        let extracted = self
            .extractor
            .extract_pages_from_bytes(&data)
            .await
            .map_err(|e| {
                tracing::warn!(file = %file_name, error = %e, "extraction failed");
                IngestDocumentError::NoTextExtracted(e.to_string())
            })?;

        if !extracted.has_text() {
            return Err(IngestDocumentError::NoTextExtracted(
                "document contains no extractable text".to_string(),
            ));
        }

        let page_fragments = self.chunker.chunk_pages(&extracted.pages);
        if page_fragments.is_empty() {
            return Err(IngestDocumentError::NoTextExtracted(
                "no fragment reached the minimum length".to_string(),
            ));
        }

        let title = non_blank(request.title)
            .or_else(|| non_blank(extracted.title.clone()))
            .unwrap_or_else(|| title_from_file_name(&file_name));
        let author = non_blank(request.author).or_else(|| non_blank(extracted.author.clone()));

        let mut metadata = extracted.metadata.clone();
        metadata.set_file_hash(hash.as_str());
        metadata.set_file_size(data.len() as u64);
        metadata.set_text("source_file", &file_name);

        let document_id = self
            .storage
            .create_document(NewDocument {
                title: title.clone(),
                author,
                page_count: extracted.page_count,
                metadata,
            })
            .await?;

        tracing::debug!(
            document = %document_id,
            pages = extracted.page_count,
            fragments = page_fragments.len(),
            "document created, generating embeddings"
        );

        let texts: Vec<String> = page_fragments.iter().map(|f| f.content.clone()).collect();
        let embeddings = self.embedding_service.embed_in_batches(&texts).await;
        let embeddings_created = embeddings.iter().filter(|e| e.is_some()).count();

        let fragments: Vec<NewFragment> = page_fragments
            .into_iter()
            .zip(embeddings)
            .map(|(fragment, embedding)| NewFragment {
                content: fragment.content,
                page_number: fragment.page_number,
                token_count: fragment.token_count as i32,
                embedding,
            })
            .collect();

        let fragments_created = self.storage.save_fragments(document_id, &fragments).await?;

        let processing_time = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            document = %document_id,
            title = %title,
            fragments = fragments_created,
            embeddings = embeddings_created,
            elapsed_ms = processing_time,
            "document ingested"
        );

        Ok(IngestDocumentResponse {
            document_id,
            title,
            page_count: extracted.page_count,
            fragments_created,
            embeddings_created,
            processing_time_ms: processing_time,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn title_from_file_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.trim().is_empty())
        .unwrap_or_else(|| "Untitled".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::document_extractor::DocumentExtractionError;
    use crate::application::ports::embedding_provider::EmbeddingProviderError;
    use crate::application::services::{ChunkingOptions, EmbeddingBatchOptions};
    use crate::application::test_support::{
        InMemoryStorageGateway, StubEmbeddingProvider, StubExtractor, WhitespaceTokenizer,
    };

    const PAGE_ONE: &str = "The mitochondria is the powerhouse of the cell and produces energy.";
    const PAGE_TWO: &str = "Ribosomes translate messenger RNA into chains of amino acids.";

    fn use_case(
        storage: Arc<InMemoryStorageGateway>,
        extractor: StubExtractor,
        provider: StubEmbeddingProvider,
    ) -> IngestDocumentUseCase {
        use_case_with(storage, Arc::new(extractor), provider)
    }

    fn use_case_with(
        storage: Arc<InMemoryStorageGateway>,
        extractor: Arc<StubExtractor>,
        provider: StubEmbeddingProvider,
    ) -> IngestDocumentUseCase {
        let chunker = Chunker::new(
            Arc::new(WhitespaceTokenizer),
            ChunkingOptions {
                fragment_token_budget: 50,
                fragment_overlap: 0,
                min_fragment_length: 3,
                max_fragments_per_page: 10,
            },
        );
        let embedding_service = EmbeddingService::new(
            Arc::new(provider),
            EmbeddingBatchOptions {
                model: "test-embedding".to_string(),
                batch_size: 1,
            },
        );
        IngestDocumentUseCase::new(
            storage,
            extractor,
            Arc::new(chunker),
            Arc::new(embedding_service),
        )
    }

    fn upload(file_name: &str, data: &[u8]) -> IngestDocumentRequest {
        IngestDocumentRequest {
            source: IngestSource::Upload {
                file_name: file_name.to_string(),
                data: data.to_vec(),
            },
            title: None,
            author: None,
        }
    }

    #[tokio::test]
    async fn test_ingest_persists_document_and_fragments() {
        let storage = Arc::new(InMemoryStorageGateway::new());
        let use_case = use_case(
            storage.clone(),
            StubExtractor::with_pages(&[PAGE_ONE, PAGE_TWO]),
            StubEmbeddingProvider::new(),
        );

        let response = use_case.execute(upload("biology.pdf", b"%PDF-1.4 one")).await.unwrap();

        assert_eq!(response.title, "biology");
        assert_eq!(response.page_count, 2);
        assert_eq!(response.fragments_created, 2);
        assert_eq!(response.embeddings_created, 2);

        let documents = storage.documents();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].fragment_count(), 2);
        let expected_hash = FileHash::of(b"%PDF-1.4 one");
        assert_eq!(documents[0].metadata().file_hash(), Some(expected_hash.as_str()));
        assert_eq!(documents[0].metadata().file_size(), Some(12));

        let fragments = storage.fragments();
        assert_eq!(fragments[0].page_number(), 1);
        assert_eq!(fragments[1].page_number(), 2);
        assert!(fragments.iter().all(|f| f.is_embedded()));
    }

    #[tokio::test]
    async fn test_duplicate_upload_rejected() {
        let storage = Arc::new(InMemoryStorageGateway::new());
        let use_case = use_case(
            storage.clone(),
            StubExtractor::with_pages(&[PAGE_ONE]),
            StubEmbeddingProvider::new(),
        );

        let first = use_case.execute(upload("a.pdf", b"same bytes")).await.unwrap();
        let second = use_case.execute(upload("b.pdf", b"same bytes")).await;

        match second {
            Err(IngestDocumentError::AlreadyIngested(id)) => assert_eq!(id, first.document_id),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(storage.documents().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_persists_nothing() {
        let storage = Arc::new(InMemoryStorageGateway::new());
        let use_case = use_case(
            storage.clone(),
            StubExtractor::failing(DocumentExtractionError::CorruptedFile("bad xref".to_string())),
            StubEmbeddingProvider::new(),
        );

        let result = use_case.execute(upload("broken.pdf", b"garbage")).await;

        assert!(matches!(result, Err(IngestDocumentError::NoTextExtracted(_))));
        assert!(storage.documents().is_empty());
        assert!(storage.fragments().is_empty());
    }

    #[tokio::test]
    async fn test_pages_without_usable_text() {
        let storage = Arc::new(InMemoryStorageGateway::new());
        let use_case = use_case(
            storage.clone(),
            StubExtractor::with_pages(&["  ", "tiny"]),
            StubEmbeddingProvider::new(),
        );

        let result = use_case.execute(upload("scan.pdf", b"scan")).await;

        assert!(matches!(result, Err(IngestDocumentError::NoTextExtracted(_))));
        assert!(storage.documents().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_still_saves_fragments() {
        let storage = Arc::new(InMemoryStorageGateway::new());
        let use_case = use_case(
            storage.clone(),
            StubExtractor::with_pages(&[PAGE_ONE, PAGE_TWO]),
            StubEmbeddingProvider::failing(EmbeddingProviderError::RateLimitExceeded),
        );

        let response = use_case.execute(upload("cells.pdf", b"cells")).await.unwrap();

        assert_eq!(response.fragments_created, 2);
        assert_eq!(response.embeddings_created, 0);
        assert!(storage.fragments().iter().all(|f| !f.is_embedded()));
    }

    #[tokio::test]
    async fn test_one_failed_batch_keeps_the_rest() {
        let storage = Arc::new(InMemoryStorageGateway::new());
        let use_case = use_case(
            storage.clone(),
            StubExtractor::with_pages(&[PAGE_ONE, PAGE_TWO]),
            StubEmbeddingProvider::failing_call(0),
        );

        let response = use_case.execute(upload("cells.pdf", b"cells")).await.unwrap();

        assert_eq!(response.embeddings_created, 1);
        let embedded: Vec<bool> = storage.fragments().iter().map(|f| f.is_embedded()).collect();
        assert_eq!(embedded, vec![false, true]);
    }

    #[tokio::test]
    async fn test_title_precedence() {
        let storage = Arc::new(InMemoryStorageGateway::new());
        let use_case = use_case(
            storage.clone(),
            StubExtractor::with_pages(&[PAGE_ONE]).with_info("Cell Biology", "A. Author"),
            StubEmbeddingProvider::new(),
        );

        let from_pdf = use_case.execute(upload("x.pdf", b"first")).await.unwrap();
        assert_eq!(from_pdf.title, "Cell Biology");

        let mut request = upload("y.pdf", b"second");
        request.title = Some("  Chosen Title ".to_string());
        let from_request = use_case.execute(request).await.unwrap();
        assert_eq!(from_request.title, "Chosen Title");

        let documents = storage.documents();
        assert_eq!(documents[0].author(), Some("A. Author"));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let storage = Arc::new(InMemoryStorageGateway::failing_writes());
        let use_case = use_case(
            storage,
            StubExtractor::with_pages(&[PAGE_ONE]),
            StubEmbeddingProvider::new(),
        );

        let result = use_case.execute(upload("a.pdf", b"data")).await;

        assert!(matches!(result, Err(IngestDocumentError::Storage(_))));
    }

    #[tokio::test]
    async fn test_local_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"%PDF-1.7 local").unwrap();

        let storage = Arc::new(InMemoryStorageGateway::new());
        let extractor = Arc::new(StubExtractor::with_pages(&[PAGE_ONE]));
        let use_case = use_case_with(storage.clone(), extractor.clone(), StubEmbeddingProvider::new());

        let response = use_case
            .execute(IngestDocumentRequest {
                source: IngestSource::LocalFile(file.path().to_path_buf()),
                title: None,
                author: None,
            })
            .await
            .unwrap();

        assert_eq!(response.fragments_created, 1);
        assert_eq!(extractor.received(), vec![b"%PDF-1.7 local".to_vec()]);
        assert_eq!(
            storage.documents()[0].metadata().get_text("source_file"),
            file.path().file_name().and_then(|n| n.to_str())
        );
        assert_eq!(
            storage.documents()[0].metadata().get_text("file_hash"),
            Some(FileHash::of(b"%PDF-1.7 local").as_str())
        );
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let storage = Arc::new(InMemoryStorageGateway::new());
        let use_case = use_case(
            storage,
            StubExtractor::with_pages(&[PAGE_ONE]),
            StubEmbeddingProvider::new(),
        );

        let result = use_case
            .execute(IngestDocumentRequest {
                source: IngestSource::LocalFile(PathBuf::from("/nonexistent/library/book.pdf")),
                title: None,
                author: None,
            })
            .await;

        assert!(matches!(result, Err(IngestDocumentError::IoError(_))));
    }
}
