//! Deterministic doubles for the application layer's ports.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::chat_provider::{
    ChatCompletionRequest, ChatCompletionResponse, ChatProviderError,
};
use crate::application::ports::document_extractor::{
    DocumentExtractionError, ExtractedDocument, ExtractedPage,
};
use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProviderError,
};
use crate::application::ports::{ChatProvider, DocumentExtractor, EmbeddingProvider, Tokenizer};
use crate::domain::entities::{Document, Fragment, NewFragment, QueryRecord, StoredFragment};
use crate::domain::repositories::{
    DocumentSearch, LibraryStatistics, NewDocument, StorageError, StorageGateway,
};
use crate::domain::value_objects::{DocumentMetadata, EmbeddingVector};

/// One token per whitespace-separated word.
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn encoding_name(&self) -> &str {
        "whitespace"
    }
}

pub fn stored_fragment(document_id: Uuid, content: &str, embedding: Option<Vec<f32>>) -> StoredFragment {
    let embedding = embedding.map(|values| EmbeddingVector::new(values).unwrap());
    StoredFragment {
        fragment: Fragment::new(
            document_id,
            content.to_string(),
            1,
            0,
            content.split_whitespace().count() as i32,
            embedding,
        ),
        document_title: "Test Document".to_string(),
        document_author: None,
    }
}

enum EmbeddingBehaviour {
    Normal,
    Failing(EmbeddingProviderError),
    FailingCall(usize),
    EmptyVectors,
    DropLast,
}

pub struct StubEmbeddingProvider {
    behaviour: EmbeddingBehaviour,
    overrides: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl StubEmbeddingProvider {
    fn with_behaviour(behaviour: EmbeddingBehaviour) -> Self {
        Self {
            behaviour,
            overrides: HashMap::new(),
            calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn new() -> Self {
        Self::with_behaviour(EmbeddingBehaviour::Normal)
    }

    pub fn failing(error: EmbeddingProviderError) -> Self {
        Self::with_behaviour(EmbeddingBehaviour::Failing(error))
    }

    /// Fails only the zero-based `call`-th request.
    pub fn failing_call(call: usize) -> Self {
        Self::with_behaviour(EmbeddingBehaviour::FailingCall(call))
    }

    pub fn returning_empty_vectors() -> Self {
        Self::with_behaviour(EmbeddingBehaviour::EmptyVectors)
    }

    pub fn dropping_last() -> Self {
        Self::with_behaviour(EmbeddingBehaviour::DropLast)
    }

    pub fn with_vector(mut self, text: &str, values: Vec<f32>) -> Self {
        self.overrides.insert(text.to_string(), values);
        self
    }

    /// Default vector for `text`: three components derived from its bytes.
    pub fn vector_for(text: &str) -> Vec<f32> {
        let sum: u32 = text.bytes().map(u32::from).sum();
        vec![text.len() as f32 + 1.0, (sum % 97) as f32 + 1.0, 1.0]
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(request.texts.len());

        let mut embeddings: Vec<Vec<f32>> = request
            .texts
            .iter()
            .map(|text| {
                self.overrides
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| Self::vector_for(text))
            })
            .collect();

        match &self.behaviour {
            EmbeddingBehaviour::Normal => {}
            EmbeddingBehaviour::Failing(error) => return Err(error.clone()),
            EmbeddingBehaviour::FailingCall(failing) if *failing == call => {
                return Err(EmbeddingProviderError::NetworkError("connection reset".to_string()));
            }
            EmbeddingBehaviour::FailingCall(_) => {}
            EmbeddingBehaviour::EmptyVectors => {
                embeddings = vec![Vec::new(); request.texts.len()];
            }
            EmbeddingBehaviour::DropLast => {
                embeddings.pop();
            }
        }

        Ok(BatchEmbeddingResponse {
            embeddings,
            model_name: request.model_name,
            total_tokens: Some(request.texts.len() as u32),
        })
    }
}

pub struct StubChatProvider {
    result: Result<String, ChatProviderError>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatCompletionRequest>>,
}

impl StubChatProvider {
    pub fn answering(answer: &str) -> Self {
        Self {
            result: Ok(answer.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(error: ChatProviderError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for StubChatProvider {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ChatProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let model = request.model.clone();
        *self.last_request.lock().unwrap() = Some(request);

        self.result.clone().map(|content| ChatCompletionResponse {
            content,
            model,
            total_tokens: Some(42),
        })
    }
}

pub struct StubExtractor {
    result: Result<ExtractedDocument, DocumentExtractionError>,
    received: Mutex<Vec<Vec<u8>>>,
}

impl StubExtractor {
    pub fn with_pages(pages: &[&str]) -> Self {
        let pages: Vec<ExtractedPage> = pages
            .iter()
            .enumerate()
            .map(|(i, text)| ExtractedPage {
                number: i as i32 + 1,
                text: text.to_string(),
            })
            .collect();

        Self {
            result: Ok(ExtractedDocument {
                page_count: pages.len() as i32,
                pages,
                title: None,
                author: None,
                metadata: DocumentMetadata::new(),
            }),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn with_info(mut self, title: &str, author: &str) -> Self {
        if let Ok(document) = &mut self.result {
            document.title = Some(title.to_string());
            document.author = Some(author.to_string());
        }
        self
    }

    pub fn failing(error: DocumentExtractionError) -> Self {
        Self {
            result: Err(error),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Every byte buffer handed to the extractor, in call order.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentExtractor for StubExtractor {
    async fn extract_pages_from_bytes(
        &self,
        data: &[u8],
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        self.received.lock().unwrap().push(data.to_vec());
        self.result.clone()
    }
}

#[derive(Default)]
struct LibraryState {
    documents: Vec<Document>,
    fragments: Vec<Fragment>,
    queries: Vec<QueryRecord>,
}

/// Storage gateway kept in process memory, documents in insertion order.
#[derive(Default)]
pub struct InMemoryStorageGateway {
    state: Mutex<LibraryState>,
    fail_writes: bool,
}

impl InMemoryStorageGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes() -> Self {
        Self {
            state: Mutex::new(LibraryState::default()),
            fail_writes: true,
        }
    }

    pub fn documents(&self) -> Vec<Document> {
        self.state.lock().unwrap().documents.clone()
    }

    pub fn fragments(&self) -> Vec<Fragment> {
        self.state.lock().unwrap().fragments.clone()
    }

    pub fn queries(&self) -> Vec<QueryRecord> {
        self.state.lock().unwrap().queries.clone()
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::DatabaseError("disk full".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageGateway for InMemoryStorageGateway {
    async fn create_document(&self, document: NewDocument) -> Result<Uuid, StorageError> {
        self.check_writable()?;
        let document = Document::new(
            document.title,
            document.author,
            document.page_count,
            document.metadata,
        );
        let id = document.id();
        self.state.lock().unwrap().documents.push(document);
        Ok(id)
    }

    async fn save_fragments(
        &self,
        document_id: Uuid,
        fragments: &[NewFragment],
    ) -> Result<usize, StorageError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        let document = state
            .documents
            .iter_mut()
            .find(|document| document.id() == document_id)
            .ok_or(StorageError::DocumentNotFound(document_id))?;
        document.set_fragment_count(fragments.len() as i32);

        for (index, fragment) in fragments.iter().enumerate() {
            state.fragments.push(Fragment::new(
                document_id,
                fragment.content.clone(),
                fragment.page_number,
                index as i32,
                fragment.token_count,
                fragment.embedding.clone(),
            ));
        }
        Ok(fragments.len())
    }

    async fn get_fragments(
        &self,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<StoredFragment>, StorageError> {
        let state = self.state.lock().unwrap();
        let mut stored = Vec::new();
        for document in &state.documents {
            if let Some(ids) = document_ids {
                if !ids.contains(&document.id()) {
                    continue;
                }
            }
            for fragment in state.fragments.iter().filter(|f| f.document_id() == document.id()) {
                stored.push(StoredFragment {
                    fragment: fragment.clone(),
                    document_title: document.title().to_string(),
                    document_author: document.author().map(str::to_string),
                });
            }
        }
        Ok(stored)
    }

    async fn log_query(&self, record: &QueryRecord) -> Result<(), StorageError> {
        self.check_writable()?;
        self.state.lock().unwrap().queries.push(record.clone());
        Ok(())
    }

    async fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .documents
            .iter()
            .find(|document| document.metadata().file_hash() == Some(hash))
            .cloned())
    }

    async fn list_documents(&self) -> Result<Vec<Document>, StorageError> {
        let mut documents = self.documents();
        documents.reverse();
        Ok(documents)
    }

    async fn search_documents(&self, criteria: &DocumentSearch) -> Result<Vec<Document>, StorageError> {
        let documents = self.list_documents().await?;
        Ok(documents
            .into_iter()
            .filter(|document| document.matches(criteria.title.as_deref(), criteria.author.as_deref()))
            .collect())
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<bool, StorageError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        let before = state.documents.len();
        state.documents.retain(|document| document.id() != document_id);
        state.fragments.retain(|fragment| fragment.document_id() != document_id);
        Ok(state.documents.len() != before)
    }

    async fn recent_queries(&self, limit: i64) -> Result<Vec<QueryRecord>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .queries
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn purge_queries(&self) -> Result<i64, StorageError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        let removed = state.queries.len() as i64;
        state.queries.clear();
        Ok(removed)
    }

    async fn statistics(&self) -> Result<LibraryStatistics, StorageError> {
        let state = self.state.lock().unwrap();
        let last_activity = state
            .documents
            .iter()
            .map(|document| document.processed_at())
            .chain(state.queries.iter().map(|query| query.asked_at()))
            .max();

        Ok(LibraryStatistics {
            total_documents: state.documents.len() as i64,
            total_fragments: state.fragments.len() as i64,
            embedded_fragments: state.fragments.iter().filter(|f| f.is_embedded()).count() as i64,
            total_queries: state.queries.len() as i64,
            total_tokens: state.fragments.iter().map(|f| f.token_count() as i64).sum(),
            last_activity,
            backend: "memory".to_string(),
        })
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
