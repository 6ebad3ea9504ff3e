use std::sync::Arc;

use crate::application::ports::EmbeddingProvider;
use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, EmbeddingProviderError,
};
use crate::domain::value_objects::EmbeddingVector;

#[derive(Debug, Clone)]
pub struct EmbeddingBatchOptions {
    pub model: String,
    pub batch_size: usize,
}

impl Default for EmbeddingBatchOptions {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            batch_size: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutcome {
    Embedded(EmbeddingVector),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchEmbeddingOutcome {
    /// One vector per input, in input order.
    Embedded(Vec<EmbeddingVector>),
    Unavailable(String),
}

/// Turns text into embedding vectors. Provider failures never escape this
/// service; they come back as `Unavailable` so callers pick the degraded path.
pub struct EmbeddingService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    options: EmbeddingBatchOptions,
}

impl EmbeddingService {
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>, options: EmbeddingBatchOptions) -> Self {
        Self {
            embedding_provider,
            options,
        }
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }

    pub async fn embed_one(&self, text: &str) -> EmbeddingOutcome {
        match self.embed_many(&[text.to_string()]).await {
            BatchEmbeddingOutcome::Embedded(mut vectors) => match vectors.pop() {
                Some(vector) => EmbeddingOutcome::Embedded(vector),
                None => EmbeddingOutcome::Unavailable("empty embedding response".to_string()),
            },
            BatchEmbeddingOutcome::Unavailable(reason) => EmbeddingOutcome::Unavailable(reason),
        }
    }

    /// One round trip for all `texts`.
    pub async fn embed_many(&self, texts: &[String]) -> BatchEmbeddingOutcome {
        if texts.is_empty() {
            return BatchEmbeddingOutcome::Embedded(Vec::new());
        }

        let request = BatchEmbeddingRequest {
            texts: texts.to_vec(),
            model_name: self.options.model.clone(),
        };

        let response = match self.embedding_provider.generate_embeddings(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(count = texts.len(), error = %e, "embedding request failed");
                return BatchEmbeddingOutcome::Unavailable(e.to_string());
            }
        };

        if response.embeddings.len() != texts.len() {
            let reason = EmbeddingProviderError::MalformedResponse(format!(
                "expected {} embeddings, received {}",
                texts.len(),
                response.embeddings.len()
            ));
            tracing::warn!(error = %reason, "embedding response rejected");
            return BatchEmbeddingOutcome::Unavailable(reason.to_string());
        }

        let mut vectors = Vec::with_capacity(response.embeddings.len());
        for values in response.embeddings {
            match EmbeddingVector::new(values) {
                Ok(vector) => vectors.push(vector),
                Err(e) => {
                    tracing::warn!(error = %e, "embedding response rejected");
                    return BatchEmbeddingOutcome::Unavailable(e.to_string());
                }
            }
        }

        tracing::debug!(
            count = vectors.len(),
            model = %response.model_name,
            tokens = ?response.total_tokens,
            "generated embeddings"
        );

        BatchEmbeddingOutcome::Embedded(vectors)
    }

    /// Embeds `texts` in sequential batches of `batch_size`. A failed batch
    /// leaves `None` in its slots and the remaining batches still run.
    pub async fn embed_in_batches(&self, texts: &[String]) -> Vec<Option<EmbeddingVector>> {
        let batch_size = self.options.batch_size.max(1);
        let mut results = Vec::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
            match self.embed_many(batch).await {
                BatchEmbeddingOutcome::Embedded(vectors) => {
                    results.extend(vectors.into_iter().map(Some));
                }
                BatchEmbeddingOutcome::Unavailable(reason) => {
                    tracing::warn!(
                        batch = batch_index,
                        size = batch.len(),
                        reason = %reason,
                        "batch left without embeddings"
                    );
                    results.extend(std::iter::repeat_n(None, batch.len()));
                }
            }
        }

        results
    }
}
