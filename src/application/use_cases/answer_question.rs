use std::sync::Arc;

use uuid::Uuid;

use crate::application::services::{
    AnswerSynthesizer, EmbeddingOutcome, EmbeddingService, RetrievedFragment, SimilarityRanker,
    SynthesisOutcome,
};
use crate::domain::entities::QueryRecord;
use crate::domain::repositories::{StorageError, StorageGateway};
use crate::domain::value_objects::QueryPhase;

#[derive(Debug, thiserror::Error)]
pub enum AnswerQuestionError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid query state: {0}")]
    InvalidState(String),
}

#[derive(Debug, Clone)]
pub struct AnswerQuestionRequest {
    pub question: String,
    /// Restricts retrieval to these documents; `None` or empty means all.
    pub document_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone)]
pub struct AnswerQuestionResponse {
    pub question: String,
    pub answer: String,
    pub phase: QueryPhase,
    pub fragments: Vec<RetrievedFragment>,
    pub referenced_document_ids: Vec<Uuid>,
    /// True when the question could not be embedded and fragments were
    /// returned unranked.
    pub degraded: bool,
    pub model_name: Option<String>,
    pub tokens_used: Option<u32>,
    pub processing_time_ms: u64,
}

pub struct AnswerQuestionUseCase {
    storage: Arc<dyn StorageGateway>,
    embedding_service: Arc<EmbeddingService>,
    ranker: Arc<SimilarityRanker>,
    synthesizer: Arc<AnswerSynthesizer>,
}

impl AnswerQuestionUseCase {
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        embedding_service: Arc<EmbeddingService>,
        ranker: Arc<SimilarityRanker>,
        synthesizer: Arc<AnswerSynthesizer>,
    ) -> Self {
        Self {
            storage,
            embedding_service,
            ranker,
            synthesizer,
        }
    }

    pub async fn execute(
        &self,
        request: AnswerQuestionRequest,
    ) -> Result<AnswerQuestionResponse, AnswerQuestionError> {
        let start_time = std::time::Instant::now();

        let question = request.question.trim().to_string();
        if question.is_empty() {
            return Err(AnswerQuestionError::ValidationError(
                "Question cannot be empty".to_string(),
            ));
        }

        let document_ids = request.document_ids.filter(|ids| !ids.is_empty());

        let mut phase = QueryPhase::Idle;
        advance(&mut phase, QueryPhase::EmbeddingQuestion)?;

        let candidates = self.storage.get_fragments(document_ids.as_deref()).await?;
        let query_vector = self.embedding_service.embed_one(&question).await;

        advance(&mut phase, QueryPhase::RankingFragments)?;

        let mut degraded = false;
        let ranked = match query_vector {
            EmbeddingOutcome::Embedded(vector) => match self.ranker.rank(&vector, candidates) {
                Ok(ranked) => ranked,
                Err(e) => {
                    tracing::error!(error = %e, "ranking failed");
                    let message = e.to_string();
                    advance(&mut phase, QueryPhase::Failed(message.clone()))?;
                    return Ok(AnswerQuestionResponse {
                        question,
                        answer: message,
                        phase,
                        fragments: Vec::new(),
                        referenced_document_ids: Vec::new(),
                        degraded,
                        model_name: None,
                        tokens_used: None,
                        processing_time_ms: start_time.elapsed().as_millis() as u64,
                    });
                }
            },
            EmbeddingOutcome::Unavailable(reason) => {
                tracing::warn!(reason = %reason, "question not embedded, returning unranked fragments");
                degraded = true;
                self.ranker.unranked(candidates)
            }
        };

        if ranked.is_empty() {
            advance(&mut phase, QueryPhase::NoContext)?;
        } else {
            advance(&mut phase, QueryPhase::Synthesizing)?;
        }

        let outcome = self
            .synthesizer
            .synthesize(&question, &ranked.fragments, &ranked.referenced_document_ids)
            .await;

        let (model_name, tokens_used) = match &outcome {
            SynthesisOutcome::Answered {
                model, tokens_used, ..
            } => {
                advance(&mut phase, QueryPhase::Done)?;
                (Some(model.clone()), *tokens_used)
            }
            SynthesisOutcome::NoContext { .. } => {
                advance(&mut phase, QueryPhase::Done)?;
                (None, None)
            }
            SynthesisOutcome::Failed { reason, .. } => {
                advance(&mut phase, QueryPhase::Failed(reason.clone()))?;
                (None, None)
            }
        };

        let answer = outcome.text().to_string();

        if phase == QueryPhase::Done {
            let record = QueryRecord::new(
                question.clone(),
                answer.clone(),
                ranked.referenced_document_ids.clone(),
                ranked.fragments.iter().map(|f| f.fragment.id()).collect(),
                Some(
                    model_name
                        .clone()
                        .unwrap_or_else(|| self.synthesizer.model().to_string()),
                ),
                tokens_used.unwrap_or(0) as i32,
            );
            self.storage.log_query(&record).await?;
        }

        let processing_time = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            phase = %phase,
            fragments = ranked.fragments.len(),
            degraded,
            elapsed_ms = processing_time,
            "question answered"
        );

        Ok(AnswerQuestionResponse {
            question,
            answer,
            phase,
            fragments: ranked.fragments,
            referenced_document_ids: ranked.referenced_document_ids,
            degraded,
            model_name,
            tokens_used,
            processing_time_ms: processing_time,
        })
    }
}

fn advance(phase: &mut QueryPhase, next: QueryPhase) -> Result<(), AnswerQuestionError> {
    tracing::debug!(from = %phase, to = %next, "query phase");
    phase.advance(next).map_err(AnswerQuestionError::InvalidState)
}
