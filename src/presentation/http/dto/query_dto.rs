use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::RetrievedFragment;
use crate::application::use_cases::AnswerQuestionResponse;
use crate::domain::entities::QueryRecord;
use crate::domain::value_objects::QueryPhase;

#[derive(Debug, Deserialize)]
pub struct AskQuestionRequestDto {
    pub question: String,
    pub document_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct FragmentResultDto {
    pub fragment_id: Uuid,
    pub document_id: Uuid,
    pub document_title: String,
    pub page_number: i32,
    pub content: String,
    pub similarity: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponseDto {
    pub question: String,
    pub answer: String,
    pub phase: QueryPhase,
    pub fragments: Vec<FragmentResultDto>,
    pub referenced_document_ids: Vec<Uuid>,
    pub degraded: bool,
    pub model_name: Option<String>,
    pub tokens_used: Option<u32>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct RecentQueriesParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct QueryRecordDto {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub referenced_document_ids: Vec<Uuid>,
    pub fragment_ids: Vec<Uuid>,
    pub model_name: Option<String>,
    pub tokens_used: i32,
    pub asked_at: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponseDto {
    pub removed: i64,
}

impl From<RetrievedFragment> for FragmentResultDto {
    fn from(retrieved: RetrievedFragment) -> Self {
        let stored = retrieved.fragment;
        Self {
            fragment_id: stored.id(),
            document_id: stored.document_id(),
            page_number: stored.fragment.page_number(),
            content: stored.fragment.content().to_string(),
            document_title: stored.document_title,
            similarity: retrieved.similarity,
        }
    }
}

impl From<AnswerQuestionResponse> for AnswerResponseDto {
    fn from(response: AnswerQuestionResponse) -> Self {
        Self {
            question: response.question,
            answer: response.answer,
            phase: response.phase,
            fragments: response
                .fragments
                .into_iter()
                .map(FragmentResultDto::from)
                .collect(),
            referenced_document_ids: response.referenced_document_ids,
            degraded: response.degraded,
            model_name: response.model_name,
            tokens_used: response.tokens_used,
            processing_time_ms: response.processing_time_ms,
        }
    }
}

impl From<QueryRecord> for QueryRecordDto {
    fn from(record: QueryRecord) -> Self {
        Self {
            id: record.id(),
            question: record.question().to_string(),
            answer: record.answer().to_string(),
            referenced_document_ids: record.referenced_document_ids().to_vec(),
            fragment_ids: record.fragment_ids().to_vec(),
            model_name: record.model_name().map(str::to_string),
            tokens_used: record.tokens_used(),
            asked_at: record.asked_at().to_rfc3339(),
        }
    }
}
