use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only log entry for an answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    id: Uuid,
    question: String,
    answer: String,
    referenced_document_ids: Vec<Uuid>,
    fragment_ids: Vec<Uuid>,
    model_name: Option<String>,
    tokens_used: i32,
    asked_at: DateTime<Utc>,
}

impl QueryRecord {
    pub fn new(
        question: String,
        answer: String,
        referenced_document_ids: Vec<Uuid>,
        fragment_ids: Vec<Uuid>,
        model_name: Option<String>,
        tokens_used: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question,
            answer,
            referenced_document_ids,
            fragment_ids,
            model_name,
            tokens_used,
            asked_at: Utc::now(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        question: String,
        answer: String,
        referenced_document_ids: Vec<Uuid>,
        fragment_ids: Vec<Uuid>,
        model_name: Option<String>,
        tokens_used: i32,
        asked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            question,
            answer,
            referenced_document_ids,
            fragment_ids,
            model_name,
            tokens_used,
            asked_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn referenced_document_ids(&self) -> &[Uuid] {
        &self.referenced_document_ids
    }

    pub fn fragment_ids(&self) -> &[Uuid] {
        &self.fragment_ids
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn tokens_used(&self) -> i32 {
        self.tokens_used
    }

    pub fn asked_at(&self) -> DateTime<Utc> {
        self.asked_at
    }
}
