use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::QueryRecord;
use crate::domain::repositories::StorageError;
use crate::infrastructure::database::schema::query_log;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = query_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QueryLogModel {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub referenced_document_ids: serde_json::Value,
    pub fragment_ids: serde_json::Value,
    pub model_name: Option<String>,
    pub tokens_used: i32,
    pub asked_at: DateTime<Utc>,
}

impl From<&QueryRecord> for QueryLogModel {
    fn from(record: &QueryRecord) -> Self {
        Self {
            id: record.id(),
            question: record.question().to_string(),
            answer: record.answer().to_string(),
            referenced_document_ids: ids_to_json(record.referenced_document_ids()),
            fragment_ids: ids_to_json(record.fragment_ids()),
            model_name: record.model_name().map(str::to_string),
            tokens_used: record.tokens_used(),
            asked_at: record.asked_at(),
        }
    }
}

impl TryFrom<QueryLogModel> for QueryRecord {
    type Error = StorageError;

    fn try_from(model: QueryLogModel) -> Result<Self, Self::Error> {
        Ok(QueryRecord::restore(
            model.id,
            model.question,
            model.answer,
            ids_from_json(model.referenced_document_ids)?,
            ids_from_json(model.fragment_ids)?,
            model.model_name,
            model.tokens_used,
            model.asked_at,
        ))
    }
}

pub fn ids_to_json(ids: &[Uuid]) -> serde_json::Value {
    serde_json::Value::Array(
        ids.iter()
            .map(|id| serde_json::Value::String(id.to_string()))
            .collect(),
    )
}

pub fn ids_from_json(value: serde_json::Value) -> Result<Vec<Uuid>, StorageError> {
    serde_json::from_value(value).map_err(|e| StorageError::CorruptRecord(e.to_string()))
}
