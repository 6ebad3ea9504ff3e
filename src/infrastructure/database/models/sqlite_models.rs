//! Row types for the SQLite backend. Ids, timestamps and JSON are stored as
//! text; embeddings as little-endian `f32` blobs.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{Document, Fragment, NewFragment, QueryRecord};
use crate::domain::repositories::StorageError;
use crate::domain::value_objects::{DocumentMetadata, EmbeddingVector};
use crate::infrastructure::database::sqlite_schema::{documents, fragments, query_log};

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteDocumentRow {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub page_count: i32,
    pub fragment_count: i32,
    pub file_hash: Option<String>,
    pub processed_at: String,
    pub metadata: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = fragments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteFragmentRow {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub page_number: i32,
    pub fragment_index: i32,
    pub token_count: i32,
    pub embedding: Option<Vec<u8>>,
    pub created_at: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = query_log)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteQueryRow {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub referenced_document_ids: String,
    pub fragment_ids: String,
    pub model_name: Option<String>,
    pub tokens_used: i32,
    pub asked_at: String,
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
pub fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| StorageError::CorruptRecord(format!("timestamp '{}': {}", value, e)))
}

pub fn decode_uuid(value: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(value).map_err(|e| StorageError::CorruptRecord(format!("id '{}': {}", value, e)))
}

fn encode_ids(ids: &[Uuid]) -> Result<String, StorageError> {
    serde_json::to_string(ids).map_err(|e| StorageError::CorruptRecord(e.to_string()))
}

fn decode_ids(value: &str) -> Result<Vec<Uuid>, StorageError> {
    serde_json::from_str(value).map_err(|e| StorageError::CorruptRecord(e.to_string()))
}

impl SqliteDocumentRow {
    pub fn from_document(document: &Document) -> Result<Self, StorageError> {
        let metadata = serde_json::to_string(document.metadata())
            .map_err(|e| StorageError::CorruptRecord(e.to_string()))?;

        Ok(Self {
            id: document.id().to_string(),
            title: document.title().to_string(),
            author: document.author().map(str::to_string),
            page_count: document.page_count(),
            fragment_count: document.fragment_count(),
            file_hash: document.metadata().file_hash().map(str::to_string),
            processed_at: encode_timestamp(document.processed_at()),
            metadata,
        })
    }

    pub fn into_document(self) -> Result<Document, StorageError> {
        let metadata: DocumentMetadata = serde_json::from_str(&self.metadata)
            .map_err(|e| StorageError::CorruptRecord(format!("metadata of {}: {}", self.id, e)))?;

        Ok(Document::restore(
            decode_uuid(&self.id)?,
            self.title,
            self.author,
            self.page_count,
            self.fragment_count,
            decode_timestamp(&self.processed_at)?,
            metadata,
        ))
    }
}

impl SqliteFragmentRow {
    pub fn new(document_id: Uuid, fragment_index: i32, fragment: &NewFragment) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            content: fragment.content.clone(),
            page_number: fragment.page_number,
            fragment_index,
            token_count: fragment.token_count,
            embedding: fragment.embedding.as_ref().map(EmbeddingVector::to_le_bytes),
            created_at: encode_timestamp(Utc::now()),
        }
    }

    pub fn into_fragment(self) -> Result<Fragment, StorageError> {
        let embedding = self
            .embedding
            .as_deref()
            .map(EmbeddingVector::from_le_bytes)
            .transpose()
            .map_err(|e| StorageError::CorruptRecord(format!("fragment {}: {}", self.id, e)))?;

        Ok(Fragment::restore(
            decode_uuid(&self.id)?,
            decode_uuid(&self.document_id)?,
            self.content,
            self.page_number,
            self.fragment_index,
            self.token_count,
            embedding,
            decode_timestamp(&self.created_at)?,
        ))
    }
}

impl SqliteQueryRow {
    pub fn from_record(record: &QueryRecord) -> Result<Self, StorageError> {
        Ok(Self {
            id: record.id().to_string(),
            question: record.question().to_string(),
            answer: record.answer().to_string(),
            referenced_document_ids: encode_ids(record.referenced_document_ids())?,
            fragment_ids: encode_ids(record.fragment_ids())?,
            model_name: record.model_name().map(str::to_string),
            tokens_used: record.tokens_used(),
            asked_at: encode_timestamp(record.asked_at()),
        })
    }

    pub fn into_record(self) -> Result<QueryRecord, StorageError> {
        Ok(QueryRecord::restore(
            decode_uuid(&self.id)?,
            self.question,
            self.answer,
            decode_ids(&self.referenced_document_ids)?,
            decode_ids(&self.fragment_ids)?,
            self.model_name,
            self.tokens_used,
            decode_timestamp(&self.asked_at)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_text_orders_chronologically() {
        let earlier = DateTime::parse_from_rfc3339("2024-03-01T09:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let (a, b) = (encode_timestamp(earlier), encode_timestamp(later));
        assert!(a < b);
        assert_eq!(a.len(), b.len());
        assert_eq!(decode_timestamp(&a).unwrap(), earlier);
    }

    #[test]
    fn test_fragment_blob_round_trip() {
        let document_id = Uuid::new_v4();
        let row = SqliteFragmentRow::new(
            document_id,
            0,
            &NewFragment {
                content: "Enzymes lower activation energy.".to_string(),
                page_number: 9,
                token_count: 6,
                embedding: Some(EmbeddingVector::new(vec![0.1, 0.2, -0.3]).unwrap()),
            },
        );
        assert_eq!(row.embedding.as_ref().map(Vec::len), Some(12));

        let fragment = row.into_fragment().unwrap();
        assert_eq!(fragment.document_id(), document_id);
        let values = fragment.embedding().unwrap().as_slice();
        assert!((values[0] - 0.1).abs() <= f32::EPSILON);
        assert!((values[2] + 0.3).abs() <= f32::EPSILON);
    }

    #[test]
    fn test_corrupt_rows_rejected() {
        let row = SqliteFragmentRow {
            id: "not-a-uuid".to_string(),
            document_id: Uuid::new_v4().to_string(),
            content: String::new(),
            page_number: 1,
            fragment_index: 0,
            token_count: 0,
            embedding: None,
            created_at: encode_timestamp(Utc::now()),
        };
        assert!(matches!(row.into_fragment(), Err(StorageError::CorruptRecord(_))));

        let blob = SqliteFragmentRow {
            id: Uuid::new_v4().to_string(),
            embedding: Some(vec![1, 2, 3]),
            ..SqliteFragmentRow::new(Uuid::new_v4(), 0, &NewFragment {
                content: String::new(),
                page_number: 1,
                token_count: 0,
                embedding: None,
            })
        };
        assert!(matches!(blob.into_fragment(), Err(StorageError::CorruptRecord(_))));
    }
}
