use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::EmbeddingVector;

/// A bounded piece of a document's text, optionally carrying its embedding.
/// A fragment without an embedding is valid state but cannot be ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    id: Uuid,
    document_id: Uuid,
    content: String,
    page_number: i32,
    fragment_index: i32,
    token_count: i32,
    embedding: Option<EmbeddingVector>,
    created_at: DateTime<Utc>,
}

impl Fragment {
    pub fn new(
        document_id: Uuid,
        content: String,
        page_number: i32,
        fragment_index: i32,
        token_count: i32,
        embedding: Option<EmbeddingVector>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            page_number,
            fragment_index,
            token_count,
            embedding,
            created_at: Utc::now(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        document_id: Uuid,
        content: String,
        page_number: i32,
        fragment_index: i32,
        token_count: i32,
        embedding: Option<EmbeddingVector>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            document_id,
            content,
            page_number,
            fragment_index,
            token_count,
            embedding,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn page_number(&self) -> i32 {
        self.page_number
    }

    pub fn fragment_index(&self) -> i32 {
        self.fragment_index
    }

    pub fn token_count(&self) -> i32 {
        self.token_count
    }

    pub fn embedding(&self) -> Option<&EmbeddingVector> {
        self.embedding.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_embedded(&self) -> bool {
        self.embedding.is_some()
    }
}

/// What ingestion hands to the storage gateway, before ids exist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFragment {
    pub content: String,
    pub page_number: i32,
    pub token_count: i32,
    pub embedding: Option<EmbeddingVector>,
}

/// A fragment as retrieval sees it: joined with its owning document's
/// title and author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFragment {
    pub fragment: Fragment,
    pub document_title: String,
    pub document_author: Option<String>,
}

impl StoredFragment {
    pub fn id(&self) -> Uuid {
        self.fragment.id()
    }

    pub fn document_id(&self) -> Uuid {
        self.fragment.document_id()
    }

    pub fn embedding(&self) -> Option<&EmbeddingVector> {
        self.fragment.embedding()
    }
}
