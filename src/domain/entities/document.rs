use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::DocumentMetadata;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: Uuid,
    title: String,
    author: Option<String>,
    page_count: i32,
    fragment_count: i32,
    processed_at: DateTime<Utc>,
    metadata: DocumentMetadata,
}

impl Document {
    pub fn new(
        title: String,
        author: Option<String>,
        page_count: i32,
        metadata: DocumentMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            author,
            page_count,
            fragment_count: 0,
            processed_at: Utc::now(),
            metadata,
        }
    }

    /// Rebuilds a document read back from storage.
    pub fn restore(
        id: Uuid,
        title: String,
        author: Option<String>,
        page_count: i32,
        fragment_count: i32,
        processed_at: DateTime<Utc>,
        metadata: DocumentMetadata,
    ) -> Self {
        Self {
            id,
            title,
            author,
            page_count,
            fragment_count,
            processed_at,
            metadata,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn page_count(&self) -> i32 {
        self.page_count
    }

    pub fn fragment_count(&self) -> i32 {
        self.fragment_count
    }

    pub fn processed_at(&self) -> DateTime<Utc> {
        self.processed_at
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// The only mutation a document sees after creation.
    pub fn set_fragment_count(&mut self, count: i32) {
        self.fragment_count = count;
    }

    pub fn matches(&self, title: Option<&str>, author: Option<&str>) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };

        let title_ok = title.is_none_or(|t| contains(&self.title, t));
        let author_ok = author.is_none_or(|a| self.author.as_deref().is_some_and(|own| contains(own, a)));

        title_ok && author_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(
            "Cien años de soledad".to_string(),
            Some("Gabriel García Márquez".to_string()),
            417,
            DocumentMetadata::new(),
        )
    }

    #[test]
    fn test_new_document_has_no_fragments() {
        let document = sample();
        assert_eq!(document.fragment_count(), 0);
        assert_eq!(document.page_count(), 417);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let document = sample();
        assert!(document.matches(Some("SOLEDAD"), None));
        assert!(document.matches(None, Some("garcía")));
        assert!(document.matches(Some("cien"), Some("márquez")));
        assert!(!document.matches(Some("rayuela"), None));
    }

    #[test]
    fn test_author_filter_requires_author() {
        let document = Document::new("Anon".to_string(), None, 1, DocumentMetadata::new());
        assert!(!document.matches(None, Some("someone")));
        assert!(document.matches(None, None));
    }
}
