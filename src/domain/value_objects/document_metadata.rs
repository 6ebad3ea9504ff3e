use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Free-form metadata attached to a document (file hash, size, detected
/// language, PDF info dictionary entries, content statistics).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentMetadata {
    properties: HashMap<String, Value>,
}

impl DocumentMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_property(&mut self, key: &str, value: Value) {
        self.properties.insert(key.to_string(), value);
    }

    /// Stores a string property, skipping blank values.
    pub fn set_text(&mut self, key: &str, value: &str) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            self.set_property(key, Value::String(trimmed.to_string()));
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get_property(key).and_then(Value::as_str)
    }

    pub fn properties(&self) -> &HashMap<String, Value> {
        &self.properties
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    // Well-known keys
    pub fn set_file_hash(&mut self, hash: &str) {
        self.set_text("file_hash", hash);
    }

    pub fn file_hash(&self) -> Option<&str> {
        self.get_text("file_hash")
    }

    pub fn set_file_size(&mut self, bytes: u64) {
        self.set_property("file_size_bytes", Value::Number(bytes.into()));
    }

    pub fn file_size(&self) -> Option<u64> {
        self.get_property("file_size_bytes").and_then(Value::as_u64)
    }

    pub fn set_language(&mut self, language: &str) {
        self.set_text("language", language);
    }

    pub fn language(&self) -> Option<&str> {
        self.get_text("language")
    }

    pub fn merge(&mut self, other: DocumentMetadata) {
        self.properties.extend(other.properties);
    }
}

impl From<DocumentMetadata> for Value {
    fn from(metadata: DocumentMetadata) -> Self {
        Value::Object(metadata.properties.into_iter().collect())
    }
}

impl From<Value> for DocumentMetadata {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                properties: map.into_iter().collect(),
            },
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_keys() {
        let mut metadata = DocumentMetadata::new();
        metadata.set_file_hash("abc123");
        metadata.set_file_size(2048);
        metadata.set_language("es");

        assert_eq!(metadata.file_hash(), Some("abc123"));
        assert_eq!(metadata.file_size(), Some(2048));
        assert_eq!(metadata.language(), Some("es"));
        assert_eq!(metadata.len(), 3);
    }

    #[test]
    fn test_blank_text_is_skipped() {
        let mut metadata = DocumentMetadata::new();
        metadata.set_text("subject", "   ");
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let mut metadata = DocumentMetadata::new();
        metadata.set_property("isbn", Value::String("9780306406157".to_string()));
        metadata.set_property("word_count", Value::Number(42.into()));

        let json: Value = metadata.clone().into();
        assert_eq!(json["isbn"], "9780306406157");
        assert_eq!(DocumentMetadata::from(json), metadata);
    }

    #[test]
    fn test_non_object_json_yields_empty() {
        assert!(DocumentMetadata::from(Value::Null).is_empty());
    }

    #[test]
    fn test_merge() {
        let mut first = DocumentMetadata::new();
        first.set_language("en");
        let mut second = DocumentMetadata::new();
        second.set_file_hash("ff");

        first.merge(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.get_text("file_hash"), Some("ff"));
    }
}
