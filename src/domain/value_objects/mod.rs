pub mod document_metadata;
pub mod embedding_vector;
pub mod file_hash;
pub mod query_phase;

pub use document_metadata::DocumentMetadata;
pub use embedding_vector::{EmbeddingVector, EmbeddingVectorError};
pub use file_hash::FileHash;
pub use query_phase::QueryPhase;
