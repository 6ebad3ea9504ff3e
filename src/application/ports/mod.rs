pub mod chat_provider;
pub mod document_extractor;
pub mod embedding_provider;
pub mod tokenizer;

pub use chat_provider::ChatProvider;
pub use document_extractor::DocumentExtractor;
pub use embedding_provider::EmbeddingProvider;
pub use tokenizer::Tokenizer;
