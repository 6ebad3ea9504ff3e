pub mod document_extractors;
pub mod openai_client;
pub mod tiktoken_tokenizer;

pub use document_extractors::PdfExtractor;
pub use openai_client::{OpenAiChatProvider, OpenAiClient, OpenAiClientConfig, OpenAiEmbeddingProvider};
pub use tiktoken_tokenizer::TiktokenTokenizer;
