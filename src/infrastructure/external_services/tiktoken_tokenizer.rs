use tiktoken_rs::CoreBPE;

use crate::application::ports::Tokenizer;

const ENCODING: &str = "cl100k_base";

#[derive(Debug, thiserror::Error)]
#[error("Failed to load {encoding} encoding: {message}")]
pub struct TokenizerError {
    encoding: &'static str,
    message: String,
}

/// `cl100k_base` token counting, the encoding used by the OpenAI embedding
/// and chat models.
pub struct TiktokenTokenizer {
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    pub fn cl100k() -> Result<Self, TokenizerError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| TokenizerError {
            encoding: ENCODING,
            message: e.to_string(),
        })?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn encoding_name(&self) -> &str {
        ENCODING
    }
}
