/// Counts tokens for one fixed subword encoding. Ingestion and querying must
/// share the same instance so budgets are comparable.
pub trait Tokenizer: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;

    fn encoding_name(&self) -> &str;
}
