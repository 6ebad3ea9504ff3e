pub mod answer_synthesizer;
pub mod chunker;
pub mod embedding_service;
pub mod similarity_ranker;

pub use answer_synthesizer::{AnswerSynthesizer, SynthesisOptions, SynthesisOutcome};
pub use chunker::{Chunker, ChunkingOptions, PageFragment};
pub use embedding_service::{
    BatchEmbeddingOutcome, EmbeddingBatchOptions, EmbeddingOutcome, EmbeddingService,
};
pub use similarity_ranker::{
    RankedFragments, RankingError, RankingOptions, RetrievedFragment, SimilarityRanker,
};
