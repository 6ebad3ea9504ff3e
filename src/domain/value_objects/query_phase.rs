use serde::{Deserialize, Serialize};

/// Lifecycle of a single question:
/// `Idle → EmbeddingQuestion → RankingFragments → (NoContext | Synthesizing) → Done`.
/// `Failed` may be entered from any non-terminal phase and carries a message
/// meant to be shown to the user in place of an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "message", rename_all = "snake_case")]
pub enum QueryPhase {
    Idle,
    EmbeddingQuestion,
    RankingFragments,
    NoContext,
    Synthesizing,
    Done,
    Failed(String),
}

impl QueryPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryPhase::Done | QueryPhase::Failed(_))
    }

    pub fn can_transition_to(&self, next: &QueryPhase) -> bool {
        match (self, next) {
            (current, QueryPhase::Failed(_)) => !current.is_terminal(),
            (QueryPhase::Idle, QueryPhase::EmbeddingQuestion) => true,
            (QueryPhase::EmbeddingQuestion, QueryPhase::RankingFragments) => true,
            (QueryPhase::RankingFragments, QueryPhase::NoContext) => true,
            (QueryPhase::RankingFragments, QueryPhase::Synthesizing) => true,
            (QueryPhase::NoContext, QueryPhase::Done) => true,
            (QueryPhase::Synthesizing, QueryPhase::Done) => true,
            _ => false,
        }
    }

    pub fn advance(&mut self, next: QueryPhase) -> Result<(), String> {
        if !self.can_transition_to(&next) {
            return Err(format!("Invalid query transition {} -> {}", self, next));
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryPhase::Idle => "idle",
            QueryPhase::EmbeddingQuestion => "embedding_question",
            QueryPhase::RankingFragments => "ranking_fragments",
            QueryPhase::NoContext => "no_context",
            QueryPhase::Synthesizing => "synthesizing",
            QueryPhase::Done => "done",
            QueryPhase::Failed(_) => "failed",
        }
    }
}

impl Default for QueryPhase {
    fn default() -> Self {
        QueryPhase::Idle
    }
}

impl std::fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
