use std::sync::Arc;

use uuid::Uuid;

use crate::application::ports::ChatProvider;
use crate::application::ports::chat_provider::{ChatCompletionRequest, ChatMessage};
use crate::application::services::similarity_ranker::RetrievedFragment;

pub const NO_CONTEXT_ANSWER: &str = "I could not find relevant information in your library to answer this question. Try rephrasing it or add more documents.";

const SYSTEM_INSTRUCTION: &str = "You are an academic assistant that answers questions using only the texts provided. You are precise and objective and limit yourself to the available evidence. You never invent information or draw on outside knowledge.";

const REFERENCE_INSTRUCTION: &str = "Cite the specific documents and pages when relevant.";

#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub include_references: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            include_references: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    Answered {
        text: String,
        model: String,
        tokens_used: Option<u32>,
    },
    /// No fragments to ground on; the chat service was not called.
    NoContext { text: String },
    /// The chat service failed; `text` is safe to show as the answer.
    Failed { text: String, reason: String },
}

impl SynthesisOutcome {
    pub fn text(&self) -> &str {
        match self {
            SynthesisOutcome::Answered { text, .. }
            | SynthesisOutcome::NoContext { text }
            | SynthesisOutcome::Failed { text, .. } => text,
        }
    }
}

pub struct AnswerSynthesizer {
    chat_provider: Arc<dyn ChatProvider>,
    options: SynthesisOptions,
}

impl AnswerSynthesizer {
    pub fn new(chat_provider: Arc<dyn ChatProvider>, options: SynthesisOptions) -> Self {
        Self {
            chat_provider,
            options,
        }
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }

    pub async fn synthesize(
        &self,
        question: &str,
        fragments: &[RetrievedFragment],
        referenced_document_ids: &[Uuid],
    ) -> SynthesisOutcome {
        if fragments.is_empty() {
            return SynthesisOutcome::NoContext {
                text: NO_CONTEXT_ANSWER.to_string(),
            };
        }

        let context = build_context(fragments);
        let cite = self.options.include_references && !referenced_document_ids.is_empty();

        let request = ChatCompletionRequest {
            model: self.options.model.clone(),
            messages: build_messages(question, &context, cite),
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        tracing::debug!(
            fragments = fragments.len(),
            model = %self.options.model,
            "requesting answer"
        );

        match self.chat_provider.complete(request).await {
            Ok(response) => SynthesisOutcome::Answered {
                text: response.content,
                model: response.model,
                tokens_used: response.total_tokens,
            },
            Err(e) => {
                tracing::warn!(error = %e, "answer synthesis failed");
                let reason = e.to_string();
                SynthesisOutcome::Failed {
                    text: format!(
                        "Sorry, there was an error processing your question: {}\n\nCheck your network connection and API key configuration.",
                        reason
                    ),
                    reason,
                }
            }
        }
    }
}

/// One block per fragment naming its document and page, blocks separated by
/// a blank line.
pub fn build_context(fragments: &[RetrievedFragment]) -> String {
    fragments
        .iter()
        .map(|retrieved| {
            format!(
                "[From '{}', page {}]: {}",
                retrieved.fragment.document_title,
                retrieved.fragment.fragment.page_number(),
                retrieved.fragment.fragment.content()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_messages(question: &str, context: &str, cite_references: bool) -> Vec<ChatMessage> {
    let mut rules = vec![
        "Answer ONLY with information found in the fragments.",
        "If the information is not sufficient, state the limitations clearly.",
        "Be precise and evidence based.",
    ];
    if cite_references {
        rules.push(REFERENCE_INSTRUCTION);
    }
    rules.push("Do NOT invent information or use outside knowledge.");
    rules.push("If the fragments contradict each other, point out the contradiction.");
    rules.push("Keep the answer clear and organized.");

    let numbered = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "You are an assistant specialised in analysing the content of documents.\n\
         Based EXCLUSIVELY on the following document fragments, answer the user's question.\n\n\
         CRITICAL INSTRUCTIONS:\n{}\n\n\
         DOCUMENT FRAGMENTS:\n{}\n\n\
         USER QUESTION:\n{}\n\n\
         ANSWER BASED ON THE DOCUMENTS:",
        numbered, context, question
    );

    vec![ChatMessage::system(SYSTEM_INSTRUCTION), ChatMessage::user(prompt)]
}
