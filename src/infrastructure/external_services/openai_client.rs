use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::application::ports::chat_provider::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatProvider, ChatProviderError,
};
use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
};

#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
    model: String,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    model: String,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Failure of one HTTP round trip, before it is mapped onto a port error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpenAiError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("rate limited")]
    RateLimited,
    #[error("status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Minimal client for OpenAI-compatible `/embeddings` and
/// `/chat/completions` endpoints. One call is one request; no retries.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiClientConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, OpenAiError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| OpenAiError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| OpenAiError::Decode(e.to_string()))
    }

    pub async fn embeddings(
        &self,
        model: &str,
        input: &[String],
    ) -> Result<(Vec<Vec<f32>>, String, Option<u32>), OpenAiError> {
        let response: EmbeddingsResponse = self
            .post("embeddings", &EmbeddingsRequest { model, input })
            .await?;

        let mut data = response.data;
        data.sort_by_key(|item| item.index);
        let vectors = data.into_iter().map(|item| item.embedding).collect();

        Ok((vectors, response.model, response.usage.map(|u| u.total_tokens)))
    }

    pub async fn chat(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<(String, String, Option<u32>), OpenAiError> {
        let response: ChatResponse = self
            .post(
                "chat/completions",
                &ChatRequest {
                    model: &request.model,
                    messages: &request.messages,
                    temperature: request.temperature,
                    max_tokens: request.max_tokens,
                },
            )
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OpenAiError::Decode("completion has no content".to_string()))?;

        Ok((content, response.model, response.usage.map(|u| u.total_tokens)))
    }
}

fn classify_failure(status: StatusCode, body: &str) -> OpenAiError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OpenAiError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => OpenAiError::RateLimited,
        _ => OpenAiError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

impl From<OpenAiError> for EmbeddingProviderError {
    fn from(error: OpenAiError) -> Self {
        match error {
            OpenAiError::Network(msg) => EmbeddingProviderError::NetworkError(msg),
            OpenAiError::Unauthorized(msg) => EmbeddingProviderError::AuthenticationFailed(msg),
            OpenAiError::RateLimited => EmbeddingProviderError::RateLimitExceeded,
            OpenAiError::Api { .. } => EmbeddingProviderError::ApiError(error.to_string()),
            OpenAiError::Decode(msg) => EmbeddingProviderError::MalformedResponse(msg),
        }
    }
}

impl From<OpenAiError> for ChatProviderError {
    fn from(error: OpenAiError) -> Self {
        match error {
            OpenAiError::Network(msg) => ChatProviderError::NetworkError(msg),
            OpenAiError::Unauthorized(msg) => ChatProviderError::AuthenticationFailed(msg),
            OpenAiError::RateLimited => ChatProviderError::RateLimitExceeded,
            OpenAiError::Api { .. } => ChatProviderError::ApiError(error.to_string()),
            OpenAiError::Decode(msg) => ChatProviderError::MalformedResponse(msg),
        }
    }
}

// Adapters implementing the application ports over the shared client
pub struct OpenAiEmbeddingProvider {
    client: OpenAiClient,
}

impl OpenAiEmbeddingProvider {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        let (embeddings, model_name, total_tokens) = self
            .client
            .embeddings(&request.model_name, &request.texts)
            .await?;

        Ok(BatchEmbeddingResponse {
            embeddings,
            model_name,
            total_tokens,
        })
    }
}

pub struct OpenAiChatProvider {
    client: OpenAiClient,
}

impl OpenAiChatProvider {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ChatProviderError> {
        let (content, model, total_tokens) = self.client.chat(&request).await?;

        Ok(ChatCompletionResponse {
            content,
            model,
            total_tokens,
        })
    }
}
