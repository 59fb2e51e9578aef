//! Chat-completion client.
//!
//! [`OpenAiCompleter`] speaks the OpenAI-compatible `/chat/completions`
//! protocol over an injected [`HttpClient`]. [`MockCompleter`] answers
//! offline and is used when mock mode is on.

use crate::http_client::{HttpClient, HttpResponse, ReqwestHttpClient};
use crate::session::{Message, ModelParams, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Body of a chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
}

impl ChatRequest {
    pub fn new(params: &ModelParams, messages: &[Message]) -> Self {
        Self {
            model: params.model.clone(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            messages: messages.to_vec(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("the API key was rejected")]
    Unauthorized,
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response from the API: {0}")]
    MalformedResponse(String),
    #[error("request failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Sends the conversation and returns the assistant's reply.
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<String, CompletionError>;

    /// Whether this completer needs an API key at all.
    fn requires_key(&self) -> bool {
        true
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct OpenAiCompleter<H: HttpClient = ReqwestHttpClient> {
    http: H,
    base_url: String,
}

impl OpenAiCompleter<ReqwestHttpClient> {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(ReqwestHttpClient::new(), base_url)
    }
}

impl<H: HttpClient> OpenAiCompleter<H> {
    pub fn with_client(http: H, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl<H: HttpClient> ChatCompleter for OpenAiCompleter<H> {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<String, CompletionError> {
        let body = serde_json::to_value(request)
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;
        let authorization = format!("Bearer {}", api_key);
        let headers = [
            ("Authorization", authorization.as_str()),
            ("Content-Type", "application/json"),
        ];

        info!("Requesting completion from {} with model {}", self.endpoint(), request.model);
        let response = self
            .http
            .post_json(&self.endpoint(), &headers, &body)
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        debug!("Completion response ({}): {}", response.status, response.body);

        parse_response(response)
    }
}

fn parse_response(response: HttpResponse) -> Result<String, CompletionError> {
    if response.status == 401 || response.status == 403 {
        warn!("API rejected the key with status {}", response.status);
        return Err(CompletionError::Unauthorized);
    }

    if !response.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&response.body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| response.body.trim().to_string());
        return Err(CompletionError::Api {
            status: response.status,
            message,
        });
    }

    let parsed: CompletionResponse = serde_json::from_str(&response.body)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::MalformedResponse("no choices in response".to_string()))
}

/// Offline completer. Replies with a fenced echo of the latest user message
/// so delimiter trimming is exercised as well.
pub struct MockCompleter;

#[async_trait]
impl ChatCompleter for MockCompleter {
    async fn complete(
        &self,
        _api_key: &str,
        request: &ChatRequest,
    ) -> Result<String, CompletionError> {
        let turn = request.messages.iter().filter(|m| m.role == Role::User).count();
        let last = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        info!("Using mock completer (HEY_USE_MOCK)");
        Ok(format!("```\n[{} #{}] {}\n```", request.model, turn, last))
    }

    fn requires_key(&self) -> bool {
        false
    }
}
