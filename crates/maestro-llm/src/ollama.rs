//! Ollama - Local Ollama API provider
//!
//! Talks to the `/api/chat` endpoint of a local Ollama server with
//! streaming disabled and maps its eval counters onto usage and timing.

use crate::completion::{CompletionRequest, CompletionResponse, CompletionTiming, TokenUsage};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::provider::LlmProvider;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default Ollama model
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Default Ollama API URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Longest server error text passed through to callers
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    options: SamplingOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct SamplingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Non-streaming `/api/chat` reply; durations are in nanoseconds
#[derive(Debug, Deserialize)]
struct ChatReply {
    model: String,
    message: ReplyMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    total_duration: Option<u64>,
    #[serde(default)]
    prompt_eval_duration: Option<u64>,
    #[serde(default)]
    eval_duration: Option<u64>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    error: String,
}

/// Ollama provider configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Server root, without the `/api` suffix
    pub base_url: String,
    /// Model used when a request leaves its model empty
    pub model: String,
    /// `num_predict` used when a request sets no limit
    pub max_tokens: u32,
    /// Whole-request bound; local inference is slow
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2000,
            timeout: Duration::from_secs(120),
        }
    }
}

impl OllamaConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL; a trailing slash is dropped
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the fallback model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the fallback token limit
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

/// Ollama local provider
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::NotConfigured(format!("ollama http client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(OllamaConfig::default())
    }

    fn transport_error(&self, e: &reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.config.timeout.as_millis() as u64)
        } else if e.is_connect() {
            Error::Network(format!("no Ollama server at {}", self.config.base_url))
        } else {
            Error::Network(e.to_string())
        }
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> Result<ChatReply> {
        debug!(model = %request.model, messages = request.messages.len(), "Sending chat to Ollama");

        let response = self
            .client
            .post(self.config.chat_url())
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            let error = server_failure(status, &body, request.model);
            warn!(%status, error = %error, "Ollama rejected the chat");
            return Err(error);
        }

        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

/// Map a non-2xx reply onto the crate's error kinds
///
/// A missing model is a configuration problem; everything else is an API
/// error whose text has filesystem paths masked and is cut to a bounded
/// length.
fn server_failure(status: StatusCode, body: &str, model: &str) -> Error {
    let text = serde_json::from_str::<ServerError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string());
    let lower = text.to_lowercase();

    if status == StatusCode::NOT_FOUND || (lower.contains("model") && lower.contains("not found")) {
        return Error::NotConfigured(format!(
            "model '{}' is not available; pull it with `ollama pull {}`",
            model, model
        ));
    }

    let masked: Vec<&str> = text
        .split_whitespace()
        .map(|word| {
            let bare = word.trim_matches(|c: char| "'\"()[],:".contains(c));
            if bare.starts_with('/') || bare.contains(":\\") {
                "<path>"
            } else {
                word
            }
        })
        .collect();
    let mut message = masked.join(" ");
    if message.chars().count() > MAX_ERROR_CHARS {
        message = message.chars().take(MAX_ERROR_CHARS).collect::<String>() + "...";
    }

    Error::Api(format!("HTTP {}: {}", status.as_u16(), message))
}

fn nanos_to_ms(nanos: Option<u64>) -> f64 {
    let ms = nanos.unwrap_or(0) as f64 / NANOS_PER_MILLI;
    (ms * 100.0).round() / 100.0
}

impl ChatReply {
    fn into_completion(self) -> CompletionResponse {
        let usage = self
            .prompt_eval_count
            .zip(self.eval_count)
            .map(|(prompt, completion)| TokenUsage::new(prompt, completion));

        let timing = CompletionTiming {
            prompt_eval_ms: nanos_to_ms(self.prompt_eval_duration),
            eval_ms: nanos_to_ms(self.eval_duration),
            total_ms: nanos_to_ms(self.total_duration),
        };

        CompletionResponse {
            content: self.message.content,
            usage,
            timing: Some(timing),
            finish_reason: self.done_reason,
            model: self.model,
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = if request.model.is_empty() {
            self.config.model.as_str()
        } else {
            request.model.as_str()
        };

        let chat = ChatRequest {
            model,
            messages: &request.messages,
            options: SamplingOptions {
                temperature: request.temperature,
                num_predict: Some(request.max_tokens.unwrap_or(self.config.max_tokens)),
            },
            stream: false,
        };

        Ok(self.chat(&chat).await?.into_completion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = OllamaConfig::new()
            .with_model("mistral")
            .with_base_url("http://ollama:11434/")
            .with_max_tokens(1024)
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.model, "mistral");
        assert_eq!(config.base_url, "http://ollama:11434");
        assert_eq!(config.chat_url(), "http://ollama:11434/api/chat");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_default_config() {
        let config = OllamaConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![Message::system("be brief"), Message::user("hi")];
        let request = ChatRequest {
            model: "llama3.1",
            messages: &messages,
            options: SamplingOptions {
                temperature: Some(0.2),
                num_predict: None,
            },
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["stream"], false);
        assert!(json["options"].get("num_predict").is_none());
    }

    #[test]
    fn test_reply_metrics() {
        let body = r#"{
            "model": "llama3.1",
            "message": {"role": "assistant", "content": "hello"},
            "done": true,
            "prompt_eval_count": 20,
            "eval_count": 7,
            "total_duration": 1500000000,
            "eval_duration": 250000000
        }"#;
        let reply: ChatReply = serde_json::from_str(body).unwrap();
        let completion = reply.into_completion();
        assert_eq!(completion.content, "hello");
        assert_eq!(completion.total_tokens(), 27);
        let timing = completion.timing.unwrap();
        assert_eq!(timing.total_ms, 1500.0);
        assert_eq!(timing.eval_ms, 250.0);
        assert_eq!(timing.prompt_eval_ms, 0.0);
    }

    #[test]
    fn test_reply_without_counters_has_no_usage() {
        let body = r#"{"model": "llama3.1", "message": {"content": "hi"}}"#;
        let reply: ChatReply = serde_json::from_str(body).unwrap();
        assert!(reply.into_completion().usage.is_none());
    }

    #[test]
    fn test_missing_model_is_a_configuration_error() {
        let error = server_failure(
            StatusCode::NOT_FOUND,
            r#"{"error": "model \"qwen\" not found, try pulling it first"}"#,
            "qwen",
        );
        assert!(matches!(error, Error::NotConfigured(ref m) if m.contains("ollama pull qwen")));
        assert!(!error.is_unreachable());
    }

    #[test]
    fn test_server_error_masks_paths_and_is_bounded() {
        let error = server_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error": "failed to load '/root/.ollama/models/blobs/sha256-abc'"}"#,
            "llama3.1",
        );
        let Error::Api(message) = error else {
            panic!("expected an api error");
        };
        assert!(message.starts_with("HTTP 500"));
        assert!(message.contains("<path>"));
        assert!(!message.contains("/root"));

        let long = "x ".repeat(400);
        let Error::Api(message) = server_failure(StatusCode::BAD_REQUEST, &long, "m") else {
            panic!("expected an api error");
        };
        assert!(message.ends_with("..."));
        assert!(message.chars().count() < MAX_ERROR_CHARS + 20);
    }
}
