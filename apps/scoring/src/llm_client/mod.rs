//! AI collaborator: the `AiClient` seam plus its Anthropic-backed implementation.
//!
//! Analyzers only see `AiGateway`, which wraps any `AiClient` with a timeout and call
//! telemetry. The model is pinned in `MODEL`.
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod gateway;
pub mod prompts;
#[cfg(test)]
pub mod testing;

pub use gateway::AiGateway;

use prompts::JSON_ONLY_SYSTEM;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls in the scoring service.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 2048;
// Kept low: every call is bounded by the gateway timeout and has a local fallback.
const MAX_ATTEMPTS: u32 = 2;
const INITIAL_BACKOFF_MS: u64 = 500;
const TEXT_SYSTEM: &str = "You are a concise classifier. Answer with the requested value only.";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

/// Result of a structured-analysis call.
#[derive(Debug, Clone)]
pub struct StructuredResponse {
    pub data: Value,
    pub processing_time_ms: u64,
    /// 0–1, the collaborator's own estimate of answer quality.
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct TextResponse {
    pub data: String,
}

/// The narrow AI collaborator interface used by every analyzer.
/// Swap implementations (real client, deterministic stubs) without touching analyzer logic.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn generate_structured_response(
        &self,
        prompt: &str,
        schema_hint: &str,
    ) -> Result<StructuredResponse, LlmError>;

    async fn generate_text(&self, prompt: &str) -> Result<TextResponse, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            api_key,
        })
    }

    /// One Messages API round trip. Rate limits, server errors and transport failures
    /// are retried with doubling backoff; other API errors return immediately.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
        let mut attempt = 1;
        loop {
            match self.send_once(&body).await {
                Ok(response) => {
                    debug!(
                        attempt,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        "Anthropic call succeeded"
                    );
                    return Ok(response);
                }
                Err(err) if attempt < MAX_ATTEMPTS && is_retryable(&err) => {
                    warn!(attempt, error = %err, backoff_ms = backoff.as_millis() as u64, "Retrying Anthropic call");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(LlmError::Api { status: 429, .. }) => {
                    return Err(LlmError::RateLimited { attempts: attempt });
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(&self, body: &AnthropicRequest<'_>) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<AnthropicError>(&raw)
            .map(|e| e.error.message)
            .unwrap_or(raw);
        Err(LlmError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn is_retryable(err: &LlmError) -> bool {
    match err {
        LlmError::Http(_) => true,
        LlmError::Api { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl AiClient for LlmClient {
    async fn generate_structured_response(
        &self,
        prompt: &str,
        schema_hint: &str,
    ) -> Result<StructuredResponse, LlmError> {
        let started = Instant::now();
        let full_prompt = format!(
            "{prompt}\n\nRespond with a single JSON object matching this shape:\n{schema_hint}"
        );

        let response = self.call(&full_prompt, JSON_ONLY_SYSTEM).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        let data: Value = serde_json::from_str(strip_json_fences(text))?;

        // A truncated answer (max_tokens) is usable but less trustworthy.
        let confidence = match response.stop_reason.as_deref() {
            Some("end_turn") | None => 0.9,
            Some(_) => 0.6,
        };

        Ok(StructuredResponse {
            data,
            processing_time_ms: started.elapsed().as_millis() as u64,
            confidence,
        })
    }

    async fn generate_text(&self, prompt: &str) -> Result<TextResponse, LlmError> {
        let response = self.call(prompt, TEXT_SYSTEM).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(TextResponse {
            data: text.trim().to_string(),
        })
    }
}

/// Drops a surrounding markdown code fence (with or without a `json` tag).
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_untagged() {
        assert_eq!(strip_json_fences("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn test_only_transient_errors_retry() {
        let api = |status| LlmError::Api {
            status,
            message: String::new(),
        };
        assert!(is_retryable(&api(429)));
        assert!(is_retryable(&api(503)));
        assert!(!is_retryable(&api(400)));
        assert!(!is_retryable(&LlmError::EmptyContent));
    }

    #[test]
    fn test_llm_response_reads_stop_reason() {
        let json = r#"{
            "content": [{"type": "text", "text": "Technology"}],
            "usage": {"input_tokens": 12, "output_tokens": 2},
            "stop_reason": "max_tokens"
        }"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Technology"));
        assert_eq!(response.stop_reason.as_deref(), Some("max_tokens"));
    }
}
