//! Deterministic `AiClient` stubs for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm_client::{AiClient, LlmError, StructuredResponse, TextResponse};

/// Rejects every call, like an AI service that is permanently down.
pub struct FailingAiClient;

#[async_trait]
impl AiClient for FailingAiClient {
    async fn generate_structured_response(
        &self,
        _prompt: &str,
        _schema_hint: &str,
    ) -> Result<StructuredResponse, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }

    async fn generate_text(&self, _prompt: &str) -> Result<TextResponse, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }
}

/// Answers structured calls whose schema hint contains a registered key.
/// Unmatched structured calls fail; text calls return the configured answer or fail.
#[derive(Default)]
pub struct ScriptedAiClient {
    structured: Vec<(String, Value)>,
    text: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedAiClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structured(mut self, schema_key: &str, data: Value) -> Self {
        self.structured.push((schema_key.to_string(), data));
        self
    }

    pub fn with_text(mut self, answer: &str) -> Self {
        self.text = Some(answer.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiClient for ScriptedAiClient {
    async fn generate_structured_response(
        &self,
        _prompt: &str,
        schema_hint: &str,
    ) -> Result<StructuredResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.structured
            .iter()
            .find(|(key, _)| schema_hint.contains(key.as_str()))
            .map(|(_, data)| StructuredResponse {
                data: data.clone(),
                processing_time_ms: 120,
                confidence: 0.9,
            })
            .ok_or(LlmError::EmptyContent)
    }

    async fn generate_text(&self, _prompt: &str) -> Result<TextResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .map(|data| TextResponse { data })
            .ok_or(LlmError::EmptyContent)
    }
}

/// Sleeps before answering; pair with a short gateway timeout.
pub struct SlowAiClient {
    delay: Duration,
}

impl SlowAiClient {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl AiClient for SlowAiClient {
    async fn generate_structured_response(
        &self,
        _prompt: &str,
        _schema_hint: &str,
    ) -> Result<StructuredResponse, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok(StructuredResponse {
            data: Value::Null,
            processing_time_ms: self.delay.as_millis() as u64,
            confidence: 0.5,
        })
    }

    async fn generate_text(&self, _prompt: &str) -> Result<TextResponse, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok(TextResponse {
            data: "Technology".to_string(),
        })
    }
}
