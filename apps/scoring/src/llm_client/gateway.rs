use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::llm_client::{AiClient, LlmError};
use crate::scoring::telemetry::CallLog;

/// Wraps the AI collaborator with a per-call timeout and records every call
/// into the run's `CallLog`. Calls are independent: a timeout on one never
/// cancels another in flight.
#[derive(Clone)]
pub struct AiGateway {
    client: Arc<dyn AiClient>,
    timeout: Duration,
}

impl AiGateway {
    pub fn new(client: Arc<dyn AiClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Structured call decoded into `T`. A payload that does not decode counts as a failed call.
    pub async fn structured<T: DeserializeOwned>(
        &self,
        log: &CallLog,
        component: &str,
        prompt: &str,
        schema_hint: &str,
    ) -> Result<T, LlmError> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.timeout,
            self.client.generate_structured_response(prompt, schema_hint),
        )
        .await;

        let result = match outcome {
            Ok(Ok(response)) => {
                debug!(
                    component,
                    reported_ms = response.processing_time_ms,
                    confidence = response.confidence,
                    "AI structured response"
                );
                serde_json::from_value::<T>(response.data).map_err(LlmError::Parse)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(LlmError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }),
        };

        log.record_call(component, started.elapsed(), result.is_ok());
        if let Err(e) = &result {
            warn!(component, "AI structured call failed: {e}");
        }
        result
    }

    /// Free-text call. Empty answers count as failures.
    pub async fn text(&self, log: &CallLog, component: &str, prompt: &str) -> Result<String, LlmError> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.client.generate_text(prompt)).await;

        let result = match outcome {
            Ok(Ok(response)) if !response.data.trim().is_empty() => Ok(response.data),
            Ok(Ok(_)) => Err(LlmError::EmptyContent),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(LlmError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }),
        };

        log.record_call(component, started.elapsed(), result.is_ok());
        if let Err(e) = &result {
            warn!(component, "AI text call failed: {e}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{FailingAiClient, ScriptedAiClient, SlowAiClient};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        value: u32,
    }

    #[tokio::test]
    async fn test_structured_decodes_and_records_success() {
        let client = ScriptedAiClient::new().with_structured("Probe", json!({"value": 7}));
        let gateway = AiGateway::new(Arc::new(client), Duration::from_secs(5));
        let log = CallLog::new();

        let probe: Probe = gateway
            .structured(&log, "probe", "prompt", "Probe {value}")
            .await
            .unwrap();

        assert_eq!(probe.value, 7);
        let t = log.snapshot();
        assert_eq!(t.total_calls(), 1);
        assert_eq!(t.failed_calls(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_a_failed_call() {
        let client = ScriptedAiClient::new().with_structured("Probe", json!({"value": "seven"}));
        let gateway = AiGateway::new(Arc::new(client), Duration::from_secs(5));
        let log = CallLog::new();

        let result: Result<Probe, _> = gateway.structured(&log, "probe", "p", "Probe").await;
        assert!(matches!(result, Err(LlmError::Parse(_))));
        assert_eq!(log.snapshot().failed_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_client_times_out() {
        let gateway = AiGateway::new(
            Arc::new(SlowAiClient::new(Duration::from_secs(60))),
            Duration::from_millis(500),
        );
        let log = CallLog::new();

        let result = gateway.text(&log, "industry", "classify").await;
        assert!(matches!(result, Err(LlmError::Timeout { after_ms: 500 })));
        assert_eq!(log.snapshot().failed_calls(), 1);
    }

    #[tokio::test]
    async fn test_failing_client_text_is_error() {
        let gateway = AiGateway::new(Arc::new(FailingAiClient), Duration::from_secs(1));
        let log = CallLog::new();
        assert!(gateway.text(&log, "industry", "x").await.is_err());
    }
}
