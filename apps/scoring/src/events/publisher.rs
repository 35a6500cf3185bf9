//! Outbound event delivery.
//!
//! Publishing never throws past this module: failures come back as a
//! `PublishOutcome { success: false, .. }` and are logged. Redelivery is the bus's job.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublishOutcome {
    pub fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Sends an already-serialized event on `subject`.
    async fn publish(&self, subject: &str, payload: String) -> Result<(), AppError>;
}

/// Serializes `event` and publishes it, converting any failure into a logged outcome.
pub async fn publish_event<T: Serialize>(
    publisher: &dyn EventPublisher,
    subject: &str,
    event: &T,
) -> PublishOutcome {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(e) => {
            error!(subject, "Failed to serialize outbound event: {e}");
            return PublishOutcome::failed(format!("serialization failed: {e}"));
        }
    };

    match publisher.publish(subject, payload).await {
        Ok(()) => PublishOutcome::delivered(),
        Err(e) => {
            error!(subject, "Failed to publish event: {e}");
            PublishOutcome::failed(e.to_string())
        }
    }
}

/// PUBLISHes events on Redis channels named after the subject.
pub struct RedisEventPublisher {
    client: redis::Client,
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RedisEventPublisher {
    pub fn new(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Publish(format!("invalid Redis URL: {e}")))?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, AppError> {
        let mut cached = self.connection.lock().await;
        if let Some(conn) = cached.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Publish(format!("Redis connection failed: {e}")))?;
        *cached = Some(conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, subject: &str, payload: String) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<i64> = conn.publish(subject, payload).await;
        match result {
            Ok(receivers) => {
                info!(subject, receivers, "Event published");
                Ok(())
            }
            Err(e) => {
                // Force a reconnect on the next publish.
                *self.connection.lock().await = None;
                Err(AppError::Publish(format!("Redis PUBLISH failed: {e}")))
            }
        }
    }
}

/// Used when no bus is configured: events only reach the log.
pub struct LogEventPublisher;

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(&self, subject: &str, payload: String) -> Result<(), AppError> {
        info!(subject, bytes = payload.len(), "Event published (log only)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::{FailingPublisher, RecordingPublisher};
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_event_records_payload() {
        let publisher = RecordingPublisher::new();
        let outcome = publish_event(&publisher, "scoring.completed", &json!({"jobId": "job-1"})).await;
        assert_eq!(outcome, PublishOutcome::delivered());

        let events = publisher.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "scoring.completed");
        assert_eq!(events[0].1["jobId"], "job-1");
    }

    #[tokio::test]
    async fn test_publish_failure_is_returned_not_thrown() {
        let outcome = publish_event(&FailingPublisher, "scoring.failed", &json!({})).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("bus unavailable"));
    }

    #[tokio::test]
    async fn test_log_publisher_always_succeeds() {
        let outcome = publish_event(&LogEventPublisher, "scoring.completed", &json!({"a": 1})).await;
        assert!(outcome.success);
    }

    #[test]
    fn test_invalid_redis_url_is_rejected() {
        assert!(RedisEventPublisher::new("not a url").is_err());
    }
}
