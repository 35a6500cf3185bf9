//! Publishers for tests.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::events::publisher::EventPublisher;

/// Captures every published event as `(subject, payload)`.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().await.clone()
    }

    pub async fn subjects(&self) -> Vec<String> {
        self.events.lock().await.iter().map(|(s, _)| s.clone()).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, subject: &str, payload: String) -> Result<(), AppError> {
        let value: Value = serde_json::from_str(&payload).map_err(|e| AppError::Publish(e.to_string()))?;
        self.events.lock().await.push((subject.to_string(), value));
        Ok(())
    }
}

pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _subject: &str, _payload: String) -> Result<(), AppError> {
        Err(AppError::Publish("bus unavailable".to_string()))
    }
}
