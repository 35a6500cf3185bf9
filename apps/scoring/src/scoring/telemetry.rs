//! Per-run processing telemetry: AI call latencies, failures and fallbacks.
//!
//! One `CallLog` is created per scored resume and shared by the analyzers running
//! concurrently for it. The confidence engine only ever sees the immutable
//! `ProcessingTelemetry` snapshot.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub component: String,
    pub latency_ms: u64,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<CallRecord>>,
    fallbacks: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_call(&self, component: &str, latency: Duration, succeeded: bool) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(CallRecord {
                component: component.to_string(),
                latency_ms: latency.as_millis() as u64,
                succeeded,
            });
        }
    }

    /// Marks that `component` substituted its deterministic fallback.
    pub fn record_fallback(&self, component: &str) {
        if let Ok(mut fallbacks) = self.fallbacks.lock() {
            fallbacks.push(component.to_string());
        }
    }

    pub fn snapshot(&self) -> ProcessingTelemetry {
        let calls = self.calls.lock().map(|c| c.clone()).unwrap_or_default();
        let fallbacks = self.fallbacks.lock().map(|f| f.clone()).unwrap_or_default();
        ProcessingTelemetry { calls, fallbacks }
    }
}

/// Immutable view of one run's AI activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTelemetry {
    pub calls: Vec<CallRecord>,
    pub fallbacks: Vec<String>,
}

impl ProcessingTelemetry {
    pub fn total_calls(&self) -> usize {
        self.calls.len()
    }

    pub fn failed_calls(&self) -> usize {
        self.calls.iter().filter(|c| !c.succeeded).count()
    }

    pub fn fallbacks_used(&self) -> u32 {
        self.fallbacks.len() as u32
    }

    /// Sum of AI latencies. Calls run concurrently, so this can exceed wall time.
    pub fn ai_time_ms(&self) -> u64 {
        self.calls.iter().map(|c| c.latency_ms).sum()
    }

    pub fn average_latency_ms(&self) -> f64 {
        if self.calls.is_empty() {
            return 0.0;
        }
        self.ai_time_ms() as f64 / self.calls.len() as f64
    }

    /// fallbacks / max(calls, 1), clamped to 1.
    pub fn fallback_rate(&self) -> f64 {
        let calls = self.calls.len().max(1) as f64;
        (self.fallbacks.len() as f64 / calls).min(1.0)
    }

    /// Mean of the per-component failure ratios.
    pub fn average_error_rate(&self) -> f64 {
        let mut per_component: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for call in &self.calls {
            let entry = per_component.entry(call.component.as_str()).or_default();
            entry.0 += 1;
            if !call.succeeded {
                entry.1 += 1;
            }
        }
        if per_component.is_empty() {
            return 0.0;
        }
        let sum: f64 = per_component
            .values()
            .map(|(total, failed)| *failed as f64 / *total as f64)
            .sum();
        sum / per_component.len() as f64
    }
}
