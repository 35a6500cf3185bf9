use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One scoring dimension as consumed by the orchestrator and the confidence engine.
///
/// `score` and `evidence_strength` are on a 0–100 scale; `confidence` stays on the
/// analyzer-level 0–1 scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponent {
    pub score: f64,
    pub confidence: f64,
    pub evidence_strength: f64,
    pub breakdown: BTreeMap<String, f64>,
}

impl ScoreComponent {
    pub fn new(score: f64, confidence: f64, evidence_strength: f64) -> Self {
        Self {
            score: score.clamp(0.0, 100.0),
            confidence: confidence.clamp(0.0, 1.0),
            evidence_strength: evidence_strength.clamp(0.0, 100.0),
            breakdown: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: f64) -> Self {
        self.breakdown.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Maps a 0–100 certainty score: high ≥ 80, medium ≥ 60, low otherwise.
    pub fn from_report_score(score: f64) -> Self {
        if score >= 80.0 {
            ConfidenceLevel::High
        } else if score >= 60.0 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Maps a 0–1 confidence: high > 0.8, medium > 0.6, low otherwise.
    pub fn from_ratio(confidence: f64) -> Self {
        if confidence > 0.8 {
            ConfidenceLevel::High
        } else if confidence > 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}
