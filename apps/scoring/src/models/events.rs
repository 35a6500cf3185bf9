//! Wire format of the inbound extraction events and outbound scoring events.
//!
//! Inbound payloads keep every required field optional so that a missing field
//! surfaces as a `ValidationError` naming the field, not as a serde failure.

use serde::{Deserialize, Serialize};

use crate::models::jd::CompanyProfile;
use crate::models::resume::ResumeDto;
use crate::models::score::ConfidenceLevel;
use crate::scoring::orchestrator::ScoreDto;

pub const SUBJECT_SCORING_COMPLETED: &str = "scoring.completed";
pub const SUBJECT_SCORING_FAILED: &str = "scoring.failed";

/// A technical requirement as the extractor emits it: a bare name or a detailed object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TechnicalRequirement {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        weight: Option<f64>,
        #[serde(default)]
        required: Option<bool>,
        #[serde(default)]
        category: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedRequirements {
    pub technical: Vec<TechnicalRequirement>,
    pub soft: Vec<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
}

/// Only the industry is scored; other company keys (name, size) are accepted and ignored.
/// Cultural fit needs a full `companyProfile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedCompany {
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedJdData {
    pub requirements: ExtractedRequirements,
    pub company: ExtractedCompany,
    pub company_profile: Option<CompanyProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdExtractedEvent {
    pub job_id: Option<String>,
    pub extracted_data: Option<ExtractedJdData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeParsedEvent {
    pub job_id: Option<String>,
    pub resume_id: Option<String>,
    pub resume_dto: Option<ResumeDto>,
    /// Delivery attempt as reported by the bus bridge; 0 on first delivery.
    #[serde(default)]
    pub retry_attempt: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub total_processing_time: u64,
    pub ai_analysis_time: u64,
    pub efficiency: f64,
    pub fallback_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySummary {
    pub confidence_level: ConfidenceLevel,
    pub components_processed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringCompletedEvent {
    pub job_id: String,
    pub resume_id: String,
    pub match_score: ScoreDto,
    pub processing_time_ms: u64,
    pub performance: PerformanceSummary,
    pub quality: QualitySummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventError {
    pub message: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Validation,
    JdLookup,
    Scoring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringFailedEvent {
    pub job_id: String,
    pub resume_id: String,
    pub error: EventError,
    pub stage: FailureStage,
    pub retry_attempt: u32,
}
