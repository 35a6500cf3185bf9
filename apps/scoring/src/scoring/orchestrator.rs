//! Scoring Orchestrator: caches JDs, runs the analyzers, weights their scores and
//! publishes the outcome.
//!
//! Enhanced path: skills ‖ experience ‖ cultural fit (concurrently), education,
//! seniority weights, confidence report. Any error there falls back to the basic
//! scorer; the result is still published, flagged low-confidence.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::publisher::{publish_event, EventPublisher, PublishOutcome};
use crate::llm_client::AiGateway;
use crate::models::events::{
    EventError, FailureStage, JdExtractedEvent, PerformanceSummary, QualitySummary,
    ResumeParsedEvent, ScoringCompletedEvent, ScoringFailedEvent, SUBJECT_SCORING_COMPLETED,
    SUBJECT_SCORING_FAILED,
};
use crate::models::jd::JobDescription;
use crate::models::resume::ResumeDto;
use crate::models::score::{ConfidenceLevel, ScoreComponent};
use crate::scoring::confidence::{ConfidenceEngine, ConfidenceInput, ConfidenceReport};
use crate::scoring::cultural_fit::{CulturalFitAnalyzer, CulturalFitScore};
use crate::scoring::experience::{ExperienceAnalyzer, ExperienceRequirements, ExperienceScore};
use crate::scoring::fallback::basic_score;
use crate::scoring::jd_cache::JdCache;
use crate::scoring::jd_mapping::job_description_from_extracted;
use crate::scoring::skill_matcher::{SkillMatchResult, SkillMatcher};
use crate::scoring::telemetry::{CallLog, ProcessingTelemetry};
use crate::scoring::weights::{candidate_education_level, education_score, ScoringWeights};

/// Cultural-fit score used when the JD carries no company profile.
const NO_PROFILE_CULTURAL_SCORE: f64 = 75.0;
const NO_PROFILE_CULTURAL_CONFIDENCE: f64 = 0.5;
const EDUCATION_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("non-finite {0} score")]
    NonFinite(&'static str),
}

// ────────────────────────────────────────────────────────────────────────────
// Result types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMetrics {
    /// Milliseconds.
    #[serde(rename = "totalTime")]
    pub total_time_ms: u64,
    /// Sum of AI call latencies in milliseconds; exceeds wall time when calls overlapped.
    #[serde(rename = "aiTime")]
    pub ai_time_ms: u64,
    pub fallbacks_used: u32,
    /// 0–1.
    pub fallback_rate: f64,
    pub confidence_level: ConfidenceLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedAnalyses {
    pub skills: SkillMatchResult,
    pub experience: ExperienceScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_fit: Option<CulturalFitScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDto {
    pub score_id: Uuid,
    pub job_id: String,
    pub resume_id: String,
    /// 0–100.
    pub overall_score: u32,
    pub skills: ScoreComponent,
    pub experience: ScoreComponent,
    pub education: ScoreComponent,
    pub cultural_fit: ScoreComponent,
    /// Full analyzer output; absent when the basic scorer produced the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced: Option<EnhancedAnalyses>,
    pub weights: ScoringWeights,
    pub confidence_report: ConfidenceReport,
    pub processing_metrics: ProcessingMetrics,
    pub scored_at: DateTime<Utc>,
}

impl ScoreDto {
    /// Components that were actually computed rather than substituted.
    pub fn components_processed(&self) -> u32 {
        match &self.enhanced {
            Some(enhanced) if enhanced.cultural_fit.is_some() => 4,
            _ => 3,
        }
    }
}

/// Borrowed inputs for one scoring run.
pub struct ScoringRequest<'a> {
    pub job_id: &'a str,
    pub resume_id: &'a str,
    pub jd: &'a JobDescription,
    pub resume: &'a ResumeDto,
}

/// Result of handling one validated `resume.parsed` event. Both variants have already
/// been published, so neither should trigger a redelivery upstream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResumeOutcome {
    Completed {
        #[serde(rename = "matchScore")]
        match_score: Box<ScoreDto>,
        published: PublishOutcome,
    },
    Failed {
        stage: FailureStage,
        error: EventError,
        published: PublishOutcome,
    },
}

impl ResumeOutcome {
    pub fn published(&self) -> &PublishOutcome {
        match self {
            ResumeOutcome::Completed { published, .. } | ResumeOutcome::Failed { published, .. } => published,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

pub struct ScoringService {
    skill_matcher: SkillMatcher,
    experience: ExperienceAnalyzer,
    cultural_fit: CulturalFitAnalyzer,
    confidence: ConfidenceEngine,
    cache: JdCache,
    publisher: Arc<dyn EventPublisher>,
}

impl ScoringService {
    /// Fails fast on unusable dependencies instead of checking them per call.
    pub fn new(ai: AiGateway, cache: JdCache, publisher: Arc<dyn EventPublisher>) -> Result<Self, AppError> {
        if ai.timeout().is_zero() {
            return Err(AppError::Validation("AI timeout must be greater than zero".to_string()));
        }
        if cache.capacity() == 0 || cache.ttl().is_zero() {
            return Err(AppError::Validation(
                "JD cache needs a positive capacity and TTL".to_string(),
            ));
        }

        Ok(Self {
            skill_matcher: SkillMatcher::new(ai.clone()),
            experience: ExperienceAnalyzer::new(ai.clone()),
            cultural_fit: CulturalFitAnalyzer::new(ai),
            confidence: ConfidenceEngine::new(),
            cache,
            publisher,
        })
    }

    pub async fn cached_jd_count(&self) -> usize {
        self.cache.len().await
    }

    /// Caches the JD for `jobId`, overwriting any earlier extraction.
    pub async fn handle_jd_extracted(&self, event: JdExtractedEvent) -> Result<JobDescription, AppError> {
        let job_id = require_field(event.job_id, "jobId")?;
        let data = event
            .extracted_data
            .ok_or_else(|| AppError::Validation("jd.extracted is missing extractedData".to_string()))?;

        let jd = job_description_from_extracted(&job_id, &data);
        info!(
            job_id = %job_id,
            skills = jd.required_skills.len(),
            seniority = ?jd.seniority,
            "JD cached"
        );
        self.cache.insert(jd.clone()).await;
        Ok(jd)
    }

    /// Scores one resume and publishes `scoring.completed`, or publishes `scoring.failed`.
    /// Only validation errors are returned as `Err`; a missing JD or a scoring failure is
    /// a published `Failed` outcome.
    pub async fn handle_resume_parsed(&self, event: ResumeParsedEvent) -> Result<ResumeOutcome, AppError> {
        let retry_attempt = event.retry_attempt.unwrap_or(0);
        let ids = (event.job_id.clone(), event.resume_id.clone());

        let (job_id, resume_id, resume) = match validate_resume_event(event) {
            Ok(valid) => valid,
            Err(error) => {
                warn!("Rejected resume.parsed event: {error}");
                if let (Some(job_id), Some(resume_id)) = ids {
                    self.publish_failed(&job_id, &resume_id, &error, FailureStage::Validation, retry_attempt)
                        .await;
                }
                return Err(error);
            }
        };

        let Some(jd) = self.cache.get(&job_id).await else {
            let error = AppError::MissingJd { job_id: job_id.clone() };
            warn!(job_id = %job_id, resume_id = %resume_id, "No cached JD for resume");
            return Ok(self
                .failed_outcome(&job_id, &resume_id, &error, FailureStage::JdLookup, retry_attempt)
                .await);
        };

        let request = ScoringRequest {
            job_id: &job_id,
            resume_id: &resume_id,
            jd: &jd,
            resume: &resume,
        };
        let score = match self.score_resume(&request).await {
            Ok(score) => score,
            Err(error) => {
                warn!(job_id = %job_id, resume_id = %resume_id, "Basic scorer failed too: {error}");
                return Ok(self
                    .failed_outcome(&job_id, &resume_id, &error, FailureStage::Scoring, retry_attempt)
                    .await);
            }
        };

        let event = completed_event(score);
        let published = publish_event(self.publisher.as_ref(), SUBJECT_SCORING_COMPLETED, &event).await;
        Ok(ResumeOutcome::Completed {
            match_score: Box::new(event.match_score),
            published,
        })
    }

    /// Enhanced scoring with the basic scorer as fallback. Errs only if both fail.
    pub async fn score_resume(&self, request: &ScoringRequest<'_>) -> Result<ScoreDto, AppError> {
        let started = Instant::now();
        let today = Utc::now().date_naive();
        let log = CallLog::new();

        match self.score_enhanced(request, today, &log, started).await {
            Ok(score) => {
                info!(
                    job_id = request.job_id,
                    resume_id = request.resume_id,
                    score = score.overall_score,
                    fallbacks = score.processing_metrics.fallbacks_used,
                    elapsed_ms = score.processing_metrics.total_time_ms,
                    "Resume scored"
                );
                Ok(score)
            }
            Err(e) => {
                warn!(
                    job_id = request.job_id,
                    resume_id = request.resume_id,
                    "Enhanced scoring failed, using basic scorer: {e}"
                );
                let ai_time_ms = log.snapshot().ai_time_ms();
                basic_score(request, today, elapsed_ms(started), ai_time_ms).map_err(|e| AppError::Internal(e.into()))
            }
        }
    }

    async fn score_enhanced(
        &self,
        request: &ScoringRequest<'_>,
        today: NaiveDate,
        log: &CallLog,
        started: Instant,
    ) -> Result<ScoreDto, ScoringError> {
        let jd = request.jd;
        let resume = request.resume;
        let requirements = ExperienceRequirements::from_jd(jd);

        let cultural = async {
            match &jd.company_profile {
                Some(profile) => Some(self.cultural_fit.analyze(resume, profile, jd, log).await),
                None => None,
            }
        };
        let (skills, experience, cultural) = tokio::join!(
            self.skill_matcher.match_skills(&jd.required_skills, &resume.skills, log),
            self.experience.analyze(
                &resume.work_experience,
                &requirements,
                jd.industry_context.as_deref(),
                today,
                log,
            ),
            cultural,
        );

        let skills_component = skills.component();
        let experience_component = experience.component();
        let cultural_component = match &cultural {
            Some(score) => score.component(),
            None => ScoreComponent::new(NO_PROFILE_CULTURAL_SCORE, NO_PROFILE_CULTURAL_CONFIDENCE, 0.0)
                .with_detail("companyProfileProvided", 0.0),
        };
        let candidate_level = candidate_education_level(&resume.education);
        let education_component = ScoreComponent::new(
            education_score(candidate_level, jd.education_level),
            EDUCATION_CONFIDENCE,
            if resume.education.is_empty() { 0.0 } else { 100.0 },
        )
        .with_detail("candidateLevel", candidate_level.rank() as f64)
        .with_detail("requiredLevel", jd.education_level.rank() as f64);

        for (name, component) in [
            ("skills", &skills_component),
            ("experience", &experience_component),
            ("education", &education_component),
            ("cultural fit", &cultural_component),
        ] {
            if !component.score.is_finite() {
                return Err(ScoringError::NonFinite(name));
            }
        }

        let weights = ScoringWeights::for_seniority(jd.seniority);
        let raw = weights.weighted_sum(
            skills_component.score,
            experience_component.score,
            education_component.score,
            cultural_component.score,
        );
        if !raw.is_finite() {
            return Err(ScoringError::NonFinite("overall"));
        }
        let overall_score = raw.round().clamp(0.0, 100.0) as u32;

        let telemetry = log.snapshot();
        debug!(
            calls = telemetry.total_calls(),
            failed_calls = telemetry.failed_calls(),
            fallbacks = telemetry.fallbacks_used(),
            "AI activity for resume"
        );
        let confidence_report = self.confidence.assess(&ConfidenceInput {
            skills: &skills_component,
            experience: &experience_component,
            cultural_fit: &cultural_component,
            resume,
            telemetry: &telemetry,
            current_score: overall_score as f64,
            today,
        });
        let confidence_level = resolve_confidence_level(&confidence_report, &telemetry);

        Ok(ScoreDto {
            score_id: Uuid::new_v4(),
            job_id: request.job_id.to_string(),
            resume_id: request.resume_id.to_string(),
            overall_score,
            skills: skills_component,
            experience: experience_component,
            education: education_component,
            cultural_fit: cultural_component,
            enhanced: Some(EnhancedAnalyses {
                skills,
                experience,
                cultural_fit: cultural,
            }),
            weights,
            confidence_report,
            processing_metrics: ProcessingMetrics {
                total_time_ms: elapsed_ms(started),
                ai_time_ms: telemetry.ai_time_ms(),
                fallbacks_used: telemetry.fallbacks_used(),
                fallback_rate: telemetry.fallback_rate(),
                confidence_level,
            },
            scored_at: Utc::now(),
        })
    }

    async fn failed_outcome(
        &self,
        job_id: &str,
        resume_id: &str,
        error: &AppError,
        stage: FailureStage,
        retry_attempt: u32,
    ) -> ResumeOutcome {
        let published = self
            .publish_failed(job_id, resume_id, error, stage, retry_attempt)
            .await;
        ResumeOutcome::Failed {
            stage,
            error: EventError {
                message: error.to_string(),
                name: error.name().to_string(),
            },
            published,
        }
    }

    async fn publish_failed(
        &self,
        job_id: &str,
        resume_id: &str,
        error: &AppError,
        stage: FailureStage,
        retry_attempt: u32,
    ) -> PublishOutcome {
        let event = ScoringFailedEvent {
            job_id: job_id.to_string(),
            resume_id: resume_id.to_string(),
            error: EventError {
                message: error.to_string(),
                name: error.name().to_string(),
            },
            stage,
            retry_attempt,
        };
        publish_event(self.publisher.as_ref(), SUBJECT_SCORING_FAILED, &event).await
    }
}

fn require_field(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("missing required field '{field}'")))
}

fn validate_resume_event(event: ResumeParsedEvent) -> Result<(String, String, ResumeDto), AppError> {
    let job_id = require_field(event.job_id, "jobId")?;
    let resume_id = require_field(event.resume_id, "resumeId")?;
    let resume = event
        .resume_dto
        .ok_or_else(|| AppError::Validation("missing required field 'resumeDto'".to_string()))?;
    Ok((job_id, resume_id, resume))
}

/// From the report's 0–100 confidence: high > 0.8, medium > 0.6. Capped at medium
/// when any fallback ran, low when at least half the AI work fell back.
fn resolve_confidence_level(report: &ConfidenceReport, telemetry: &ProcessingTelemetry) -> ConfidenceLevel {
    let level = ConfidenceLevel::from_ratio(report.overall_confidence / 100.0);
    if telemetry.fallbacks_used() == 0 {
        return level;
    }
    if telemetry.fallback_rate() >= 0.5 {
        return ConfidenceLevel::Low;
    }
    match level {
        ConfidenceLevel::High => ConfidenceLevel::Medium,
        other => other,
    }
}

fn completed_event(score: ScoreDto) -> ScoringCompletedEvent {
    let metrics = &score.processing_metrics;
    let total = metrics.total_time_ms;
    ScoringCompletedEvent {
        job_id: score.job_id.clone(),
        resume_id: score.resume_id.clone(),
        processing_time_ms: total,
        performance: PerformanceSummary {
            total_processing_time: total,
            ai_analysis_time: metrics.ai_time_ms,
            efficiency: (metrics.ai_time_ms as f64 / total.max(1) as f64 * 100.0).round() / 100.0,
            fallback_rate: metrics.fallback_rate,
        },
        quality: QualitySummary {
            confidence_level: metrics.confidence_level,
            components_processed: score.components_processed(),
        },
        match_score: score,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
