//! Confidence / Reliability Engine: how trustworthy is a computed match score?
//!
//! Pure function of the component scores, the resume and the run's telemetry.
//! Reports on the 0–100 scale; analyzer confidences (0–1) are multiplied by 100
//! where they enter a report-level formula.
//!
//! dataQuality          = 0.3·completeness + 0.25·consistency + 0.2·recency + 0.25·detail
//! analysisReliability  = 0.3·algorithm + 0.25·aiResponseQuality + 0.25·evidence + 0.2·crossValidation
//! stabilityScore       = 100 − 10·RMS((100 − confidence%) / 10)
//! certainty            = 0.4·stability + 0.35·dataQuality + 0.25·reliability
//! overallConfidence    = 0.3·dataQuality + 0.35·reliability + 0.2·stability + 0.15·certainty

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::resume::{months_between, ResumeDto};
use crate::models::score::{ConfidenceLevel, ScoreComponent};
use crate::scoring::telemetry::ProcessingTelemetry;

const BAND_Z: f64 = 1.96;
const FALLBACK_CONFIDENCE: f64 = 50.0;
const FALLBACK_BAND_HALF_WIDTH: f64 = 15.0;

#[derive(Debug, Error)]
pub enum ConfidenceError {
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Everything the engine reads. Borrowed; the engine never mutates its inputs.
pub struct ConfidenceInput<'a> {
    pub skills: &'a ScoreComponent,
    pub experience: &'a ScoreComponent,
    pub cultural_fit: &'a ScoreComponent,
    pub resume: &'a ResumeDto,
    pub telemetry: &'a ProcessingTelemetry,
    /// The point score the reliability band is centred on.
    pub current_score: f64,
    pub today: NaiveDate,
}

impl ConfidenceInput<'_> {
    fn components(&self) -> [(&'static str, &ScoreComponent); 3] {
        [
            ("skills", self.skills),
            ("experience", self.experience),
            ("culturalFit", self.cultural_fit),
        ]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Report types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub score: f64,
    pub factors: BTreeMap<String, f64>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReliability {
    pub score: f64,
    pub factors: BTreeMap<String, f64>,
    pub uncertainties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreVariance {
    pub per_component: BTreeMap<String, f64>,
    pub overall: f64,
    pub stability_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationCertainty {
    pub level: ConfidenceLevel,
    pub score: f64,
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceMetrics {
    pub data_quality: DataQuality,
    pub analysis_reliability: AnalysisReliability,
    pub score_variance: ScoreVariance,
    pub recommendation_certainty: RecommendationCertainty,
}

/// `min_score ≤ most_likely_score ≤ max_score`, all within [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityBand {
    pub min_score: f64,
    pub most_likely_score: f64,
    pub max_score: f64,
}

impl ReliabilityBand {
    fn around(centre: f64, half_width: f64) -> Self {
        let centre = if centre.is_finite() { centre.clamp(0.0, 100.0) } else { 50.0 };
        Self {
            min_score: (centre - half_width).clamp(0.0, 100.0),
            most_likely_score: centre,
            max_score: (centre + half_width).clamp(0.0, 100.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceGrades {
    pub overall: Grade,
    pub data_quality: Grade,
    pub analysis_reliability: Grade,
    pub score_stability: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceReport {
    /// 0–100.
    pub overall_confidence: f64,
    pub metrics: ConfidenceMetrics,
    pub reliability_band: ReliabilityBand,
    pub grades: ConfidenceGrades,
    pub fallback_used: bool,
}

impl ConfidenceReport {
    /// The fixed report used when assessment itself fails.
    pub fn fallback(skills_score: f64) -> Self {
        let neutral = FALLBACK_CONFIDENCE;
        Self {
            overall_confidence: neutral,
            metrics: ConfidenceMetrics {
                data_quality: DataQuality {
                    score: neutral,
                    factors: BTreeMap::new(),
                    issues: vec!["Confidence assessment unavailable".to_string()],
                },
                analysis_reliability: AnalysisReliability {
                    score: neutral,
                    factors: BTreeMap::new(),
                    uncertainties: vec!["Confidence assessment unavailable".to_string()],
                },
                score_variance: ScoreVariance {
                    per_component: BTreeMap::new(),
                    overall: FALLBACK_BAND_HALF_WIDTH / BAND_Z,
                    stability_score: neutral,
                },
                recommendation_certainty: RecommendationCertainty {
                    level: ConfidenceLevel::Low,
                    score: neutral,
                    risk_factors: vec!["Confidence assessment unavailable".to_string()],
                },
            },
            reliability_band: ReliabilityBand::around(skills_score, FALLBACK_BAND_HALF_WIDTH),
            grades: ConfidenceGrades {
                overall: Grade::C,
                data_quality: Grade::C,
                analysis_reliability: Grade::C,
                score_stability: Grade::C,
            },
            fallback_used: true,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceEngine;

impl ConfidenceEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(&self, input: &ConfidenceInput<'_>) -> ConfidenceReport {
        match compute_report(input) {
            Ok(report) => {
                debug!(
                    overall_confidence = report.overall_confidence,
                    level = report.metrics.recommendation_certainty.level.as_str(),
                    "Confidence assessed"
                );
                report
            }
            Err(e) => {
                warn!("Confidence assessment failed, using fixed report: {e}");
                ConfidenceReport::fallback(input.skills.score)
            }
        }
    }
}

fn compute_report(input: &ConfidenceInput<'_>) -> Result<ConfidenceReport, ConfidenceError> {
    for (name, component) in input.components() {
        if !component.score.is_finite() || !component.confidence.is_finite() || !component.evidence_strength.is_finite() {
            return Err(ConfidenceError::NonFinite(name));
        }
    }
    if !input.current_score.is_finite() {
        return Err(ConfidenceError::NonFinite("current score"));
    }

    let data_quality = assess_data_quality(input.resume, input.today);
    let analysis_reliability = assess_analysis_reliability(input)?;
    let score_variance = assess_variance(input)?;
    let recommendation_certainty =
        assess_certainty(&data_quality, &analysis_reliability, &score_variance, input.telemetry);

    let overall_confidence = (0.3 * data_quality.score
        + 0.35 * analysis_reliability.score
        + 0.2 * score_variance.stability_score
        + 0.15 * recommendation_certainty.score)
        .clamp(0.0, 100.0);
    if !overall_confidence.is_finite() {
        return Err(ConfidenceError::NonFinite("overall confidence"));
    }

    let reliability_band = ReliabilityBand::around(input.current_score, BAND_Z * score_variance.overall);
    let grades = ConfidenceGrades {
        overall: Grade::from_score(overall_confidence),
        data_quality: Grade::from_score(data_quality.score),
        analysis_reliability: Grade::from_score(analysis_reliability.score),
        score_stability: Grade::from_score(score_variance.stability_score),
    };

    Ok(ConfidenceReport {
        overall_confidence: round1(overall_confidence),
        metrics: ConfidenceMetrics {
            data_quality,
            analysis_reliability,
            score_variance,
            recommendation_certainty,
        },
        reliability_band,
        grades,
        fallback_used: false,
    })
}

// ── data quality ────────────────────────────────────────────────────────────

fn assess_data_quality(resume: &ResumeDto, today: NaiveDate) -> DataQuality {
    let mut issues = Vec::new();
    let completeness = completeness_score(resume, &mut issues);
    let consistency = consistency_score(resume, today, &mut issues);
    let recency = recency_score(resume, today, &mut issues);
    let detail = detail_score(resume, &mut issues);

    let score = 0.3 * completeness + 0.25 * consistency + 0.2 * recency + 0.25 * detail;
    let factors = BTreeMap::from([
        ("completeness".to_string(), completeness),
        ("consistency".to_string(), consistency),
        ("recency".to_string(), recency),
        ("detail".to_string(), detail),
    ]);
    DataQuality {
        score: round1(score.clamp(0.0, 100.0)),
        factors,
        issues,
    }
}

/// Contact fields 10 each (name, email, phone, location); skills 20; work history 25; education 15.
fn completeness_score(resume: &ResumeDto, issues: &mut Vec<String>) -> f64 {
    let contact = &resume.contact_info;
    let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());
    let mut score = 0.0;

    for (label, field) in [
        ("name", &contact.name),
        ("email", &contact.email),
        ("phone", &contact.phone),
        ("location", &contact.location),
    ] {
        if present(field) {
            score += 10.0;
        } else {
            issues.push(format!("Missing contact {label}"));
        }
    }
    if resume.skills.is_empty() {
        issues.push("No skills listed".to_string());
    } else {
        score += 20.0;
    }
    if resume.work_experience.is_empty() {
        issues.push("No work experience listed".to_string());
    } else {
        let complete = resume
            .work_experience
            .iter()
            .filter(|j| !j.company.trim().is_empty() && !j.position.trim().is_empty())
            .count();
        score += 25.0 * complete as f64 / resume.work_experience.len() as f64;
        if complete < resume.work_experience.len() {
            issues.push("Some jobs are missing company or position".to_string());
        }
    }
    if resume.education.is_empty() {
        issues.push("No education listed".to_string());
    } else {
        score += 15.0;
    }
    score
}

/// Starts at 100: −15 per unparseable start date, −20 per end-before-start, −10 per overlap > 1 month.
fn consistency_score(resume: &ResumeDto, today: NaiveDate, issues: &mut Vec<String>) -> f64 {
    let mut score: f64 = 100.0;
    let mut spans = Vec::new();

    for job in &resume.work_experience {
        match (job.start(), job.end(today)) {
            (None, _) => {
                score -= 15.0;
                issues.push(format!("Unreadable start date at {}", job.company));
            }
            (Some(start), Some(end)) if end < start => {
                score -= 20.0;
                issues.push(format!("End date precedes start date at {}", job.company));
            }
            (Some(start), Some(end)) => spans.push((start, end)),
            (Some(_), None) => {
                score -= 15.0;
                issues.push(format!("Unreadable end date at {}", job.company));
            }
        }
    }

    spans.sort();
    let overlaps = spans
        .windows(2)
        .filter(|pair| months_between(pair[1].0, pair[0].1) > 1)
        .count();
    if overlaps > 0 {
        score -= 10.0 * overlaps as f64;
        issues.push(format!("{overlaps} overlapping job period(s)"));
    }
    score.max(0.0)
}

/// Time since the most recent job ended.
fn recency_score(resume: &ResumeDto, today: NaiveDate, issues: &mut Vec<String>) -> f64 {
    let latest_end = resume.work_experience.iter().filter_map(|j| j.end(today)).max();
    let Some(latest_end) = latest_end else {
        issues.push("No datable work history".to_string());
        return 20.0;
    };

    match months_between(latest_end, today) {
        m if m <= 0 => 100.0,
        m if m <= 6 => 90.0,
        m if m <= 12 => 75.0,
        m if m <= 24 => {
            issues.push("Last role ended over a year ago".to_string());
            55.0
        }
        _ => {
            issues.push("Last role ended over two years ago".to_string());
            30.0
        }
    }
}

/// Half from average summary length, half from skill count.
fn detail_score(resume: &ResumeDto, issues: &mut Vec<String>) -> f64 {
    let jobs = &resume.work_experience;
    let average_summary = if jobs.is_empty() {
        0.0
    } else {
        jobs.iter().map(|j| j.summary.trim().chars().count()).sum::<usize>() as f64 / jobs.len() as f64
    };
    let summary_points = match average_summary {
        a if a >= 200.0 => 50.0,
        a if a >= 100.0 => 35.0,
        a if a >= 50.0 => 20.0,
        _ => {
            issues.push("Job summaries are short or missing".to_string());
            5.0
        }
    };
    let skill_points = match resume.skills.len() {
        n if n >= 10 => 50.0,
        n if n >= 5 => 35.0,
        n if n >= 1 => 20.0,
        _ => 0.0,
    };
    summary_points + skill_points
}

// ── analysis reliability ────────────────────────────────────────────────────

fn assess_analysis_reliability(input: &ConfidenceInput<'_>) -> Result<AnalysisReliability, ConfidenceError> {
    let components = input.components();
    let count = components.len() as f64;
    let mut uncertainties = Vec::new();

    let algorithm_confidence = components.iter().map(|(_, c)| c.confidence * 100.0).sum::<f64>() / count;
    let ai_response_quality = ai_response_quality(input.telemetry, &mut uncertainties);
    let evidence_strength = components.iter().map(|(_, c)| c.evidence_strength).sum::<f64>() / count;

    let scores: Vec<f64> = components.iter().map(|(_, c)| c.score).collect();
    let spread = std_dev(&scores);
    let cross_validation = (100.0 - 2.0 * spread).clamp(0.0, 100.0);

    if evidence_strength < 40.0 {
        uncertainties.push("Limited supporting evidence in the resume".to_string());
    }
    if spread > 25.0 {
        uncertainties.push("Component scores disagree strongly".to_string());
    }
    for (name, component) in components {
        if component.confidence < 0.6 {
            uncertainties.push(format!("Low {name} analysis confidence"));
        }
    }

    let score = 0.3 * algorithm_confidence
        + 0.25 * ai_response_quality
        + 0.25 * evidence_strength
        + 0.2 * cross_validation;
    if !score.is_finite() {
        return Err(ConfidenceError::NonFinite("analysis reliability"));
    }

    let factors = BTreeMap::from([
        ("algorithmConfidence".to_string(), algorithm_confidence),
        ("aiResponseQuality".to_string(), ai_response_quality),
        ("evidenceStrength".to_string(), evidence_strength),
        ("crossValidation".to_string(), cross_validation),
    ]);
    Ok(AnalysisReliability {
        score: round1(score.clamp(0.0, 100.0)),
        factors,
        uncertainties,
    })
}

/// 90, −10 over 5 s average latency (−20 over 10 s), −30×fallbackRate, −50×avgErrorRate.
fn ai_response_quality(telemetry: &ProcessingTelemetry, uncertainties: &mut Vec<String>) -> f64 {
    let mut quality: f64 = 90.0;
    let latency = telemetry.average_latency_ms();
    if latency > 10_000.0 {
        quality -= 20.0;
        uncertainties.push("AI responses were very slow".to_string());
    } else if latency > 5_000.0 {
        quality -= 10.0;
        uncertainties.push("AI responses were slow".to_string());
    }

    let fallback_rate = telemetry.fallback_rate();
    if fallback_rate > 0.0 {
        uncertainties.push(format!("{} analysis step(s) used fallbacks", telemetry.fallbacks_used()));
    }
    quality -= 30.0 * fallback_rate;
    quality -= 50.0 * telemetry.average_error_rate();
    quality.clamp(0.0, 100.0)
}

// ── variance + certainty ────────────────────────────────────────────────────

fn assess_variance(input: &ConfidenceInput<'_>) -> Result<ScoreVariance, ConfidenceError> {
    let components = input.components();
    let mut per_component = BTreeMap::new();
    let mut squares = 0.0;
    for (name, component) in components {
        let variance = (100.0 - component.confidence * 100.0) / 10.0;
        squares += variance * variance;
        per_component.insert(name.to_string(), variance);
    }
    let overall = (squares / components.len() as f64).sqrt();
    if !overall.is_finite() {
        return Err(ConfidenceError::NonFinite("score variance"));
    }

    Ok(ScoreVariance {
        per_component,
        overall,
        stability_score: (100.0 - 10.0 * overall).clamp(0.0, 100.0),
    })
}

fn assess_certainty(
    data_quality: &DataQuality,
    reliability: &AnalysisReliability,
    variance: &ScoreVariance,
    telemetry: &ProcessingTelemetry,
) -> RecommendationCertainty {
    let score =
        (0.4 * variance.stability_score + 0.35 * data_quality.score + 0.25 * reliability.score).clamp(0.0, 100.0);

    let mut risk_factors = Vec::new();
    if data_quality.score < 60.0 {
        risk_factors.push("Resume data quality is low".to_string());
    }
    if reliability.score < 60.0 {
        risk_factors.push("Analysis reliability is low".to_string());
    }
    if variance.stability_score < 60.0 {
        risk_factors.push("Score is unstable".to_string());
    }
    if telemetry.fallbacks_used() > 0 {
        risk_factors.push("Deterministic fallbacks replaced AI analysis".to_string());
    }

    RecommendationCertainty {
        level: ConfidenceLevel::from_report_score(score),
        score: round1(score),
        risk_factors,
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
