//! Experience Analyzer: tenure, recency, leadership, progression, gaps and industry mix.
//!
//! Closed-form parts (tenure, recency, gaps, weighting) are always computed locally.
//! Judgment-heavy parts (relevant years, leadership evidence, progression, relevance
//! sub-scores, industry labels) come from the AI collaborator, each with its own
//! deterministic fallback.
//!
//! final = base
//!       + relevance_adjustment × relevance_weight
//!       + recency_adjustment × recency_weight
//!       + leadership_bonus + progression_bonus
//!       + industry_penalty × 100
//!       − gap_penalty
//! clamped to [0, 100], then capped at 99 (ascending trend) or 98.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::llm_client::AiGateway;
use crate::models::jd::{ExperienceRange, JobDescription, Seniority};
use crate::models::resume::{months_between, WorkExperience};
use crate::models::score::ScoreComponent;
use crate::scoring::prompts::{
    render_jobs, with_evidence_instruction, EXPERIENCE_JUDGMENT_PROMPT_TEMPLATE,
    EXPERIENCE_JUDGMENT_SCHEMA, INDUSTRY_PROMPT_TEMPLATE,
};
use crate::scoring::telemetry::CallLog;

const RECENT_WINDOW_MONTHS: u32 = 36;
const GAP_THRESHOLD_MONTHS: i32 = 2;
const GAP_PENALTY_FREE_MONTHS: u32 = 6;
const MAX_GAP_PENALTY: f64 = 15.0;
const SHORT_SUMMARY_CHARS: usize = 50;
const LEADERSHIP_TITLE_KEYWORDS: &[&str] = &["lead", "manager", "director"];
const OTHER_INDUSTRY: &str = "Other";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// What the role asks for, as far as experience is concerned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceRequirements {
    pub years: ExperienceRange,
    pub required_technologies: Vec<String>,
    pub required_industries: Vec<String>,
    pub leadership_required: bool,
    pub seniority: Seniority,
}

impl ExperienceRequirements {
    pub fn from_jd(jd: &JobDescription) -> Self {
        Self {
            years: jd.experience_years,
            required_technologies: jd.required_technologies(),
            required_industries: jd.required_industries(),
            leadership_required: jd.seniority.expects_leadership(),
            seniority: jd.seniority,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerTrend {
    Ascending,
    #[default]
    Stable,
    Descending,
    Mixed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadershipExperience {
    pub has_leadership: bool,
    pub leadership_years: f64,
    pub team_size_managed: u32,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CareerProgression {
    pub score: f64,
    pub trend: CareerTrend,
    pub promotions: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelevanceFactors {
    pub skill_alignment: f64,
    pub industry_relevance: f64,
    pub role_similarity: f64,
    pub technology_relevance: f64,
}

impl RelevanceFactors {
    pub fn mean(&self) -> f64 {
        (self.skill_alignment + self.industry_relevance + self.role_similarity + self.technology_relevance)
            / 4.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentGaps {
    pub has_gaps: bool,
    pub gap_months: u32,
    pub explanations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceAnalysis {
    pub total_years: f64,
    pub relevant_years: f64,
    pub recent_years: f64,
    pub industry_experience: BTreeMap<String, f64>,
    pub leadership_experience: LeadershipExperience,
    pub career_progression: CareerProgression,
    pub relevance_factors: RelevanceFactors,
    pub gaps: EmploymentGaps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightingFactors {
    pub recency_weight: f64,
    pub relevance_weight: f64,
    pub leadership_bonus: f64,
    pub progression_bonus: f64,
    pub industry_penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceBreakdown {
    pub base_experience_score: f64,
    pub relevance_adjustment: f64,
    pub recency_adjustment: f64,
    pub leadership_bonus: f64,
    pub progression_bonus: f64,
    pub industry_penalty: f64,
    pub gap_penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceScore {
    pub overall_score: f64,
    pub analysis: ExperienceAnalysis,
    pub confidence: f64,
    pub weighting_factors: WeightingFactors,
    pub breakdown: ExperienceBreakdown,
    pub evidence_strength: f64,
    /// True when the AI judgment was replaced by the closed-form fallback.
    pub fallback_used: bool,
}

impl ExperienceScore {
    pub fn component(&self) -> ScoreComponent {
        ScoreComponent::new(self.overall_score, self.confidence, self.evidence_strength)
            .with_detail("totalYears", self.analysis.total_years)
            .with_detail("relevantYears", self.analysis.relevant_years)
            .with_detail("recentYears", self.analysis.recent_years)
            .with_detail("gapMonths", self.analysis.gaps.gap_months as f64)
            .with_detail("baseExperienceScore", self.breakdown.base_experience_score)
    }
}

/// AI answer for the judgment-heavy part of the analysis.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ExperienceJudgment {
    relevant_years: f64,
    leadership: LeadershipExperience,
    career_progression: CareerProgression,
    relevance_factors: RelevanceFactors,
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

pub struct ExperienceAnalyzer {
    ai: AiGateway,
}

impl ExperienceAnalyzer {
    pub fn new(ai: AiGateway) -> Self {
        Self { ai }
    }

    pub async fn analyze(
        &self,
        jobs: &[WorkExperience],
        requirements: &ExperienceRequirements,
        industry_context: Option<&str>,
        today: NaiveDate,
        log: &CallLog,
    ) -> ExperienceScore {
        let total_years = years(total_months(jobs, today));
        let recent_years = years(recent_months(jobs, today));
        let gaps = detect_gaps(jobs, today);

        let (judgment, industries) = tokio::join!(
            self.request_judgment(jobs, requirements, industry_context, total_years, log),
            self.classify_industries(jobs, log),
        );

        let mut industry_experience: BTreeMap<String, f64> = BTreeMap::new();
        for (job, industry) in jobs.iter().zip(&industries) {
            *industry_experience.entry(industry.clone()).or_default() += years(job_months(job, today));
        }

        let fallback_used = judgment.is_none();
        let judgment = match judgment {
            Some(j) => sanitize_judgment(j, total_years),
            None => fallback_judgment(jobs, requirements, &industries, total_years, today),
        };

        let analysis = ExperienceAnalysis {
            total_years: round1(total_years),
            relevant_years: round1(judgment.relevant_years),
            recent_years: round1(recent_years),
            industry_experience,
            leadership_experience: judgment.leadership,
            career_progression: judgment.career_progression,
            relevance_factors: judgment.relevance_factors,
            gaps,
        };

        let weighting_factors = derive_weighting_factors(requirements, &analysis);
        let breakdown = compute_breakdown(&analysis, requirements, &weighting_factors);
        let overall_score = final_score(&breakdown, &weighting_factors, analysis.career_progression.trend);
        let confidence = compute_confidence(jobs, &analysis, overall_score);
        let evidence_strength = evidence_strength(jobs, fallback_used);

        info!(
            score = overall_score,
            total_years = analysis.total_years,
            fallback_used,
            "Experience analysis complete"
        );

        ExperienceScore {
            overall_score,
            analysis,
            confidence,
            weighting_factors,
            breakdown,
            evidence_strength,
            fallback_used,
        }
    }

    /// `None` means the fallback must be used. An empty history skips the call but
    /// still counts as a fallback.
    async fn request_judgment(
        &self,
        jobs: &[WorkExperience],
        requirements: &ExperienceRequirements,
        industry_context: Option<&str>,
        total_years: f64,
        log: &CallLog,
    ) -> Option<ExperienceJudgment> {
        if jobs.is_empty() {
            log.record_fallback("experience.judgment");
            return None;
        }
        let prompt = with_evidence_instruction(EXPERIENCE_JUDGMENT_PROMPT_TEMPLATE)
            .replace("{seniority}", &format!("{:?}", requirements.seniority).to_lowercase())
            .replace("{min_years}", &requirements.years.min.to_string())
            .replace("{max_years}", &requirements.years.max.to_string())
            .replace("{technologies}", &requirements.required_technologies.join(", "))
            .replace("{industry}", industry_context.unwrap_or("unspecified"))
            .replace("{total_years}", &format!("{total_years:.1}"))
            .replace("{jobs}", &render_jobs(jobs));

        match self
            .ai
            .structured::<ExperienceJudgment>(log, "experience.judgment", &prompt, EXPERIENCE_JUDGMENT_SCHEMA)
            .await
        {
            Ok(judgment) => Some(judgment),
            Err(_) => {
                log.record_fallback("experience.judgment");
                None
            }
        }
    }

    /// One text call per job, all in flight together; any failure labels that job "Other".
    async fn classify_industries(&self, jobs: &[WorkExperience], log: &CallLog) -> Vec<String> {
        join_all(jobs.iter().map(|job| self.classify_industry(job, log))).await
    }

    async fn classify_industry(&self, job: &WorkExperience, log: &CallLog) -> String {
        let prompt = INDUSTRY_PROMPT_TEMPLATE
            .replace("{company}", &job.company)
            .replace("{position}", &job.position)
            .replace("{summary}", job.summary.trim());
        match self.ai.text(log, "experience.industry", &prompt).await {
            Ok(answer) => normalize_industry(&answer),
            Err(_) => {
                log.record_fallback("experience.industry");
                OTHER_INDUSTRY.to_string()
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Closed-form computations
// ────────────────────────────────────────────────────────────────────────────

/// Inclusive month count of one job; 0 when its dates are unusable.
fn job_months(job: &WorkExperience, today: NaiveDate) -> u32 {
    match (job.start(), job.end(today)) {
        (Some(start), Some(end)) if end >= start => (months_between(start, end) + 1) as u32,
        _ => 0,
    }
}

pub(crate) fn total_months(jobs: &[WorkExperience], today: NaiveDate) -> u32 {
    jobs.iter().map(|job| job_months(job, today)).sum()
}

/// Months of employment overlapping the trailing 3-year window.
fn recent_months(jobs: &[WorkExperience], today: NaiveDate) -> u32 {
    let window_start = today
        .checked_sub_months(Months::new(RECENT_WINDOW_MONTHS))
        .unwrap_or(today);
    let months: u32 = jobs
        .iter()
        .filter_map(|job| {
            let start = job.start()?.max(window_start);
            let end = job.end(today)?.min(today);
            (end >= start).then(|| (months_between(start, end) + 1) as u32)
        })
        .sum();
    months.min(RECENT_WINDOW_MONTHS)
}

/// Gaps longer than two months between consecutive jobs ordered by start date.
fn detect_gaps(jobs: &[WorkExperience], today: NaiveDate) -> EmploymentGaps {
    let mut dated: Vec<(&WorkExperience, NaiveDate, NaiveDate)> = jobs
        .iter()
        .filter_map(|job| Some((job, job.start()?, job.end(today)?)))
        .collect();
    dated.sort_by_key(|(_, start, _)| *start);

    let mut gaps = EmploymentGaps::default();
    let mut latest: Option<(&WorkExperience, NaiveDate)> = None;

    for (job, start, end) in dated {
        if let Some((previous, previous_end)) = latest {
            let gap = months_between(previous_end, start);
            if gap > GAP_THRESHOLD_MONTHS {
                gaps.gap_months += gap as u32;
                gaps.explanations.push(format!(
                    "{gap}-month gap between {} (ended {}) and {} (started {})",
                    previous.company,
                    previous_end.format("%Y-%m"),
                    job.company,
                    start.format("%Y-%m")
                ));
            }
        }
        // Overlapping jobs: keep whichever ends later.
        if latest.map_or(true, |(_, previous_end)| end > previous_end) {
            latest = Some((job, end));
        }
    }

    gaps.has_gaps = gaps.gap_months > 0;
    gaps
}

fn sanitize_judgment(mut judgment: ExperienceJudgment, total_years: f64) -> ExperienceJudgment {
    judgment.relevant_years = judgment.relevant_years.clamp(0.0, total_years);
    let leadership = &mut judgment.leadership;
    leadership.leadership_years = leadership.leadership_years.clamp(0.0, total_years);
    leadership.evidence.truncate(10);
    judgment.career_progression.score = judgment.career_progression.score.clamp(0.0, 100.0);
    let factors = &mut judgment.relevance_factors;
    for value in [
        &mut factors.skill_alignment,
        &mut factors.industry_relevance,
        &mut factors.role_similarity,
        &mut factors.technology_relevance,
    ] {
        *value = value.clamp(0.0, 100.0);
    }
    judgment
}

/// Deterministic stand-in for the AI judgment.
fn fallback_judgment(
    jobs: &[WorkExperience],
    requirements: &ExperienceRequirements,
    industries: &[String],
    total_years: f64,
    today: NaiveDate,
) -> ExperienceJudgment {
    let leadership_jobs: Vec<&WorkExperience> = jobs
        .iter()
        .filter(|job| {
            let title = job.position.to_lowercase();
            LEADERSHIP_TITLE_KEYWORDS.iter().any(|k| title.contains(k))
        })
        .collect();

    let leadership = LeadershipExperience {
        has_leadership: !leadership_jobs.is_empty(),
        leadership_years: round1(
            leadership_jobs
                .iter()
                .map(|job| years(job_months(job, today)))
                .sum(),
        ),
        team_size_managed: 0,
        evidence: leadership_jobs
            .iter()
            .map(|job| format!("{} at {}", job.position, job.company))
            .collect(),
    };

    let technology_relevance = mention_ratio(jobs, &requirements.required_technologies)
        .map(|r| r * 100.0)
        .unwrap_or(60.0);

    let industry_relevance = if requirements.required_industries.is_empty() {
        60.0
    } else if industries.iter().any(|have| {
        let have = have.to_lowercase();
        requirements.required_industries.iter().any(|want| {
            let want = want.to_lowercase();
            have.contains(&want) || want.contains(&have)
        })
    }) {
        80.0
    } else {
        40.0
    };

    ExperienceJudgment {
        relevant_years: total_years * 0.8,
        leadership,
        career_progression: CareerProgression {
            score: 60.0,
            trend: CareerTrend::Stable,
            promotions: 0,
        },
        relevance_factors: RelevanceFactors {
            skill_alignment: technology_relevance,
            industry_relevance,
            role_similarity: 60.0,
            technology_relevance,
        },
    }
}

/// Share of `terms` mentioned anywhere in the job titles or summaries; `None` without terms.
fn mention_ratio(jobs: &[WorkExperience], terms: &[String]) -> Option<f64> {
    if terms.is_empty() {
        return None;
    }
    let corpus = jobs
        .iter()
        .map(|job| format!("{} {}", job.position, job.summary))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let hits = terms
        .iter()
        .filter(|t| corpus.contains(&t.trim().to_lowercase()))
        .count();
    Some(hits as f64 / terms.len() as f64)
}

fn derive_weighting_factors(
    requirements: &ExperienceRequirements,
    analysis: &ExperienceAnalysis,
) -> WeightingFactors {
    WeightingFactors {
        recency_weight: if requirements.seniority.is_senior_track() { 0.3 } else { 0.2 },
        relevance_weight: if requirements.required_technologies.is_empty() { 0.3 } else { 0.4 },
        leadership_bonus: if requirements.leadership_required
            && analysis.leadership_experience.has_leadership
        {
            0.15
        } else {
            0.05
        },
        progression_bonus: if analysis.career_progression.trend == CareerTrend::Ascending {
            0.1
        } else {
            0.0
        },
        industry_penalty: if !requirements.required_industries.is_empty()
            && analysis.relevance_factors.industry_relevance < 50.0
        {
            -0.1
        } else {
            0.0
        },
    }
}

/// Tenure against the required range, before adjustments.
fn base_experience_score(total_years: f64, range: ExperienceRange) -> f64 {
    let min = range.min.max(0.0);
    let max = range.max.max(min);

    if min <= 0.0 {
        return if total_years > 0.0 {
            80.0 + total_years.min(10.0) * 1.5
        } else {
            50.0
        };
    }
    if total_years < min {
        70.0 * total_years / min
    } else if total_years <= max {
        if max > min {
            75.0 + 20.0 * (total_years - min) / (max - min)
        } else {
            85.0
        }
    } else {
        90.0
    }
}

fn compute_breakdown(
    analysis: &ExperienceAnalysis,
    requirements: &ExperienceRequirements,
    factors: &WeightingFactors,
) -> ExperienceBreakdown {
    let gap_penalty = if analysis.gaps.gap_months > GAP_PENALTY_FREE_MONTHS {
        ((analysis.gaps.gap_months - GAP_PENALTY_FREE_MONTHS) as f64).min(MAX_GAP_PENALTY)
    } else {
        0.0
    };

    ExperienceBreakdown {
        base_experience_score: base_experience_score(analysis.total_years, requirements.years),
        relevance_adjustment: analysis.relevance_factors.mean() - 50.0,
        recency_adjustment: analysis.recent_years / (RECENT_WINDOW_MONTHS as f64 / 12.0) * 100.0 - 50.0,
        leadership_bonus: factors.leadership_bonus,
        progression_bonus: factors.progression_bonus,
        industry_penalty: factors.industry_penalty,
        gap_penalty,
    }
}

fn final_score(breakdown: &ExperienceBreakdown, factors: &WeightingFactors, trend: CareerTrend) -> f64 {
    let raw = breakdown.base_experience_score
        + breakdown.relevance_adjustment * factors.relevance_weight
        + breakdown.recency_adjustment * factors.recency_weight
        + breakdown.leadership_bonus
        + breakdown.progression_bonus
        + breakdown.industry_penalty * 100.0
        - breakdown.gap_penalty;

    // Keeps near-perfect candidates strictly ordered instead of tying at 100.
    let cap = if trend == CareerTrend::Ascending { 99.0 } else { 98.0 };
    round1(raw.clamp(0.0, 100.0).min(cap))
}

fn compute_confidence(jobs: &[WorkExperience], analysis: &ExperienceAnalysis, score: f64) -> f64 {
    let mut confidence: f64 = 0.8;

    if jobs.len() < 2 {
        confidence -= 0.1;
    }
    let short = jobs
        .iter()
        .filter(|job| job.summary.trim().chars().count() < SHORT_SUMMARY_CHARS)
        .count();
    if jobs.is_empty() || short * 2 > jobs.len() {
        confidence -= 0.1;
    }
    if analysis.gaps.gap_months > 12 {
        confidence -= 0.1;
    }
    if analysis.career_progression.trend == CareerTrend::Ascending && score > 70.0 {
        confidence += 0.1;
    }

    let confidence = confidence.clamp(0.4, 1.0);
    debug!(confidence, "Experience confidence");
    confidence
}

fn evidence_strength(jobs: &[WorkExperience], fallback_used: bool) -> f64 {
    if jobs.is_empty() {
        return 0.0;
    }
    let detailed = jobs
        .iter()
        .filter(|job| job.summary.trim().chars().count() >= SHORT_SUMMARY_CHARS)
        .count() as f64
        / jobs.len() as f64;
    let judged = if fallback_used { 0.5 } else { 1.0 };
    let breadth = (jobs.len() as f64 / 3.0).min(1.0);
    (40.0 * detailed + 30.0 * judged + 30.0 * breadth).clamp(0.0, 100.0)
}

fn normalize_industry(answer: &str) -> String {
    let first_line = answer.lines().next().unwrap_or_default();
    let cleaned = first_line
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '*')
        .trim();
    if cleaned.is_empty() || cleaned.chars().count() > 40 {
        OTHER_INDUSTRY.to_string()
    } else {
        cleaned.to_string()
    }
}

fn years(months: u32) -> f64 {
    months as f64 / 12.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
