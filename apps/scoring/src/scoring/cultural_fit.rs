//! Cultural-Fit Analyzer: infers working style from the resume and aligns it with a company profile.
//!
//! Three independent AI calls (indicators, soft skills, recommendations), each with
//! its own fixed fallback. Alignment is deterministic given indicators + profile.
//!
//! overall = 0.6 × mean(5 alignment scores) + 0.4 × mean(8 soft-skill scores)
//!
//! Any error in the computation itself yields `CulturalFitScore::failure()`, never a partial result.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::AiGateway;
use crate::models::jd::{
    CollaborationStyle, CompanyProfile, CompanySize, InnovationLevel, JobDescription, WorkStyle,
};
use crate::models::resume::ResumeDto;
use crate::models::score::ScoreComponent;
use crate::scoring::prompts::{
    render_jobs, with_evidence_instruction, CULTURAL_INDICATORS_PROMPT_TEMPLATE,
    CULTURAL_INDICATORS_SCHEMA, RECOMMENDATIONS_PROMPT_TEMPLATE, RECOMMENDATIONS_SCHEMA,
    SOFT_SKILLS_PROMPT_TEMPLATE, SOFT_SKILLS_SCHEMA,
};
use crate::scoring::telemetry::CallLog;

const FAILURE_SCORE: f64 = 60.0;
const FAILURE_CONFIDENCE: f64 = 0.6;
const SPARSE_SUMMARY_CHARS: usize = 200;

#[derive(Debug, Error)]
enum CulturalFitError {
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

// ────────────────────────────────────────────────────────────────────────────
// Indicators (AI output)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkStyleIndicator {
    pub remote_readiness: f64,
    pub collaboration_preference: f64,
    pub autonomy_level: f64,
    pub evidence: Vec<String>,
}

impl Default for WorkStyleIndicator {
    fn default() -> Self {
        Self {
            remote_readiness: 60.0,
            collaboration_preference: 65.0,
            autonomy_level: 60.0,
            evidence: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunicationIndicator {
    pub written: f64,
    pub verbal: f64,
    pub presentation: f64,
    pub cross_functional: f64,
    pub evidence: Vec<String>,
}

impl Default for CommunicationIndicator {
    fn default() -> Self {
        Self {
            written: 65.0,
            verbal: 65.0,
            presentation: 55.0,
            cross_functional: 60.0,
            evidence: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadershipStyle {
    Directive,
    #[default]
    Collaborative,
    Servant,
    Transformational,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadershipStyleIndicator {
    pub style: LeadershipStyle,
    pub score: f64,
    pub evidence: Vec<String>,
}

impl Default for LeadershipStyleIndicator {
    fn default() -> Self {
        Self {
            style: LeadershipStyle::Collaborative,
            score: 55.0,
            evidence: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InnovationIndicator {
    pub score: f64,
    pub risk_tolerance: f64,
    pub evidence: Vec<String>,
}

impl Default for InnovationIndicator {
    fn default() -> Self {
        Self {
            score: 60.0,
            risk_tolerance: 55.0,
            evidence: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaturityIndicator {
    pub score: f64,
    pub evidence: Vec<String>,
}

impl Default for MaturityIndicator {
    fn default() -> Self {
        Self {
            score: 70.0,
            evidence: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanySizePreference {
    pub preferred: CompanySize,
    pub confidence: f64,
    pub evidence: Vec<String>,
}

impl Default for CompanySizePreference {
    fn default() -> Self {
        Self {
            preferred: CompanySize::Medium,
            confidence: 50.0,
            evidence: vec![],
        }
    }
}

/// Neutral values (50–70) when the AI is unavailable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CulturalFitIndicators {
    pub work_style: WorkStyleIndicator,
    pub communication: CommunicationIndicator,
    pub leadership_style: LeadershipStyleIndicator,
    pub innovation: InnovationIndicator,
    pub professional_maturity: MaturityIndicator,
    pub company_size_preference: CompanySizePreference,
}

impl CulturalFitIndicators {
    fn evidence_count(&self) -> usize {
        self.work_style.evidence.len()
            + self.communication.evidence.len()
            + self.leadership_style.evidence.len()
            + self.innovation.evidence.len()
            + self.professional_maturity.evidence.len()
            + self.company_size_preference.evidence.len()
    }

    fn clamp_ranges(mut self) -> Self {
        for value in [
            &mut self.work_style.remote_readiness,
            &mut self.work_style.collaboration_preference,
            &mut self.work_style.autonomy_level,
            &mut self.communication.written,
            &mut self.communication.verbal,
            &mut self.communication.presentation,
            &mut self.communication.cross_functional,
            &mut self.leadership_style.score,
            &mut self.innovation.score,
            &mut self.innovation.risk_tolerance,
            &mut self.professional_maturity.score,
            &mut self.company_size_preference.confidence,
        ] {
            *value = value.clamp(0.0, 100.0);
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftSkillRating {
    pub score: f64,
    pub evidence: Vec<String>,
}

impl SoftSkillRating {
    fn neutral(score: f64) -> Self {
        Self {
            score,
            evidence: vec![],
        }
    }
}

impl Default for SoftSkillRating {
    fn default() -> Self {
        Self::neutral(55.0)
    }
}

/// Eight soft-skill ratings. Fallback values sit around 50–60.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoftSkillsAssessment {
    pub communication: SoftSkillRating,
    pub teamwork: SoftSkillRating,
    pub problem_solving: SoftSkillRating,
    pub adaptability: SoftSkillRating,
    pub leadership: SoftSkillRating,
    pub time_management: SoftSkillRating,
    pub critical_thinking: SoftSkillRating,
    pub emotional_intelligence: SoftSkillRating,
}

impl Default for SoftSkillsAssessment {
    fn default() -> Self {
        Self {
            communication: SoftSkillRating::neutral(60.0),
            teamwork: SoftSkillRating::neutral(60.0),
            problem_solving: SoftSkillRating::neutral(60.0),
            adaptability: SoftSkillRating::neutral(55.0),
            leadership: SoftSkillRating::neutral(50.0),
            time_management: SoftSkillRating::neutral(55.0),
            critical_thinking: SoftSkillRating::neutral(55.0),
            emotional_intelligence: SoftSkillRating::neutral(50.0),
        }
    }
}

impl SoftSkillsAssessment {
    fn ratings(&self) -> [&SoftSkillRating; 8] {
        [
            &self.communication,
            &self.teamwork,
            &self.problem_solving,
            &self.adaptability,
            &self.leadership,
            &self.time_management,
            &self.critical_thinking,
            &self.emotional_intelligence,
        ]
    }

    pub fn mean(&self) -> f64 {
        self.ratings().iter().map(|r| r.score.clamp(0.0, 100.0)).sum::<f64>() / 8.0
    }

    fn evidence_count(&self) -> usize {
        self.ratings().iter().map(|r| r.evidence.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CulturalRecommendations {
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub development_areas: Vec<String>,
}

impl Default for CulturalRecommendations {
    fn default() -> Self {
        Self {
            strengths: vec!["Professional experience relevant to the role".to_string()],
            concerns: vec!["Cultural fit could not be assessed in depth".to_string()],
            development_areas: vec!["Discuss team practices and expectations during interviews".to_string()],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Alignment + result
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentScores {
    pub company_size: f64,
    pub work_style: f64,
    pub leadership: f64,
    pub innovation: f64,
    pub communication: f64,
}

impl AlignmentScores {
    fn uniform(value: f64) -> Self {
        Self {
            company_size: value,
            work_style: value,
            leadership: value,
            innovation: value,
            communication: value,
        }
    }

    pub fn mean(&self) -> f64 {
        (self.company_size + self.work_style + self.leadership + self.innovation + self.communication) / 5.0
    }

    fn all_finite(&self) -> bool {
        [self.company_size, self.work_style, self.leadership, self.innovation, self.communication]
            .iter()
            .all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalFitScore {
    pub overall_score: f64,
    pub confidence: f64,
    pub indicators: CulturalFitIndicators,
    pub soft_skills: SoftSkillsAssessment,
    pub alignment: AlignmentScores,
    pub recommendations: CulturalRecommendations,
    pub evidence_strength: f64,
    /// The whole analysis collapsed to the fixed failure object.
    pub degraded: bool,
}

impl CulturalFitScore {
    /// The single fixed object returned when the analysis fails.
    pub fn failure() -> Self {
        Self {
            overall_score: FAILURE_SCORE,
            confidence: FAILURE_CONFIDENCE,
            indicators: CulturalFitIndicators::default(),
            soft_skills: SoftSkillsAssessment::default(),
            alignment: AlignmentScores::uniform(FAILURE_SCORE),
            recommendations: CulturalRecommendations {
                strengths: vec!["Unable to assess cultural strengths automatically".to_string()],
                concerns: vec!["Cultural fit analysis unavailable".to_string()],
                development_areas: vec!["Assess cultural fit in a structured interview".to_string()],
            },
            evidence_strength: 0.0,
            degraded: true,
        }
    }

    pub fn component(&self) -> ScoreComponent {
        ScoreComponent::new(self.overall_score, self.confidence, self.evidence_strength)
            .with_detail("companySizeAlignment", self.alignment.company_size)
            .with_detail("workStyleAlignment", self.alignment.work_style)
            .with_detail("leadershipAlignment", self.alignment.leadership)
            .with_detail("innovationAlignment", self.alignment.innovation)
            .with_detail("communicationAlignment", self.alignment.communication)
            .with_detail("softSkillsMean", self.soft_skills.mean())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

pub struct CulturalFitAnalyzer {
    ai: AiGateway,
}

impl CulturalFitAnalyzer {
    pub fn new(ai: AiGateway) -> Self {
        Self { ai }
    }

    pub async fn analyze(
        &self,
        resume: &ResumeDto,
        profile: &CompanyProfile,
        jd: &JobDescription,
        log: &CallLog,
    ) -> CulturalFitScore {
        let jobs = render_jobs(&resume.work_experience);

        let (indicators, soft_skills, recommendations) = tokio::join!(
            self.infer_indicators(resume, &jobs, log),
            self.assess_soft_skills(jd, &jobs, log),
            self.recommend(profile, &jobs, log),
        );

        match score_alignment(resume, profile, indicators, soft_skills, recommendations) {
            Ok(score) => {
                info!(score = score.overall_score, confidence = score.confidence, "Cultural fit analysis complete");
                score
            }
            Err(e) => {
                warn!("Cultural fit analysis failed, using fixed result: {e}");
                log.record_fallback("cultural_fit");
                CulturalFitScore::failure()
            }
        }
    }

    async fn infer_indicators(&self, resume: &ResumeDto, jobs: &str, log: &CallLog) -> CulturalFitIndicators {
        let prompt = with_evidence_instruction(CULTURAL_INDICATORS_PROMPT_TEMPLATE)
            .replace("{jobs}", jobs)
            .replace("{skills}", &resume.skills.join(", "));
        match self
            .ai
            .structured::<CulturalFitIndicators>(log, "cultural.indicators", &prompt, CULTURAL_INDICATORS_SCHEMA)
            .await
        {
            Ok(indicators) => indicators.clamp_ranges(),
            Err(_) => {
                log.record_fallback("cultural.indicators");
                CulturalFitIndicators::default()
            }
        }
    }

    async fn assess_soft_skills(&self, jd: &JobDescription, jobs: &str, log: &CallLog) -> SoftSkillsAssessment {
        let wanted = if jd.soft_skills.is_empty() {
            "not specified".to_string()
        } else {
            jd.soft_skills.join(", ")
        };
        let prompt = with_evidence_instruction(SOFT_SKILLS_PROMPT_TEMPLATE)
            .replace("{soft_skills}", &wanted)
            .replace("{jobs}", jobs);
        match self
            .ai
            .structured::<SoftSkillsAssessment>(log, "cultural.soft_skills", &prompt, SOFT_SKILLS_SCHEMA)
            .await
        {
            Ok(assessment) => assessment,
            Err(_) => {
                log.record_fallback("cultural.soft_skills");
                SoftSkillsAssessment::default()
            }
        }
    }

    async fn recommend(&self, profile: &CompanyProfile, jobs: &str, log: &CallLog) -> CulturalRecommendations {
        let culture = &profile.culture;
        let prompt = RECOMMENDATIONS_PROMPT_TEMPLATE
            .replace("{size}", &format!("{:?}", profile.size).to_lowercase())
            .replace("{work_style}", &format!("{:?}", culture.work_style).to_lowercase())
            .replace("{decision_making}", &format!("{:?}", culture.decision_making).to_lowercase())
            .replace(
                "{collaboration}",
                &format!("{:?}", profile.team_structure.collaboration_style).to_lowercase(),
            )
            .replace("{values}", &culture.values.join(", "))
            .replace("{jobs}", jobs);
        match self
            .ai
            .structured::<CulturalRecommendations>(log, "cultural.recommendations", &prompt, RECOMMENDATIONS_SCHEMA)
            .await
        {
            Ok(recommendations) => recommendations,
            Err(_) => {
                log.record_fallback("cultural.recommendations");
                CulturalRecommendations::default()
            }
        }
    }
}

fn score_alignment(
    resume: &ResumeDto,
    profile: &CompanyProfile,
    indicators: CulturalFitIndicators,
    soft_skills: SoftSkillsAssessment,
    recommendations: CulturalRecommendations,
) -> Result<CulturalFitScore, CulturalFitError> {
    let alignment = compute_alignment(&indicators, profile);
    if !alignment.all_finite() {
        return Err(CulturalFitError::NonFinite("alignment"));
    }
    let soft_mean = soft_skills.mean();
    if !soft_mean.is_finite() {
        return Err(CulturalFitError::NonFinite("soft skills"));
    }

    let overall_score = (0.6 * alignment.mean() + 0.4 * soft_mean).clamp(0.0, 100.0);
    let evidence = indicators.evidence_count() + soft_skills.evidence_count();
    let confidence = compute_confidence(resume, evidence, indicators.company_size_preference.confidence);
    let evidence_strength = (evidence as f64 / 20.0 * 100.0).min(100.0);

    Ok(CulturalFitScore {
        overall_score: (overall_score * 10.0).round() / 10.0,
        confidence,
        indicators,
        soft_skills,
        alignment,
        recommendations,
        evidence_strength,
        degraded: false,
    })
}

pub fn compute_alignment(indicators: &CulturalFitIndicators, profile: &CompanyProfile) -> AlignmentScores {
    AlignmentScores {
        company_size: company_size_alignment(indicators.company_size_preference.preferred, profile.size),
        work_style: work_style_alignment(&indicators.work_style, profile),
        leadership: leadership_alignment(&indicators.leadership_style, profile.team_structure.management_layers),
        innovation: innovation_alignment(indicators.innovation.score, profile.culture.innovation),
        communication: communication_alignment(
            &indicators.communication,
            profile.team_structure.collaboration_style,
        ),
    }
}

/// Same size 100, adjacent 75, two steps 50, further 30.
fn company_size_alignment(preferred: CompanySize, actual: CompanySize) -> f64 {
    match (preferred.ordinal() - actual.ordinal()).abs() {
        0 => 100.0,
        1 => 75.0,
        2 => 50.0,
        _ => 30.0,
    }
}

fn work_style_alignment(work_style: &WorkStyleIndicator, profile: &CompanyProfile) -> f64 {
    let wanted_collaboration = match profile.team_structure.collaboration_style {
        CollaborationStyle::Independent => 40.0,
        CollaborationStyle::Collaborative => 70.0,
        CollaborationStyle::CrossFunctional => 85.0,
    };
    let base = 100.0 - (work_style.collaboration_preference - wanted_collaboration).abs();
    let remote_bonus = match profile.culture.work_style {
        WorkStyle::Remote if work_style.remote_readiness > 70.0 => 10.0,
        WorkStyle::Hybrid | WorkStyle::Flexible if work_style.remote_readiness > 70.0 => 5.0,
        _ => 0.0,
    };
    (base + remote_bonus).clamp(0.0, 100.0)
}

/// Flat orgs reward servant/collaborative leaders, deep hierarchies reward directive ones.
fn leadership_alignment(leadership: &LeadershipStyleIndicator, management_layers: u32) -> f64 {
    let bonus = match (leadership.style, management_layers) {
        (LeadershipStyle::Servant | LeadershipStyle::Collaborative, 0..=2) => 15.0,
        (LeadershipStyle::Transformational, 0..=2) => 10.0,
        (LeadershipStyle::Directive, 0..=2) => 0.0,
        (LeadershipStyle::Directive, 4..) => 10.0,
        (LeadershipStyle::Collaborative | LeadershipStyle::Transformational, 4..) => 5.0,
        (LeadershipStyle::Servant, 4..) => 0.0,
        (LeadershipStyle::Collaborative, _) => 10.0,
        (LeadershipStyle::None, _) => 0.0,
        _ => 5.0,
    };
    (leadership.score + bonus).clamp(0.0, 100.0)
}

fn innovation_alignment(score: f64, level: InnovationLevel) -> f64 {
    let requirement = match level {
        InnovationLevel::Low => 40.0,
        InnovationLevel::Medium => 60.0,
        InnovationLevel::High => 80.0,
        InnovationLevel::CuttingEdge => 95.0,
    };
    (score / requirement * 100.0).min(100.0)
}

fn communication_alignment(communication: &CommunicationIndicator, collaboration: CollaborationStyle) -> f64 {
    let average = (communication.written
        + communication.verbal
        + communication.presentation
        + communication.cross_functional)
        / 4.0;
    let bonus = if collaboration == CollaborationStyle::CrossFunctional && communication.presentation > 70.0 {
        10.0
    } else {
        0.0
    };
    (average + bonus).clamp(0.0, 100.0)
}

fn compute_confidence(resume: &ResumeDto, evidence_count: usize, size_preference_confidence: f64) -> f64 {
    let mut confidence: f64 = 0.8;
    let jobs = &resume.work_experience;

    if jobs.len() < 2 {
        confidence -= 0.1;
    }
    let summary_chars: usize = jobs.iter().map(|j| j.summary.trim().chars().count()).sum();
    if summary_chars < SPARSE_SUMMARY_CHARS {
        confidence -= 0.1;
    }
    if evidence_count > 15 {
        confidence += 0.1;
    }
    if size_preference_confidence > 80.0 {
        confidence += 0.05;
    }
    confidence.clamp(0.4, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{FailingAiClient, ScriptedAiClient};
    use crate::models::jd::{CultureProfile, EducationLevel, ExperienceRange, Seniority, TeamStructure};
    use crate::models::resume::WorkExperience;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn profile() -> CompanyProfile {
        CompanyProfile {
            size: CompanySize::Startup,
            culture: CultureProfile {
                values: vec!["ownership".to_string()],
                work_style: WorkStyle::Remote,
                innovation: InnovationLevel::High,
                ..Default::default()
            },
            team_structure: TeamStructure {
                team_size: 6,
                management_layers: 1,
                collaboration_style: CollaborationStyle::CrossFunctional,
            },
        }
    }

    fn jd() -> JobDescription {
        JobDescription {
            job_id: "job-1".to_string(),
            required_skills: vec![],
            experience_years: ExperienceRange::default(),
            education_level: EducationLevel::Any,
            soft_skills: vec!["communication".to_string()],
            seniority: Seniority::Mid,
            company_profile: Some(profile()),
            industry_context: None,
        }
    }

    fn resume(jobs: usize) -> ResumeDto {
        ResumeDto {
            work_experience: (0..jobs)
                .map(|i| WorkExperience {
                    company: format!("Company {i}"),
                    position: "Engineer".to_string(),
                    start_date: "2019-01".to_string(),
                    end_date: "2021-01".to_string(),
                    summary: "Worked remotely with product, design and data teams to ship features weekly; presented roadmaps to leadership.".to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_company_size_matrix() {
        assert_eq!(company_size_alignment(CompanySize::Startup, CompanySize::Startup), 100.0);
        assert_eq!(company_size_alignment(CompanySize::Small, CompanySize::Startup), 75.0);
        assert_eq!(company_size_alignment(CompanySize::Medium, CompanySize::Startup), 50.0);
        assert_eq!(company_size_alignment(CompanySize::Enterprise, CompanySize::Startup), 30.0);
    }

    #[test]
    fn test_innovation_ratio_capped() {
        assert_eq!(innovation_alignment(95.0, InnovationLevel::Medium), 100.0);
        assert!((innovation_alignment(40.0, InnovationLevel::High) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_remote_readiness_bonus() {
        let ready = WorkStyleIndicator {
            remote_readiness: 90.0,
            collaboration_preference: 85.0,
            ..Default::default()
        };
        assert_eq!(work_style_alignment(&ready, &profile()), 100.0);
        let office = WorkStyleIndicator {
            remote_readiness: 20.0,
            collaboration_preference: 65.0,
            ..Default::default()
        };
        assert_eq!(work_style_alignment(&office, &profile()), 80.0);
    }

    #[test]
    fn test_leadership_matrix_by_layers() {
        let servant = LeadershipStyleIndicator {
            style: LeadershipStyle::Servant,
            score: 60.0,
            evidence: vec![],
        };
        let directive = LeadershipStyleIndicator {
            style: LeadershipStyle::Directive,
            score: 60.0,
            evidence: vec![],
        };
        assert_eq!(leadership_alignment(&servant, 1), 75.0);
        assert_eq!(leadership_alignment(&directive, 1), 60.0);
        assert_eq!(leadership_alignment(&directive, 5), 70.0);
        assert_eq!(leadership_alignment(&servant, 3), 65.0);
    }

    #[test]
    fn test_cross_functional_presentation_bonus() {
        let comms = CommunicationIndicator {
            written: 70.0,
            verbal: 70.0,
            presentation: 80.0,
            cross_functional: 80.0,
            evidence: vec![],
        };
        assert_eq!(communication_alignment(&comms, CollaborationStyle::CrossFunctional), 85.0);
        assert_eq!(communication_alignment(&comms, CollaborationStyle::Independent), 75.0);
    }

    #[tokio::test]
    async fn test_all_calls_failing_uses_independent_fallbacks() {
        let analyzer = CulturalFitAnalyzer::new(AiGateway::new(Arc::new(FailingAiClient), Duration::from_secs(1)));
        let log = CallLog::new();
        let score = analyzer.analyze(&resume(1), &profile(), &jd(), &log).await;

        // Per-call fallbacks, not the whole-method failure object.
        assert!(!score.degraded);
        assert_eq!(score.recommendations.strengths, CulturalRecommendations::default().strengths);
        assert!(score.overall_score > 0.0 && score.overall_score <= 100.0);
        assert!((0.4..=1.0).contains(&score.confidence));
        assert_eq!(log.snapshot().fallbacks_used(), 3);
    }

    #[tokio::test]
    async fn test_overall_formula_with_scripted_ai() {
        let mut soft = serde_json::Map::new();
        for key in [
            "communication",
            "teamwork",
            "problemSolving",
            "adaptability",
            "leadership",
            "timeManagement",
            "criticalThinking",
            "emotionalIntelligence",
        ] {
            soft.insert(key.to_string(), json!({"score": 80, "evidence": ["a", "b"]}));
        }
        let client = ScriptedAiClient::new()
            .with_structured(
                "CulturalFitIndicators",
                json!({
                    "workStyle": {"remoteReadiness": 90, "collaborationPreference": 85, "autonomyLevel": 70, "evidence": ["remote"]},
                    "communication": {"written": 80, "verbal": 80, "presentation": 80, "crossFunctional": 80, "evidence": ["demos"]},
                    "leadershipStyle": {"style": "servant", "score": 70, "evidence": []},
                    "innovation": {"score": 80, "riskTolerance": 60, "evidence": []},
                    "professionalMaturity": {"score": 75, "evidence": []},
                    "companySizePreference": {"preferred": "startup", "confidence": 90, "evidence": ["two startups"]}
                }),
            )
            .with_structured("SoftSkillsAssessment", serde_json::Value::Object(soft))
            .with_structured(
                "CulturalRecommendations",
                json!({"strengths": ["Remote-ready"], "concerns": [], "developmentAreas": []}),
            );
        let analyzer = CulturalFitAnalyzer::new(AiGateway::new(Arc::new(client), Duration::from_secs(1)));
        let score = analyzer.analyze(&resume(3), &profile(), &jd(), &CallLog::new()).await;

        // size 100, work style 100, leadership 85, innovation 100, communication 90 → mean 95
        assert_eq!(score.alignment.mean(), 95.0);
        // 0.6 × 95 + 0.4 × 80
        assert!((score.overall_score - 89.0).abs() < 1e-9);
        // 0.8 + 0.1 (19 evidence strings) + 0.05 (size preference 90)
        assert!((score.confidence - 0.95).abs() < 1e-9);
        assert_eq!(score.recommendations.strengths, vec!["Remote-ready".to_string()]);
    }

    #[test]
    fn test_non_finite_alignment_returns_error() {
        let mut indicators = CulturalFitIndicators::default();
        indicators.leadership_style.score = f64::NAN;
        let result = score_alignment(
            &resume(2),
            &profile(),
            indicators,
            SoftSkillsAssessment::default(),
            CulturalRecommendations::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_failure_object_is_fixed() {
        let failure = CulturalFitScore::failure();
        assert_eq!(failure.overall_score, 60.0);
        assert_eq!(failure.confidence, 0.6);
        assert_eq!(failure.alignment, AlignmentScores::uniform(60.0));
        assert!(failure.degraded);
    }
}
