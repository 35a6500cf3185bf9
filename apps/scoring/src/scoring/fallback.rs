//! Basic scorer used when the enhanced path fails.
//!
//! Substring skill matching, a linear years ratio and a binary education check,
//! weighted 0.5 / 0.3 / 0.2. No AI calls. Always flagged `fallbacksUsed = 1`, low confidence.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::models::jd::JobDescription;
use crate::models::score::{ConfidenceLevel, ScoreComponent};
use crate::scoring::confidence::ConfidenceReport;
use crate::scoring::experience::total_months;
use crate::scoring::orchestrator::{ProcessingMetrics, ScoreDto, ScoringError, ScoringRequest};
use crate::scoring::weights::{candidate_education_level, ScoringWeights};

const BASIC_WEIGHTS: ScoringWeights = ScoringWeights {
    skills: 0.5,
    experience: 0.3,
    education: 0.2,
    cultural_fit: 0.0,
};
const BASIC_CONFIDENCE: f64 = 0.4;
const NO_REQUIREMENTS_SCORE: f64 = 70.0;
const CULTURAL_PLACEHOLDER_SCORE: f64 = 75.0;

pub fn basic_score(
    request: &ScoringRequest<'_>,
    today: NaiveDate,
    total_time_ms: u64,
    ai_time_ms: u64,
) -> Result<ScoreDto, ScoringError> {
    let jd = request.jd;
    let resume = request.resume;

    let (skills_score, matched) = substring_skill_score(jd, &resume.skills);
    let years = total_months(&resume.work_experience, today) as f64 / 12.0;
    let experience_score = years_ratio_score(years, jd.experience_years.min);
    let candidate_level = candidate_education_level(&resume.education);
    let education_pass = candidate_level >= jd.education_level;
    let education_score = if education_pass { 100.0 } else { 0.0 };

    let raw = BASIC_WEIGHTS.weighted_sum(skills_score, experience_score, education_score, 0.0);
    if !raw.is_finite() {
        return Err(ScoringError::NonFinite("basic overall"));
    }

    let skills = ScoreComponent::new(skills_score, BASIC_CONFIDENCE, skills_score)
        .with_detail("matchedSkills", matched as f64)
        .with_detail("requiredSkills", jd.required_skills.len() as f64);
    let experience = ScoreComponent::new(experience_score, BASIC_CONFIDENCE, 0.0)
        .with_detail("totalYears", (years * 10.0).round() / 10.0);
    let education = ScoreComponent::new(education_score, BASIC_CONFIDENCE, 0.0)
        .with_detail("candidateLevel", candidate_level.rank() as f64)
        .with_detail("requiredLevel", jd.education_level.rank() as f64);

    Ok(ScoreDto {
        score_id: Uuid::new_v4(),
        job_id: request.job_id.to_string(),
        resume_id: request.resume_id.to_string(),
        overall_score: raw.round().clamp(0.0, 100.0) as u32,
        confidence_report: ConfidenceReport::fallback(skills.score),
        skills,
        experience,
        education,
        cultural_fit: ScoreComponent::new(CULTURAL_PLACEHOLDER_SCORE, BASIC_CONFIDENCE, 0.0),
        enhanced: None,
        weights: BASIC_WEIGHTS,
        processing_metrics: ProcessingMetrics {
            total_time_ms,
            ai_time_ms,
            fallbacks_used: 1,
            fallback_rate: 1.0,
            confidence_level: ConfidenceLevel::Low,
        },
        scored_at: Utc::now(),
    })
}

/// Share of JD skills whose name contains, or is contained in, a resume skill (case-insensitive).
fn substring_skill_score(jd: &JobDescription, candidate: &[String]) -> (f64, usize) {
    if jd.required_skills.is_empty() {
        return (NO_REQUIREMENTS_SCORE, 0);
    }
    let candidate: Vec<String> = candidate
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let matched = jd
        .required_skills
        .iter()
        .map(|skill| skill.name.trim().to_lowercase())
        .filter(|wanted| {
            candidate
                .iter()
                .any(|have| have.contains(wanted.as_str()) || wanted.contains(have.as_str()))
        })
        .count();
    (matched as f64 / jd.required_skills.len() as f64 * 100.0, matched)
}

fn years_ratio_score(years: f64, required_min: f64) -> f64 {
    if required_min <= 0.0 {
        return 100.0;
    }
    (years / required_min).min(1.0) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::jd::{EducationLevel, ExperienceRange, RequiredSkill, Seniority};
    use crate::models::resume::{Education, ResumeDto, WorkExperience};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn jd() -> JobDescription {
        JobDescription {
            job_id: "job-1".to_string(),
            required_skills: ["typescript", "node", "postgres", "kafka"]
                .iter()
                .map(|name| RequiredSkill {
                    name: name.to_string(),
                    weight: 1.0,
                    required: true,
                    category: "technical".to_string(),
                })
                .collect(),
            experience_years: ExperienceRange { min: 4.0, max: 6.0 },
            education_level: EducationLevel::Bachelor,
            soft_skills: vec![],
            seniority: Seniority::Mid,
            company_profile: None,
            industry_context: None,
        }
    }

    fn resume() -> ResumeDto {
        ResumeDto {
            skills: vec!["TypeScript".to_string(), "Node.js".to_string()],
            work_experience: vec![WorkExperience {
                company: "Acme".to_string(),
                position: "Engineer".to_string(),
                start_date: "2022-07".to_string(),
                end_date: "2024-06".to_string(),
                summary: String::new(),
            }],
            education: vec![Education {
                school: "Uni".to_string(),
                degree: "Bachelor of Science".to_string(),
                major: "CS".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_basic_score_components() {
        let jd = jd();
        let resume = resume();
        let request = ScoringRequest {
            job_id: "job-1",
            resume_id: "res-1",
            jd: &jd,
            resume: &resume,
        };
        let dto = basic_score(&request, today(), 12, 0).unwrap();

        assert_eq!(dto.skills.score, 50.0);
        // 24 months of a 4-year minimum
        assert_eq!(dto.experience.score, 50.0);
        assert_eq!(dto.education.score, 100.0);
        // 0.5×50 + 0.3×50 + 0.2×100
        assert_eq!(dto.overall_score, 60);
        assert_eq!(dto.processing_metrics.fallbacks_used, 1);
        assert_eq!(dto.processing_metrics.confidence_level, ConfidenceLevel::Low);
        assert!(dto.confidence_report.fallback_used);
        assert!(dto.enhanced.is_none());
    }

    #[test]
    fn test_education_is_binary() {
        let mut jd = jd();
        jd.education_level = EducationLevel::Master;
        let resume = resume();
        let request = ScoringRequest {
            job_id: "job-1",
            resume_id: "res-1",
            jd: &jd,
            resume: &resume,
        };
        assert_eq!(basic_score(&request, today(), 0, 0).unwrap().education.score, 0.0);
    }

    #[test]
    fn test_years_ratio() {
        assert_eq!(years_ratio_score(1.0, 0.0), 100.0);
        assert_eq!(years_ratio_score(8.0, 4.0), 100.0);
        assert_eq!(years_ratio_score(1.0, 4.0), 25.0);
    }
}
