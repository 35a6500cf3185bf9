// Prompt templates and schema hints for the scoring analyzers.
// Placeholders are filled with `str::replace`. Each schema hint starts with the
// name of the structure it describes.

use crate::llm_client::prompts::EVIDENCE_INSTRUCTION;
use crate::models::resume::WorkExperience;

pub const SKILL_SEMANTIC_SCHEMA: &str = r#"SkillSemanticMatches {
  "matches": [{"skill": string (the required skill), "matchedWith": string (a candidate skill), "similarity": number 0..1}]
}"#;

pub const SKILL_SEMANTIC_PROMPT_TEMPLATE: &str = "\
For each required skill, find the candidate skill that means the same thing or is a close
substitute (for example a framework of the required language). Skip required skills with no
reasonable substitute.

Required skills: {required}
Candidate skills: {candidate}";

pub const EXPERIENCE_JUDGMENT_SCHEMA: &str = r#"ExperienceJudgment {
  "relevantYears": number,
  "leadership": {"hasLeadership": bool, "leadershipYears": number, "teamSizeManaged": integer, "evidence": [string]},
  "careerProgression": {"score": number 0..100, "trend": "ascending"|"stable"|"descending"|"mixed", "promotions": integer},
  "relevanceFactors": {"skillAlignment": number 0..100, "industryRelevance": number 0..100, "roleSimilarity": number 0..100, "technologyRelevance": number 0..100}
}"#;

pub const EXPERIENCE_JUDGMENT_PROMPT_TEMPLATE: &str = "\
Assess this work history for a {seniority} role.
Required experience: {min_years}-{max_years} years. Required technologies: {technologies}.
Industry context: {industry}. Total tenure already computed: {total_years} years.

{evidence_instruction}

Work history:
{jobs}";

pub const INDUSTRY_PROMPT_TEMPLATE: &str = "\
Classify the industry of this employer in one or two words (for example: Technology, Finance,
Healthcare, Retail, Education, Manufacturing). Reply with the industry only.

Company: {company}
Position: {position}
Summary: {summary}";

pub const CULTURAL_INDICATORS_SCHEMA: &str = r#"CulturalFitIndicators {
  "workStyle": {"remoteReadiness": number 0..100, "collaborationPreference": number 0..100, "autonomyLevel": number 0..100, "evidence": [string]},
  "communication": {"written": number 0..100, "verbal": number 0..100, "presentation": number 0..100, "crossFunctional": number 0..100, "evidence": [string]},
  "leadershipStyle": {"style": "directive"|"collaborative"|"servant"|"transformational"|"none", "score": number 0..100, "evidence": [string]},
  "innovation": {"score": number 0..100, "riskTolerance": number 0..100, "evidence": [string]},
  "professionalMaturity": {"score": number 0..100, "evidence": [string]},
  "companySizePreference": {"preferred": "startup"|"small"|"medium"|"large"|"enterprise", "confidence": number 0..100, "evidence": [string]}
}"#;

pub const CULTURAL_INDICATORS_PROMPT_TEMPLATE: &str = "\
Infer the candidate's working style, communication style, leadership style, innovation
mindset, professional maturity and preferred company size from their resume.

{evidence_instruction}

Work history:
{jobs}
Skills: {skills}";

pub const SOFT_SKILLS_SCHEMA: &str = r#"SoftSkillsAssessment {
  "communication": {"score": number 0..100, "evidence": [string]},
  "teamwork": {...}, "problemSolving": {...}, "adaptability": {...},
  "leadership": {...}, "timeManagement": {...}, "criticalThinking": {...}, "emotionalIntelligence": {...}
}"#;

pub const SOFT_SKILLS_PROMPT_TEMPLATE: &str = "\
Rate the candidate's soft skills from the evidence in their resume.
The role asks for: {soft_skills}.

{evidence_instruction}

Work history:
{jobs}";

pub const RECOMMENDATIONS_SCHEMA: &str = r#"CulturalRecommendations {
  "strengths": [string], "concerns": [string], "developmentAreas": [string]
}"#;

pub const RECOMMENDATIONS_PROMPT_TEMPLATE: &str = "\
The company is a {size} organisation with a {work_style} work style, {decision_making}
decision making and {collaboration} collaboration. Its values: {values}.
List the candidate's cultural strengths, concerns and development areas for this company.

Work history:
{jobs}";

/// Renders a work history as numbered plain-text lines for prompts.
pub fn render_jobs(jobs: &[WorkExperience]) -> String {
    if jobs.is_empty() {
        return "(no work history provided)".to_string();
    }
    jobs.iter()
        .enumerate()
        .map(|(i, job)| {
            format!(
                "{}. {} at {} ({} – {}): {}",
                i + 1,
                job.position,
                job.company,
                job.start_date,
                if job.end_date.trim().is_empty() { "present" } else { job.end_date.as_str() },
                job.summary.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn with_evidence_instruction(template: &str) -> String {
    template.replace("{evidence_instruction}", EVIDENCE_INSTRUCTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_hints_are_named() {
        assert!(EXPERIENCE_JUDGMENT_SCHEMA.starts_with("ExperienceJudgment"));
        assert!(CULTURAL_INDICATORS_SCHEMA.starts_with("CulturalFitIndicators"));
        assert!(SOFT_SKILLS_SCHEMA.starts_with("SoftSkillsAssessment"));
        assert!(RECOMMENDATIONS_SCHEMA.starts_with("CulturalRecommendations"));
        assert!(SKILL_SEMANTIC_SCHEMA.starts_with("SkillSemanticMatches"));
    }

    #[test]
    fn test_render_jobs_marks_open_end_as_present() {
        let jobs = vec![WorkExperience {
            company: "Acme".to_string(),
            position: "Engineer".to_string(),
            start_date: "2021-01".to_string(),
            end_date: String::new(),
            summary: "Built APIs".to_string(),
        }];
        let rendered = render_jobs(&jobs);
        assert!(rendered.contains("Engineer at Acme (2021-01 – present): Built APIs"));
    }

    #[test]
    fn test_evidence_instruction_is_inlined() {
        let prompt = with_evidence_instruction(EXPERIENCE_JUDGMENT_PROMPT_TEMPLATE);
        assert!(!prompt.contains("{evidence_instruction}"));
        assert!(prompt.contains("Do NOT invent employers"));
    }
}
