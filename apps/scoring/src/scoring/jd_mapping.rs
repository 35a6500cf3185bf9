//! JD mapping: converts a `jd.extracted` payload into the cached `JobDescription`.
//!
//! The free-text conversions here are part of the event contract and must stay
//! stable: experience text → `{min,max}`, education text → level, keywords → seniority.

use std::collections::HashSet;

use crate::models::events::{ExtractedJdData, TechnicalRequirement};
use crate::models::jd::{EducationLevel, ExperienceRange, JobDescription, RequiredSkill, Seniority};

/// Builds the cached JD for `job_id` from the extractor's output.
pub fn job_description_from_extracted(job_id: &str, data: &ExtractedJdData) -> JobDescription {
    let requirements = &data.requirements;
    let experience_text = requirements.experience.as_deref().unwrap_or_default();
    let experience_years = parse_experience_range(experience_text);

    JobDescription {
        job_id: job_id.to_string(),
        required_skills: map_technical_requirements(&requirements.technical),
        experience_years,
        education_level: parse_education_level(requirements.education.as_deref().unwrap_or_default()),
        soft_skills: requirements
            .soft
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        seniority: infer_seniority(experience_text, experience_years),
        company_profile: data.company_profile.clone(),
        industry_context: data
            .company
            .industry
            .as_ref()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty()),
    }
}

fn map_technical_requirements(technical: &[TechnicalRequirement]) -> Vec<RequiredSkill> {
    let mut seen = HashSet::new();
    technical
        .iter()
        .map(|req| match req {
            TechnicalRequirement::Name(name) => RequiredSkill {
                name: name.trim().to_string(),
                weight: 1.0,
                required: true,
                category: "technical".to_string(),
            },
            TechnicalRequirement::Detailed {
                name,
                weight,
                required,
                category,
            } => RequiredSkill {
                name: name.trim().to_string(),
                weight: weight.unwrap_or(1.0).max(0.0),
                required: required.unwrap_or(true),
                category: category.clone().unwrap_or_else(|| "technical".to_string()),
            },
        })
        .filter(|skill| !skill.name.is_empty() && seen.insert(skill.name.to_lowercase()))
        .collect()
}

/// `"3-5 years"` → {3,5}; `"5+ years"` → {5,10}; `"4 years"` → {4,7}; no number → {0,10}.
pub fn parse_experience_range(text: &str) -> ExperienceRange {
    let lower = text.to_lowercase();
    let numbers = extract_numbers(&lower);

    let Some(&(min, _, min_end)) = numbers.first() else {
        return ExperienceRange::default();
    };

    if lower[min_end..].trim_start().starts_with('+') {
        return ExperienceRange { min, max: min + 5.0 };
    }

    if let Some(&(max, max_start, _)) = numbers.get(1) {
        let separator = lower[min_end..max_start].trim();
        if matches!(separator, "-" | "–" | "—" | "~" | "to") && max >= min {
            return ExperienceRange { min, max };
        }
    }

    ExperienceRange { min, max: min + 3.0 }
}

/// Numbers in `text` with their byte span.
fn extract_numbers(text: &str) -> Vec<(f64, usize, usize)> {
    let mut numbers = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        let part_of_number = c.is_ascii_digit() || (c == '.' && start.is_some());
        match (part_of_number, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                push_number(text, s, i, &mut numbers);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        push_number(text, s, text.len(), &mut numbers);
    }
    numbers
}

fn push_number(text: &str, start: usize, end: usize, out: &mut Vec<(f64, usize, usize)>) {
    let raw = text[start..end].trim_end_matches('.');
    if let Ok(value) = raw.parse::<f64>() {
        out.push((value, start, start + raw.len()));
    }
}

pub fn parse_education_level(text: &str) -> EducationLevel {
    let lower = text.to_lowercase();
    let words = words(&lower);
    let has_word = |w: &str| words.contains(&w);

    if lower.contains("phd") || lower.contains("ph.d") || lower.contains("doctor") || lower.contains("博士") {
        EducationLevel::Phd
    } else if lower.contains("master")
        || lower.contains("msc")
        || lower.contains("mba")
        || lower.contains("m.s.")
        || lower.contains("硕士")
    {
        EducationLevel::Master
    } else if lower.contains("bachelor")
        || lower.contains("degree")
        || lower.contains("bsc")
        || lower.contains("b.s.")
        || lower.contains("本科")
        || has_word("bs")
        || has_word("ba")
    {
        EducationLevel::Bachelor
    } else {
        EducationLevel::Any
    }
}

/// Seniority from keywords in the experience requirement, else from minimum years.
pub fn infer_seniority(text: &str, range: ExperienceRange) -> Seniority {
    let lower = text.to_lowercase();
    let words = words(&lower);
    let has_any = |candidates: &[&str]| candidates.iter().any(|c| words.contains(c));

    if has_any(&["executive", "director", "vp", "chief"]) || lower.contains("head of") {
        Seniority::Executive
    } else if has_any(&["lead", "principal"]) {
        Seniority::Lead
    } else if has_any(&["senior", "sr"]) || lower.contains("7+") || lower.contains("8+") {
        Seniority::Senior
    } else if has_any(&["junior", "jr", "entry"]) {
        Seniority::Junior
    } else if range.min >= 7.0 {
        Seniority::Senior
    } else if range.min >= 3.0 {
        Seniority::Mid
    } else {
        Seniority::Junior
    }
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::{ExtractedCompany, ExtractedRequirements};

    #[test]
    fn test_experience_range_forms() {
        assert_eq!(parse_experience_range("3-5 years"), ExperienceRange { min: 3.0, max: 5.0 });
        assert_eq!(parse_experience_range("3 to 6 yrs"), ExperienceRange { min: 3.0, max: 6.0 });
        assert_eq!(parse_experience_range("5+ years"), ExperienceRange { min: 5.0, max: 10.0 });
        assert_eq!(parse_experience_range("2.5 years"), ExperienceRange { min: 2.5, max: 5.5 });
        assert_eq!(parse_experience_range("extensive"), ExperienceRange { min: 0.0, max: 10.0 });
        assert_eq!(parse_experience_range(""), ExperienceRange::default());
    }

    #[test]
    fn test_education_levels() {
        assert_eq!(parse_education_level("PhD in Computer Science"), EducationLevel::Phd);
        assert_eq!(parse_education_level("Master's preferred"), EducationLevel::Master);
        assert_eq!(parse_education_level("Bachelor's degree"), EducationLevel::Bachelor);
        assert_eq!(parse_education_level("BS in CS or equivalent"), EducationLevel::Bachelor);
        assert_eq!(parse_education_level("本科及以上"), EducationLevel::Bachelor);
        assert_eq!(parse_education_level("none"), EducationLevel::Any);
    }

    #[test]
    fn test_seniority_keywords_take_precedence() {
        let range = ExperienceRange { min: 1.0, max: 3.0 };
        assert_eq!(infer_seniority("Principal engineer level", range), Seniority::Lead);
        assert_eq!(infer_seniority("Senior, 5 years", range), Seniority::Senior);
        assert_eq!(infer_seniority("8+ years", range), Seniority::Senior);
        assert_eq!(infer_seniority("entry level", range), Seniority::Junior);
        assert_eq!(infer_seniority("Head of platform", range), Seniority::Executive);
    }

    #[test]
    fn test_seniority_falls_back_to_years() {
        assert_eq!(infer_seniority("", ExperienceRange { min: 7.0, max: 10.0 }), Seniority::Senior);
        assert_eq!(infer_seniority("", ExperienceRange { min: 3.0, max: 5.0 }), Seniority::Mid);
        assert_eq!(infer_seniority("", ExperienceRange { min: 1.0, max: 2.0 }), Seniority::Junior);
    }

    #[test]
    fn test_job_description_from_extracted() {
        let data = ExtractedJdData {
            requirements: ExtractedRequirements {
                technical: vec![
                    TechnicalRequirement::Name("TypeScript".to_string()),
                    TechnicalRequirement::Name("typescript".to_string()),
                    TechnicalRequirement::Name("  ".to_string()),
                    TechnicalRequirement::Detailed {
                        name: "Node".to_string(),
                        weight: Some(0.5),
                        required: Some(false),
                        category: None,
                    },
                ],
                soft: vec!["communication".to_string()],
                experience: Some("2-5 years".to_string()),
                education: Some("Bachelor".to_string()),
            },
            company: ExtractedCompany {
                industry: Some("Fintech".to_string()),
            },
            company_profile: None,
        };

        let jd = job_description_from_extracted("job-1", &data);
        assert_eq!(jd.required_skills.len(), 2);
        assert!(!jd.required_skills[1].required);
        assert_eq!(jd.experience_years, ExperienceRange { min: 2.0, max: 5.0 });
        assert_eq!(jd.education_level, EducationLevel::Bachelor);
        assert_eq!(jd.seniority, Seniority::Junior);
        assert_eq!(jd.industry_context.as_deref(), Some("Fintech"));
    }
}
