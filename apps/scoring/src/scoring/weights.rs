//! Seniority-dependent dimension weights and the education score.

use serde::{Deserialize, Serialize};

use crate::models::jd::{EducationLevel, Seniority};
use crate::models::resume::Education;
use crate::scoring::jd_mapping::parse_education_level;

/// Weights over the four dimensions. Always sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
    pub cultural_fit: f64,
}

impl ScoringWeights {
    const fn of(skills: f64, experience: f64, education: f64, cultural_fit: f64) -> Self {
        Self {
            skills,
            experience,
            education,
            cultural_fit,
        }
    }

    pub fn for_seniority(seniority: Seniority) -> Self {
        match seniority {
            Seniority::Junior => Self::of(0.5, 0.25, 0.15, 0.1),
            Seniority::Senior | Seniority::Lead => Self::of(0.35, 0.45, 0.1, 0.1),
            Seniority::Executive => Self::of(0.3, 0.4, 0.1, 0.2),
            Seniority::Mid => Self::of(0.4, 0.35, 0.15, 0.1),
        }
    }

    pub fn weighted_sum(&self, skills: f64, experience: f64, education: f64, cultural_fit: f64) -> f64 {
        self.skills * skills
            + self.experience * experience
            + self.education * education
            + self.cultural_fit * cultural_fit
    }
}

/// Highest level found across the candidate's degrees.
pub fn candidate_education_level(education: &[Education]) -> EducationLevel {
    education
        .iter()
        .map(|e| parse_education_level(&format!("{} {}", e.degree, e.major)))
        .max()
        .unwrap_or_default()
}

/// 85 at the required level, +5 per level above (max 100), −25 per level below (min 0).
pub fn education_score(candidate: EducationLevel, required: EducationLevel) -> f64 {
    let gap = candidate.rank() - required.rank();
    if gap >= 0 {
        (85.0 + 5.0 * gap as f64).min(100.0)
    } else {
        (85.0 + 25.0 * gap as f64).max(0.0)
    }
}
