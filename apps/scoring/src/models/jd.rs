use serde::{Deserialize, Serialize};

/// Required education level, ordered `Any < Bachelor < Master < Phd`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    #[default]
    Any,
    Bachelor,
    Master,
    Phd,
}

impl EducationLevel {
    /// Position in the 4-level hierarchy (any=0 … phd=3).
    pub fn rank(self) -> i32 {
        match self {
            EducationLevel::Any => 0,
            EducationLevel::Bachelor => 1,
            EducationLevel::Master => 2,
            EducationLevel::Phd => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Junior,
    #[default]
    Mid,
    Senior,
    Lead,
    Executive,
}

impl Seniority {
    pub fn is_senior_track(self) -> bool {
        matches!(self, Seniority::Senior | Seniority::Lead)
    }

    pub fn expects_leadership(self) -> bool {
        matches!(self, Seniority::Lead | Seniority::Executive)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredSkill {
    pub name: String,
    pub weight: f64,
    pub required: bool,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ExperienceRange {
    fn default() -> Self {
        Self { min: 0.0, max: 10.0 }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Company profile (cultural-fit input)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Startup,
    Small,
    #[default]
    Medium,
    Large,
    Enterprise,
}

impl CompanySize {
    pub fn ordinal(self) -> i32 {
        match self {
            CompanySize::Startup => 0,
            CompanySize::Small => 1,
            CompanySize::Medium => 2,
            CompanySize::Large => 3,
            CompanySize::Enterprise => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStyle {
    Remote,
    #[default]
    Hybrid,
    Office,
    Flexible,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMaking {
    Hierarchical,
    #[default]
    Collaborative,
    Autonomous,
    Consensus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InnovationLevel {
    Low,
    #[default]
    Medium,
    High,
    CuttingEdge,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Seed,
    #[default]
    Growth,
    Mature,
    Transformation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationStyle {
    Independent,
    #[default]
    Collaborative,
    CrossFunctional,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CultureProfile {
    pub values: Vec<String>,
    pub work_style: WorkStyle,
    pub decision_making: DecisionMaking,
    pub innovation: InnovationLevel,
    pub growth_stage: GrowthStage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamStructure {
    pub team_size: u32,
    pub management_layers: u32,
    pub collaboration_style: CollaborationStyle,
}

impl Default for TeamStructure {
    fn default() -> Self {
        Self {
            team_size: 8,
            management_layers: 3,
            collaboration_style: CollaborationStyle::Collaborative,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyProfile {
    pub size: CompanySize,
    pub culture: CultureProfile,
    pub team_structure: TeamStructure,
}

// ────────────────────────────────────────────────────────────────────────────
// Job description
// ────────────────────────────────────────────────────────────────────────────

/// Structured requirements for one job, cached by `job_id` once extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescription {
    pub job_id: String,
    pub required_skills: Vec<RequiredSkill>,
    pub experience_years: ExperienceRange,
    pub education_level: EducationLevel,
    pub soft_skills: Vec<String>,
    pub seniority: Seniority,
    pub company_profile: Option<CompanyProfile>,
    pub industry_context: Option<String>,
}

impl JobDescription {
    /// Names of the technical skills the JD asks for.
    pub fn required_technologies(&self) -> Vec<String> {
        self.required_skills
            .iter()
            .filter(|s| s.category == "technical")
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn required_industries(&self) -> Vec<String> {
        self.industry_context
            .iter()
            .filter(|i| !i.trim().is_empty())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_levels_are_ordered() {
        assert!(EducationLevel::Any < EducationLevel::Bachelor);
        assert!(EducationLevel::Bachelor < EducationLevel::Master);
        assert!(EducationLevel::Master < EducationLevel::Phd);
        assert_eq!(EducationLevel::Phd.rank() - EducationLevel::Bachelor.rank(), 2);
    }

    #[test]
    fn test_company_profile_deserializes_with_defaults() {
        let json = r#"{"size": "startup", "culture": {"workStyle": "remote", "innovation": "cutting_edge"}}"#;
        let profile: CompanyProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.size, CompanySize::Startup);
        assert_eq!(profile.culture.work_style, WorkStyle::Remote);
        assert_eq!(profile.culture.innovation, InnovationLevel::CuttingEdge);
        assert_eq!(profile.team_structure.management_layers, 3);
    }

    #[test]
    fn test_seniority_tracks() {
        assert!(Seniority::Lead.is_senior_track());
        assert!(!Seniority::Executive.is_senior_track());
        assert!(Seniority::Executive.expects_leadership());
        assert!(!Seniority::Junior.expects_leadership());
    }
}
