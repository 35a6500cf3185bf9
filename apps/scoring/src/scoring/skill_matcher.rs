//! Skill Matcher: scores resume skills against the JD's required skills.
//!
//! Tiers, best match wins per JD skill:
//! 1. exact (case-insensitive)              → 1.0
//! 2. alias (canonical form, e.g. Node.js)  → 0.9
//! 3. fuzzy (Jaro–Winkler ≥ 0.9)            → 0.75 × similarity
//! 4. semantic (one AI call for leftovers)  → 0.6 × similarity, accepted at ≥ 0.6
//!
//! score = 0.8 × weighted strength % + 0.2 × required coverage %

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm_client::AiGateway;
use crate::models::jd::RequiredSkill;
use crate::models::score::ScoreComponent;
use crate::scoring::prompts::{SKILL_SEMANTIC_PROMPT_TEMPLATE, SKILL_SEMANTIC_SCHEMA};
use crate::scoring::telemetry::CallLog;

const FUZZY_THRESHOLD: f64 = 0.9;
const FUZZY_MIN_LENGTH_RATIO: f64 = 0.7;
const SEMANTIC_THRESHOLD: f64 = 0.6;
const NO_REQUIREMENTS_SCORE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Alias,
    Fuzzy,
    Semantic,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMatch {
    pub skill: String,
    pub matched_with: Option<String>,
    pub kind: MatchKind,
    pub strength: f64, // 0.0 – 1.0
    pub required: bool,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMatchResult {
    pub overall_score: f64,
    pub confidence: f64,
    pub evidence_strength: f64,
    pub required_coverage: f64,
    pub matches: Vec<SkillMatch>,
    pub semantic_used: bool,
    /// The semantic call failed and leftovers stayed unmatched.
    pub degraded: bool,
}

impl SkillMatchResult {
    pub fn component(&self) -> ScoreComponent {
        let count = |kind: MatchKind| self.matches.iter().filter(|m| m.kind == kind).count() as f64;
        ScoreComponent::new(self.overall_score, self.confidence, self.evidence_strength)
            .with_detail("exactMatches", count(MatchKind::Exact))
            .with_detail("aliasMatches", count(MatchKind::Alias))
            .with_detail("fuzzyMatches", count(MatchKind::Fuzzy))
            .with_detail("semanticMatches", count(MatchKind::Semantic))
            .with_detail("missing", count(MatchKind::Missing))
            .with_detail("requiredCoverage", self.required_coverage)
    }
}

#[derive(Debug, Deserialize)]
struct SemanticMatches {
    #[serde(default)]
    matches: Vec<SemanticMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SemanticMatch {
    skill: String,
    matched_with: String,
    similarity: f64,
}

pub struct SkillMatcher {
    ai: AiGateway,
}

impl SkillMatcher {
    pub fn new(ai: AiGateway) -> Self {
        Self { ai }
    }

    pub async fn match_skills(
        &self,
        required: &[RequiredSkill],
        candidate: &[String],
        log: &CallLog,
    ) -> SkillMatchResult {
        if required.is_empty() {
            return SkillMatchResult {
                overall_score: NO_REQUIREMENTS_SCORE,
                confidence: 0.5,
                evidence_strength: 0.0,
                required_coverage: 100.0,
                matches: vec![],
                semantic_used: false,
                degraded: false,
            };
        }

        let mut matches: Vec<SkillMatch> = required
            .iter()
            .map(|skill| deterministic_match(skill, candidate))
            .collect();

        let unmatched: Vec<&str> = matches
            .iter()
            .filter(|m| m.kind == MatchKind::Missing)
            .map(|m| m.skill.as_str())
            .collect();

        let mut semantic_used = false;
        let mut degraded = false;

        if !unmatched.is_empty() && !candidate.is_empty() {
            let prompt = SKILL_SEMANTIC_PROMPT_TEMPLATE
                .replace("{required}", &unmatched.join(", "))
                .replace("{candidate}", &candidate.join(", "));

            match self
                .ai
                .structured::<SemanticMatches>(log, "skills.semantic", &prompt, SKILL_SEMANTIC_SCHEMA)
                .await
            {
                Ok(response) => {
                    semantic_used = apply_semantic_matches(&mut matches, candidate, response.matches);
                }
                Err(_) => {
                    log.record_fallback("skills.semantic");
                    degraded = true;
                }
            }
        }

        let result = summarize(matches, semantic_used, degraded);
        debug!(
            score = result.overall_score,
            coverage = result.required_coverage,
            "Skill match computed"
        );
        result
    }
}

fn deterministic_match(skill: &RequiredSkill, candidate: &[String]) -> SkillMatch {
    let wanted_lower = skill.name.trim().to_lowercase();
    let wanted_canonical = canonical(&skill.name);

    let mut best: Option<(MatchKind, f64, &String)> = None;
    for have in candidate {
        let (kind, strength) = if have.trim().to_lowercase() == wanted_lower {
            (MatchKind::Exact, 1.0)
        } else if !wanted_canonical.is_empty() && canonical(have) == wanted_canonical {
            (MatchKind::Alias, 0.9)
        } else {
            match fuzzy_similarity(&wanted_canonical, &canonical(have)) {
                Some(sim) => (MatchKind::Fuzzy, 0.75 * sim),
                None => continue,
            }
        };
        if best.map_or(true, |(_, s, _)| strength > s) {
            best = Some((kind, strength, have));
        }
    }

    match best {
        Some((kind, strength, have)) => SkillMatch {
            skill: skill.name.clone(),
            matched_with: Some(have.clone()),
            kind,
            strength,
            required: skill.required,
            weight: skill.weight,
        },
        None => SkillMatch {
            skill: skill.name.clone(),
            matched_with: None,
            kind: MatchKind::Missing,
            strength: 0.0,
            required: skill.required,
            weight: skill.weight,
        },
    }
}

/// Accepts AI matches that name a real candidate skill. Returns whether any were applied.
fn apply_semantic_matches(
    matches: &mut [SkillMatch],
    candidate: &[String],
    semantic: Vec<SemanticMatch>,
) -> bool {
    let mut applied = false;
    for found in semantic {
        let similarity = found.similarity.clamp(0.0, 1.0);
        if similarity < SEMANTIC_THRESHOLD {
            continue;
        }
        let Some(have) = candidate
            .iter()
            .find(|c| c.trim().eq_ignore_ascii_case(found.matched_with.trim()))
        else {
            continue;
        };
        if let Some(slot) = matches.iter_mut().find(|m| {
            m.kind == MatchKind::Missing && m.skill.trim().eq_ignore_ascii_case(found.skill.trim())
        }) {
            slot.kind = MatchKind::Semantic;
            slot.strength = 0.6 * similarity;
            slot.matched_with = Some(have.clone());
            applied = true;
        }
    }
    applied
}

fn summarize(matches: Vec<SkillMatch>, semantic_used: bool, degraded: bool) -> SkillMatchResult {
    let total_weight: f64 = matches.iter().map(|m| m.weight.max(0.0)).sum();
    let weighted = if total_weight > 0.0 {
        matches.iter().map(|m| m.weight.max(0.0) * m.strength).sum::<f64>() / total_weight
    } else {
        matches.iter().map(|m| m.strength).sum::<f64>() / matches.len() as f64
    };

    let required: Vec<&SkillMatch> = matches.iter().filter(|m| m.required).collect();
    let required_coverage = if required.is_empty() {
        weighted * 100.0
    } else {
        required.iter().filter(|m| m.strength > 0.0).count() as f64 / required.len() as f64 * 100.0
    };

    let overall_score = (0.8 * weighted * 100.0 + 0.2 * required_coverage).clamp(0.0, 100.0);
    let evidence_strength =
        matches.iter().map(|m| m.strength).sum::<f64>() / matches.len() as f64 * 100.0;

    let has_missing = matches.iter().any(|m| m.kind == MatchKind::Missing);
    let confidence = if degraded && has_missing {
        0.7
    } else if semantic_used {
        0.75
    } else {
        0.9
    };

    SkillMatchResult {
        overall_score,
        confidence,
        evidence_strength,
        required_coverage,
        matches,
        semantic_used,
        degraded,
    }
}

/// Lowercase, punctuation-free form with common aliases folded together.
fn canonical(skill: &str) -> String {
    let mut s: String = skill
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.'))
        .collect();
    if s.len() > 4 && s.ends_with("js") {
        s.truncate(s.len() - 2);
    }
    match s.as_str() {
        "postgres" => "postgresql".to_string(),
        "k8s" => "kubernetes".to_string(),
        "golang" => "go".to_string(),
        "ts" => "typescript".to_string(),
        "js" => "javascript".to_string(),
        "py" => "python".to_string(),
        _ => s,
    }
}

fn fuzzy_similarity(a: &str, b: &str) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if (short.len() as f64 / long.len() as f64) < FUZZY_MIN_LENGTH_RATIO {
        return None;
    }
    let sim = strsim::jaro_winkler(a, b);
    (sim >= FUZZY_THRESHOLD).then_some(sim)
}
