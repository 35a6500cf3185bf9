pub mod confidence;
pub mod cultural_fit;
pub mod experience;
pub mod fallback;
pub mod jd_cache;
pub mod jd_mapping;
pub mod orchestrator;
pub mod prompts;
pub mod skill_matcher;
pub mod telemetry;
pub mod weights;

pub use orchestrator::ScoringService;
