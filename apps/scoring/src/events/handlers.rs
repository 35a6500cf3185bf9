use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::events::{JdExtractedEvent, ResumeParsedEvent};
use crate::models::jd::JobDescription;
use crate::scoring::orchestrator::ResumeOutcome;
use crate::state::AppState;

/// POST /api/v1/events/jd-extracted
/// Caches the structured JD; returns what was cached.
pub async fn handle_jd_extracted(
    State(state): State<AppState>,
    Json(event): Json<JdExtractedEvent>,
) -> Result<Json<JobDescription>, AppError> {
    let jd = state.scoring.handle_jd_extracted(event).await?;
    Ok(Json(jd))
}

/// POST /api/v1/events/resume-parsed
/// Scores the resume against its cached JD and publishes the outcome event.
/// A published failure (e.g. no cached JD) is still a 200 so the bridge does not redeliver it.
pub async fn handle_resume_parsed(
    State(state): State<AppState>,
    Json(event): Json<ResumeParsedEvent>,
) -> Result<Json<ResumeOutcome>, AppError> {
    let outcome = state.scoring.handle_resume_parsed(event).await?;
    Ok(Json(outcome))
}
