pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::events::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Inbound events, bridged from the bus
        .route(
            "/api/v1/events/jd-extracted",
            post(handlers::handle_jd_extracted),
        )
        .route(
            "/api/v1/events/resume-parsed",
            post(handlers::handle_resume_parsed),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::events::testing::RecordingPublisher;
    use crate::llm_client::testing::FailingAiClient;
    use crate::llm_client::AiGateway;
    use crate::scoring::jd_cache::JdCache;
    use crate::scoring::ScoringService;

    fn app() -> Router {
        let scoring = ScoringService::new(
            AiGateway::new(Arc::new(FailingAiClient), Duration::from_secs(5)),
            JdCache::new(Duration::from_secs(3600), 100),
            Arc::new(RecordingPublisher::new()),
        )
        .unwrap();
        build_router(AppState {
            scoring: Arc::new(scoring),
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn resume_event(job_id: &str) -> Value {
        json!({
            "jobId": job_id,
            "resumeId": "res-1",
            "resumeDto": {
                "contactInfo": {"name": "Ada", "email": "ada@example.com"},
                "skills": ["TypeScript", "Node"],
                "workExperience": [{
                    "company": "Acme",
                    "position": "Engineer",
                    "startDate": "2020-01",
                    "endDate": "2020-12",
                    "summary": "Built services."
                }],
                "education": [{"school": "Uni", "degree": "Bachelor of Science", "major": "CS"}]
            }
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cachedJobDescriptions"], 0);
    }

    #[tokio::test]
    async fn test_resume_for_unknown_job_reports_published_failure() {
        let response = app()
            .oneshot(post_json("/api/v1/events/resume-parsed", resume_event("nope")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "failed");
        assert_eq!(body["stage"], "jd_lookup");
        assert_eq!(body["error"]["name"], "MissingJdError");
        assert_eq!(body["published"]["success"], true);
    }

    #[tokio::test]
    async fn test_missing_fields_are_bad_request() {
        let response = app()
            .oneshot(post_json("/api/v1/events/resume-parsed", json!({"jobId": "job-1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_jd_then_resume_scores() {
        let app = app();
        let jd_event = json!({
            "jobId": "job-1",
            "extractedData": {
                "requirements": {
                    "technical": ["typescript", "node"],
                    "experience": "2-5 years",
                    "education": "Bachelor"
                },
                "company": {"name": "Acme"}
            }
        });
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/events/jd-extracted", jd_event))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["seniority"], "junior");

        let response = app
            .oneshot(post_json("/api/v1/events/resume-parsed", resume_event("job-1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "completed");
        let score = body["matchScore"]["overallScore"].as_u64().unwrap();
        assert!(score <= 100);
        assert_eq!(body["published"]["success"], true);
    }
}
