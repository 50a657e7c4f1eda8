//! Wearable record diagnosis endpoint.

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::health::Diagnosis;

/// `GET /diagnose`: summarize the configured record and return the model's read.
pub async fn diagnose(State(ctx): State<ApiContext>) -> Result<Json<Diagnosis>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("diagnose", %request_id);
    let composer = ctx.diagnostics.clone();
    let path = ctx.record_path.clone();

    let diagnosis =
        tokio::task::spawn_blocking(move || span.in_scope(|| composer.diagnose_file(&path)))
            .await??;

    Ok(Json(diagnosis))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::router::api_router;
    use crate::api::types::test_support::context_with;
    use crate::pipeline::rag::orchestrator::tests::MockLlm;

    fn get_diagnose() -> Request<Body> {
        Request::get("/diagnose").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn returns_model_diagnosis() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"HealthData":{"Record":[
                {"@type":"HKQuantityTypeIdentifierHeartRate","@value":"60"},
                {"@type":"HKQuantityTypeIdentifierHeartRate","@value":"80"}
            ]}}"#,
        )
        .unwrap();
        let llm = Arc::new(MockLlm::answering("Possible issues: none."));
        let app = api_router(context_with(llm.clone(), file.path().to_path_buf()));

        let response = app.oneshot(get_diagnose()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["diagnosis"], "Possible issues: none.");
        assert!(llm.last_prompt().unwrap().contains("- Avg heart rate: 70.0 bpm"));
    }

    #[tokio::test]
    async fn missing_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(MockLlm::answering("unused"));
        let app = api_router(context_with(llm.clone(), dir.path().join("none.json")));

        let response = app.oneshot(get_diagnose()).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "RECORD_NOT_FOUND");
        assert_eq!(llm.calls(), 0);
    }
}
