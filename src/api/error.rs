//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::health::HealthError;
use crate::pipeline::rag::RagError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("Health record not found: {0}")]
    RecordNotFound(String),
    #[error("Health record malformed: {0}")]
    RecordMalformed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                detail.clone(),
            ),
            ApiError::RetrievalUnavailable(detail) => {
                tracing::warn!(detail, "Medical knowledge base unreachable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "RETRIEVAL_UNAVAILABLE",
                    "Medical knowledge base is unavailable".to_string(),
                )
            }
            ApiError::GenerationFailed(detail) => {
                tracing::warn!(detail, "Language model call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_FAILED",
                    "Language model did not produce an answer".to_string(),
                )
            }
            ApiError::RecordNotFound(detail) => {
                tracing::error!(detail, "Health record missing");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RECORD_NOT_FOUND",
                    "Health record not found".to_string(),
                )
            }
            ApiError::RecordMalformed(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RECORD_MALFORMED",
                detail.clone(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::RetrievalUnavailable(detail) => ApiError::RetrievalUnavailable(detail),
            RagError::GenerationFailure(detail) => ApiError::GenerationFailed(detail),
        }
    }
}

impl From<HealthError> for ApiError {
    fn from(err: HealthError) -> Self {
        match err {
            HealthError::RecordNotFound(path) => ApiError::RecordNotFound(path.display().to_string()),
            HealthError::RecordMalformed(detail) => ApiError::RecordMalformed(detail),
            HealthError::Generation(e) => e.into(),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::path::PathBuf;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn bad_request_returns_400_with_detail() {
        let response = ApiError::BadRequest("question must not be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(json["error"]["message"], "question must not be empty");
    }

    #[tokio::test]
    async fn retrieval_unavailable_returns_503() {
        let api_err: ApiError = RagError::RetrievalUnavailable("index down".into()).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "RETRIEVAL_UNAVAILABLE");
    }

    #[tokio::test]
    async fn generation_failure_returns_502() {
        let api_err: ApiError = RagError::GenerationFailure("timeout".into()).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "GENERATION_FAILED");
    }

    #[tokio::test]
    async fn health_errors_map_to_record_codes() {
        let api_err: ApiError = HealthError::RecordNotFound(PathBuf::from("/x.json")).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"]["code"], "RECORD_NOT_FOUND");

        let api_err: ApiError = HealthError::RecordMalformed("bad value".into()).into();
        assert_eq!(body_json(api_err.into_response()).await["error"]["code"], "RECORD_MALFORMED");
    }

    #[tokio::test]
    async fn diagnosis_generation_failure_maps_like_ask() {
        let api_err: ApiError =
            HealthError::Generation(RagError::GenerationFailure("down".into())).into();
        assert_eq!(api_err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn internal_returns_500() {
        let response = ApiError::Internal("something broke".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        // Internal errors hide details from client
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }
}
