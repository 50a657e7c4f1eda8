//! Question answering endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::rag::types::{FinalResponse, Question};

/// `POST /ask`: answer a question, with citations for medical questions.
///
/// Body: `{"question": "..."}`. A blank question is rejected before any
/// collaborator is called.
pub async fn ask(
    State(ctx): State<ApiContext>,
    payload: Result<Json<Question>, JsonRejection>,
) -> Result<Json<FinalResponse>, ApiError> {
    let Json(Question { question }) =
        payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if question.trim().is_empty() {
        return Err(ApiError::BadRequest("Question cannot be empty".into()));
    }

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("ask", %request_id);
    let pipeline = ctx.ask.clone();

    let response =
        tokio::task::spawn_blocking(move || span.in_scope(|| pipeline.ask(&question))).await??;

    Ok(Json(response))
}
