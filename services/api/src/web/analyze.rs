//! services/api/src/web/analyze.rs
//!
//! The mood-analysis endpoint. Its JSON bodies, including the error bodies, are a
//! compatibility surface for the browser client, so they are built here rather than
//! through the `(StatusCode, String)` errors the other handlers use.

use axum::{
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use diary_core::analysis::{
    analyze_content, AnalysisOutcome, CONTENT_REQUIRED, RATE_LIMIT_EXCEEDED,
};
use diary_core::domain::AnalysisResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::state::AppState;

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct AnalyzeMoodRequest {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AnalyzeMoodResponse {
    pub emojis: Vec<String>,
    pub sentiment: String,
}

#[derive(Serialize, ToSchema)]
pub struct AnalyzeMoodError {
    pub error: String,
}

/// Returned on internal failure: the error plus the fallback analysis.
#[derive(Serialize, ToSchema)]
pub struct AnalyzeMoodFailure {
    pub error: String,
    pub emojis: Vec<String>,
    pub sentiment: String,
}

impl From<AnalysisResult> for AnalyzeMoodResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            emojis: result.emojis,
            sentiment: result.sentiment,
        }
    }
}

fn failure(message: String) -> Response {
    let fallback = AnalysisResult::unavailable();
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(AnalyzeMoodFailure {
            error: message,
            emojis: fallback.emojis,
            sentiment: fallback.sentiment,
        }),
    )
        .into_response()
}

//=========================================================================================
// Handler
//=========================================================================================

/// Analyze the mood of a piece of diary text.
#[utoipa::path(
    post,
    path = "/analyze-mood",
    request_body = AnalyzeMoodRequest,
    responses(
        (status = 200, description = "Mood analyzed", body = AnalyzeMoodResponse),
        (status = 400, description = "Content missing or blank", body = AnalyzeMoodError),
        (status = 429, description = "AI gateway rate limit reached", body = AnalyzeMoodError),
        (status = 500, description = "Analysis failed; fallback values included", body = AnalyzeMoodFailure)
    )
)]
pub async fn analyze_mood_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    // Unreadable bodies, oversized ones included, still get the JSON fallback.
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            error!("Error reading analyze-mood request body: {:?}", e);
            return failure(e.body_text());
        }
    };

    let request: AnalyzeMoodRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            error!("Error in analyze-mood request body: {:?}", e);
            return failure(e.to_string());
        }
    };

    match analyze_content(state.mood_adapter.as_ref(), request.content.as_deref()).await {
        AnalysisOutcome::Analyzed(result) => Json(AnalyzeMoodResponse::from(result)).into_response(),
        AnalysisOutcome::MissingContent => (
            StatusCode::BAD_REQUEST,
            Json(AnalyzeMoodError {
                error: CONTENT_REQUIRED.to_string(),
            }),
        )
            .into_response(),
        AnalysisOutcome::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(AnalyzeMoodError {
                error: RATE_LIMIT_EXCEEDED.to_string(),
            }),
        )
            .into_response(),
        AnalysisOutcome::Failed(message) => failure(message),
    }
}
