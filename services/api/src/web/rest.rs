//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the diary entry endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{analyze, auth, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use diary_core::{domain::DiaryEntry, lifecycle::DiaryError, ports::PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        analyze::analyze_mood_handler,
        list_entries_handler,
        create_entry_handler,
        update_entry_handler,
        delete_entry_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::session_handler,
    ),
    components(
        schemas(
            EntryResponse,
            EntryPayload,
            analyze::AnalyzeMoodRequest,
            analyze::AnalyzeMoodResponse,
            analyze::AnalyzeMoodError,
            analyze::AnalyzeMoodFailure,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
        )
    ),
    tags(
        (name = "Mood Diary API", description = "Diary entries annotated with mood emojis and a sentiment reflection.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The body of a create or edit request.
#[derive(Deserialize, ToSchema)]
pub struct EntryPayload {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
}

/// A diary entry as returned to the client.
#[derive(Serialize, ToSchema)]
pub struct EntryResponse {
    id: Uuid,
    user_id: Uuid,
    title: Option<String>,
    content: String,
    mood_emojis: Vec<String>,
    sentiment_analysis: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<DiaryEntry> for EntryResponse {
    fn from(entry: DiaryEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            title: entry.title,
            content: entry.content,
            mood_emojis: entry.mood_emojis,
            sentiment_analysis: entry.sentiment_analysis,
            created_at: entry.created_at,
        }
    }
}

/// Maps a lifecycle error onto a short, user-facing message.
fn reject(action: &str, e: DiaryError) -> (StatusCode, String) {
    match e {
        DiaryError::EmptyContent => (StatusCode::BAD_REQUEST, e.to_string()),
        DiaryError::Port(PortError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, "Entry not found".to_string())
        }
        DiaryError::Port(e) => {
            error!("Failed to {}: {:?}", action, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}", action),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the current user's entries, newest first.
#[utoipa::path(
    get,
    path = "/entries",
    responses(
        (status = 200, description = "Entries of the signed-in user", body = [EntryResponse]),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_entries_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = app_state
        .diary
        .list_entries(user_id)
        .await
        .map_err(|e| reject("load entries", e))?;

    let body: Vec<EntryResponse> = entries.into_iter().map(EntryResponse::from).collect();
    Ok(Json(body))
}

/// Create an entry. The mood is analyzed before saving; an analysis failure
/// saves the entry without annotations.
#[utoipa::path(
    post,
    path = "/entries",
    request_body = EntryPayload,
    responses(
        (status = 201, description = "Entry saved", body = EntryResponse),
        (status = 400, description = "Content is empty"),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<EntryPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entry = app_state
        .diary
        .create_entry(user_id, payload.title.as_deref(), &payload.content)
        .await
        .map_err(|e| reject("save entry", e))?;

    Ok((StatusCode::CREATED, Json(EntryResponse::from(entry))))
}

/// Edit an entry. The mood is only re-analyzed when the content changed.
#[utoipa::path(
    put,
    path = "/entries/{id}",
    request_body = EntryPayload,
    responses(
        (status = 200, description = "Entry updated", body = EntryResponse),
        (status = 400, description = "Content is empty"),
        (status = 401, description = "No active session"),
        (status = 404, description = "No such entry for this user"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The entry to edit.")
    )
)]
pub async fn update_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<EntryPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entry = app_state
        .diary
        .update_entry(user_id, entry_id, payload.title.as_deref(), &payload.content)
        .await
        .map_err(|e| reject("update entry", e))?;

    Ok(Json(EntryResponse::from(entry)))
}

/// Delete an entry permanently.
#[utoipa::path(
    delete,
    path = "/entries/{id}",
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 401, description = "No active session"),
        (status = 404, description = "No such entry for this user"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = Uuid, Path, description = "The entry to delete.")
    )
)]
pub async fn delete_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .diary
        .delete_entry(user_id, entry_id)
        .await
        .map_err(|e| reject("delete entry", e))?;

    Ok(StatusCode::NO_CONTENT)
}
