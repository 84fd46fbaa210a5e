//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    AcceptedResponse, AttachmentRequest, AttachmentSlotResponse, ChatListItem, ChatListResponse,
    ErrorResponse, SubmitRequest, SuccessResponse,
};
use super::AppState;
use crate::attachment::{self, Attachment};
use crate::runtime::SessionError;
use crate::session::{SessionSnapshot, TransitionError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Current session
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        // User actions
        .route("/api/session/messages", post(submit_message))
        .route(
            "/api/session/attachment",
            get(get_attachment)
                .post(select_attachment)
                .delete(remove_attachment),
        )
        .route("/api/session/new", post(new_chat))
        .route("/api/session/cancel", post(cancel))
        // Saved chats
        .route("/api/chats", get(list_chats))
        .route("/api/chats/:id", get(get_chat))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before reading the snapshot so nothing falls in between
    let broadcast_rx = state.session.subscribe();
    sse_stream(state.session.snapshot(), broadcast_rx)
}

async fn submit_message(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>), AppError> {
    state.session.submit(req.text).await?;
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { accepted: true })))
}

async fn get_attachment(State(state): State<AppState>) -> Json<AttachmentSlotResponse> {
    Json(AttachmentSlotResponse {
        attachment: state.session.snapshot().attachment,
        accepted_extensions: attachment::ACCEPTED_EXTENSIONS,
    })
}

async fn select_attachment(
    State(state): State<AppState>,
    Json(req): Json<AttachmentRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    if !attachment::has_accepted_extension(&req.name) {
        tracing::debug!(name = %req.name, "Attachment extension not offered by the picker");
    }
    let file = match req.mime_type {
        Some(mime_type) => Attachment::new(req.name, mime_type, req.size),
        None => Attachment::guess(req.name, req.size),
    };
    state.session.select_attachment(Some(file)).await?;
    Ok(Json(state.session.snapshot()))
}

async fn remove_attachment(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.session.remove_attachment().await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn new_chat(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    state.session.new_chat().await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn cancel(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    state.session.cancel().await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Saved chats
// ============================================================

async fn list_chats(State(state): State<AppState>) -> Json<ChatListResponse> {
    let now = Utc::now();
    let chats = state
        .catalog
        .list()
        .await
        .iter()
        .map(|summary| ChatListItem::from_summary(summary, now))
        .collect();

    Json(ChatListResponse { chats })
}

async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let messages = state
        .catalog
        .load(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No saved messages for chat {id}")))?;

    Ok(Json(json!({ "id": id, "messages": messages })))
}

async fn get_version() -> &'static str {
    concat!("counsel-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> Self {
        let message = error.to_string();
        match error {
            SessionError::Rejected(TransitionError::Busy) => AppError::Conflict(message),
            SessionError::Rejected(_) => AppError::BadRequest(message),
            SessionError::Closed => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
