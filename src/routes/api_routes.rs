use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use super::AppState;
use crate::errors::{AppError, StoreError};
use crate::models::{
    ActiveConversation, ActiveTab, ConversationId, DocumentRequest, ListQuery, SendRequest,
    StartRequest, StartResponse,
};

// ── Conversations ────────────────────────────────────────────────────────────

/// GET `/api/conversations`: sidebar list
pub async fn list_conversations_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    Json(state.store.list_conversations(query.order))
}

/// POST `/api/conversations`: start a conversation with its first message
pub async fn start_conversation_handler(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Response {
    match state.store.start_conversation(&request.message, request.tags()) {
        Ok(conversation_id) => {
            (StatusCode::CREATED, Json(StartResponse { conversation_id })).into_response()
        }
        Err(e) => store_error_response(&e),
    }
}

/// GET `/api/conversations/{id}`: one conversation with its messages
pub async fn get_conversation_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let id = ConversationId::from(id);
    match state.store.conversation(&id) {
        Some(view) => Json(view).into_response(),
        None => store_error_response(&StoreError::NotFound { id: id.to_string() }),
    }
}

/// DELETE `/api/conversations/{id}`: always 204, deleting twice is fine
pub async fn delete_conversation_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> StatusCode {
    state.store.delete_conversation(&ConversationId::from(id));
    StatusCode::NO_CONTENT
}

/// POST `/api/conversations/{id}/messages`: send a user message; the reply arrives later
pub async fn send_message_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Response {
    match state.store.send_message(&ConversationId::from(id), &request.message) {
        Ok(message) => (StatusCode::ACCEPTED, Json(message)).into_response(),
        Err(e) => store_error_response(&e),
    }
}

/// PUT `/api/conversations/{id}/document`: attach or clear the document context
pub async fn set_document_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> Response {
    match state.store.set_document_context(&ConversationId::from(id), request.content) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_response(&e),
    }
}

/// POST `/api/submit`: send to the active conversation or start one
pub async fn submit_handler(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Response {
    match state.store.submit(&request.message, request.tags()) {
        Ok(conversation_id) => {
            (StatusCode::ACCEPTED, Json(StartResponse { conversation_id })).into_response()
        }
        Err(e) => store_error_response(&e),
    }
}

// ── Selection ────────────────────────────────────────────────────────────────

/// GET `/api/active`
pub async fn get_active_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(ActiveConversation { conversation_id: state.store.active_id() })
}

/// PUT `/api/active`: select a conversation, or `null` for a new chat
pub async fn set_active_handler(
    State(state): State<AppState>,
    Json(request): Json<ActiveConversation>,
) -> Response {
    match request.conversation_id {
        Some(id) => {
            if state.store.select_conversation(&id) {
                StatusCode::NO_CONTENT.into_response()
            } else {
                store_error_response(&StoreError::NotFound { id: id.to_string() })
            }
        }
        None => {
            state.store.clear_active();
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

// ── Preferences ──────────────────────────────────────────────────────────────

/// GET `/api/preferences/active-tab`
pub async fn get_active_tab_handler(State(state): State<AppState>) -> Response {
    match state.preferences.active_tab().await {
        Ok(tab) => Json(ActiveTab { tab }).into_response(),
        Err(e) => app_error_response(&e),
    }
}

/// PUT `/api/preferences/active-tab`
pub async fn set_active_tab_handler(
    State(state): State<AppState>,
    Json(request): Json<ActiveTab>,
) -> Response {
    match state.preferences.set_active_tab(&request.tab).await {
        Ok(tab) => Json(ActiveTab { tab }).into_response(),
        Err(e) => app_error_response(&e),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn store_error_response(err: &StoreError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::CONFLICT
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn app_error_response(err: &AppError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        error!("Request failed: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
