pub mod api_routes;
pub mod ws_routes;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::preference_service::PreferenceService;
use crate::store::ConversationStore;

use api_routes::{
    delete_conversation_handler, get_active_handler, get_active_tab_handler,
    get_conversation_handler, list_conversations_handler, send_message_handler,
    set_active_handler, set_active_tab_handler, set_document_handler,
    start_conversation_handler, submit_handler,
};
use ws_routes::ws_events_handler;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: ConversationStore,
    pub preferences: PreferenceService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/conversations",
            get(list_conversations_handler).post(start_conversation_handler),
        )
        .route(
            "/api/conversations/{id}",
            get(get_conversation_handler).delete(delete_conversation_handler),
        )
        .route("/api/conversations/{id}/messages", post(send_message_handler))
        .route("/api/conversations/{id}/document", put(set_document_handler))
        .route("/api/active", get(get_active_handler).put(set_active_handler))
        .route("/api/submit", post(submit_handler))
        .route(
            "/api/preferences/active-tab",
            get(get_active_tab_handler).put(set_active_tab_handler),
        )
        .route("/ws/events", get(ws_events_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
