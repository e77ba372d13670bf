//! Axum router construction.
//!
//! Assembles all routes (page, REST, `WebSocket`) into a single
//! [`Router`] with CORS and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- the game page
/// - `GET /health` -- liveness
/// - `POST /api/views` -- open a view
/// - `GET /api/views/{id}` -- view state
/// - `DELETE /api/views/{id}` -- dismantle a view
/// - `POST /api/views/{id}/sign-up` -- create account
/// - `POST /api/views/{id}/sign-in` -- sign in
/// - `POST /api/views/{id}/tap` -- tap the coin
/// - `DELETE /api/views/{id}/events/{event_id}` -- label finished
/// - `GET /ws/views/{id}` -- `WebSocket` view state stream
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Page
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/ws/views/{id}", get(ws::ws_view))
        // REST API
        .route("/api/views", post(handlers::open_view))
        .route(
            "/api/views/{id}",
            get(handlers::get_view).delete(handlers::close_view),
        )
        .route("/api/views/{id}/sign-up", post(handlers::sign_up))
        .route("/api/views/{id}/sign-in", post(handlers::sign_in))
        .route("/api/views/{id}/tap", post(handlers::tap))
        .route(
            "/api/views/{id}/events/{event_id}",
            delete(handlers::expire_event),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
