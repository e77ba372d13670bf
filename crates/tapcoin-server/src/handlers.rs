//! HTTP endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | The game page |
//! | `GET` | `/health` | Liveness |
//! | `POST` | `/api/views` | Open an anonymous view |
//! | `GET` | `/api/views/{id}` | Current view state |
//! | `DELETE` | `/api/views/{id}` | Dismantle a view |
//! | `POST` | `/api/views/{id}/sign-up` | Create an account and sign in |
//! | `POST` | `/api/views/{id}/sign-in` | Sign in and load stored totals |
//! | `POST` | `/api/views/{id}/tap` | Tap the coin |
//! | `DELETE` | `/api/views/{id}/events/{event_id}` | Floating label finished |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use tapcoin_core::view::GameView;
use tapcoin_types::{Credentials, Position, TapEventId, TapOutcome, ViewId, ViewState};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The page template; `{{title}}` is replaced per request.
const INDEX_HTML: &str = include_str!("../static/index.html");

// ---------------------------------------------------------------------------
// GET / -- the game page
// ---------------------------------------------------------------------------

/// Serve the single game page.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Html(INDEX_HTML.replace("{{title}}", &escape_html(&state.rules.title)))
}

/// Liveness probe with the number of open views.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "views": state.views.len().await,
    }))
}

// ---------------------------------------------------------------------------
// View lifecycle
// ---------------------------------------------------------------------------

/// Open a new anonymous view.
pub async fn open_view(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.open_view().await;
    (StatusCode::CREATED, Json(view.state()))
}

/// Current state of one view.
pub async fn get_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ViewState>, ApiError> {
    let view = find_view(&state, &id).await?;
    Ok(Json(view.state()))
}

/// Dismantle a view. Its timer stops and pending writes are ignored.
pub async fn close_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let view_id = parse_view_id(&id)?;
    if state.views.dismantle(view_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("view {view_id}")))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Create an account and sign the view in with fresh totals.
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<ViewState>, ApiError> {
    let view = find_view(&state, &id).await?;
    Ok(Json(view.sign_up(&credentials).await?))
}

/// Sign the view in and load the stored totals.
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<ViewState>, ApiError> {
    let view = find_view(&state, &id).await?;
    Ok(Json(view.sign_in(&credentials).await?))
}

// ---------------------------------------------------------------------------
// Play
// ---------------------------------------------------------------------------

/// Tap the coin. A rejected tap is still `200 OK`.
pub async fn tap(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(position): Json<Position>,
) -> Result<Json<TapOutcome>, ApiError> {
    let view = find_view(&state, &id).await?;
    Ok(Json(view.tap(position)))
}

/// A floating label finished animating. Idempotent.
pub async fn expire_event(
    State(state): State<Arc<AppState>>,
    Path((id, event_id)): Path<(String, u64)>,
) -> Result<StatusCode, ApiError> {
    let view = find_view(&state, &id).await?;
    view.expire_event(TapEventId(event_id));
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a view id from a path segment.
pub fn parse_view_id(s: &str) -> Result<ViewId, ApiError> {
    s.parse::<Uuid>()
        .map(ViewId::from)
        .map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))
}

/// Resolve a path segment to an open view.
pub async fn find_view(state: &AppState, id: &str) -> Result<Arc<GameView>, ApiError> {
    let view_id = parse_view_id(id)?;
    state
        .views
        .get(view_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("view {view_id}")))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_escaped() {
        assert_eq!(escape_html("<b>Coin & Co</b>"), "&lt;b&gt;Coin &amp; Co&lt;/b&gt;");
    }

    #[test]
    fn bad_view_id_is_rejected() {
        assert!(matches!(parse_view_id("nope"), Err(ApiError::InvalidUuid(_))));
    }
}
