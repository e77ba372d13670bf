//! `WebSocket` handler for live view updates.
//!
//! Clients connect to `GET /ws/views/{id}` and receive the current
//! [`ViewState`](tapcoin_types::ViewState) immediately, then a new one
//! each time the view changes (tap, expiry, regeneration, sign-in).
//!
//! If a client falls behind, lagged frames are silently skipped and the
//! client resumes from the most recent state.
//!
//! The socket closes as soon as its view is dismantled. When the last
//! socket on a view closes, the view itself is dismantled.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use tapcoin_core::view::GameView;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::handlers::find_view;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming view states.
///
/// # Route
///
/// `GET /ws/views/{id}`
pub async fn ws_view(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let view = find_view(&state, &id).await?;
    Ok(ws
        .on_upgrade(move |socket| async move {
            let view_id = view.id();
            handle_ws(socket, view).await;
            if state.views.dismantle_if_unwatched(view_id).await {
                debug!(%view_id, "Last WebSocket closed, view dismantled");
            }
        })
        .into_response())
}

async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> bool {
    let json = match serde_json::to_string(value) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize view state: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Handle the `WebSocket` lifecycle: subscribe to the view's broadcast
/// channel and forward each state as a text frame until either side goes
/// away. Consumes the view handle so its subscription is gone on return.
async fn handle_ws(mut socket: WebSocket, view: Arc<GameView>) {
    let view_id = view.id();
    debug!(%view_id, "WebSocket client connected");

    let mut rx = view.subscribe();
    let mut closed = view.closed();
    if !send_json(&mut socket, &view.state()).await {
        debug!(%view_id, "WebSocket client disconnected (send failed)");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(state) => {
                        if !send_json(&mut socket, &state).await {
                            debug!(%view_id, "WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(%view_id, skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!(%view_id, "View closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            () = async { let _ = closed.wait_for(|closed| *closed).await; } => {
                debug!(%view_id, "View dismantled, closing WebSocket");
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%view_id, "WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(%view_id, "WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%view_id, "WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Input arrives over the REST endpoints.
                    }
                }
            }
        }
    }
}
