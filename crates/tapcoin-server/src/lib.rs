//! HTTP presentation boundary for Tapcoin.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **The game page** (`GET /`): sign-up/sign-in form while anonymous;
//!   title bar, energy bar, tappable coin, and floating "+N" labels once
//!   signed in.
//! - **REST endpoints** (`/api/views/...`) that open views and drive
//!   sign-up, sign-in, taps, and label expiry.
//! - **`WebSocket` endpoint** (`/ws/views/{id}`) streaming every new
//!   view state via [`tokio::sync::broadcast`].
//!
//! # Architecture
//!
//! Each open page is a [`GameView`](tapcoin_core::view::GameView) held in
//! the [`ViewRegistry`]. Handlers never hold a lock across an `.await`
//! into a collaborator; the registry lock is only taken to look up or
//! remove a view. A view is removed by `DELETE`, by its last `WebSocket`
//! closing, or by the idle sweep.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, ViewRegistry, spawn_view_reaper};
