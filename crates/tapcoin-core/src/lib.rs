//! Game logic for Tapcoin.
//!
//! Every open page is a [`GameView`]: a [`TapEngine`] holding points,
//! energy and live tap events, a [`Session`] that may carry an identity,
//! and a [`RegenTimer`] that restores energy while the view is open.
//! Persisted state flows through the [`SessionManager`].
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `tapcoin-config.yaml` into
//!   strongly-typed structs.
//! - [`rules`] -- Validated game constants.
//! - [`engine`] -- The tap/regenerate state machine.
//! - [`regen`] -- Periodic regeneration task.
//! - [`session`] -- Sign-up, sign-in, and best-effort persistence.
//! - [`view`] -- One open page tying the above together.
//!
//! [`GameView`]: view::GameView
//! [`TapEngine`]: engine::TapEngine
//! [`Session`]: session::Session
//! [`RegenTimer`]: regen::RegenTimer
//! [`SessionManager`]: session::SessionManager

pub mod config;
pub mod engine;
pub mod regen;
pub mod rules;
pub mod session;
pub mod view;
