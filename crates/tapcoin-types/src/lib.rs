//! Shared type definitions for the Tapcoin tap-to-earn game.
//!
//! This crate is the single source of truth for the data that moves
//! between the tap engine, the collaborator stores, and the page. Types
//! flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- View ids, collaborator identities, tap event tokens
//! - [`constants`] -- Default game rules (energy bounds, tap costs, timing)
//! - [`structs`] -- User state and records, taps, and the view projection

pub mod constants;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use constants::{
    DEFAULT_TITLE, ENERGY_MAX, ENERGY_PER_TAP, FLOAT_DURATION_MS, LABEL_OFFSET_X, LABEL_OFFSET_Y,
    POINTS_PER_TAP, REGEN_AMOUNT, REGEN_INTERVAL_MS, STARTING_ENERGY,
};
pub use ids::{Identity, TapEventId, ViewId};
pub use structs::{
    Credentials, FloatingLabel, Position, TapEvent, TapOutcome, UserRecord, UserState, ViewState,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::ViewId::export_all();
        let _ = crate::ids::Identity::export_all();
        let _ = crate::ids::TapEventId::export_all();

        let _ = crate::structs::UserState::export_all();
        let _ = crate::structs::UserRecord::export_all();
        let _ = crate::structs::Credentials::export_all();
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::TapEvent::export_all();
        let _ = crate::structs::TapOutcome::export_all();
        let _ = crate::structs::FloatingLabel::export_all();
        let _ = crate::structs::ViewState::export_all();
    }
}
