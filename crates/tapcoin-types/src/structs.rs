//! Core data structs shared by the engine, the stores, and the page.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::constants::{LABEL_OFFSET_X, LABEL_OFFSET_Y};
use crate::ids::{Identity, TapEventId, ViewId};

// ---------------------------------------------------------------------------
// Persisted state
// ---------------------------------------------------------------------------

/// Points and energy of one player, as known to the session.
///
/// `identity` is `None` while the view is anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserState {
    /// Identity the state belongs to, if authenticated.
    pub identity: Option<Identity>,
    /// Accumulated points.
    #[ts(type = "number")]
    pub points: u64,
    /// Current energy, within `0..=ENERGY_MAX`.
    pub energy: u32,
}

/// The stored document for one identity.
///
/// Fields are exactly `email`, `points`, `energy`. Older or hand-edited
/// documents may lack fields; `points` then reads as 0 and `energy` as
/// absent so the session can apply the starting-energy default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserRecord {
    /// Email the account was created with.
    #[serde(default)]
    pub email: String,
    /// Accumulated points.
    #[serde(default)]
    #[ts(type = "number")]
    pub points: u64,
    /// Current energy, if stored.
    #[serde(default)]
    pub energy: Option<u32>,
}

/// Email and password, passed through to the authentication collaborator.
///
/// Nothing is validated locally. `Debug` redacts the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Credentials {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Taps
// ---------------------------------------------------------------------------

/// A coordinate relative to the top-left corner of the coin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal offset in pixels.
    pub x: f32,
    /// Vertical offset in pixels.
    pub y: f32,
}

/// One accepted tap, alive until its float animation ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TapEvent {
    /// Token and animation key.
    pub id: TapEventId,
    /// Where the tap landed.
    pub position: Position,
}

/// Result of a single tap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TapOutcome {
    /// The tap was applied.
    Accepted {
        /// Points after the tap.
        #[ts(type = "number")]
        points: u64,
        /// Energy after the tap.
        energy: u32,
        /// The new floating marker.
        event: TapEvent,
    },
    /// Not enough energy; nothing changed.
    Rejected {
        /// Current energy.
        energy: u32,
        /// Energy a tap needs.
        required: u32,
    },
}

impl TapOutcome {
    /// Whether the tap changed state.
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

// ---------------------------------------------------------------------------
// View projection
// ---------------------------------------------------------------------------

/// A floating "+N" label as the page should draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FloatingLabel {
    /// The tap event this label belongs to.
    pub id: TapEventId,
    /// Label text, e.g. `+12`.
    pub text: String,
    /// CSS `top` in pixels.
    pub top: f32,
    /// CSS `left` in pixels.
    pub left: f32,
    /// Float animation duration in milliseconds.
    pub duration_ms: u32,
}

impl FloatingLabel {
    /// Place a label for `event`, offset so the text centers on the tap.
    pub fn for_event(event: &TapEvent, points_per_tap: u64, duration_ms: u32) -> Self {
        Self {
            id: event.id,
            text: format!("+{points_per_tap}"),
            top: event.position.y - LABEL_OFFSET_Y,
            left: event.position.x - LABEL_OFFSET_X,
            duration_ms,
        }
    }
}

/// Everything the page needs to render one frame of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ViewState {
    /// The view being rendered.
    pub view_id: ViewId,
    /// Header title.
    pub title: String,
    /// Authenticated identity; `None` shows the sign-in form.
    pub identity: Option<Identity>,
    /// Accumulated points.
    #[ts(type = "number")]
    pub points: u64,
    /// Current energy.
    pub energy: u32,
    /// Maximum energy.
    pub energy_max: u32,
    /// Width of the energy bar, `energy / energy_max * 100`.
    pub energy_percent: f64,
    /// Live floating labels, oldest first.
    pub labels: Vec<FloatingLabel>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn record_without_energy_reads_as_absent() {
        let record: UserRecord =
            serde_json::from_str(r#"{"email":"a@b.c","points":48}"#).unwrap();
        assert_eq!(record.email, "a@b.c");
        assert_eq!(record.points, 48);
        assert_eq!(record.energy, None);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            email: String::from("a@b.c"),
            password: String::from("hunter2"),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("a@b.c"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn tap_outcome_is_tagged() {
        let outcome = TapOutcome::Rejected {
            energy: 6,
            required: 12,
        };
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["energy"], 6);
    }

    #[test]
    fn label_is_offset_from_tap_point() {
        let event = TapEvent {
            id: TapEventId(1),
            position: Position { x: 100.0, y: 80.0 },
        };
        let label = FloatingLabel::for_event(&event, 12, 1_000);
        assert_eq!(label.text, "+12");
        assert!((label.left - 72.0).abs() < f32::EPSILON);
        assert!((label.top - 38.0).abs() < f32::EPSILON);
    }
}
