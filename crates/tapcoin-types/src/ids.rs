//! Type-safe identifier wrappers.
//!
//! Three kinds of identifier exist in the game:
//!
//! - [`ViewId`] -- one open page, generated server-side (UUID v7).
//! - [`Identity`] -- an opaque token issued by the authentication
//!   collaborator. Its format belongs to the collaborator, so it is kept
//!   as a string and never parsed.
//! - [`TapEventId`] -- a time-based, strictly increasing token for one
//!   floating "+N" marker.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for one open game view (a page session).
    ViewId
}

/// Opaque identity issued by the authentication collaborator.
///
/// Keys the user's persisted record. Present only once the view is
/// authenticated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Identity(String);

impl Identity {
    /// Wrap a collaborator-issued identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token for one tap event, also used as its animation key.
///
/// Derived from the wall-clock millisecond of the tap and bumped past the
/// previous token when two taps share a millisecond, so tokens within a
/// view are strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TapEventId(#[ts(type = "number")] pub u64);

impl TapEventId {
    /// Compute the token for a tap at `now_ms`, given the previous token.
    pub const fn next(previous: Option<Self>, now_ms: u64) -> Self {
        match previous {
            Some(prev) if now_ms <= prev.0 => Self(prev.0.saturating_add(1)),
            _ => Self(now_ms),
        }
    }
}

impl core::fmt::Display for TapEventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
