//! Game constants.
//!
//! These are the default game rules. `tapcoin-core` can override them from
//! configuration, but every default here is what a fresh install plays
//! with.

/// Points awarded per accepted tap.
pub const POINTS_PER_TAP: u64 = 12;

/// Energy consumed per accepted tap. A tap is rejected below this.
pub const ENERGY_PER_TAP: u32 = 12;

/// Upper bound of the energy meter.
pub const ENERGY_MAX: u32 = 6500;

/// Energy given to a new account, and to records stored without energy.
pub const STARTING_ENERGY: u32 = 2532;

/// Milliseconds between two regeneration ticks.
pub const REGEN_INTERVAL_MS: u64 = 10_000;

/// Energy restored per regeneration tick.
pub const REGEN_AMOUNT: u32 = 1;

/// Duration of the floating "+N" animation in milliseconds.
pub const FLOAT_DURATION_MS: u32 = 1_000;

/// Horizontal offset of a floating label from the tap point.
pub const LABEL_OFFSET_X: f32 = 28.0;

/// Vertical offset of a floating label from the tap point.
pub const LABEL_OFFSET_Y: f32 = 42.0;

/// Title shown in the header bar.
pub const DEFAULT_TITLE: &str = "Notcoin";
