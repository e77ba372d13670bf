//! Game rules: the numbers the tap engine plays by.

use std::time::Duration;

use tapcoin_types::constants::{
    DEFAULT_TITLE, ENERGY_MAX, ENERGY_PER_TAP, FLOAT_DURATION_MS, POINTS_PER_TAP, REGEN_AMOUNT,
    REGEN_INTERVAL_MS, STARTING_ENERGY,
};

use crate::config::ConfigError;

/// Validated game rules.
///
/// Built from [`GameConfig`](crate::config::GameConfig) or taken from
/// [`Default`], which equals the constants in `tapcoin_types::constants`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    /// Header title.
    pub title: String,
    /// Points per accepted tap.
    pub points_per_tap: u64,
    /// Energy per accepted tap; also the minimum energy to tap.
    pub energy_per_tap: u32,
    /// Energy ceiling.
    pub energy_max: u32,
    /// Energy for a fresh account or a record stored without energy.
    pub starting_energy: u32,
    /// Time between regeneration ticks.
    pub regen_interval: Duration,
    /// Energy restored per regeneration tick.
    pub regen_amount: u32,
    /// Lifetime of a floating label in milliseconds.
    pub float_duration_ms: u32,
}

impl GameRules {
    /// Check the rules are internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let problem = if self.energy_max == 0 {
            Some("energy_max must be greater than zero".to_owned())
        } else if self.starting_energy > self.energy_max {
            Some(format!(
                "starting_energy ({}) exceeds energy_max ({})",
                self.starting_energy, self.energy_max
            ))
        } else if self.regen_interval.is_zero() {
            Some("regen_interval_ms must be greater than zero".to_owned())
        } else {
            None
        };

        problem.map_or(Ok(()), |reason| Err(ConfigError::Invalid { reason }))
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_owned(),
            points_per_tap: POINTS_PER_TAP,
            energy_per_tap: ENERGY_PER_TAP,
            energy_max: ENERGY_MAX,
            starting_energy: STARTING_ENERGY,
            regen_interval: Duration::from_millis(REGEN_INTERVAL_MS),
            regen_amount: REGEN_AMOUNT,
            float_duration_ms: FLOAT_DURATION_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameRules::default().validate().is_ok());
    }

    #[test]
    fn zero_energy_max_is_invalid() {
        let rules = GameRules {
            energy_max: 0,
            starting_energy: 0,
            ..GameRules::default()
        };
        assert!(matches!(rules.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn starting_energy_above_max_is_invalid() {
        let rules = GameRules {
            starting_energy: 7000,
            ..GameRules::default()
        };
        assert!(matches!(rules.validate(), Err(ConfigError::Invalid { .. })));
    }
}
