//! Comparison bands
//!
//! A band is the closed interval `[min, max]` a reading is allowed to sit in.
//! A reading violates the band only when it is strictly outside it, so a value
//! equal to either bound is fine.

use serde::{Deserialize, Serialize};

use crate::readings::SoundLevel;

/// Closed interval of acceptable values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// Lowest acceptable value
    pub min: f32,
    /// Highest acceptable value
    pub max: f32,
}

impl Band {
    /// Create a band
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Band with no lower bound
    pub const fn at_most(max: f32) -> Self {
        Self::new(f32::NEG_INFINITY, max)
    }

    /// True when `value` is strictly below `min` or strictly above `max`
    pub fn violates(&self, value: f32) -> bool {
        value < self.min || value > self.max
    }
}

/// How the sound level is compared against the settings.
///
/// The settings document only carries `max_sound`, so the lower side of the
/// comparison has to be chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SoundComparison {
    /// Violation when the level is above `max_sound`
    AboveMax,

    /// Violation when the level is outside `[min, max_sound]`
    Band {
        /// Locally configured lower bound
        min: f32,
    },

    /// Violation when the level differs from `max_sound` in either direction.
    ///
    /// Reproduces the 1.x firmware, which compared against `max_sound` on both
    /// sides of the condition.
    Legacy,
}

impl Default for SoundComparison {
    fn default() -> Self {
        Self::AboveMax
    }
}

impl SoundComparison {
    /// Band this comparison checks against
    pub fn band(&self, max_sound: f32) -> Band {
        match *self {
            Self::AboveMax => Band::at_most(max_sound),
            Self::Band { min } => Band::new(min, max_sound),
            Self::Legacy => Band::new(max_sound, max_sound),
        }
    }

    /// True when `level` is a violation under this comparison
    pub fn violates(&self, level: SoundLevel, max_sound: f32) -> bool {
        self.band(max_sound).violates(f32::from(level.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let band = Band::new(18.0, 26.0);
        assert!(!band.violates(18.0));
        assert!(!band.violates(26.0));
        assert!(!band.violates(22.0));
        assert!(band.violates(17.9));
        assert!(band.violates(26.1));
    }

    #[test]
    fn nan_never_violates() {
        assert!(!Band::new(0.0, 1.0).violates(f32::NAN));
    }

    #[test]
    fn above_max_ignores_quiet() {
        let cmp = SoundComparison::AboveMax;
        assert!(!cmp.violates(SoundLevel(0), 500.0));
        assert!(!cmp.violates(SoundLevel(500), 500.0));
        assert!(cmp.violates(SoundLevel(501), 500.0));
    }

    #[test]
    fn explicit_band_checks_both_sides() {
        let cmp = SoundComparison::Band { min: 100.0 };
        assert!(cmp.violates(SoundLevel(99), 500.0));
        assert!(!cmp.violates(SoundLevel(100), 500.0));
        assert!(cmp.violates(SoundLevel(501), 500.0));
    }

    #[test]
    fn legacy_flags_anything_but_max() {
        let cmp = SoundComparison::Legacy;
        assert!(cmp.violates(SoundLevel(10), 500.0));
        assert!(!cmp.violates(SoundLevel(500), 500.0));
        assert!(cmp.violates(SoundLevel(900), 500.0));
    }

    #[test]
    fn comparison_config_shape() {
        let cmp: SoundComparison = serde_json::from_str(r#"{"mode":"band","min":40}"#).unwrap();
        assert_eq!(cmp, SoundComparison::Band { min: 40.0 });

        let cmp: SoundComparison = serde_json::from_str(r#"{"mode":"legacy"}"#).unwrap();
        assert_eq!(cmp, SoundComparison::Legacy);
    }
}
