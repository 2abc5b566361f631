//! Threshold Store
//!
//! ## Overview
//!
//! The server owns the acceptable ranges for every metric. At startup the device
//! fetches them once from `GET /api/settings/{deviceId}`; the answer is a flat JSON
//! object with seven numeric fields:
//!
//! ```text
//! {"max_temp":26,"min_temp":18,"max_humidity":70,"min_humidity":20,
//!  "max_sound":500,"temp_interval":60,"humidity_interval":60}
//! ```
//!
//! ## Field Semantics
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `min_temp`, `max_temp` | temperature band in °C |
//! | `min_humidity`, `max_humidity` | humidity band in % |
//! | `max_sound` | upper sound bound in ADC units, see [`SoundComparison`] |
//! | `temp_interval`, `humidity_interval` | seconds between repeated reports, only used by [`crate::policy::ReportPolicy::Interval`] |
//!
//! Integer and fractional JSON numbers are both accepted. Unknown keys are ignored,
//! missing keys reject the whole document.
//!
//! ## Usage Example
//!
//! ```rust
//! use envwatch_core::thresholds::Thresholds;
//!
//! let thresholds = Thresholds::from_json(
//!     r#"{"max_temp":26,"min_temp":18,"max_humidity":70,"min_humidity":20,
//!         "max_sound":500,"temp_interval":60,"humidity_interval":60}"#,
//! )?;
//!
//! assert!(thresholds.temperature_band().violates(30.0));
//! # Ok::<(), envwatch_core::ApiError>(())
//! ```

mod band;

pub use band::{Band, SoundComparison};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;
use crate::readings::Metric;
use crate::time::secs_to_ms;

/// Threshold set fetched from the settings endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Upper temperature bound (°C)
    pub max_temp: f32,
    /// Lower temperature bound (°C)
    pub min_temp: f32,
    /// Upper humidity bound (%)
    pub max_humidity: f32,
    /// Lower humidity bound (%)
    pub min_humidity: f32,
    /// Upper sound bound (ADC units)
    pub max_sound: f32,
    /// Seconds between repeated temperature reports
    pub temp_interval: f32,
    /// Seconds between repeated humidity reports
    pub humidity_interval: f32,
}

impl Thresholds {
    /// Parse a settings response body
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_str(body).map_err(|_| ApiError::Settings)?;
        Self::from_value(&value)
    }

    /// Interpret an already parsed settings payload
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        // serde would also accept a positional array for a struct
        if !value.is_object() {
            return Err(ApiError::Settings);
        }
        Self::deserialize(value).map_err(|_| ApiError::Settings)
    }

    /// Temperature band `[min_temp, max_temp]`
    pub fn temperature_band(&self) -> Band {
        Band::new(self.min_temp, self.max_temp)
    }

    /// Humidity band `[min_humidity, max_humidity]`
    pub fn humidity_band(&self) -> Band {
        Band::new(self.min_humidity, self.max_humidity)
    }

    /// Band for `metric`, using `sound` for the sound comparison
    pub fn band(&self, metric: Metric, sound: &SoundComparison) -> Band {
        match metric {
            Metric::Temperature => self.temperature_band(),
            Metric::Humidity => self.humidity_band(),
            Metric::Sound => sound.band(self.max_sound),
        }
    }

    /// Server-provided report interval for `metric` in milliseconds.
    ///
    /// The settings carry no sound interval, so `Sound` is always `None`.
    pub fn report_interval_ms(&self, metric: Metric) -> Option<u64> {
        match metric {
            Metric::Temperature => Some(secs_to_ms(self.temp_interval)),
            Metric::Humidity => Some(secs_to_ms(self.humidity_interval)),
            Metric::Sound => None,
        }
    }
}
