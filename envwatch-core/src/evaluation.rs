//! Threshold comparison
//!
//! Turns one round of readings into the list of violations the control loop has to
//! report. At most one violation per metric, so the result fits a fixed-capacity
//! vector and the hot path never allocates.

use alloc::string::String;

use heapless::Vec;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::readings::{Metric, SensorReading, SoundLevel};
use crate::thresholds::{SoundComparison, Thresholds};

/// Violations found in one tick, at most one per metric
pub type Violations = Vec<Violation, 3>;

/// A reading strictly outside its band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation {
    /// Which metric
    pub metric: Metric,
    /// The offending value
    pub value: f32,
    /// Lower bound it was checked against
    pub min: f32,
    /// Upper bound it was checked against
    pub max: f32,
}

impl Violation {
    /// True when the value is above the band
    pub fn is_high(&self) -> bool {
        self.value > self.max
    }

    /// Single-key JSON body posted to the metric endpoint, e.g. `{"temperature":30}`.
    ///
    /// Whole numbers are written without a fractional part.
    pub fn to_json_body(&self) -> String {
        let body = Body {
            key: self.metric.key(),
            value: self.value,
        };
        // a one-entry map of a string key to a number always serialises
        serde_json::to_string(&body).unwrap_or_default()
    }
}

/// `{key: value}`, with the value written at `f32` precision
struct Body<'a> {
    key: &'a str,
    value: f32,
}

impl Serialize for Body<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        if self.value.is_finite() && self.value == (self.value as i64) as f32 {
            map.serialize_entry(self.key, &(self.value as i64))?;
        } else {
            map.serialize_entry(self.key, &self.value)?;
        }
        map.end()
    }
}

/// Check a single metric value against its band
pub fn check_metric(
    metric: Metric,
    value: f32,
    thresholds: &Thresholds,
    sound: &SoundComparison,
) -> Option<Violation> {
    let band = thresholds.band(metric, sound);
    band.violates(value).then_some(Violation {
        metric,
        value,
        min: band.min,
        max: band.max,
    })
}

/// Compare one round of readings against the thresholds.
///
/// A reading that could not be taken is passed as `None` and never produces a
/// violation. Violations come out in [`Metric::ALL`] order.
pub fn evaluate(
    thresholds: &Thresholds,
    climate: Option<SensorReading>,
    sound: Option<SoundLevel>,
    comparison: &SoundComparison,
) -> Violations {
    let values = [
        climate.map(|r| r.temperature),
        climate.map(|r| r.humidity),
        sound.map(|s| f32::from(s.value())),
    ];

    let mut violations = Violations::new();
    for (metric, value) in Metric::ALL.iter().zip(values) {
        let Some(value) = value else { continue };
        if let Some(violation) = check_metric(*metric, value, thresholds, comparison) {
            // capacity equals Metric::ALL.len()
            let _ = violations.push(violation);
        }
    }
    violations
}
