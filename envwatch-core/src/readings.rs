//! Sensor readings and the metrics they feed

use core::fmt;

/// One temperature/humidity poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Air temperature in °C
    pub temperature: f32,
    /// Relative humidity in %
    pub humidity: f32,
}

impl SensorReading {
    /// Create a reading
    pub const fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
        }
    }

    /// All-zero reading the 1.x firmware substituted on read failure.
    ///
    /// The control loop never does this itself; it is here for drivers that must
    /// always produce a value.
    pub const fn zeroed() -> Self {
        Self::new(0.0, 0.0)
    }

    /// True when both values are finite numbers
    pub fn is_finite(&self) -> bool {
        self.temperature.is_finite() && self.humidity.is_finite()
    }
}

/// Mean of one window of raw sound samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SoundLevel(pub u16);

impl SoundLevel {
    /// Raw ADC units
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for SoundLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity that can violate a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Air temperature
    Temperature,
    /// Relative humidity
    Humidity,
    /// Averaged sound level
    Sound,
}

impl Metric {
    /// Every metric, in the order the control loop checks them
    pub const ALL: [Metric; 3] = [Metric::Temperature, Metric::Humidity, Metric::Sound];

    /// Key of the single-entry JSON body and endpoint segment
    pub const fn key(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Sound => "sound",
        }
    }

    /// Position in [`Metric::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Metric::Temperature => 0,
            Metric::Humidity => 1,
            Metric::Sound => 2,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_keys_match_endpoints() {
        assert_eq!(Metric::Temperature.key(), "temperature");
        assert_eq!(Metric::Humidity.key(), "humidity");
        assert_eq!(Metric::Sound.key(), "sound");
    }

    #[test]
    fn metric_index_follows_all() {
        for (i, metric) in Metric::ALL.iter().enumerate() {
            assert_eq!(metric.index(), i);
        }
    }

    #[test]
    fn non_finite_reading_detected() {
        assert!(SensorReading::new(21.0, 40.0).is_finite());
        assert!(!SensorReading::new(f32::NAN, 40.0).is_finite());
        assert!(SensorReading::zeroed().is_finite());
    }
}
