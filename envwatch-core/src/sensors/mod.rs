//! Sensor Reader
//!
//! ## Overview
//!
//! The device has two inputs and two outputs:
//!
//! - a combined temperature/humidity sensor (DHT-class, single blocking read)
//! - an analog sound sensor averaged over a window of samples
//! - a green "ok" lamp and a red "alert" lamp
//!
//! Each is a small synchronous trait so the control loop can run against real
//! drivers on the device and against fakes in tests.
//!
//! ## Failure Reporting
//!
//! A failed climate read is an `Err(SensorError)`. The reading is never replaced by
//! zeros, because a genuine 0 °C reading would then be indistinguishable from a
//! sensor fault. Drivers that return NaN are rejected by [`SensorBoard`] for the
//! same reason.
//!
//! ## Usage Example
//!
//! ```rust
//! use envwatch_core::sensors::{AnalogInput, ClimateSensor, SensorBoard, SensorSource};
//! use envwatch_core::{SensorError, SensorReading};
//!
//! struct Dht;
//! impl ClimateSensor for Dht {
//!     fn read_climate(&mut self) -> Result<SensorReading, SensorError> {
//!         Ok(SensorReading::new(21.5, 40.0))
//!     }
//! }
//!
//! struct Mic;
//! impl AnalogInput for Mic {
//!     fn read_raw(&mut self) -> nb::Result<u16, SensorError> {
//!         Ok(300)
//!     }
//! }
//!
//! let mut board = SensorBoard::new(Dht, Mic);
//! assert_eq!(board.read_sound().unwrap().value(), 300);
//! ```

mod sound;

pub use sound::{average_samples, AnalogInput, SoundMeter, SOUND_SAMPLES, SOUND_SHIFT};

use log::{trace, warn};

use crate::errors::SensorError;
use crate::readings::{SensorReading, SoundLevel};

/// Temperature/humidity sensor driver
pub trait ClimateSensor {
    /// Perform one blocking measurement
    fn read_climate(&mut self) -> Result<SensorReading, SensorError>;
}

/// Everything the control loop reads per tick
pub trait SensorSource {
    /// Read temperature and humidity
    fn read_climate(&mut self) -> Result<SensorReading, SensorError>;

    /// Read the averaged sound level
    fn read_sound(&mut self) -> Result<SoundLevel, SensorError>;
}

/// Status lamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Green lamp, everything in range
    Ok,
    /// Red lamp, at least one threshold violated
    Alert,
}

/// Binary output lines
pub trait Indicators {
    /// Switch one indicator on or off
    fn set(&mut self, indicator: Indicator, on: bool);
}

/// Indicators for builds without lamps
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIndicators;

impl Indicators for NoIndicators {
    fn set(&mut self, _indicator: Indicator, _on: bool) {}
}

/// A climate sensor and a sound meter wired together
#[derive(Debug)]
pub struct SensorBoard<C, A> {
    climate: C,
    sound: SoundMeter<A>,
}

impl<C: ClimateSensor, A: AnalogInput> SensorBoard<C, A> {
    /// Combine the two sensors
    pub fn new(climate: C, microphone: A) -> Self {
        Self {
            climate,
            sound: SoundMeter::new(microphone),
        }
    }

    /// Access the sound meter, e.g. for its last peak
    pub fn sound_meter(&self) -> &SoundMeter<A> {
        &self.sound
    }
}

impl<C: ClimateSensor, A: AnalogInput> SensorSource for SensorBoard<C, A> {
    fn read_climate(&mut self) -> Result<SensorReading, SensorError> {
        let reading = self.climate.read_climate().map_err(|e| {
            warn!("Failed to get temperature and humidity value: {}", e);
            e
        })?;

        if !reading.is_finite() {
            warn!("Climate sensor returned {:?}", reading);
            return Err(SensorError::InvalidValue { sensor: "climate" });
        }
        Ok(reading)
    }

    fn read_sound(&mut self) -> Result<SoundLevel, SensorError> {
        let level = self.sound.read_level().map_err(|e| {
            warn!("Failed to sample sound level: {}", e);
            e
        })?;
        trace!("Sound level {} (peak {})", level.value(), self.sound.last_peak());
        Ok(level)
    }
}
