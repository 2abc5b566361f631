//! Sound level averaging
//!
//! The microphone module outputs an envelope voltage that is noisy from sample to
//! sample. One level is the mean of [`SOUND_SAMPLES`] consecutive ADC conversions;
//! with 32 samples the division is a right shift by [`SOUND_SHIFT`] bits, which
//! truncates toward zero.

use crate::errors::SensorError;
use crate::readings::SoundLevel;

/// Samples per sound level
pub const SOUND_SAMPLES: usize = 32;

/// `log2(SOUND_SAMPLES)`
pub const SOUND_SHIFT: u32 = 5;

/// One-shot analog input
pub trait AnalogInput {
    /// Start or poll a conversion.
    ///
    /// Returns `WouldBlock` while the conversion is still running.
    fn read_raw(&mut self) -> nb::Result<u16, SensorError>;
}

/// Integer mean of one full window of samples
pub fn average_samples(samples: &[u16; SOUND_SAMPLES]) -> SoundLevel {
    let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
    // 32 * u16::MAX >> 5 always fits in u16
    SoundLevel((sum >> SOUND_SHIFT) as u16)
}

/// Averages [`SOUND_SAMPLES`] blocking conversions from an analog input
#[derive(Debug)]
pub struct SoundMeter<A> {
    input: A,
    last_window: [u16; SOUND_SAMPLES],
}

impl<A: AnalogInput> SoundMeter<A> {
    /// Wrap an analog input
    pub fn new(input: A) -> Self {
        Self {
            input,
            last_window: [0; SOUND_SAMPLES],
        }
    }

    /// Take one full window of samples and return its mean
    pub fn read_level(&mut self) -> Result<SoundLevel, SensorError> {
        let mut window = [0u16; SOUND_SAMPLES];
        for slot in window.iter_mut() {
            *slot = nb::block!(self.input.read_raw())?;
        }
        self.last_window = window;
        Ok(average_samples(&window))
    }

    /// Loudest sample of the most recent window
    pub fn last_peak(&self) -> u16 {
        self.last_window.iter().copied().max().unwrap_or(0)
    }
}
