//! Simulated sensors and lamps for running the node on a host.

use envwatch_core::sensors::{AnalogInput, ClimateSensor, Indicator, Indicators};
use envwatch_core::{SensorError, SensorReading};
use log::info;

/// Small deterministic noise source (xorshift32).
#[derive(Debug, Clone)]
struct Noise(u32);

impl Noise {
    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform in [-1, 1)
    fn unit(&mut self) -> f32 {
        (self.next() % 2000) as f32 / 1000.0 - 1.0
    }
}

/// Temperature/humidity that wander slowly around a base value.
#[derive(Debug, Clone)]
pub struct SimClimate {
    temperature: f32,
    humidity: f32,
    step: u32,
    noise: Noise,
}

impl SimClimate {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
            step: 0,
            noise: Noise(0x2545_f491),
        }
    }
}

impl ClimateSensor for SimClimate {
    fn read_climate(&mut self) -> Result<SensorReading, SensorError> {
        self.step = self.step.wrapping_add(1);
        let phase = self.step as f32 / 60.0;
        let temperature = self.temperature + 2.0 * phase.sin() + 0.2 * self.noise.unit();
        let humidity = (self.humidity + 5.0 * phase.cos() + self.noise.unit()).clamp(0.0, 100.0);
        // DHT11 resolution
        Ok(SensorReading::new(temperature.round(), humidity.round()))
    }
}

/// Microphone ADC returning a noisy level around a base value.
#[derive(Debug, Clone)]
pub struct SimMic {
    level: u16,
    spread: u16,
    noise: Noise,
    busy: bool,
}

impl SimMic {
    pub fn new(level: u16, spread: u16) -> Self {
        Self {
            level,
            spread,
            noise: Noise(0x9e37_79b9),
            busy: false,
        }
    }
}

impl AnalogInput for SimMic {
    fn read_raw(&mut self) -> nb::Result<u16, SensorError> {
        // every other poll reports a conversion in progress, like a real ADC
        self.busy = !self.busy;
        if self.busy {
            return Err(nb::Error::WouldBlock);
        }
        let offset = (self.noise.unit() * f32::from(self.spread)) as i32;
        let raw = (i32::from(self.level) + offset).clamp(0, 1023);
        Ok(raw as u16)
    }
}

/// Lamps rendered as log lines whenever they change.
#[derive(Debug, Default)]
pub struct LogIndicators {
    ok: bool,
    alert: bool,
}

impl Indicators for LogIndicators {
    fn set(&mut self, indicator: Indicator, on: bool) {
        let slot = match indicator {
            Indicator::Ok => &mut self.ok,
            Indicator::Alert => &mut self.alert,
        };
        if *slot != on {
            *slot = on;
            info!("{:?} lamp {}", indicator, if on { "on" } else { "off" });
        }
    }
}
