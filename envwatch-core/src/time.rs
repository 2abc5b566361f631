//! Time management for the device loop
//!
//! Provides clock abstraction to handle different time sources:
//! - System clock (host builds)
//! - Fixed clock (deterministic tests)
//!
//! and a blocking [`Delay`] used by the link retry loop.

/// Timestamp in milliseconds since device boot
pub type Timestamp = u64;

/// Milliseconds per second
pub const MS_PER_SECOND: u64 = 1000;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Blocking delay
pub trait Delay {
    /// Block the calling thread for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

/// A clock that can both tell time and block
pub trait Clock: TimeSource + Delay {}

impl<T: TimeSource + Delay> Clock for T {}

/// Monotonic system clock (requires std)
///
/// Timestamps count from the moment the clock was created.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Start a clock at zero
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }
}

#[cfg(feature = "std")]
impl Delay for SystemClock {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

/// Fixed time source for testing
///
/// `delay_ms` advances the clock instead of sleeping, so retry loops run instantly.
#[derive(Debug, Clone, Default)]
pub struct FixedTime {
    timestamp: Timestamp,
    slept_ms: u64,
}

impl FixedTime {
    /// Create a clock frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            slept_ms: 0,
        }
    }

    /// Move the clock forward
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }

    /// Total time spent in `delay_ms`
    pub fn slept_ms(&self) -> u64 {
        self.slept_ms
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

impl Delay for FixedTime {
    fn delay_ms(&mut self, ms: u32) {
        self.timestamp += u64::from(ms);
        self.slept_ms += u64::from(ms);
    }
}

/// Milliseconds elapsed between two timestamps, zero if time went backwards
pub fn elapsed_ms(earlier: Timestamp, later: Timestamp) -> u64 {
    later.saturating_sub(earlier)
}

/// Convert a seconds value from the settings document into milliseconds.
///
/// Negative and non-finite values count as zero.
pub fn secs_to_ms(secs: f32) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * MS_PER_SECOND as f32) as u64
    } else {
        0
    }
}
