//! Error Types for the Sample-Compare-Report Loop
//!
//! ## Design Philosophy
//!
//! The device has a handful of distinct ways to fail, and each of them calls for a
//! different reaction from the control loop. Instead of collapsing everything into
//! an integer status, every failure is a tagged variant:
//!
//! 1. **Small Size**: variants carry only `Copy` data (`u16` statuses, attempt
//!    counts, `&'static str` contexts), so errors can be returned from hot paths and
//!    stored in tick reports without allocation.
//!
//! 2. **Categorised**: every error maps to an [`ErrorKind`] so callers can branch on
//!    "transport vs. parse vs. sensor" without matching every variant.
//!
//! 3. **Legacy Mapping**: [`ApiError::legacy_status`] recovers the `-1` convention
//!    the 1.x firmware used for any non-HTTP failure.
//!
//! ## Error Categories
//!
//! ### Transport
//! - `LinkDown`: the network link is not associated, no I/O attempted
//! - `Connect`: a new TCP connection could not be established
//! - `Transport`: the connection failed while writing or reading
//!
//! ### Parse
//! - `MalformedResponse`: no usable HTTP status line
//! - `ResponseTooLarge`: the server sent more than the response cap
//! - `Payload`: the body was not valid JSON (the HTTP status is kept)
//! - `Settings`: valid JSON that is not a threshold document
//!
//! ### Status
//! - `Status`: the server answered with a non-2xx code
//!
//! ## Handling Strategy
//!
//! ```rust
//! use envwatch_core::{ApiError, ErrorKind};
//!
//! fn on_report_failure(err: ApiError) {
//!     match err.kind() {
//!         ErrorKind::Transport => { /* link or socket trouble, next tick retries */ }
//!         ErrorKind::Parse => { /* server spoke something unexpected */ }
//!         ErrorKind::Status => { /* server rejected the report */ }
//!         _ => {}
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Sentinel status the 1.x firmware used for every non-HTTP failure
pub const LEGACY_FAILURE_STATUS: i32 = -1;

/// Broad category of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network link, connection or socket I/O
    Transport,
    /// Response framing or payload could not be understood
    Parse,
    /// A sensor could not be read
    Sensor,
    /// Network association failed during initialisation
    Link,
    /// The server answered with a non-success status
    Status,
}

/// Sensor read failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The driver reported a failed measurement
    #[error("{sensor} read failed")]
    ReadFailed {
        /// Which sensor failed
        sensor: &'static str,
    },

    /// The driver returned a value that is not a finite number
    #[error("{sensor} returned a non-finite value")]
    InvalidValue {
        /// Which sensor produced the value
        sensor: &'static str,
    },

    /// The analog converter could not complete a sample
    #[error("analog conversion failed")]
    AdcFault,
}

impl SensorError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Sensor
    }
}

/// Failures of a single HTTP exchange with the settings/telemetry server
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    /// Network link not associated, request not attempted
    #[error("network link is not associated")]
    LinkDown,

    /// TCP connection to the server could not be established
    #[error("could not connect to server")]
    Connect,

    /// The connection failed mid-exchange
    #[error("transport failed while trying to {during}")]
    Transport {
        /// Which step of the exchange failed
        during: &'static str,
    },

    /// No parseable HTTP status line in the response
    #[error("malformed HTTP response")]
    MalformedResponse,

    /// The response exceeded the configured size cap
    #[error("response exceeded {limit} bytes")]
    ResponseTooLarge {
        /// Configured cap in bytes
        limit: usize,
    },

    /// The response body was not valid JSON
    #[error("invalid JSON payload (HTTP {status})")]
    Payload {
        /// HTTP status that came with the unparseable body
        status: u16,
    },

    /// The settings document did not contain the expected numeric fields
    #[error("settings document is not a valid threshold set")]
    Settings,

    /// The server answered with a non-2xx status
    #[error("server answered HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },
}

impl ApiError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LinkDown | Self::Connect | Self::Transport { .. } => ErrorKind::Transport,
            Self::MalformedResponse
            | Self::ResponseTooLarge { .. }
            | Self::Payload { .. }
            | Self::Settings => ErrorKind::Parse,
            Self::Status { .. } => ErrorKind::Status,
        }
    }

    /// Integer status in the 1.x firmware convention.
    ///
    /// Non-2xx answers keep their HTTP code, everything else is `-1`.
    pub fn legacy_status(&self) -> i32 {
        match self {
            Self::Status { status } => i32::from(*status),
            _ => LEGACY_FAILURE_STATUS,
        }
    }
}

/// Network association failures - all of them are fatal
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No network module answered
    #[error("communication with network module failed")]
    NoModule,

    /// Module firmware is older than required
    #[error("network module firmware is outdated, please upgrade")]
    FirmwareOutdated,

    /// Every association attempt failed
    #[error("could not associate after {attempts} attempts")]
    AttemptsExhausted {
        /// Number of attempts made
        attempts: u32,
    },
}

impl LinkError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Link
    }
}

/// Fatal initialisation failures; the control loop halts on any of these
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// Network association failed
    #[error("link setup failed: {0}")]
    Link(LinkError),

    /// The startup settings fetch failed
    #[error("settings fetch failed: {0}")]
    Settings(ApiError),

    /// `initialize` was called on a halted device
    #[error("device is halted")]
    Halted,
}

impl InitError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Link(e) => e.kind(),
            Self::Settings(e) => e.kind(),
            Self::Halted => ErrorKind::Link,
        }
    }
}

impl From<LinkError> for InitError {
    fn from(err: LinkError) -> Self {
        Self::Link(err)
    }
}

impl From<ApiError> for InitError {
    fn from(err: ApiError) -> Self {
        Self::Settings(err)
    }
}

/// Configuration rejected by [`crate::config::DeviceConfig::validate`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field is empty
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the field
        field: &'static str,
    },

    /// A field holds a value that cannot work
    #[error("{field} is invalid: {reason}")]
    Invalid {
        /// Name of the field
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ReadFailed { sensor } => defmt::write!(fmt, "{} read failed", sensor),
            Self::InvalidValue { sensor } => defmt::write!(fmt, "{} non-finite", sensor),
            Self::AdcFault => defmt::write!(fmt, "ADC fault"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ApiError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::LinkDown => defmt::write!(fmt, "Link down"),
            Self::Connect => defmt::write!(fmt, "Connect failed"),
            Self::Transport { during } => defmt::write!(fmt, "Transport failed: {}", during),
            Self::MalformedResponse => defmt::write!(fmt, "Malformed response"),
            Self::ResponseTooLarge { limit } => defmt::write!(fmt, "Response > {} bytes", limit),
            Self::Payload { status } => defmt::write!(fmt, "Bad JSON (HTTP {})", status),
            Self::Settings => defmt::write!(fmt, "Bad settings"),
            Self::Status { status } => defmt::write!(fmt, "HTTP {}", status),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NoModule => defmt::write!(fmt, "No module"),
            Self::FirmwareOutdated => defmt::write!(fmt, "Firmware outdated"),
            Self::AttemptsExhausted { attempts } => {
                defmt::write!(fmt, "Gave up after {} attempts", attempts)
            }
        }
    }
}
