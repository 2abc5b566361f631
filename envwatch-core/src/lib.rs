//! Core sample-compare-report engine for envwatch
//!
//! Reads temperature, humidity and sound, compares them against thresholds
//! fetched from a settings server, and reports every violation back.
//! Hardware and network access sit behind small traits so the same loop runs on
//! the device and against fakes on the host.
//!
//! Key constraints:
//! - Runs without `std` (enable the `embedded` feature for `defmt`)
//! - No heap allocation per reading; violations live in fixed-capacity vectors
//! - Failures are tagged errors, never magic sentinel values
//!
//! ```no_run
//! use envwatch_core::{evaluate, Metric, SensorReading, SoundComparison, Thresholds};
//!
//! let thresholds = Thresholds::from_json(
//!     r#"{"max_temp":26,"min_temp":18,"max_humidity":70,"min_humidity":20,
//!         "max_sound":500,"temp_interval":60,"humidity_interval":60}"#,
//! )?;
//!
//! let violations = evaluate(
//!     &thresholds,
//!     Some(SensorReading::new(30.0, 40.0)),
//!     None,
//!     &SoundComparison::default(),
//! );
//! assert_eq!(violations[0].metric, Metric::Temperature);
//! assert_eq!(violations[0].to_json_body(), r#"{"temperature":30}"#);
//! # Ok::<(), envwatch_core::ApiError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod config;
pub mod errors;
pub mod evaluation;
pub mod link;
pub mod monitor;
pub mod policy;
pub mod readings;
pub mod sensors;
pub mod thresholds;
pub mod time;

// Public API
pub use config::{DeviceConfig, ServerConfig, WifiCredentials};
pub use errors::{
    ApiError, ConfigError, ErrorKind, InitError, LinkError, SensorError, LEGACY_FAILURE_STATUS,
};
pub use evaluation::{check_metric, evaluate, Violation, Violations};
pub use link::{associate, LinkInfo, LinkStatus, NetworkLink, RetryPolicy};
pub use monitor::{Monitor, MonitorSettings, MonitorState, ReportOutcome, TelemetryApi, TickReport};
pub use policy::{ReportGate, ReportPolicy};
pub use readings::{Metric, SensorReading, SoundLevel};
pub use sensors::{Indicator, Indicators, SensorSource};
pub use thresholds::{Band, SoundComparison, Thresholds};
pub use time::{Clock, Delay, TimeSource, Timestamp};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
