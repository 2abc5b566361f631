//! Device configuration
//!
//! Everything the device needs to know before it can start: network credentials,
//! where the settings/telemetry server lives, who the device is, and how the loop
//! should behave. Supplied once at startup, never reloaded.
//!
//! ```rust
//! use envwatch_core::config::DeviceConfig;
//!
//! let config = DeviceConfig::new("lab-wifi", "hunter2")
//!     .with_server("192.168.1.100", 3000)
//!     .with_device_id("123456789")
//!     .with_poll_interval_ms(2_000);
//!
//! config.validate()?;
//! # Ok::<(), envwatch_core::ConfigError>(())
//! ```

use alloc::string::String;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::link::RetryPolicy;
use crate::policy::ReportPolicy;
use crate::thresholds::SoundComparison;

/// Wireless network credentials
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WifiCredentials {
    /// Network name
    pub ssid: String,
    /// WPA passphrase
    #[serde(default)]
    pub password: String,
}

impl WifiCredentials {
    /// Create credentials
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }
}

// keep the passphrase out of logs
impl core::fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"***")
            .finish()
    }
}

/// Settings/telemetry server address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host name or IP, also sent as the `Host` header
    pub host: String,
    /// TCP port
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_port() -> u16 {
        3000
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: Self::default_port(),
        }
    }
}

/// Full device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Network credentials
    pub wifi: WifiCredentials,
    /// Server address
    pub server: ServerConfig,
    /// Identifier appended to every endpoint path
    pub device_id: String,
    /// Association retry policy
    #[serde(default)]
    pub link: RetryPolicy,
    /// Log association details and per-attempt status
    #[serde(default = "DeviceConfig::default_verbose")]
    pub verbose: bool,
    /// How the sound level is compared
    #[serde(default)]
    pub sound: SoundComparison,
    /// When violations are re-reported
    #[serde(default)]
    pub reporting: ReportPolicy,
    /// Pause between loop iterations
    #[serde(default = "DeviceConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u32,
    /// Re-fetch thresholds this often; `None` fetches once at startup
    #[serde(default)]
    pub settings_refresh_secs: Option<u32>,
    /// Largest response the HTTP client will buffer
    #[serde(default = "DeviceConfig::default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl DeviceConfig {
    fn default_verbose() -> bool {
        true
    }

    fn default_poll_interval_ms() -> u32 {
        1_000
    }

    fn default_max_response_bytes() -> usize {
        4_096
    }

    /// Configuration with defaults for everything but the credentials
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            wifi: WifiCredentials::new(ssid, password),
            server: ServerConfig::default(),
            device_id: String::new(),
            link: RetryPolicy::default(),
            verbose: Self::default_verbose(),
            sound: SoundComparison::default(),
            reporting: ReportPolicy::default(),
            poll_interval_ms: Self::default_poll_interval_ms(),
            settings_refresh_secs: None,
            max_response_bytes: Self::default_max_response_bytes(),
        }
    }

    /// Set server host and port
    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.server = ServerConfig {
            host: host.into(),
            port,
        };
        self
    }

    /// Set the device identifier
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    /// Set the association retry policy
    pub fn with_retry(mut self, max_attempts: u32, retry_delay_ms: u32) -> Self {
        self.link = RetryPolicy {
            max_attempts,
            retry_delay_ms,
        };
        self
    }

    /// Set the sound comparison
    pub fn with_sound_comparison(mut self, sound: SoundComparison) -> Self {
        self.sound = sound;
        self
    }

    /// Set the report policy
    pub fn with_reporting(mut self, reporting: ReportPolicy) -> Self {
        self.reporting = reporting;
        self
    }

    /// Set the loop cadence
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Re-fetch thresholds periodically
    pub fn with_settings_refresh_secs(mut self, secs: u32) -> Self {
        self.settings_refresh_secs = Some(secs);
        self
    }

    /// Toggle verbose link logging
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Reject configurations that cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wifi.ssid.is_empty() {
            return Err(ConfigError::Empty { field: "wifi.ssid" });
        }
        if self.server.host.is_empty() {
            return Err(ConfigError::Empty { field: "server.host" });
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                field: "server.port",
                reason: "port 0 is not connectable",
            });
        }
        if self.device_id.is_empty() {
            return Err(ConfigError::Empty { field: "device_id" });
        }
        if !self
            .device_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(ConfigError::Invalid {
                field: "device_id",
                reason: "only ASCII letters, digits, '-', '_' and '.' are allowed in a path segment",
            });
        }
        if self.link.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "link.max_attempts",
                reason: "at least one attempt is required",
            });
        }
        if self.max_response_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_response_bytes",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}
