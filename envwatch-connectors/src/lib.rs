//! Network Connectors for the Settings/Telemetry Server
//!
//! ## Overview
//!
//! The device talks to exactly one server, over plain HTTP/1.1 on TCP:
//!
//! | Request | Path | Body |
//! |---------|------|------|
//! | `GET`   | `/api/settings/{deviceId}` | none, answers with the threshold document |
//! | `POST`  | `/api/{metric}/{deviceId}` | single-key JSON, e.g. `{"temperature":30}` |
//!
//! The stack is three thin layers, each behind its own type so every layer can be
//! tested on its own:
//!
//! ```text
//! TelemetryClient  paths, status checks, threshold parsing   (api)
//!       │
//! HttpClient       framing, response parsing, socket reuse   (http)
//!       │
//! Transport        connect / write / read / close            (transport)
//! ```
//!
//! ## Connection Reuse
//!
//! The client writes to the open connection when there is one and dials a new one
//! otherwise. Every request still sends `Connection: close`, so in practice the
//! server hangs up after each answer and the next request reconnects; reuse only
//! kicks in when a server ignores the header.
//!
//! ## Response Limits
//!
//! Responses are buffered in full before parsing and capped (4 KiB by default).
//! The threshold document is well under 200 bytes, so the cap only trips on a
//! misbehaving server.
//!
//! ## Example Usage
//!
//! ```no_run
//! use envwatch_connectors::telemetry_client;
//! use envwatch_core::{DeviceConfig, TelemetryApi};
//!
//! let config = DeviceConfig::new("lab-wifi", "hunter2")
//!     .with_server("192.168.1.100", 3000)
//!     .with_device_id("123456789");
//!
//! let mut client = telemetry_client(&config)?;
//! let thresholds = client.fetch_settings()?;
//! println!("max temperature {}", thresholds.max_temp);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod api;
pub mod http;
pub mod link;
pub mod transport;

// Re-export common types
pub use api::{telemetry_client, TelemetryClient};
pub use http::{legacy_status, HttpClient, HttpConfig, HttpResponse, Method};
pub use link::HostLink;
pub use transport::{TcpTransport, Transport};

use serde::Serialize;
use thiserror::Error;

use envwatch_core::ConfigError;

/// Errors raised while setting up a connector
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Device configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server host did not resolve to any address
    #[error("Cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },
}

/// Connection statistics kept by the HTTP client
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStats {
    /// Requests that produced a parsed response
    pub requests_sent: u64,
    /// Requests that ended in an error
    pub requests_failed: u64,
    /// Total request bytes written
    pub bytes_sent: u64,
    /// Total response bytes read
    pub bytes_received: u64,
    /// TCP connections opened
    pub connections_opened: u32,
    /// Last error message
    pub last_error: Option<String>,
}
