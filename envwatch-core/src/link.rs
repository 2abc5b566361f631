//! Network link association
//!
//! Before any request can go out the device has to join the wireless network.
//! This is the only step with a retry loop: a fixed number of attempts with a
//! fixed delay between them. Running out of attempts is fatal, since the device
//! cannot do anything useful offline.

use core::fmt;
use core::net::Ipv4Addr;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::config::WifiCredentials;
use crate::errors::LinkError;
use crate::time::Delay;

/// Association state reported by the network module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Idle, not trying to connect
    Idle,
    /// Requested network not visible
    NoSsidAvailable,
    /// Scan finished
    ScanCompleted,
    /// Associated and addressed
    Connected,
    /// Association attempt failed
    ConnectFailed,
    /// Was associated, lost it
    ConnectionLost,
    /// Explicitly disconnected
    Disconnected,
    /// Acting as access point, a station joined
    ApConnected,
    /// Acting as access point, waiting for stations
    ApListening,
    /// No network module answered
    NoModule,
}

impl LinkStatus {
    /// Human-readable name, as printed in the association log
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::NoSsidAvailable => "No SSID Available",
            Self::ScanCompleted => "Scan Completed",
            Self::Connected => "Connected",
            Self::ConnectFailed => "Connect Failed",
            Self::ConnectionLost => "Connection Lost",
            Self::Disconnected => "Disconnected",
            Self::ApConnected => "AP Connected",
            Self::ApListening => "AP Listening",
            Self::NoModule => "No Shield/Module",
        }
    }

    /// True when requests can go out
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware address, most-significant byte first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Details about the current association, each optional because not every
/// module can report them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkInfo {
    /// Network name
    pub ssid: heapless::String<32>,
    /// Access point address
    pub bssid: Option<MacAddress>,
    /// Signal strength in dBm
    pub rssi: Option<i32>,
    /// Module-specific encryption type code
    pub encryption: Option<u8>,
    /// Local address
    pub ip: Option<Ipv4Addr>,
    /// Local hardware address
    pub mac: Option<MacAddress>,
}

/// Wireless network module
pub trait NetworkLink {
    /// Current association state
    fn status(&self) -> LinkStatus;

    /// Make one association attempt and report the resulting state
    fn begin(&mut self, credentials: &WifiCredentials) -> LinkStatus;

    /// False when the module firmware is too old to be trusted
    fn firmware_current(&self) -> bool {
        true
    }

    /// Association details for the log
    fn info(&self) -> LinkInfo {
        LinkInfo::default()
    }

    /// Leave the network
    fn end(&mut self) {}
}

/// How hard to try when joining the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts before giving up
    pub max_attempts: u32,
    /// Pause after a failed attempt
    pub retry_delay_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay_ms: 10_000,
        }
    }
}

/// Join the network, retrying per `policy`.
///
/// Fails fast when the module is missing or outdated. Otherwise makes up to
/// `policy.max_attempts` attempts, sleeping `retry_delay_ms` between them.
pub fn associate<L, D>(
    link: &mut L,
    credentials: &WifiCredentials,
    policy: &RetryPolicy,
    delay: &mut D,
    verbose: bool,
) -> Result<u32, LinkError>
where
    L: NetworkLink + ?Sized,
    D: Delay + ?Sized,
{
    if link.status() == LinkStatus::NoModule {
        error!("Communication with network module failed!");
        return Err(LinkError::NoModule);
    }
    if !link.firmware_current() {
        error!("Please upgrade the network module firmware");
        return Err(LinkError::FirmwareOutdated);
    }

    let mut attempts = 0;
    let mut status = link.status();
    while !status.is_connected() && attempts < policy.max_attempts {
        info!("Attempting to connect to SSID: {}", credentials.ssid);
        status = link.begin(credentials);
        attempts += 1;
        if verbose {
            debug!("Link status after attempt {}: {}", attempts, status);
        }

        if !status.is_connected() && attempts < policy.max_attempts {
            delay.delay_ms(policy.retry_delay_ms);
        }
    }

    if !status.is_connected() {
        error!("Max tries reached ({})", attempts);
        return Err(LinkError::AttemptsExhausted { attempts });
    }

    info!("Connected to the network");
    if verbose {
        log_link_info(&link.info());
    }
    Ok(attempts)
}

/// Write association details to the log
pub fn log_link_info(info: &LinkInfo) {
    info!("SSID: {}", info.ssid);
    if let Some(bssid) = info.bssid {
        info!("BSSID: {}", bssid);
    }
    if let Some(rssi) = info.rssi {
        info!("signal strength (RSSI): {}", rssi);
    }
    if let Some(encryption) = info.encryption {
        info!("Encryption Type: {:X}", encryption);
    }
    if let Some(ip) = info.ip {
        info!("IP Address: {}", ip);
    }
    if let Some(mac) = info.mac {
        info!("MAC address: {}", mac);
    }
}
