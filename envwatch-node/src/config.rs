use anyhow::{Context, Result};
use envwatch_core::DeviceConfig;
use std::fs;
use std::path::Path;

pub const ENV_WIFI_SSID: &str = "ENVWATCH_WIFI_SSID";
pub const ENV_WIFI_PASS: &str = "ENVWATCH_WIFI_PASS";
pub const ENV_SERVER_HOST: &str = "ENVWATCH_SERVER_HOST";
pub const ENV_SERVER_PORT: &str = "ENVWATCH_SERVER_PORT";
pub const ENV_DEVICE_ID: &str = "ENVWATCH_DEVICE_ID";

/// Read the JSON config at `path`, or start from defaults when there is none.
pub fn load(path: Option<&Path>) -> Result<DeviceConfig> {
    match path {
        Some(path) => {
            let txt = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&txt).with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(DeviceConfig::new("", "")),
    }
}

/// Overlay environment variables; `lookup` is `std::env::var` outside tests.
pub fn apply_env<F>(mut cfg: DeviceConfig, lookup: F) -> Result<DeviceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(ssid) = lookup(ENV_WIFI_SSID) {
        cfg.wifi.ssid = ssid;
    }
    if let Some(pass) = lookup(ENV_WIFI_PASS) {
        cfg.wifi.password = pass;
    }
    if let Some(host) = lookup(ENV_SERVER_HOST) {
        cfg.server.host = host;
    }
    if let Some(port) = lookup(ENV_SERVER_PORT) {
        cfg.server.port = port
            .trim()
            .parse()
            .with_context(|| format!("{ENV_SERVER_PORT}={port:?} is not a port number"))?;
    }
    if let Some(id) = lookup(ENV_DEVICE_ID) {
        cfg.device_id = id;
    }
    Ok(cfg)
}

/// Load, overlay the process environment, and validate.
pub fn resolve(path: Option<&Path>) -> Result<DeviceConfig> {
    let cfg = apply_env(load(path)?, |key| std::env::var(key).ok())?;
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}
