//! Settings/telemetry API client
//!
//! Maps the two operations the control loop needs onto HTTP requests against
//! the device's endpoints.

use std::net::ToSocketAddrs;
use std::time::Duration;

use log::{debug, info};

use envwatch_core::{
    ApiError, DeviceConfig, Metric, NetworkLink, TelemetryApi, Thresholds, Violation,
};

use crate::http::{HttpClient, HttpConfig, HttpResponse};
use crate::link::HostLink;
use crate::transport::{TcpTransport, Transport};
use crate::ConnectorError;

/// [`TelemetryApi`] over an [`HttpClient`]
pub struct TelemetryClient<T, L> {
    http: HttpClient<T, L>,
    device_id: String,
}

impl<T: Transport, L: NetworkLink> TelemetryClient<T, L> {
    /// Wrap an HTTP client for one device
    pub fn new(http: HttpClient<T, L>, device_id: impl Into<String>) -> Self {
        Self {
            http,
            device_id: device_id.into(),
        }
    }

    /// `/api/settings/{deviceId}`
    pub fn settings_path(&self) -> String {
        format!("/api/settings/{}", self.device_id)
    }

    /// `/api/{metric}/{deviceId}`
    pub fn metric_path(&self, metric: Metric) -> String {
        format!("/api/{}/{}", metric.key(), self.device_id)
    }

    /// The underlying HTTP client
    pub fn http(&self) -> &HttpClient<T, L> {
        &self.http
    }

    /// Unwrap the HTTP client
    pub fn into_inner(self) -> HttpClient<T, L> {
        self.http
    }
}

fn require_success(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ApiError::Status {
            status: response.status,
        })
    }
}

impl<T: Transport, L: NetworkLink> TelemetryApi for TelemetryClient<T, L> {
    type Link = L;

    fn link(&mut self) -> &mut L {
        self.http.link_mut()
    }

    fn fetch_settings(&mut self) -> Result<Thresholds, ApiError> {
        let path = self.settings_path();
        let response = self.http.get(&path)?;
        require_success(&response)?;
        debug!("Settings payload: {}", response.payload);
        Thresholds::from_value(&response.payload)
    }

    fn report(&mut self, violation: &Violation) -> Result<u16, ApiError> {
        let path = self.metric_path(violation.metric);
        let body = violation.to_json_body();
        debug!("POST {} {}", path, body);
        let response = self.http.post(&path, &body)?;
        require_success(&response)?;
        Ok(response.status)
    }
}

/// Build a TCP telemetry client for `config`.
///
/// Validates the configuration and checks that the server host resolves.
pub fn telemetry_client(
    config: &DeviceConfig,
) -> Result<TelemetryClient<TcpTransport, HostLink>, ConnectorError> {
    config.validate()?;

    let host = &config.server.host;
    let resolved = (host.as_str(), config.server.port)
        .to_socket_addrs()
        .map_err(|source| ConnectorError::Resolve {
            host: host.clone(),
            source,
        })?
        .count();
    info!("Server {}:{} ({} address(es))", host, config.server.port, resolved);

    let http = HttpClient::new(
        TcpTransport::new()
            .connect_timeout(Duration::from_secs(5))
            .read_timeout(Duration::from_secs(10)),
        HostLink::new(host.clone(), config.server.port),
        HttpConfig::new(host.clone(), config.server.port)
            .max_response_bytes(config.max_response_bytes),
    );
    Ok(TelemetryClient::new(http, config.device_id.clone()))
}
