//! Network link for host builds
//!
//! On a host the operating system owns the network, so "associating" means
//! checking that the server is routable. The check binds a UDP socket and
//! connects it to the server address, which picks a route and a local address
//! without sending anything.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs, UdpSocket};

use log::debug;

use envwatch_core::{LinkInfo, LinkStatus, NetworkLink, WifiCredentials};

/// [`NetworkLink`] backed by the host network stack
#[derive(Debug, Clone)]
pub struct HostLink {
    server: (String, u16),
    status: LinkStatus,
    ssid: String,
    local_ip: Option<IpAddr>,
}

impl HostLink {
    /// Link that considers itself up once `host:port` is routable
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            server: (host.into(), port),
            status: LinkStatus::Idle,
            ssid: String::new(),
            local_ip: None,
        }
    }

    /// Local address picked for the server route, once connected
    pub fn local_ip(&self) -> Option<IpAddr> {
        self.local_ip
    }

    fn probe(&self) -> std::io::Result<IpAddr> {
        let addrs: Vec<SocketAddr> = (self.server.0.as_str(), self.server.1)
            .to_socket_addrs()?
            .collect();
        let mut last_err = std::io::Error::from(std::io::ErrorKind::NotFound);
        for addr in addrs {
            let bind: SocketAddr = if addr.is_ipv4() {
                ([0, 0, 0, 0], 0).into()
            } else {
                ([0u16; 8], 0).into()
            };
            let socket = UdpSocket::bind(bind)?;
            match socket.connect(addr) {
                Ok(()) => return Ok(socket.local_addr()?.ip()),
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }
}

impl NetworkLink for HostLink {
    fn status(&self) -> LinkStatus {
        self.status
    }

    fn begin(&mut self, credentials: &WifiCredentials) -> LinkStatus {
        self.ssid = credentials.ssid.clone();
        self.status = match self.probe() {
            Ok(ip) => {
                self.local_ip = Some(ip);
                LinkStatus::Connected
            }
            Err(err) => {
                debug!("No route to {}:{}: {}", self.server.0, self.server.1, err);
                LinkStatus::ConnectFailed
            }
        };
        self.status
    }

    fn info(&self) -> LinkInfo {
        let mut ssid = heapless::String::new();
        for c in self.ssid.chars() {
            if ssid.push(c).is_err() {
                break;
            }
        }
        LinkInfo {
            ssid,
            ip: match self.local_ip {
                Some(IpAddr::V4(ip)) => Some(ip),
                _ => None,
            },
            ..LinkInfo::default()
        }
    }

    fn end(&mut self) {
        self.status = LinkStatus::Disconnected;
        self.local_ip = None;
    }
}
