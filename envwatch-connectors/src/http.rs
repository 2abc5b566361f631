//! Minimal HTTP/1.1 Client
//!
//! ## Overview
//!
//! Just enough HTTP for one JSON API: `GET` and `POST`, a `Host` header, a JSON
//! body, and a response that is read to the end and parsed in one go. No
//! chunked encoding, no redirects and no retries. A response ends when the
//! peer closes. One cut short by the transport's read timeout is still parsed,
//! but its connection is dropped so late bytes never reach the next request.
//!
//! ## Request Framing
//!
//! ```text
//! POST /api/temperature/123456789 HTTP/1.1\r\n
//! Host: 192.168.1.100\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 18\r\n
//! Connection: close\r\n
//! \r\n
//! {"temperature":30}
//! ```
//!
//! ## Response Parsing
//!
//! Everything before the first blank line is the header block, kept verbatim
//! (status line included, lines joined by `\n`). The status code is the second
//! token of the `HTTP/x.y` line. Everything after the blank line is the JSON
//! body; an empty body is `null`.
//!
//! | Input | Result |
//! |-------|--------|
//! | no `HTTP/x.y NNN` line | [`ApiError::MalformedResponse`] |
//! | body is not JSON | [`ApiError::Payload`], status kept |
//! | more than `max_response_bytes` | [`ApiError::ResponseTooLarge`] |

use std::fmt;
use std::fmt::Write as _;

use log::{debug, trace, warn};
use serde_json::Value;

use envwatch_core::{ApiError, NetworkLink, LEGACY_FAILURE_STATUS};

use crate::transport::Transport;
use crate::ConnectionStats;

const READ_CHUNK: usize = 512;

/// Supported request methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Fetch a resource
    Get,
    /// Submit a JSON body
    Post,
}

impl Method {
    /// Token used on the request line
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to send requests and how much to accept back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Server host, also sent as the `Host` header
    pub host: String,
    /// Server port
    pub port: u16,
    /// Largest response buffered before giving up
    pub max_response_bytes: usize,
}

impl HttpConfig {
    /// Configuration with the default 4 KiB response cap
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            max_response_bytes: 4_096,
        }
    }

    /// Set the response cap
    pub fn max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }
}

/// A parsed response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code from the status line
    pub status: u16,
    /// Header block, status line included, one header per line
    pub headers: String,
    /// JSON body, `null` when empty
    pub payload: Value,
}

impl HttpResponse {
    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// Integer status in the 1.x firmware convention: the HTTP status, or `-1` for
/// any failure that produced no parsed response
pub fn legacy_status(result: &Result<HttpResponse, ApiError>) -> i32 {
    match result {
        Ok(response) => i32::from(response.status),
        Err(err) => err.legacy_status(),
    }
}

/// Frame a request.
///
/// `body` is only sent for `POST`; `GET` ignores it.
pub fn encode_request(method: Method, host: &str, path: &str, body: Option<&str>) -> String {
    let mut request = String::with_capacity(128 + body.map_or(0, str::len));
    // writing to a String cannot fail
    let _ = write!(request, "{} {} HTTP/1.1\r\nHost: {}\r\n", method, path, host);
    match (method, body) {
        (Method::Post, Some(body)) => {
            let _ = write!(
                request,
                "Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
        }
        (Method::Post, None) => {
            request.push_str("Content-Length: 0\r\nConnection: close\r\n\r\n");
        }
        (Method::Get, _) => request.push_str("Connection: close\r\n\r\n"),
    }
    request
}

/// Parse a complete response buffer
pub fn parse_response(raw: &[u8]) -> Result<HttpResponse, ApiError> {
    let text = std::str::from_utf8(raw).map_err(|_| ApiError::MalformedResponse)?;

    let mut headers = Vec::new();
    let mut rest = text;
    let mut terminated = false;
    while !rest.is_empty() {
        let (line, tail) = rest.split_once('\n').unwrap_or((rest, ""));
        rest = tail;
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            terminated = true;
            break;
        }
        headers.push(line);
    }
    let body = if terminated { rest.trim() } else { "" };

    let status = headers
        .iter()
        .find_map(|line| parse_status_line(line))
        .ok_or(ApiError::MalformedResponse)?;
    trace!("Status {} with {} header lines", status, headers.len());

    let payload = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).map_err(|err| {
            debug!("Body is not JSON ({}): {:?}", err, body);
            ApiError::Payload { status }
        })?
    };

    Ok(HttpResponse {
        status,
        headers: headers.join("\n"),
        payload,
    })
}

fn parse_status_line(line: &str) -> Option<u16> {
    let mut tokens = line.split_whitespace();
    if !tokens.next()?.starts_with("HTTP/") {
        return None;
    }
    tokens.next()?.parse().ok()
}

/// HTTP client over a reusable transport, gated on the network link
pub struct HttpClient<T, L> {
    transport: T,
    link: L,
    config: HttpConfig,
    stats: ConnectionStats,
}

impl<T: Transport, L: NetworkLink> HttpClient<T, L> {
    /// Create a client; no connection is made until the first request
    pub fn new(transport: T, link: L, config: HttpConfig) -> Self {
        Self {
            transport,
            link,
            config,
            stats: ConnectionStats::default(),
        }
    }

    /// `GET path`
    pub fn get(&mut self, path: &str) -> Result<HttpResponse, ApiError> {
        self.request(Method::Get, path, None)
    }

    /// `POST path` with a JSON body
    pub fn post(&mut self, path: &str, body: &str) -> Result<HttpResponse, ApiError> {
        self.request(Method::Post, path, Some(body))
    }

    /// Send one request and read the whole response
    pub fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&str>,
    ) -> Result<HttpResponse, ApiError> {
        let result = self.exchange(method, path, body);
        match &result {
            Ok(response) => {
                self.stats.requests_sent += 1;
                debug!("{} {} -> {}", method, path, response.status);
            }
            Err(err) => {
                self.stats.requests_failed += 1;
                self.stats.last_error = Some(err.to_string());
                warn!("{} {} failed: {}", method, path, err);
            }
        }
        result
    }

    fn exchange(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&str>,
    ) -> Result<HttpResponse, ApiError> {
        if !self.link.status().is_connected() {
            return Err(ApiError::LinkDown);
        }

        if !self.transport.is_connected() {
            self.transport
                .connect(&self.config.host, self.config.port)
                .map_err(|err| {
                    debug!("Connect to {}:{} failed: {}", self.config.host, self.config.port, err);
                    ApiError::Connect
                })?;
            self.stats.connections_opened += 1;
        } else {
            trace!("Reusing open connection");
        }

        let request = encode_request(method, &self.config.host, path, body);
        trace!("{} {} HTTP/1.1 ({} bytes)", method, path, request.len());
        if let Err(err) = self.transport.write_all(request.as_bytes()) {
            debug!("Write failed: {}", err);
            self.transport.close();
            return Err(ApiError::Transport { during: "write" });
        }
        self.stats.bytes_sent += request.len() as u64;

        let raw = self.read_response()?;
        self.stats.bytes_received += raw.len() as u64;
        parse_response(&raw).map_err(|err| {
            // whatever follows an unparseable response is not ours to read
            self.transport.close();
            err
        })
    }

    fn read_response(&mut self) -> Result<Vec<u8>, ApiError> {
        let limit = self.config.max_response_bytes;
        let mut raw = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.transport.read(&mut chunk) {
                Ok(0) => return Ok(raw),
                Ok(n) => {
                    if raw.len() + n > limit {
                        self.transport.close();
                        return Err(ApiError::ResponseTooLarge { limit });
                    }
                    raw.extend_from_slice(&chunk[..n]);
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(
                        err.kind(),
                        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                    ) =>
                {
                    // late bytes of this response would be read as the next one
                    self.transport.close();
                    if raw.is_empty() {
                        debug!("No response before the read timeout");
                        return Err(ApiError::Transport { during: "read" });
                    }
                    debug!("Read timed out after {} bytes, closing", raw.len());
                    return Ok(raw);
                }
                Err(err) => {
                    debug!("Read failed: {}", err);
                    self.transport.close();
                    return Err(ApiError::Transport { during: "read" });
                }
            }
        }
    }

    /// The network link
    pub fn link(&self) -> &L {
        &self.link
    }

    /// The network link, mutably
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// The transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Request counters
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }
}
