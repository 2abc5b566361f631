//! Byte transport under the HTTP client
//!
//! A [`Transport`] is one bidirectional stream that may or may not be open. The
//! HTTP client only needs five operations, which keeps it testable with a
//! scripted in-memory transport and portable to whatever socket API the target
//! offers.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, trace};

/// A reusable client connection
pub trait Transport {
    /// True while a connection is open
    fn is_connected(&self) -> bool;

    /// Open a connection to `host:port`
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()>;

    /// Write the whole buffer
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Read what is available.
    ///
    /// `Ok(0)` means the peer finished the response. Silence past the read
    /// timeout is an `io::ErrorKind::TimedOut` error instead, and the stream may
    /// still carry late bytes of that response.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Drop the connection, if any
    fn close(&mut self);
}

/// Plain TCP transport built on [`std::net::TcpStream`]
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Transport with fully blocking sockets
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up connecting after `timeout`
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Fail reads with `TimedOut` after `timeout` of silence
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    fn dial(&self, addr: &SocketAddr) -> io::Result<TcpStream> {
        match self.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(addr, timeout),
            None => TcpStream::connect(addr),
        }
    }

    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }
}

impl Transport for TcpTransport {
    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        self.close();

        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no address for host");
        for addr in (host, port).to_socket_addrs()? {
            match self.dial(&addr) {
                Ok(stream) => {
                    stream.set_read_timeout(self.read_timeout)?;
                    stream.set_nodelay(true)?;
                    debug!("Connected to {}", addr);
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(err) => {
                    trace!("Connect to {} failed: {}", addr, err);
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let stream = self.stream()?;
        stream.write_all(buf)?;
        stream.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.stream()?.read(buf);
        match result {
            Ok(0) => {
                trace!("Peer closed the connection");
                self.close();
                Ok(0)
            }
            Ok(n) => Ok(n),
            // platforms disagree on which kind a read timeout reports
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                Err(io::Error::from(io::ErrorKind::TimedOut))
            }
            Err(err) => Err(err),
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }
}
