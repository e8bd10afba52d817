//! Outbound connection establishment.
//!
//! # Responsibilities
//! - Define the dial boundary used by the prober and the failover dialer
//! - Resolve `host:port` targets and filter by address family
//! - Enforce a connect timeout per attempt

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;

/// Default connect timeout for upstream connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A bidirectional byte stream to an upstream.
pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Connection for T {}

pub type BoxedConnection = Box<dyn Connection>;

/// Network protocol for a dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// TCP over any address family.
    #[default]
    Tcp,
    /// TCP over IPv4 only.
    Tcp4,
    /// TCP over IPv6 only.
    Tcp6,
}

impl Protocol {
    fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            Protocol::Tcp => true,
            Protocol::Tcp4 => addr.is_ipv4(),
            Protocol::Tcp6 => addr.is_ipv6(),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Tcp => "tcp",
            Protocol::Tcp4 => "tcp4",
            Protocol::Tcp6 => "tcp6",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported protocol: {0}")]
pub struct UnsupportedProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnsupportedProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "tcp4" => Ok(Protocol::Tcp4),
            "tcp6" => Ok(Protocol::Tcp6),
            other => Err(UnsupportedProtocol(other.to_string())),
        }
    }
}

/// Opens connections to raw `host:port` targets.
#[async_trait]
pub trait Dial: Send + Sync + fmt::Debug {
    async fn dial(&self, protocol: Protocol, address: &str) -> io::Result<BoxedConnection>;
}

/// Dialer backed by tokio TCP streams.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    connect_timeout: Duration,
}

impl TcpDialer {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Connect to the first resolved address that accepts within the timeout.
    pub async fn connect(&self, protocol: Protocol, address: &str) -> io::Result<TcpStream> {
        let mut last_err = None;

        for addr in lookup_host(address).await?.filter(|a| protocol.accepts(a)) {
            match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Ok(Err(e)) => last_err = Some(e),
                Err(_) => {
                    last_err = Some(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("connect to {} timed out after {:?}", addr, self.connect_timeout),
                    ))
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no {} address found for {}", protocol, address),
            )
        }))
    }
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl Dial for TcpDialer {
    async fn dial(&self, protocol: Protocol, address: &str) -> io::Result<BoxedConnection> {
        let stream = self.connect(protocol, address).await?;
        Ok(Box::new(stream))
    }
}
