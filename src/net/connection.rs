//! Per-connection metadata handed to the HTTP layer.
//!
//! The dispatcher needs exactly one fact about the transport: whether the
//! inbound connection was TLS-terminated here. That decides the upstream
//! scheme and how protocol-relative links resolve.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use tokio::net::TcpListener;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough, only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// URL scheme used toward the upstream and for protocol-relative links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// `https` when the inbound connection was TLS, `http` otherwise.
    pub fn from_tls(tls: bool) -> Self {
        if tls {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection info attached to every request served by the proxy.
#[derive(Debug, Clone, Copy)]
pub struct InboundConnection {
    pub id: ConnectionId,
    pub remote_addr: SocketAddr,
    /// Whether TLS was terminated by this process for the connection.
    pub tls: bool,
}

impl InboundConnection {
    /// A plaintext TCP connection from `remote_addr`.
    pub fn plain(remote_addr: SocketAddr) -> Self {
        Self {
            id: ConnectionId::new(),
            remote_addr,
            tls: false,
        }
    }

    pub fn scheme(&self) -> Scheme {
        Scheme::from_tls(self.tls)
    }
}

impl Connected<IncomingStream<'_, TcpListener>> for InboundConnection {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        let connection = Self::plain(*stream.remote_addr());
        tracing::trace!(
            connection_id = %connection.id,
            peer_addr = %connection.remote_addr,
            "Connection accepted"
        );
        connection
    }
}
