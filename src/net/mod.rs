//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → axum::serve accept loop
//!     → connection.rs (InboundConnection: id, peer, TLS flag)
//!     → exposed to handlers as ConnectInfo
//!     → dispatcher derives the upstream Scheme from it
//! ```

pub mod connection;

pub use connection::{ConnectionId, InboundConnection, Scheme};
