//! Error types for the client engine.
//!
//! Connection-layer failures (`Resolution`, `Connect`, `Send`, `Read`,
//! `PeerClosed`) always leave the owning server in the `Error` state before
//! they are returned or logged. Parse failures are dropped by the reader.

use crate::app::event::ServerId;
use std::io;
use thiserror::Error;

/// Convenience alias for results produced by this crate.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Address lookup for the server failed or yielded no IPv4 address.
    #[error("could not resolve {host}:{port}: {source}")]
    Resolution {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Every resolved address refused or failed the connection.
    #[error("could not connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Write failure on a live socket.
    #[error("failed to send command: {0}")]
    Send(#[source] io::Error),

    /// Receive failure on a live socket.
    #[error("read error: {0}")]
    Read(#[source] io::Error),

    /// The peer closed the stream while we were connected.
    #[error("connection closed by server")]
    PeerClosed,

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A soft cap on servers or channels was reached.
    #[error("{what} limit of {limit} reached")]
    Capacity { what: &'static str, limit: usize },

    /// The server is not in the `Connected` state or has no open socket.
    #[error("not connected")]
    NotConnected,

    #[error("unknown server id {0}")]
    UnknownServer(ServerId),

    #[error("already connected to {0}")]
    AlreadyConnected(String),

    #[error("no active channel")]
    NoActiveChannel,

    #[error("failed to start reader thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Reasons an inbound line could not be decomposed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    /// Line started with `:` but carried nothing before the first space.
    #[error("empty prefix")]
    MissingPrefix,

    #[error("missing command")]
    MissingCommand,
}

impl ClientError {
    /// True for failures that put the server into the `Error` state.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ClientError::Resolution { .. }
                | ClientError::Connect { .. }
                | ClientError::Send(_)
                | ClientError::Read(_)
                | ClientError::PeerClosed
        )
    }
}
