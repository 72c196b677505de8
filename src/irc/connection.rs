//! Socket setup and the outbound command path.
//!
//! Resolution and connection happen without the client lock held; the
//! resulting stream is then installed on the server by the manager, which
//! runs the handshake through [`send_command`].

use crate::app::state::{ConnectionState, Server};
use crate::error::{ClientError, Result};
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

/// Resolve `host:port` to its IPv4 stream candidates, in resolver order.
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let resolution_error = |source| ClientError::Resolution {
        host: host.to_string(),
        port,
        source,
    };
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(resolution_error)?
        .filter(SocketAddr::is_ipv4)
        .collect();
    if addrs.is_empty() {
        return Err(resolution_error(io::Error::new(
            io::ErrorKind::NotFound,
            "no IPv4 address",
        )));
    }
    Ok(addrs)
}

/// Try each resolved address in turn until one accepts the connection.
pub fn open_socket(host: &str, port: u16) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in resolve(host, port)? {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                tracing::debug!(%addr, "TCP connection established");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%addr, "Connect attempt failed: {}", e);
                last_err = Some(e);
            }
        }
    }
    Err(ClientError::Connect {
        host: host.to_string(),
        port,
        source: last_err
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no candidate address")),
    })
}

/// Write one already `\r\n`-terminated command to the server's socket.
///
/// Rejected with `NotConnected` (logged as a warning, no state change) unless
/// the server is `Connected` with an open socket. A failed write moves the
/// server to `Error`; callers that ignore the result can poll the state.
pub fn send_command(server: &mut Server, command: &str) -> Result<()> {
    if server.state != ConnectionState::Connected {
        tracing::warn!(server = %server.name, "Attempted to send command to disconnected server");
        return Err(ClientError::NotConnected);
    }
    let Some(stream) = server.stream.as_mut() else {
        tracing::warn!(server = %server.name, "Attempted to send command without an open socket");
        return Err(ClientError::NotConnected);
    };

    if let Err(e) = stream.write_all(command.as_bytes()) {
        tracing::error!(server = %server.name, "Failed to send command: {}", e);
        server.state = ConnectionState::Error;
        return Err(ClientError::Send(e));
    }
    tracing::debug!(server = %server.name, "Sent: {}", command.trim_end());
    Ok(())
}

/// Registration sequence: `PASS` (only with a password), `NICK`, `USER`.
pub fn handshake(server: &mut Server) -> Result<()> {
    if let Some(password) = server.password.clone() {
        send_command(server, &format!("PASS {}\r\n", password))?;
    }
    let nick = server.nick.clone();
    let real_name = server.real_name.clone();
    send_command(server, &format!("NICK {}\r\n", nick))?;
    send_command(server, &format!("USER {} 0 * :{}\r\n", nick, real_name))
}

/// Shut down both directions so a reader blocked on this socket (or a clone
/// of it) wakes up.
pub fn shutdown_socket(stream: &TcpStream) {
    if let Err(e) = stream.shutdown(Shutdown::Both) {
        if e.kind() != io::ErrorKind::NotConnected {
            tracing::debug!("Socket shutdown failed: {}", e);
        }
    }
}
