use crate::app::event::{Event, EventSender, ServerId};
use crate::app::state::{ClientState, ConnectionState};
use crate::config::model::{AppConfig, ServerConfig};
use crate::error::{ClientError, Result};
use crate::irc::commands::{join, parse_input, privmsg, quit, ParsedInput};
use crate::irc::connection::{handshake, open_socket, send_command, shutdown_socket};
use crate::irc::reader::{spawn_reader, ReaderHandle};
use parking_lot::Mutex;
use std::net::TcpStream;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Entry point for the foreground: owns the shared client context and the
/// producer side of the event queue.
///
/// All methods block only on the client lock, except [`IrcClient::connect`]
/// (name resolution and TCP connect, done without the lock) and
/// [`IrcClient::disconnect`] (joins the reader thread).
pub struct IrcClient {
    state: Arc<Mutex<ClientState>>,
    events: EventSender,
}

impl IrcClient {
    pub fn new(config: &AppConfig, event_tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClientState::from_config(config))),
            events: EventSender::new(event_tx, config.ui.timestamp_format.clone()),
        }
    }

    /// Read access to the shared state under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&ClientState) -> R) -> R {
        f(&*self.state.lock())
    }

    pub fn add_server(&self, config: &ServerConfig) -> Result<ServerId> {
        let id = self.state.lock().add_server(config)?;
        tracing::info!("Added server {} ({}:{})", config.name, config.host, config.port);
        Ok(id)
    }

    pub fn server_ids(&self) -> Vec<ServerId> {
        self.with_state(|s| s.servers.iter().map(|srv| srv.id).collect())
    }

    pub fn connection_state(&self, id: ServerId) -> Option<ConnectionState> {
        self.with_state(|s| s.get_server(id).map(|srv| srv.state))
    }

    pub fn active_server(&self) -> Option<ServerId> {
        self.with_state(|s| s.active_server)
    }

    pub fn set_active_server(&self, id: ServerId) -> Result<()> {
        let mut guard = self.state.lock();
        guard.server_mut(id)?;
        guard.active_server = Some(id);
        Ok(())
    }

    /// Resolve, connect, register and start the reader for one server.
    ///
    /// A server still holding a socket or reader from an earlier failure has
    /// them released first. Resolution and connect failures leave the server
    /// in `Error` and are also reported as a status line.
    pub fn connect(&self, id: ServerId) -> Result<()> {
        let (host, port, stale_stream, stale_reader) = {
            let mut guard = self.state.lock();
            let server = guard.server_mut(id)?;
            if matches!(
                server.state,
                ConnectionState::Connected | ConnectionState::Connecting
            ) {
                return Err(ClientError::AlreadyConnected(server.name.clone()));
            }
            server.state = ConnectionState::Connecting;
            server.logged_in = false;
            tracing::info!("Connecting to {} ({}:{})", server.name, server.hostname, server.port);
            (
                server.hostname.clone(),
                server.port,
                server.stream.take(),
                server.reader.take(),
            )
        };
        release(stale_stream, stale_reader);

        let stream = open_socket(&host, port).and_then(|stream| {
            let reader_stream = stream.try_clone().map_err(|source| ClientError::Connect {
                host: host.clone(),
                port,
                source,
            })?;
            Ok((stream, reader_stream))
        });
        let (stream, reader_stream) = match stream {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!("{}", e);
                if let Some(server) = self.state.lock().get_server_mut(id) {
                    server.state = ConnectionState::Error;
                }
                self.events.status(id, None, format!("Connection failed: {}", e));
                return Err(e);
            }
        };

        let mut guard = self.state.lock();
        let server = guard.server_mut(id)?;
        server.stream = Some(stream);
        server.state = ConnectionState::Connected;
        tracing::info!("Connected to {}:{}", host, port);

        if let Err(e) = handshake(server) {
            drop(guard);
            self.events.status(id, None, format!("Registration failed: {}", e));
            return Err(e);
        }

        match spawn_reader(Arc::clone(&self.state), id, reader_stream, self.events.clone()) {
            Ok(handle) => {
                server.reader = Some(handle);
                server.reader_active = true;
            }
            Err(e) => {
                tracing::error!(server = %server.name, "Failed to start reader thread: {}", e);
                server.state = ConnectionState::Error;
                return Err(ClientError::Spawn(e));
            }
        }
        let name = server.name.clone();
        guard.active_server = Some(id);
        drop(guard);

        self.events
            .status(id, None, format!("Connected to {} ({}:{})", name, host, port));
        Ok(())
    }

    /// Send `QUIT` if connected, close the socket and wait for the reader to
    /// exit. Safe to call on a server that is already disconnected.
    pub fn disconnect(&self, id: ServerId, reason: Option<&str>) -> Result<()> {
        let (name, stream, reader) = {
            let mut guard = self.state.lock();
            let quit_message = guard.behavior.quit_message.clone();
            let server = guard.server_mut(id)?;
            if server.is_connected() && server.has_open_socket() {
                let _ = send_command(server, &quit(reason.unwrap_or(quit_message.as_str())));
            }
            if let Some(reader) = &server.reader {
                reader.signal_stop();
            }
            server.state = ConnectionState::Disconnected;
            server.logged_in = false;
            (server.name.clone(), server.stream.take(), server.reader.take())
        };

        let had_socket = stream.is_some();
        release(stream, reader);
        if had_socket {
            tracing::info!("Disconnected from {}", name);
            self.events.status(id, None, format!("Disconnected from {}", name));
        }
        Ok(())
    }

    /// Send an already `\r\n`-terminated command. Failures are also reported
    /// as a status line.
    pub fn send(&self, id: ServerId, command: &str) -> Result<()> {
        let mut guard = self.state.lock();
        let result = send_command(guard.server_mut(id)?, command);
        drop(guard);
        self.report(id, result)
    }

    /// Handle one line typed by the user for server `id`.
    ///
    /// Slash commands work without a selected channel; plain text needs one
    /// and fails with `NoActiveChannel` otherwise. Local echo happens whether
    /// or not the send went through.
    pub fn submit_input(&self, id: ServerId, line: &str) -> Result<()> {
        let Some(input) = parse_input(line) else {
            return Ok(());
        };

        match input {
            ParsedInput::Join { channel } => self.send(id, &join(&channel)),
            ParsedInput::Raw { command } => self.send(id, &format!("{}\r\n", command)),
            ParsedInput::Quit { reason } => self.disconnect(id, reason.as_deref()),
            ParsedInput::Msg { target, text } => {
                let result = {
                    let mut guard = self.state.lock();
                    let server = guard.server_mut(id)?;
                    let result = send_command(server, &privmsg(&target, &text));
                    match server.add_channel(&target, true) {
                        Ok(idx) => {
                            self.events
                                .chat(id, server.channels[idx].id, &server.nick, &text)
                        }
                        Err(e) => tracing::info!("Not echoing message to {}: {}", target, e),
                    }
                    result
                };
                self.report(id, result)
            }
            ParsedInput::Chat { text } => {
                let result = {
                    let mut guard = self.state.lock();
                    let server = guard.server_mut(id)?;
                    let Some(channel) = server.active() else {
                        return Err(ClientError::NoActiveChannel);
                    };
                    let (target, channel_id) = (channel.target(), channel.id);
                    let result = send_command(server, &privmsg(&target, &text));
                    self.events.chat(id, channel_id, &server.nick, &text);
                    result
                };
                self.report(id, result)
            }
        }
    }

    /// Select the channel at `index` on server `id` for display and outbound
    /// chat. Returns `false` (and changes nothing) when out of range.
    pub fn switch_channel(&self, id: ServerId, index: usize) -> Result<bool> {
        let mut guard = self.state.lock();
        let server = guard.server_mut(id)?;
        let Some(channel) = server.switch_channel(index) else {
            return Ok(false);
        };
        let (channel_id, label) = (channel.id, channel.display_name());
        guard.active_server = Some(id);
        drop(guard);

        self.events
            .status(id, Some(channel_id), format!("Switched to {}", label));
        Ok(true)
    }

    /// Server and channel lists in their persisted form.
    pub fn snapshot(&self) -> Vec<ServerConfig> {
        self.with_state(ClientState::to_server_configs)
    }

    /// `base` with its server list replaced by the current snapshot.
    pub fn to_config(&self, base: &AppConfig) -> AppConfig {
        AppConfig {
            servers: self.snapshot(),
            ..base.clone()
        }
    }

    /// Disconnect every server and return the snapshot to persist.
    pub fn shutdown(&self) -> Vec<ServerConfig> {
        self.disconnect_all();
        self.snapshot()
    }

    fn disconnect_all(&self) {
        let live: Vec<ServerId> = self.with_state(|s| {
            s.servers
                .iter()
                .filter(|srv| srv.has_open_socket() || srv.reader.is_some())
                .map(|srv| srv.id)
                .collect()
        });
        for id in live {
            if let Err(e) = self.disconnect(id, None) {
                tracing::warn!("Failed to disconnect server {}: {}", id, e);
            }
        }
    }

    fn report(&self, id: ServerId, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            self.events.status(id, None, format!("Send failed: {}", e));
        }
        result
    }
}

impl Drop for IrcClient {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

/// Close a socket taken off a server and join its reader. Called without the
/// client lock held.
fn release(stream: Option<TcpStream>, reader: Option<ReaderHandle>) {
    if let Some(stream) = &stream {
        shutdown_socket(stream);
    }
    if let Some(reader) = reader {
        reader.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::event::EventKind;

    fn client_with(servers: Vec<ServerConfig>) -> (IrcClient, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = AppConfig {
            servers,
            ..AppConfig::default()
        };
        (IrcClient::new(&config, tx), rx)
    }

    #[test]
    fn input_on_disconnected_server_is_rejected() {
        let (client, mut rx) = client_with(vec![ServerConfig::new("a", "127.0.0.1", "me")]);
        let err = client.submit_input(0, "/join #rust").unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
        assert_eq!(client.connection_state(0), Some(ConnectionState::Disconnected));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::StatusLine);
        assert_eq!(event.text, "Send failed: not connected");
    }

    #[test]
    fn msg_echoes_into_new_dm_even_when_offline() {
        let (client, mut rx) = client_with(vec![ServerConfig::new("a", "127.0.0.1", "me")]);
        assert!(client.submit_input(0, "/msg alice hi").is_err());
        let channels = client.with_state(|s| s.servers[0].channels.clone());
        assert_eq!(channels.len(), 1);
        assert!(channels[0].is_direct_message);

        let echo = rx.try_recv().unwrap();
        assert_eq!(echo.kind, EventKind::ChatLine);
        assert!(echo.text.ends_with("<me> hi"));
    }

    #[test]
    fn chat_needs_active_channel() {
        let (client, _rx) = client_with(vec![ServerConfig::new("a", "127.0.0.1", "me")]);
        assert!(matches!(
            client.submit_input(0, "hello"),
            Err(ClientError::NoActiveChannel)
        ));
        assert!(client.submit_input(0, "").is_ok());
    }

    #[test]
    fn switch_channel_emits_status() {
        let mut cfg = ServerConfig::new("a", "127.0.0.1", "me");
        cfg.channels.push(crate::config::model::ChannelConfig {
            name: "rust".into(),
            is_direct_message: false,
            auto_join: true,
        });
        let (client, mut rx) = client_with(vec![cfg]);
        assert!(!client.switch_channel(0, 4).unwrap());
        assert!(client.switch_channel(0, 0).unwrap());
        assert_eq!(client.active_server(), Some(0));
        assert_eq!(rx.try_recv().unwrap().text, "Switched to #rust");
    }

    #[test]
    fn unknown_server_is_an_error() {
        let (client, _rx) = client_with(Vec::new());
        assert!(matches!(client.connect(3), Err(ClientError::UnknownServer(3))));
        assert!(matches!(
            client.disconnect(3, None),
            Err(ClientError::UnknownServer(3))
        ));
    }

    #[test]
    fn disconnect_when_idle_is_a_no_op() {
        let (client, mut rx) = client_with(vec![ServerConfig::new("a", "127.0.0.1", "me")]);
        client.disconnect(0, None).unwrap();
        client.disconnect(0, None).unwrap();
        assert_eq!(client.connection_state(0), Some(ConnectionState::Disconnected));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn shutdown_returns_snapshot() {
        let (client, _rx) = client_with(vec![ServerConfig::new("a", "127.0.0.1", "me")]);
        client.add_server(&ServerConfig::new("b", "127.0.0.2", "me")).unwrap();
        let saved = client.shutdown();
        let names: Vec<_> = saved.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
