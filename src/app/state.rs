use crate::app::event::{ChannelId, ServerId};
use crate::config::model::{AppConfig, BehaviorConfig, ChannelConfig, LimitsConfig, ServerConfig};
use crate::error::{ClientError, Result};
use crate::irc::reader::ReaderHandle;
use std::net::TcpStream;

pub const DEFAULT_PORT: u16 = 6667;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// A joined channel or a direct-message conversation.
///
/// For channels `name` has no leading `#`; for DMs it is the peer nick. The
/// text buffer lives with the consumer and is addressed through `id`, which
/// stays stable when entries before it are removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub is_direct_message: bool,
    pub active: bool,
}

impl Channel {
    pub fn display_name(&self) -> String {
        if self.is_direct_message {
            format!("@{}", self.name)
        } else {
            format!("#{}", self.name)
        }
    }

    /// The PRIVMSG target for outbound chat.
    pub fn target(&self) -> String {
        if self.is_direct_message {
            self.name.clone()
        } else {
            format!("#{}", self.name)
        }
    }
}

#[derive(Debug)]
pub struct Server {
    pub id: ServerId,
    pub name: String,
    pub hostname: String,
    pub port: u16,
    pub nick: String,
    pub real_name: String,
    pub password: Option<String>,
    pub auto_connect: bool,
    pub state: ConnectionState,
    /// Set once the welcome reply (001) has been seen on this connection.
    pub logged_in: bool,
    /// Insertion order is display order.
    pub channels: Vec<Channel>,
    pub active_channel: Option<usize>,
    pub(crate) stream: Option<TcpStream>,
    pub(crate) reader: Option<ReaderHandle>,
    pub(crate) reader_active: bool,
    channel_limit: usize,
    next_channel_id: ChannelId,
}

impl Server {
    pub fn new(id: ServerId, config: &ServerConfig, channel_limit: usize) -> Self {
        let port = if config.port == 0 { DEFAULT_PORT } else { config.port };
        let mut server = Self {
            id,
            name: config.name.clone(),
            hostname: config.host.clone(),
            port,
            nick: config.nickname.clone(),
            real_name: config
                .realname
                .clone()
                .unwrap_or_else(|| config.nickname.clone()),
            password: config.password.clone().filter(|p| !p.is_empty()),
            auto_connect: config.auto_connect,
            state: ConnectionState::Disconnected,
            logged_in: false,
            channels: Vec::new(),
            active_channel: None,
            stream: None,
            reader: None,
            reader_active: false,
            channel_limit,
            next_channel_id: 0,
        };

        for ch in &config.channels {
            match server.add_channel(&ch.name, ch.is_direct_message) {
                Ok(idx) => server.channels[idx].active = ch.auto_join,
                Err(e) => {
                    tracing::warn!(server = %server.name, channel = %ch.name, "Skipping saved channel: {}", e);
                }
            }
        }
        server
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn has_open_socket(&self) -> bool {
        self.stream.is_some()
    }

    /// True while a reader thread is running for this server.
    pub fn reader_active(&self) -> bool {
        self.reader_active
    }

    /// Index of the entry matching `(name, is_dm)` exactly.
    pub fn find_channel(&self, name: &str, is_dm: bool) -> Option<usize> {
        self.channels
            .iter()
            .position(|c| c.is_direct_message == is_dm && c.name == name)
    }

    /// Append a channel or DM, or return the index of the existing entry.
    ///
    /// Fails with `Capacity` only when the entry is new and the per-server
    /// limit has been reached; the registry is left untouched in that case.
    pub fn add_channel(&mut self, name: &str, is_dm: bool) -> Result<usize> {
        if let Some(idx) = self.find_channel(name, is_dm) {
            return Ok(idx);
        }
        if self.channels.len() >= self.channel_limit {
            return Err(ClientError::Capacity {
                what: "channel",
                limit: self.channel_limit,
            });
        }

        let id = self.next_channel_id;
        self.next_channel_id += 1;
        self.channels.push(Channel {
            id,
            name: name.to_string(),
            is_direct_message: is_dm,
            active: true,
        });
        tracing::info!(
            server = %self.name,
            "Added {} {}",
            if is_dm { "DM" } else { "channel" },
            name
        );
        Ok(self.channels.len() - 1)
    }

    /// Remove the entry at `index`, keeping the remaining order.
    ///
    /// `active_channel` moves down by one when it pointed at or past the
    /// removed entry, and becomes `None` when it was the first entry.
    pub fn remove_channel(&mut self, index: usize) -> Option<Channel> {
        if index >= self.channels.len() {
            return None;
        }
        let removed = self.channels.remove(index);
        if let Some(active) = self.active_channel {
            if active >= index {
                self.active_channel = active.checked_sub(1);
            }
        }
        Some(removed)
    }

    pub fn switch_channel(&mut self, index: usize) -> Option<&Channel> {
        if index >= self.channels.len() {
            return None;
        }
        self.active_channel = Some(index);
        self.channels.get(index)
    }

    pub fn channel_by_id(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn active(&self) -> Option<&Channel> {
        self.active_channel.and_then(|idx| self.channels.get(idx))
    }

    pub fn to_config(&self) -> ServerConfig {
        ServerConfig {
            name: self.name.clone(),
            host: self.hostname.clone(),
            port: self.port,
            nickname: self.nick.clone(),
            realname: Some(self.real_name.clone()),
            password: self.password.clone(),
            auto_connect: self.auto_connect,
            channels: self
                .channels
                .iter()
                .map(|c| ChannelConfig {
                    name: c.name.clone(),
                    is_direct_message: c.is_direct_message,
                    auto_join: c.active,
                })
                .collect(),
        }
    }
}

/// The client context shared between the foreground and the reader threads.
///
/// Always accessed through the single lock held by `IrcClient`.
#[derive(Debug)]
pub struct ClientState {
    pub servers: Vec<Server>,
    pub active_server: Option<ServerId>,
    pub limits: LimitsConfig,
    pub behavior: BehaviorConfig,
    next_server_id: ServerId,
}

impl ClientState {
    pub fn new(limits: LimitsConfig, behavior: BehaviorConfig) -> Self {
        Self {
            servers: Vec::new(),
            active_server: None,
            limits,
            behavior,
            next_server_id: 0,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut state = Self::new(config.limits.clone(), config.behavior.clone());
        for srv in &config.servers {
            if let Err(e) = state.add_server(srv) {
                tracing::warn!(server = %srv.name, "Skipping configured server: {}", e);
            }
        }
        tracing::info!("Loaded configuration: {} servers", state.servers.len());
        state
    }

    pub fn allocate_server_id(&mut self) -> ServerId {
        let id = self.next_server_id;
        self.next_server_id += 1;
        id
    }

    pub fn add_server(&mut self, config: &ServerConfig) -> Result<ServerId> {
        if self.servers.len() >= self.limits.max_servers {
            return Err(ClientError::Capacity {
                what: "server",
                limit: self.limits.max_servers,
            });
        }
        let id = self.allocate_server_id();
        let server = Server::new(id, config, self.limits.max_channels_per_server);
        self.servers.push(server);
        Ok(id)
    }

    pub fn get_server(&self, id: ServerId) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }

    pub fn get_server_mut(&mut self, id: ServerId) -> Option<&mut Server> {
        self.servers.iter_mut().find(|s| s.id == id)
    }

    pub fn server_mut(&mut self, id: ServerId) -> Result<&mut Server> {
        self.get_server_mut(id).ok_or(ClientError::UnknownServer(id))
    }

    pub fn to_server_configs(&self) -> Vec<ServerConfig> {
        self.servers.iter().map(Server::to_config).collect()
    }
}
