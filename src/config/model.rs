//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a default so an empty or missing file still loads.

use serde::{Deserialize, Serialize};

use super::nickname::generate_nickname;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A saved server together with its channel and DM list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// User-facing label (e.g. `"libera"`).
    pub name: String,
    /// Hostname or IPv4 address of the IRC server.
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_nickname")]
    pub nickname: String,
    /// Falls back to the nickname when unset.
    #[serde(default)]
    pub realname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub auto_connect: bool,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, host: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: default_port(),
            nickname: nickname.into(),
            realname: None,
            password: None,
            auto_connect: false,
            channels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel name without `#`, or the peer nick for a DM.
    pub name: String,
    #[serde(default)]
    pub is_direct_message: bool,
    #[serde(default = "default_true")]
    pub auto_join: bool,
}

/// Soft caps on the number of servers and channels per server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_servers")]
    pub max_servers: usize,
    #[serde(default = "default_max_channels")]
    pub max_channels_per_server: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_servers: default_max_servers(),
            max_channels_per_server: default_max_channels(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    #[serde(default = "default_max_scrollback")]
    pub max_scrollback: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
            max_scrollback: default_max_scrollback(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
    /// Send JOIN for saved channels once the welcome reply arrives.
    #[serde(default = "default_true")]
    pub autojoin_on_welcome: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            quit_message: default_quit_message(),
            autojoin_on_welcome: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_nickname() -> String {
    generate_nickname()
}

fn default_port() -> u16 {
    6667
}

fn default_true() -> bool {
    true
}

fn default_max_servers() -> usize {
    16
}

fn default_max_channels() -> usize {
    32
}

fn default_timestamp_format() -> String {
    "[%H:%M:%S]".to_string()
}

fn default_max_scrollback() -> usize {
    10000
}

fn default_quit_message() -> String {
    "Client disconnecting".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert!(cfg.servers.is_empty());
        assert_eq!(cfg.limits.max_servers, 16);
        assert_eq!(cfg.limits.max_channels_per_server, 32);
        assert_eq!(cfg.ui.timestamp_format, "[%H:%M:%S]");
        assert_eq!(cfg.behavior.quit_message, "Client disconnecting");
        assert!(cfg.behavior.autojoin_on_welcome);
    }

    #[test]
    fn server_entry_fills_missing_fields() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [[servers]]
            name = "local"
            host = "127.0.0.1"

            [[servers.channels]]
            name = "rust"

            [[servers.channels]]
            name = "alice"
            is_direct_message = true
            auto_join = false
            "#,
        )
        .unwrap();
        let srv = &cfg.servers[0];
        assert_eq!(srv.port, 6667);
        assert!(!srv.nickname.is_empty());
        assert!(!srv.auto_connect);
        assert_eq!(srv.channels.len(), 2);
        assert!(srv.channels[0].auto_join);
        assert!(!srv.channels[0].is_direct_message);
        assert!(srv.channels[1].is_direct_message);
        assert!(!srv.channels[1].auto_join);
    }

    #[test]
    fn password_is_omitted_when_unset() {
        let mut cfg = AppConfig::default();
        cfg.servers.push(ServerConfig::new("a", "irc.a.net", "nick"));
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(!text.contains("password"));
    }
}
