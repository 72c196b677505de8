//! A multi-server IRC client engine.
//!
//! [`irc::manager::IrcClient`] is the entry point. It owns the shared client
//! state, runs one reader thread per connected server, and hands every
//! chat and status line to the foreground through an unbounded
//! [`tokio::sync::mpsc`] channel of [`app::event::Event`]s.

pub mod app;
pub mod config;
pub mod error;
pub mod irc;
pub mod logging;

pub use app::event::{ChannelId, Event, EventKind, ServerId};
pub use error::{ClientError, ParseError};
pub use irc::manager::IrcClient;
