//! Per-command reactions to inbound messages.
//!
//! Runs on the reader thread with the client lock held. Only `PING`,
//! `PRIVMSG`, `001`, `JOIN`, `PART` and `KICK` are acted on; everything else
//! is dropped after parsing.

use crate::app::event::EventSender;
use crate::app::state::Server;
use crate::error::Result;
use crate::irc::connection::send_command;
use crate::irc::message::{split_param, ParsedMessage};

/// Options that shape dispatch but do not live on the server itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    /// Re-send `JOIN` for every remembered channel once the welcome arrives.
    pub autojoin_on_welcome: bool,
}

/// React to one message. Only the replies sent from here (`PONG`, auto-join
/// `JOIN`) can fail; a failed write has already moved the server to `Error`
/// when the error is returned.
pub fn dispatch(
    server: &mut Server,
    msg: &ParsedMessage,
    events: &EventSender,
    opts: DispatchOptions,
) -> Result<()> {
    match msg.command.as_str() {
        "PING" => return on_ping(server, msg),
        "PRIVMSG" => on_privmsg(server, msg, events),
        "001" => return on_welcome(server, events, opts),
        "JOIN" => on_join(server, msg, events),
        "PART" | "KICK" => on_leave(server, msg, events),
        _ => {}
    }
    Ok(())
}

fn on_ping(server: &mut Server, msg: &ParsedMessage) -> Result<()> {
    send_command(server, &format!("PONG {}\r\n", msg.params))
}

fn on_privmsg(server: &mut Server, msg: &ParsedMessage, events: &EventSender) {
    let (Some(nick), Some((target, text))) = (msg.nick(), msg.first_param()) else {
        return;
    };
    let text = text.strip_prefix(':').unwrap_or(text);

    if target == server.nick {
        match server.add_channel(nick, true) {
            Ok(idx) => events.chat(server.id, server.channels[idx].id, nick, text),
            Err(e) => tracing::info!(server = %server.name, "Dropping DM from {}: {}", nick, e),
        }
        return;
    }

    let bare = target.strip_prefix('#');
    let matched = server
        .channels
        .iter()
        .find(|c| !c.is_direct_message && (c.name == target || bare == Some(c.name.as_str())));
    match matched {
        Some(channel) => events.chat(server.id, channel.id, nick, text),
        None => tracing::debug!(server = %server.name, "No channel for message to {}", target),
    }
}

fn on_welcome(server: &mut Server, events: &EventSender, opts: DispatchOptions) -> Result<()> {
    server.logged_in = true;
    tracing::info!("Successfully logged into {}", server.name);
    events.status(server.id, None, "Connected and logged in");

    if !opts.autojoin_on_welcome {
        return Ok(());
    }
    let joins: Vec<String> = server
        .channels
        .iter()
        .filter(|c| !c.is_direct_message && c.active)
        .map(|c| format!("JOIN #{}\r\n", c.name))
        .collect();
    for join in joins {
        send_command(server, &join)?;
    }
    Ok(())
}

/// Channel token of a JOIN/PART/KICK with the `:` and `#` markers removed.
fn channel_token(msg: &ParsedMessage) -> Option<&str> {
    let (token, _) = split_param(&msg.params)?;
    let token = token.strip_prefix(':').unwrap_or(token);
    let token = token.strip_prefix('#').unwrap_or(token);
    (!token.is_empty()).then_some(token)
}

fn on_join(server: &mut Server, msg: &ParsedMessage, events: &EventSender) {
    let (Some(nick), Some(channel)) = (msg.nick(), channel_token(msg)) else {
        return;
    };
    if nick != server.nick {
        return;
    }
    match server.add_channel(channel, false) {
        Ok(idx) => {
            tracing::info!(server = %server.name, "Joined channel #{}", channel);
            let id = server.channels[idx].id;
            events.status(server.id, Some(id), format!("Now talking in #{}", channel));
        }
        Err(e) => tracing::info!(server = %server.name, "Not tracking #{}: {}", channel, e),
    }
}

fn on_leave(server: &mut Server, msg: &ParsedMessage, events: &EventSender) {
    let (Some(nick), Some(channel)) = (msg.nick(), channel_token(msg)) else {
        return;
    };
    if nick != server.nick {
        return;
    }
    if let Some(idx) = server.find_channel(channel, false) {
        server.remove_channel(idx);
    }
    tracing::info!(server = %server.name, "Left channel #{}", channel);
    events.status(server.id, None, format!("Left #{}", channel));
}
