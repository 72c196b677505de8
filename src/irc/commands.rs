//! User input parser.
//!
//! Turns one line typed by the user into a typed [`ParsedInput`] that the
//! client facade turns into protocol traffic. Matching is by literal prefix,
//! case-sensitive, and the text after the prefix is passed on untouched.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    /// `/join X` sends `JOIN X`.
    Join { channel: String },
    /// `/msg nick text` sends a private message and echoes it into the DM.
    Msg { target: String, text: String },
    /// `/quit [reason]` disconnects the server.
    Quit { reason: Option<String> },
    /// Any other `/cmd ...`, sent verbatim without the slash.
    Raw { command: String },
    /// Plain text for the active channel.
    Chat { text: String },
}

pub fn join(channel: &str) -> String {
    format!("JOIN {}\r\n", channel)
}

pub fn privmsg(target: &str, text: &str) -> String {
    format!("PRIVMSG {} :{}\r\n", target, text)
}

pub fn quit(reason: &str) -> String {
    format!("QUIT :{}\r\n", reason)
}

/// Parse one input line.
///
/// Returns `None` for empty input and for a `/msg` that has a target but no
/// message text, both of which are ignored.
pub fn parse_input(input: &str) -> Option<ParsedInput> {
    if input.is_empty() {
        return None;
    }
    let Some(body) = input.strip_prefix('/') else {
        return Some(ParsedInput::Chat {
            text: input.to_string(),
        });
    };

    if let Some(channel) = input.strip_prefix("/join ") {
        return Some(ParsedInput::Join {
            channel: channel.to_string(),
        });
    }
    if let Some(rest) = input.strip_prefix("/quit") {
        let reason = rest.strip_prefix(' ').filter(|r| !r.is_empty());
        return Some(ParsedInput::Quit {
            reason: reason.map(str::to_string),
        });
    }
    if let Some(rest) = input.strip_prefix("/msg ") {
        let (target, text) = rest.split_once(' ')?;
        return Some(ParsedInput::Msg {
            target: target.to_string(),
            text: text.to_string(),
        });
    }

    Some(ParsedInput::Raw {
        command: body.to_string(),
    })
}
