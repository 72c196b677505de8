//! Inbound line decomposition.
//!
//! A line is split into an optional `:prefix`, a command token, and the raw
//! parameter remainder. Parameters are left as text; each dispatch handler
//! tokenizes what it needs, since arity varies per command and the last
//! argument may be a `:`-introduced trailing parameter containing spaces.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Originator without the leading `:`, e.g. `nick!user@host`.
    pub prefix: Option<String>,
    pub command: String,
    /// Everything after the space that terminates the command.
    pub params: String,
}

impl ParsedMessage {
    /// The nick part of the prefix, if there is a prefix.
    pub fn nick(&self) -> Option<&str> {
        self.prefix.as_deref().map(nick_from_prefix)
    }

    /// First parameter token and the remainder after it.
    pub fn first_param(&self) -> Option<(&str, &str)> {
        split_param(&self.params)
    }
}

pub fn parse(line: &str) -> Result<ParsedMessage, ParseError> {
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let (prefix, rest) = match line.strip_prefix(':') {
        Some(stripped) => {
            let (prefix, rest) = stripped.split_once(' ').unwrap_or((stripped, ""));
            if prefix.is_empty() {
                return Err(ParseError::MissingPrefix);
            }
            (Some(prefix.to_string()), rest)
        }
        None => (None, line),
    };

    let rest = rest.trim_start_matches(' ');
    let (command, params) = rest.split_once(' ').unwrap_or((rest, ""));
    if command.is_empty() {
        return Err(ParseError::MissingCommand);
    }

    Ok(ParsedMessage {
        prefix,
        command: command.to_string(),
        params: params.to_string(),
    })
}

/// `nick!user@host` -> `nick`. A prefix without `!` (a server name) is
/// returned whole.
pub fn nick_from_prefix(prefix: &str) -> &str {
    prefix.split_once('!').map_or(prefix, |(nick, _)| nick)
}

/// Split off one space-delimited token, skipping leading spaces. The
/// remainder starts right after the single space that ended the token.
pub fn split_param(params: &str) -> Option<(&str, &str)> {
    let params = params.trim_start_matches(' ');
    if params.is_empty() {
        return None;
    }
    Some(params.split_once(' ').unwrap_or((params, "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privmsg_with_prefix() {
        let msg = parse(":nick!user@host PRIVMSG #chan :hello world").unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("nick!user@host"));
        assert_eq!(msg.command, "PRIVMSG");
        assert!(msg.params.starts_with("#chan :hello world"));
        assert_eq!(msg.nick(), Some("nick"));
        assert_eq!(msg.first_param(), Some(("#chan", ":hello world")));
    }

    #[test]
    fn no_prefix() {
        let msg = parse("PING :token123").unwrap();
        assert_eq!(msg.prefix, None);
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.params, ":token123");
        assert_eq!(msg.nick(), None);
    }

    #[test]
    fn command_without_params() {
        let msg = parse("PING").unwrap();
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.params, "");
        assert_eq!(msg.first_param(), None);
    }

    #[test]
    fn numeric_reply_from_server_prefix() {
        let msg = parse(":irc.example.net 001 me :Welcome to the network").unwrap();
        assert_eq!(msg.command, "001");
        assert_eq!(msg.nick(), Some("irc.example.net"));
        assert_eq!(msg.params, "me :Welcome to the network");
    }

    #[test]
    fn extra_spaces_before_command_are_skipped() {
        let msg = parse(":a!b@c   JOIN :#rust").unwrap();
        assert_eq!(msg.command, "JOIN");
        assert_eq!(msg.params, ":#rust");
    }

    #[test]
    fn commandless_lines_are_errors() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse(":nick!user@host"), Err(ParseError::MissingCommand));
        assert_eq!(parse(":nick!user@host   "), Err(ParseError::MissingCommand));
        assert_eq!(parse("   "), Err(ParseError::MissingCommand));
        assert_eq!(parse(": PING"), Err(ParseError::MissingPrefix));
    }

    #[test]
    fn command_case_is_preserved() {
        let msg = parse("privmsg #a :b").unwrap();
        assert_eq!(msg.command, "privmsg");
    }

    #[test]
    fn split_param_keeps_trailing_text() {
        assert_eq!(split_param("  #a  :x y"), Some(("#a", " :x y")));
        assert_eq!(split_param("only"), Some(("only", "")));
        assert_eq!(split_param("   "), None);
    }
}
