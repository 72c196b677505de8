use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use tokio::sync::mpsc;

/// Used when the configured timestamp format does not parse.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "[%H:%M:%S]";

pub type ServerId = usize;
pub type ChannelId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A chat line (`<nick> text`) for a channel or DM.
    ChatLine,
    /// A status or informational line.
    StatusLine,
}

/// An event handed from the core to the foreground consumer.
///
/// `channel_id` is `None` for lines that belong to the server itself rather
/// than to one of its channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub server_id: ServerId,
    pub channel_id: Option<ChannelId>,
    pub kind: EventKind,
    pub text: String,
}

/// Producer side of the event hand-off.
///
/// Cloned into every reader thread. Delivery is FIFO per producer, which
/// gives the per-server ordering guarantee since each server has exactly one
/// reader thread.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
    timestamp_format: String,
}

impl EventSender {
    /// An unparsable `timestamp_format` is replaced by
    /// [`DEFAULT_TIMESTAMP_FORMAT`]; formatting never fails after this.
    pub fn new(tx: mpsc::UnboundedSender<Event>, timestamp_format: impl Into<String>) -> Self {
        let mut timestamp_format = timestamp_format.into();
        if StrftimeItems::new(&timestamp_format).any(|item| matches!(item, Item::Error)) {
            tracing::warn!(
                "Invalid timestamp format {:?}, using {}",
                timestamp_format,
                DEFAULT_TIMESTAMP_FORMAT
            );
            timestamp_format = DEFAULT_TIMESTAMP_FORMAT.to_string();
        }
        Self {
            tx,
            timestamp_format,
        }
    }

    /// Emit a `<nick> text` chat line stamped with the delivery time.
    pub fn chat(&self, server_id: ServerId, channel_id: ChannelId, nick: &str, text: &str) {
        let line = format!("{} <{}> {}", self.timestamp(), nick, text);
        self.send(Event {
            server_id,
            channel_id: Some(channel_id),
            kind: EventKind::ChatLine,
            text: line,
        });
    }

    pub fn status(&self, server_id: ServerId, channel_id: Option<ChannelId>, text: impl Into<String>) {
        self.send(Event {
            server_id,
            channel_id,
            kind: EventKind::StatusLine,
            text: text.into(),
        });
    }

    fn send(&self, event: Event) {
        // A dropped receiver means the consumer is gone; nothing left to notify.
        if self.tx.send(event).is_err() {
            tracing::debug!("event consumer dropped, discarding event");
        }
    }

    fn timestamp(&self) -> String {
        Local::now().format(&self.timestamp_format).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_lines_are_stamped_and_formatted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = EventSender::new(tx, "[%H:%M:%S]");
        events.chat(3, 7, "alice", "hello there");

        let event = rx.try_recv().unwrap();
        assert_eq!(event.server_id, 3);
        assert_eq!(event.channel_id, Some(7));
        assert_eq!(event.kind, EventKind::ChatLine);
        assert!(event.text.starts_with('['));
        assert!(event.text.ends_with("] <alice> hello there"));
    }

    #[test]
    fn invalid_timestamp_format_falls_back() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = EventSender::new(tx, "%Q");
        assert_eq!(events.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        events.chat(0, 0, "alice", "hi");
        let text = rx.try_recv().unwrap().text;
        assert!(text.starts_with('['));
        assert!(text.ends_with("] <alice> hi"));
    }

    #[test]
    fn sending_after_consumer_dropped_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let events = EventSender::new(tx, "%H:%M");
        events.status(0, None, "still fine");
    }
}
