//! Foreground event consumer.
//!
//! Owns the text buffers the core only refers to by id: one status buffer
//! per server plus one buffer per channel or DM. Events are appended in the
//! order they are received, and each buffer keeps at most `max_scrollback`
//! lines.

use crate::app::event::{ChannelId, Event, ServerId};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKey {
    ServerStatus(ServerId),
    Channel(ServerId, ChannelId),
}

impl BufferKey {
    pub fn for_event(event: &Event) -> Self {
        match event.channel_id {
            Some(channel) => BufferKey::Channel(event.server_id, channel),
            None => BufferKey::ServerStatus(event.server_id),
        }
    }
}

#[derive(Debug, Default)]
pub struct Buffer {
    lines: VecDeque<String>,
    unread: usize,
}

impl Buffer {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn unread(&self) -> usize {
        self.unread
    }
}

#[derive(Debug)]
pub struct Transcript {
    buffers: HashMap<BufferKey, Buffer>,
    max_scrollback: usize,
}

impl Transcript {
    pub fn new(max_scrollback: usize) -> Self {
        Self {
            buffers: HashMap::new(),
            max_scrollback: max_scrollback.max(1),
        }
    }

    pub fn buffer(&self, key: BufferKey) -> Option<&Buffer> {
        self.buffers.get(&key)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Clear the unread counter, e.g. when the buffer is shown.
    pub fn mark_read(&mut self, key: BufferKey) {
        if let Some(buf) = self.buffers.get_mut(&key) {
            buf.unread = 0;
        }
    }

    fn append(&mut self, key: BufferKey, line: String) {
        let buf = self.buffers.entry(key).or_default();
        buf.lines.push_back(line);
        while buf.lines.len() > self.max_scrollback {
            buf.lines.pop_front();
        }
        buf.unread += 1;
    }
}

/// Append one event to its buffer and return where it went.
pub fn handle_event(transcript: &mut Transcript, event: Event) -> BufferKey {
    let key = BufferKey::for_event(&event);
    transcript.append(key, event.text);
    key
}
