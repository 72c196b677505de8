//! Reassembly of `\r\n`-terminated lines from arbitrary receive chunks.

/// Advisory maximum length of one protocol line, CRLF included.
pub const MAX_MESSAGE_LEN: usize = 512;

/// Upper bound on a single socket read.
pub const READ_CHUNK: usize = MAX_MESSAGE_LEN - 1;

/// Accumulator capacity. Bytes of an over-long line beyond this are dropped
/// until the next `\n`.
pub const LINE_CAPACITY: usize = MAX_MESSAGE_LEN * 2;

#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(LINE_CAPACITY),
        }
    }

    /// Consume one received chunk and return every line it completed.
    ///
    /// A trailing `\r` before the `\n` is not part of the line, and empty
    /// lines are skipped. Bytes after the last `\n` stay buffered.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let mut end = self.buf.len();
                if end > 0 && self.buf[end - 1] == b'\r' {
                    end -= 1;
                }
                if end > 0 {
                    lines.push(String::from_utf8_lossy(&self.buf[..end]).into_owned());
                }
                self.buf.clear();
            } else if self.buf.len() < LINE_CAPACITY - 1 {
                self.buf.push(byte);
            }
        }
        lines
    }

    /// Number of bytes waiting for their terminating `\n`.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
