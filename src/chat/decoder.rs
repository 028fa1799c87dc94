//! Incremental decoder for chat-completions event streams.
//!
//! Bytes arrive in arbitrary chunks. They are decoded as streaming
//! UTF-8 into a text buffer that is addressed by two offsets: the
//! start of the unconsumed text and the point up to which it has
//! already been searched for a line terminator. Complete lines are
//! classified into frames, incomplete tail text waits for the next
//! chunk and nothing is ever rescanned.

use serde_json::Value;

use crate::openai::{DONE_SENTINEL, delta_content};

const DATA_PREFIX: &str = "data: ";

/// One line of the event stream.
#[derive(Debug, PartialEq)]
pub enum Frame<'a> {
    /// Blank lines, `:` comments (heartbeats) and non-data fields
    Skip,
    /// The (trimmed) payload of a `data: ` line
    Data(&'a str),
    /// The `[DONE]` sentinel
    Done,
}

/// Classify a single line with its terminator already removed.
pub fn classify(line: &str) -> Frame<'_> {
    if line.starts_with(':') || line.trim().is_empty() {
        return Frame::Skip;
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Skip;
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        Frame::Done
    } else {
        Frame::Data(payload)
    }
}

// A line that can only be the rest of a JSON payload broken by a raw
// newline, as opposed to the start of the next event.
fn is_continuation(line: &str) -> bool {
    !line.trim().is_empty() && !line.starts_with(DATA_PREFIX) && !line.starts_with(':')
}

#[derive(Debug, Default)]
pub struct StreamDecoder {
    text: String,
    // Start of the text not yet handed out as a line
    consumed: usize,
    // Everything before this offset is known to contain no '\n'
    scanned: usize,
    // Trailing bytes of a code point split across chunks
    utf8_tail: Vec<u8>,
    // Payload of a frame that failed to parse and may be continued
    // by the next line
    held: Option<String>,
    done: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the sentinel frame has been seen. Any further input
    /// is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed the next chunk of the response body and return the text
    /// deltas of every frame it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.push_bytes(chunk);
        self.drain(false)
    }

    /// Signal the end of the response body. Complete lines still
    /// buffered are processed; an unterminated trailing line and a
    /// frame that never completed are dropped.
    pub fn finish(&mut self) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        if !self.utf8_tail.is_empty() {
            let tail = std::mem::take(&mut self.utf8_tail);
            self.text.push_str(&String::from_utf8_lossy(&tail));
        }
        let deltas = self.drain(true);
        if let Some(held) = self.held.take() {
            tracing::debug!("Stream closed with an incomplete frame: {}", held);
        }
        self.done = true;
        self.reset_buffer();
        deltas
    }

    fn push_bytes(&mut self, chunk: &[u8]) {
        self.utf8_tail.extend_from_slice(chunk);
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.utf8_tail[start..]) {
                Ok(s) => {
                    self.text.push_str(s);
                    self.utf8_tail.clear();
                    return;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&self.utf8_tail[start..valid_end]) {
                        self.text.push_str(s);
                    }
                    match e.error_len() {
                        Some(invalid_len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + invalid_len;
                        }
                        // Incomplete code point at the end, keep it for
                        // the next chunk
                        None => {
                            self.utf8_tail.drain(..valid_end);
                            return;
                        }
                    }
                }
            }
        }
    }

    // Returns the byte range of the next complete line, without its
    // '\n', and advances past it.
    fn next_line(&mut self) -> Option<(usize, usize)> {
        match self.text[self.scanned..].find('\n') {
            Some(offset) => {
                let start = self.consumed;
                let end = self.scanned + offset;
                self.consumed = end + 1;
                self.scanned = end + 1;
                Some((start, end))
            }
            None => {
                self.scanned = self.text.len();
                None
            }
        }
    }

    fn drain(&mut self, at_eof: bool) -> Vec<String> {
        let mut deltas = Vec::new();

        while let Some((start, end)) = self.next_line() {
            let raw = &self.text[start..end];
            let line = raw.strip_suffix('\r').unwrap_or(raw);

            if let Some(held) = self.held.take() {
                if is_continuation(line) {
                    let joined = format!("{}\n{}", held, line);
                    match serde_json::from_str::<Value>(&joined) {
                        Ok(chunk) => {
                            deltas.extend(delta_content(&chunk).map(str::to_string));
                        }
                        Err(_) => {
                            self.held = Some(joined);
                            if !at_eof {
                                break;
                            }
                        }
                    }
                    continue;
                }
                tracing::debug!("Dropping frame that never completed: {}", held);
            }

            match classify(line) {
                Frame::Skip => continue,
                Frame::Done => {
                    self.done = true;
                    break;
                }
                Frame::Data(payload) => match serde_json::from_str::<Value>(payload) {
                    Ok(chunk) => {
                        deltas.extend(delta_content(&chunk).map(str::to_string));
                    }
                    Err(_) => {
                        // Keep the frame and wait for more bytes before
                        // scanning further
                        self.held = Some(payload.to_string());
                        if !at_eof {
                            break;
                        }
                    }
                },
            }
        }

        if self.done {
            self.held = None;
            self.reset_buffer();
        } else {
            self.compact();
        }

        deltas
    }

    fn compact(&mut self) {
        if self.consumed > 0 && self.consumed * 2 >= self.text.len() {
            self.text.drain(..self.consumed);
            self.scanned -= self.consumed;
            self.consumed = 0;
        }
    }

    fn reset_buffer(&mut self) {
        self.text.clear();
        self.utf8_tail.clear();
        self.consumed = 0;
        self.scanned = 0;
    }
}
