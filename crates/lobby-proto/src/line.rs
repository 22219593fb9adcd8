//! Line-based codec for tokio.
//!
//! Reads newline-terminated UTF-8 lines and writes lines with a trailing `\n`.
//! Oversized and non-UTF-8 lines are skipped rather than treated as fatal,
//! and every frame reports how many raw bytes it occupied on the wire so the
//! server can do byte-based flood accounting. Bytes of an oversized line are
//! reported as they arrive, so input without a newline is still counted.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ProtocolError, Result};

/// Default maximum line length in bytes, terminator included.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

/// A decoded line with its wire size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Line content without the trailing `\r\n` / `\n`.
    pub text: String,
    /// Number of bytes the line occupied on the wire.
    pub wire_len: usize,
}

/// A frame produced by [`LineCodec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete line within the length limit.
    Line(RawLine),
    /// Part of an oversized line, dropped while the rest is still arriving.
    Discarded {
        /// Bytes dropped in this chunk.
        wire_len: usize,
    },
    /// The end of an oversized line.
    TooLong {
        /// Bytes dropped that were not already reported as [`Inbound::Discarded`].
        wire_len: usize,
    },
    /// A complete line that is not valid UTF-8; dropped.
    Invalid {
        /// Bytes the line occupied, terminator included.
        wire_len: usize,
    },
}

impl Inbound {
    /// Raw byte length of the frame, regardless of whether it was kept.
    pub fn wire_len(&self) -> usize {
        match self {
            Inbound::Line(line) => line.wire_len,
            Inbound::Discarded { wire_len }
            | Inbound::TooLong { wire_len }
            | Inbound::Invalid { wire_len } => *wire_len,
        }
    }
}

/// Line codec that handles newline-terminated messages.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
    /// Skipping the rest of an oversized line
    discarding: bool,
}

impl LineCodec {
    /// Create a codec with the default line limit.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a codec with a custom line limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    /// The configured line limit.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn continue_discard(&mut self, src: &mut BytesMut) -> Option<Inbound> {
        match src.iter().position(|b| *b == b'\n') {
            Some(offset) => {
                src.advance(offset + 1);
                self.discarding = false;
                self.next_index = 0;
                Some(Inbound::TooLong {
                    wire_len: offset + 1,
                })
            }
            None if src.is_empty() => None,
            None => {
                let len = src.len();
                src.advance(len);
                Some(Inbound::Discarded { wire_len: len })
            }
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = Inbound;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Inbound>> {
        if self.discarding {
            return Ok(self.continue_discard(src));
        }

        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let end = self.next_index + offset + 1;
            self.next_index = 0;

            if end > self.max_len {
                src.advance(end);
                return Ok(Some(Inbound::TooLong { wire_len: end }));
            }

            let line = src.split_to(end);
            let Ok(text) = std::str::from_utf8(&line) else {
                return Ok(Some(Inbound::Invalid { wire_len: end }));
            };

            return Ok(Some(Inbound::Line(RawLine {
                text: text.trim_end_matches(&['\r', '\n'][..]).to_string(),
                wire_len: end,
            })));
        }

        if src.len() > self.max_len {
            // Partial line already over the limit: drop what we have and skip to the next newline
            let len = src.len();
            src.advance(len);
            self.next_index = 0;
            self.discarding = true;
            return Ok(Some(Inbound::Discarded { wire_len: len }));
        }

        self.next_index = src.len();
        Ok(None)
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(msg.len() + 1);
        dst.extend_from_slice(msg.as_bytes());
        if !msg.ends_with('\n') {
            dst.extend_from_slice(b"\n");
        }
        Ok(())
    }
}
