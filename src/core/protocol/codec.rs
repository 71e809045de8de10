// src/core/protocol/codec.rs

//! Frames the inbound byte stream of a chat client into text lines.

use crate::core::ChatError;
use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

/// Splits input on `\n` and decodes each line leniently.
///
/// Content never fails a read: invalid UTF-8 is replaced with U+FFFD, and a
/// line longer than `max_length` bytes is handed out in `max_length`-sized
/// pieces, each one a line of its own. A trailing `\r` is dropped.
#[derive(Debug, Clone)]
pub struct ChatLineCodec {
    max_length: usize,
    /// How far `\n` has already been searched for in the buffer.
    next_index: usize,
}

impl ChatLineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.max(1),
            next_index: 0,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn take_line(&mut self, src: &mut BytesMut, len: usize, skip: usize) -> String {
        self.next_index = 0;
        let line = src.split_to(len);
        src.advance(skip);
        let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
        String::from_utf8_lossy(line).into_owned()
    }
}

/// The longest prefix of `bytes` that does not end inside a UTF-8 sequence.
/// Falls back to the whole slice when nothing valid can be kept.
fn char_boundary(bytes: &[u8]) -> usize {
    match std::str::from_utf8(bytes) {
        Err(e) if e.error_len().is_none() && e.valid_up_to() > 0 => e.valid_up_to(),
        _ => bytes.len(),
    }
}

impl Decoder for ChatLineCodec {
    type Item = String;
    type Error = ChatError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let limit = src.len().min(self.max_length + 1);
        if let Some(offset) = src[self.next_index..limit].iter().position(|b| *b == b'\n') {
            let end = self.next_index + offset;
            if end <= self.max_length {
                return Ok(Some(self.take_line(src, end, 1)));
            }
        }
        if src.len() > self.max_length {
            let cut = char_boundary(&src[..self.max_length]);
            return Ok(Some(self.take_line(src, cut, 0)));
        }
        self.next_index = src.len();
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            Ok(None)
        } else {
            let len = src.len();
            Ok(Some(self.take_line(src, len, 0)))
        }
    }
}
