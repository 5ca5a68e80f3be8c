//! Accumulating buffer that recognizers are evaluated against.
//!
//! Every chunk read from the remote is appended here and the whole
//! accumulated buffer is searched again, so a prompt split across two reads
//! is found exactly as if it had arrived in one piece.

use std::borrow::Cow;
use std::ops::Range;

use bytes::BytesMut;
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Upper bound on observed text carried inside errors.
pub const MAX_EXCERPT_LEN: usize = 512;

/// Buffer for accumulating output and searching it for recognizers.
///
/// ANSI escape sequences are removed as data arrives. The `vte` parser keeps
/// its state between chunks, so a sequence cut in half by a read boundary is
/// still stripped.
pub struct PatternBuffer {
    /// The accumulated (stripped) output.
    buffer: BytesMut,

    /// Escape sequence parser, `None` when stripping is disabled.
    parser: Option<Parser>,
}

/// Position of the first recognizer that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    /// Index of the recognizer in the slice that was searched.
    pub index: usize,

    /// Byte range of the match in the buffer.
    pub range: Range<usize>,
}

impl PatternBuffer {
    /// Create an empty buffer that strips ANSI escape sequences.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            parser: Some(Parser::new()),
        }
    }

    /// Create an empty buffer that keeps the raw bytes.
    pub fn raw() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            parser: None,
        }
    }

    /// Extend the buffer with new data.
    pub fn extend(&mut self, data: &[u8]) {
        match self.parser.as_mut() {
            Some(parser) => {
                let mut sink = Printable {
                    out: &mut self.buffer,
                };
                parser.advance(&mut sink, data);
            }
            None => self.buffer.extend_from_slice(data),
        }
    }

    /// Find the earliest match among `patterns`.
    ///
    /// When two recognizers match at the same position the one declared
    /// first wins. Zero-width matches are ignored and an empty buffer never
    /// matches.
    pub fn find_first(&self, patterns: &[Regex]) -> Option<Found> {
        if self.buffer.is_empty() {
            return None;
        }

        let mut best: Option<Found> = None;
        for (index, pattern) in patterns.iter().enumerate() {
            let Some(m) = pattern.find_iter(&self.buffer).find(|m| !m.is_empty()) else {
                continue;
            };
            match &best {
                Some(current) if current.range.start <= m.start() => {}
                _ => {
                    best = Some(Found {
                        index,
                        range: m.range(),
                    })
                }
            }
        }
        best
    }

    /// The full line containing the byte range, without the line break.
    pub fn line_around(&self, range: &Range<usize>) -> Cow<'_, str> {
        let start = memchr::memrchr(b'\n', &self.buffer[..range.start])
            .map(|pos| pos + 1)
            .unwrap_or(0);
        let end = memchr::memchr(b'\n', &self.buffer[range.end..])
            .map(|pos| range.end + pos)
            .unwrap_or(self.buffer.len());
        String::from_utf8_lossy(&self.buffer[start..end])
    }

    /// Get a slice of the buffer as a string (lossy UTF-8 conversion).
    pub fn slice_str(&self, range: Range<usize>) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer[range])
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("strip_ansi", &self.parser.is_some())
            .finish()
    }
}

/// Collects printable characters and the layout controls that matter for
/// line-oriented prompt matching.
struct Printable<'a> {
    out: &'a mut BytesMut,
}

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t' | 0x08) {
            self.out.extend_from_slice(&[byte]);
        }
    }
}

/// Bound observed text for inclusion in an error, keeping the tail.
pub fn excerpt(text: &str) -> String {
    if text.len() <= MAX_EXCERPT_LEN {
        return text.to_string();
    }
    let mut start = text.len() - MAX_EXCERPT_LEN;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"Hello, world!\r\n");
        assert_eq!(buffer.as_slice(), b"Hello, world!\r\n");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"\x1b[32mGreen text\x1b[0m");
        assert_eq!(buffer.as_slice(), b"Green text");
    }

    #[test]
    fn test_ansi_sequence_split_across_chunks() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"node-7\x1b[");
        buffer.extend(b"1;32m# ");
        assert_eq!(buffer.as_slice(), b"node-7# ");
    }

    #[test]
    fn test_raw_buffer_keeps_escapes() {
        let mut buffer = PatternBuffer::raw();
        buffer.extend(b"\x1b[0m#");
        assert_eq!(buffer.as_slice(), b"\x1b[0m#");
    }

    #[test]
    fn test_empty_buffer_never_matches() {
        let buffer = PatternBuffer::new();
        let anything = Regex::new(r".*").unwrap();
        assert!(buffer.find_first(&[anything]).is_none());
    }

    #[test]
    fn test_zero_width_match_ignored() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"abc");
        let optional = Regex::new(r"x*").unwrap();
        assert!(buffer.find_first(&[optional]).is_none());
    }

    #[test]
    fn test_earliest_match_wins() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"Password: ... Username: ");
        let username = Regex::new(r"Username:").unwrap();
        let password = Regex::new(r"Password:").unwrap();
        let found = buffer.find_first(&[username, password]).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.range, 0..9);
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"node-7# ");
        let long = Regex::new(r"node-7#\s").unwrap();
        let short = Regex::new(r"node").unwrap();
        assert_eq!(buffer.find_first(&[long.clone(), short.clone()]).unwrap().index, 0);
        assert_eq!(buffer.find_first(&[short, long]).unwrap().index, 0);
    }

    #[test]
    fn test_line_around() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"banner\nA:admin@node-9# ");
        let prompt = Regex::new(r"#\s").unwrap();
        let found = buffer.find_first(&[prompt]).unwrap();
        assert_eq!(buffer.line_around(&found.range), "A:admin@node-9# ");
    }

    #[test]
    fn test_excerpt_keeps_tail() {
        let short = "Login failed.";
        assert_eq!(excerpt(short), short);

        let long = format!("{}TAIL", "x".repeat(MAX_EXCERPT_LEN * 2));
        let cut = excerpt(&long);
        assert!(cut.starts_with("..."));
        assert!(cut.ends_with("TAIL"));
        assert_eq!(cut.len(), MAX_EXCERPT_LEN + 3);
    }
}
