//! Scanner: owner of the rolling input buffer.
//!
//! What it does
//! - Accumulates fed chunks (text, or bytes decoded as UTF-8 with a carry
//!   for sequences split across chunks) into one buffer.
//! - Classifies the text at any position at or after the committed cursor
//!   into a [`Token`] with [`Scanner::peek_at`]. Peeking is pure, so callers
//!   may look ahead over a whole row and only [`commit`](Scanner::commit)
//!   once the row is complete.
//! - Answers [`Peeked::NeedMore`] instead of guessing whenever the buffered
//!   tail could still grow into a longer token: a prefix of a multi-character
//!   delimiter or custom row delimiter, or a lone `\r` that may become `\r\n`.
//!
//! Invariants
//! - Positions are logical byte offsets of the decoded text since the first
//!   feed. They only grow.
//! - `base <= cursor <= base + buffer.len()`. Text before `cursor` is dropped
//!   on the next feed.
//! - [`Peeked::EndOfInput`] is only reported after [`Scanner::close`] and once
//!   every buffered byte has been consumed.

use tracing::trace;

use crate::{options::Dialect, token::Token};

const REPLACEMENT: char = '\u{FFFD}';

/// Result of classifying the text at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peeked<'a> {
    /// The buffered text ends before a token can be classified.
    NeedMore,
    /// Input is closed and fully consumed.
    EndOfInput,
    /// A classified token. Text after it is not examined.
    Token(Token<'a>),
}

/// Tokenizer over input that arrives in chunks.
#[derive(Debug, Default)]
pub struct Scanner {
    buffer: String,
    /// Logical offset of `buffer[0]`.
    base: usize,
    cursor: usize,
    /// Bytes of an incomplete UTF-8 sequence from the end of the last byte
    /// chunk.
    utf8_tail: Vec<u8>,
    end_of_input: bool,
    /// Bytes covered by every token handed out.
    #[cfg(test)]
    scanned: core::cell::Cell<usize>,
}

impl Scanner {
    /// An empty, open scanner at position 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk of text.
    pub fn feed(&mut self, chunk: &str) {
        self.compact();
        if !self.utf8_tail.is_empty() {
            self.utf8_tail.clear();
            self.buffer.push(REPLACEMENT);
        }
        self.buffer.push_str(chunk);
    }

    /// Appends a chunk of bytes, decoding UTF-8.
    ///
    /// A sequence cut off at the end of the chunk is held back until the next
    /// call. Invalid bytes become U+FFFD.
    pub fn feed_bytes(&mut self, chunk: &[u8]) {
        self.compact();
        if self.utf8_tail.is_empty() {
            self.decode(chunk);
        } else {
            let mut joined = core::mem::take(&mut self.utf8_tail);
            joined.extend_from_slice(chunk);
            self.decode(&joined);
        }
    }

    fn decode(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let (ch, len) = bstr::decode_utf8(bytes);
            match ch {
                Some(ch) => self.buffer.push(ch),
                None if len == bytes.len() => {
                    // Could still be the start of a valid sequence.
                    self.utf8_tail.extend_from_slice(bytes);
                    return;
                }
                None => self.buffer.push(REPLACEMENT),
            }
            bytes = &bytes[len..];
        }
    }

    /// Signals that no more chunks will arrive.
    pub fn close(&mut self) {
        if !self.utf8_tail.is_empty() {
            self.utf8_tail.clear();
            self.buffer.push(REPLACEMENT);
        }
        self.end_of_input = true;
    }

    /// Whether [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.end_of_input
    }

    /// Committed position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Logical position just past the last decoded character.
    #[must_use]
    pub fn buffered_end(&self) -> usize {
        self.base + self.buffer.len()
    }

    /// Bytes fed but not yet committed, including an undecoded UTF-8 tail.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buffered_end() - self.cursor + self.utf8_tail.len()
    }

    /// Buffered text from `pos` to the end.
    ///
    /// # Panics
    ///
    /// If `pos` is before the cursor, past the buffered end or not on a
    /// character boundary.
    #[must_use]
    pub fn rest_at(&self, pos: usize) -> &str {
        assert!(pos >= self.cursor, "position {pos} is behind the cursor");
        &self.buffer[pos - self.base..]
    }

    /// Buffered text between two positions.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &str {
        assert!(start >= self.cursor, "position {start} is behind the cursor");
        &self.buffer[start - self.base..end - self.base]
    }

    /// Classifies the text at the cursor.
    #[must_use]
    pub fn peek(&self, dialect: &Dialect) -> Peeked<'_> {
        self.peek_at(self.cursor, dialect)
    }

    /// Classifies the text at `pos` without moving the cursor.
    #[must_use]
    pub fn peek_at(&self, pos: usize, dialect: &Dialect) -> Peeked<'_> {
        let rest = self.rest_at(pos);
        let open = !self.end_of_input;
        let token = move |len: usize| {
            #[cfg(test)]
            self.scanned.set(self.scanned.get() + len);
            Peeked::Token(Token::new(&rest[..len], pos, pos + len))
        };

        let Some(first) = rest.chars().next() else {
            return if open {
                Peeked::NeedMore
            } else {
                Peeked::EndOfInput
            };
        };

        match dialect.row_delimiter() {
            Some(row) => {
                if rest.starts_with(row) {
                    return token(row.len());
                }
                if open && row.starts_with(rest) {
                    return Peeked::NeedMore;
                }
            }
            None => match first {
                '\r' if rest.starts_with("\r\n") => return token(2),
                '\r' if open && rest.len() == 1 => return Peeked::NeedMore,
                '\r' | '\n' => return token(1),
                _ => {}
            },
        }

        // Longest candidate first: a longer candidate that the tail is a
        // prefix of must be resolved before a shorter full match is accepted.
        for candidate in dialect.delimiters() {
            if rest.starts_with(candidate.as_str()) {
                return token(candidate.len());
            }
            if open && candidate.len() > rest.len() && candidate.starts_with(rest) {
                return Peeked::NeedMore;
            }
        }

        let single = [dialect.quote(), dialect.escape(), dialect.comment()];
        if single.contains(&Some(first)) {
            return token(first.len_utf8());
        }

        let head = first.len_utf8();
        let len = rest[head..]
            .find(|c| dialect.is_special(c))
            .map_or(rest.len(), |i| head + i);
        token(len)
    }

    /// Returns the token at the cursor and moves past it.
    pub fn next_token(&mut self, dialect: &Dialect) -> Peeked<'_> {
        let span = match self.peek(dialect) {
            Peeked::Token(token) => token.span(),
            Peeked::NeedMore => return Peeked::NeedMore,
            Peeked::EndOfInput => return Peeked::EndOfInput,
        };
        self.cursor = span.end;
        Peeked::Token(Token::new(self.slice_unchecked(span.start, span.end), span.start, span.end))
    }

    fn slice_unchecked(&self, start: usize, end: usize) -> &str {
        &self.buffer[start - self.base..end - self.base]
    }

    /// Moves the cursor forward to `pos`.
    ///
    /// # Panics
    ///
    /// If `pos` is behind the cursor or past the buffered end.
    pub fn commit(&mut self, pos: usize) {
        assert!(
            pos >= self.cursor && pos <= self.buffered_end(),
            "commit to {pos} outside {}..={}",
            self.cursor,
            self.buffered_end()
        );
        trace!(from = self.cursor, to = pos, "scanner commit");
        self.cursor = pos;
    }

    /// Drops all buffered input. Positions keep counting from where they
    /// were.
    pub fn clear(&mut self) {
        self.base = self.buffered_end();
        self.cursor = self.base;
        self.buffer = String::new();
        self.utf8_tail = Vec::new();
    }

    #[cfg(test)]
    pub(crate) fn scanned_bytes(&self) -> usize {
        self.scanned.get()
    }

    /// Discards text before the cursor.
    pub fn compact(&mut self) {
        let consumed = self.cursor - self.base;
        if consumed > 0 {
            self.buffer.drain(..consumed);
            self.base = self.cursor;
        }
    }
}
