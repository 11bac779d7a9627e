//! Lexical units produced by the [`Scanner`](crate::Scanner).
//!
//! A [`Token`] carries no classification of its own. Whether it is a
//! delimiter, a quote or a row break is answered against a [`Dialect`] each
//! time it is asked.

use core::fmt;

use crate::options::Dialect;

/// Half-open range of logical byte offsets into the whole input.
///
/// Offsets count from the first byte ever fed to the parser and are never
/// reset between chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Span {
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A run of input text and the cursor range it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    content: &'a str,
    start_cursor: usize,
    end_cursor: usize,
}

impl<'a> Token<'a> {
    /// Wraps `content` read from `start_cursor..end_cursor`. Never fails.
    #[must_use]
    pub const fn new(content: &'a str, start_cursor: usize, end_cursor: usize) -> Self {
        Self {
            content,
            start_cursor,
            end_cursor,
        }
    }

    /// The token text.
    #[must_use]
    pub const fn content(&self) -> &'a str {
        self.content
    }

    /// Logical offset of the first byte.
    #[must_use]
    pub const fn start_cursor(&self) -> usize {
        self.start_cursor
    }

    /// Logical offset just past the last byte.
    #[must_use]
    pub const fn end_cursor(&self) -> usize {
        self.end_cursor
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        Span::new(self.start_cursor, self.end_cursor)
    }

    /// `true` if the token is one of the dialect's field delimiters.
    #[must_use]
    pub fn is_delimiter(&self, dialect: &Dialect) -> bool {
        dialect.delimiters().iter().any(|d| d == self.content)
    }

    /// `true` for `\r`, `\n` and `\r\n`, or only for the custom row
    /// delimiter when one is configured.
    #[must_use]
    pub fn is_row_delimiter(&self, dialect: &Dialect) -> bool {
        match dialect.row_delimiter() {
            Some(custom) => self.content == custom,
            None => matches!(self.content, "\r" | "\n" | "\r\n"),
        }
    }

    /// `true` if the token is the quote character.
    #[must_use]
    pub fn is_quote(&self, dialect: &Dialect) -> bool {
        dialect.quote().is_some_and(|q| is_char(self.content, q))
    }

    /// `true` if the token is the effective escape character, which is the
    /// quote unless another escape is configured.
    #[must_use]
    pub fn is_escape(&self, dialect: &Dialect) -> bool {
        dialect.escape().is_some_and(|e| is_char(self.content, e))
    }

    /// `true` if the token is the comment character.
    #[must_use]
    pub fn is_comment(&self, dialect: &Dialect) -> bool {
        dialect.comment().is_some_and(|c| is_char(self.content, c))
    }

    /// Either kind of delimiter: the token ends the current field.
    #[must_use]
    pub fn is_terminator(&self, dialect: &Dialect) -> bool {
        self.is_delimiter(dialect) || self.is_row_delimiter(dialect)
    }
}

fn is_char(s: &str, c: char) -> bool {
    let mut chars = s.chars();
    chars.next() == Some(c) && chars.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Delimiter, ParserOptions};

    fn dialect(options: ParserOptions) -> Dialect {
        options.compile().unwrap()
    }

    #[test]
    fn classification_follows_the_dialect() {
        let csv = dialect(ParserOptions::default());
        let token = Token::new(";", 0, 1);
        assert!(!token.is_delimiter(&csv));

        let semi = dialect(ParserOptions {
            delimiter: Delimiter::Single(';'),
            ..Default::default()
        });
        assert!(token.is_delimiter(&semi));
        assert!(token.is_terminator(&semi));
    }

    #[test]
    fn default_row_delimiters() {
        let csv = dialect(ParserOptions::default());
        for s in ["\r", "\n", "\r\n"] {
            assert!(Token::new(s, 0, s.len()).is_row_delimiter(&csv), "{s:?}");
        }
        assert!(!Token::new("\n\r", 0, 2).is_row_delimiter(&csv));
    }

    #[test]
    fn custom_row_delimiter_replaces_defaults() {
        let custom = dialect(ParserOptions {
            row_delimiter: Some("|~".into()),
            ..Default::default()
        });
        assert!(Token::new("|~", 0, 2).is_row_delimiter(&custom));
        assert!(!Token::new("\n", 0, 1).is_row_delimiter(&custom));
    }

    #[test]
    fn quote_doubles_as_escape_by_default() {
        let csv = dialect(ParserOptions::default());
        let quote = Token::new("\"", 3, 4);
        assert!(quote.is_quote(&csv));
        assert!(quote.is_escape(&csv));
        assert_eq!(quote.span(), Span::new(3, 4));
    }
}
