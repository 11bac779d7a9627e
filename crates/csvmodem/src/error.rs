use core::fmt;

use thiserror::Error;

use crate::token::Span;

/// Rejected [`ParserOptions`](crate::ParserOptions) combinations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("delimiter candidates must be non-empty strings")]
    EmptyDelimiter,
    #[error("delimiter {0:?} contains a reserved character")]
    ReservedInDelimiter(String),
    #[error("row delimiter {0:?} contains a reserved character")]
    ReservedInRowDelimiter(String),
    #[error("row delimiter {row:?} and delimiter {delimiter:?} are prefixes of each other")]
    RowDelimiterOverlap { row: String, delimiter: String },
    #[error("custom row delimiter must not be empty")]
    EmptyRowDelimiter,
    #[error("the comment character must differ from the quote and escape characters")]
    CommentOverlap,
    #[error("an escape character requires a quote character")]
    EscapeWithoutQuote,
    #[error("`rename_headers` requires explicit headers")]
    RenameWithoutHeaders,
    #[error("invalid explicit headers: {0}")]
    Header(#[from] HeaderError),
}

/// A fatal error that ends the stream.
///
/// `span` is the logical byte range of the input the error refers to and
/// `row` the 1-based index of the offending row among all non-comment rows.
#[derive(Error, Debug)]
#[error("{source} at {span} (row {row})")]
pub struct ParserError {
    pub(crate) source: ErrorSource,
    pub(crate) span: Span,
    pub(crate) row: usize,
}

impl ParserError {
    pub(crate) fn new(source: ErrorSource, span: Span, row: usize) -> Self {
        Self { source, span, row }
    }

    /// What went wrong.
    #[must_use]
    pub fn kind(&self) -> &ErrorSource {
        &self.source
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn row(&self) -> usize {
        self.row
    }
}

/// Cause of a [`ParserError`].
#[derive(Error, Debug)]
pub enum ErrorSource {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("column header mismatch: expected {expected} columns, got {actual}")]
    ColumnCount { expected: usize, actual: usize },
    #[error("header error: {0}")]
    Header(#[from] HeaderError),
    #[error("validate callback failed: {0}")]
    Validate(#[source] CallbackError),
    #[error("transform callback failed: {0}")]
    Transform(#[source] CallbackError),
    #[error("row of {actual} bytes exceeds the limit of {limit} bytes")]
    RowTooLarge { limit: usize, actual: usize },
}

/// Malformed quoting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unterminated quoted field")]
    UnterminatedQuote,
    #[error("unexpected character '{0}' after closing quote")]
    UnexpectedAfterQuote(char),
}

/// Header names rejected in strict mode. Positions are 0-based.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("duplicate header {0:?}")]
    Duplicate(String),
    #[error("empty header in column {0}")]
    Empty(usize),
}

/// Error returned by a user validate or transform callback.
#[derive(Debug)]
pub struct CallbackError(Box<dyn core::error::Error + Send + Sync>);

impl CallbackError {
    /// Wraps any error or message.
    pub fn new(error: impl Into<Box<dyn core::error::Error + Send + Sync>>) -> Self {
        Self(error.into())
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl core::error::Error for CallbackError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.0.source()
    }
}

/// Errors from [`CsvFormatter::format`](crate::CsvFormatter::format).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("row has {actual} fields but {expected} headers are configured")]
    ColumnCount { expected: usize, actual: usize },
}

/// Errors from the one-shot helpers ([`parse_str`](crate::parse_str)).
#[derive(Debug, Error)]
pub enum CsvError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParserError),
}
