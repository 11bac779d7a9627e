#![allow(clippy::struct_excessive_bools)]

use crate::error::ConfigError;

/// Field separator: a single character or a set of candidate strings.
///
/// With several candidates the longest one that matches at the cursor wins,
/// so `Any(vec![":".into(), "::".into()])` splits `a::b:c` into `a`, `b`
/// and `c`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Delimiter {
    Single(char),
    /// Candidate strings, each at least one character long.
    Any(Vec<String>),
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::Single(',')
    }
}

impl From<char> for Delimiter {
    fn from(c: char) -> Self {
        Self::Single(c)
    }
}

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::Single(c),
            _ => Self::Any(vec![s.to_owned()]),
        }
    }
}

/// Where column names come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderMode {
    /// Rows are emitted as plain field lists.
    #[default]
    Disabled,
    /// The first data row names the columns and is not emitted.
    FirstRow,
    /// Column names given up front. A `None` entry drops that column.
    Explicit(Vec<Option<String>>),
}

impl HeaderMode {
    /// Explicit headers where every column is kept.
    pub fn explicit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Explicit(names.into_iter().map(|s| Some(s.into())).collect())
    }
}

/// Configuration options for the CSV parser.
///
/// Options are checked once by [`ParserOptions::compile`], which every
/// parser constructor calls.
///
/// # Examples
///
/// ```rust
/// use csvmodem::{CsvParser, Delimiter, ParserOptions};
///
/// let options = ParserOptions {
///     delimiter: Delimiter::Single(';'),
///     comment: Some('#'),
///     ignore_empty: true,
///     ..Default::default()
/// };
/// let parser = CsvParser::new(options).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParserOptions {
    /// Field separator.
    ///
    /// # Default
    ///
    /// `,`
    pub delimiter: Delimiter,

    /// Quote character. `None` disables quoting entirely.
    ///
    /// # Default
    ///
    /// `Some('"')`
    pub quote: Option<char>,

    /// Escape character inside quoted fields. `None` means the quote
    /// character escapes itself by doubling.
    pub escape: Option<char>,

    /// Rows whose first character is this are skipped without being
    /// counted.
    pub comment: Option<char>,

    /// Custom row terminator. `None` recognizes CR, LF and CRLF.
    pub row_delimiter: Option<String>,

    /// Header handling.
    pub headers: HeaderMode,

    /// With explicit headers, consume the first row of the input and replace
    /// it with the configured names.
    pub rename_headers: bool,

    /// Drop rows whose fields are all empty or whitespace.
    pub ignore_empty: bool,

    /// Number of data rows to skip after headers are resolved.
    pub skip_rows: usize,

    /// Number of input rows to skip before anything else, header row
    /// included.
    pub skip_lines: usize,

    /// Stop after emitting this many rows.
    pub max_rows: Option<usize>,

    /// Fail on rows whose field count differs from the header count, and on
    /// empty or duplicate header names.
    pub strict_column_handling: bool,

    /// Silently drop fields beyond the header count, even in strict mode.
    pub discard_unmapped_columns: bool,

    /// Trim surrounding whitespace from unquoted fields.
    pub trim: bool,

    /// Trim leading whitespace from unquoted fields.
    pub ltrim: bool,

    /// Trim trailing whitespace from unquoted fields.
    pub rtrim: bool,

    /// Fail when a single row grows beyond this many bytes.
    pub max_row_bytes: Option<usize>,

    /// Drop a leading U+FEFF byte order mark.
    ///
    /// # Default
    ///
    /// `true`
    pub strip_bom: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::default(),
            quote: Some('"'),
            escape: None,
            comment: None,
            row_delimiter: None,
            headers: HeaderMode::Disabled,
            rename_headers: false,
            ignore_empty: false,
            skip_rows: 0,
            skip_lines: 0,
            max_rows: None,
            strict_column_handling: false,
            discard_unmapped_columns: false,
            trim: false,
            ltrim: false,
            rtrim: false,
            max_row_bytes: None,
            strip_bom: true,
        }
    }
}

impl ParserOptions {
    /// Validates the options and resolves them into a [`Dialect`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for ambiguous or contradictory settings.
    pub fn compile(&self) -> Result<Dialect, ConfigError> {
        let mut delimiters = match &self.delimiter {
            Delimiter::Single(c) => vec![c.to_string()],
            Delimiter::Any(candidates) => candidates.clone(),
        };
        if delimiters.is_empty() || delimiters.iter().any(String::is_empty) {
            return Err(ConfigError::EmptyDelimiter);
        }
        delimiters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        delimiters.dedup();

        if self.escape.is_some() && self.quote.is_none() {
            return Err(ConfigError::EscapeWithoutQuote);
        }
        let escape = self.escape.or(self.quote);
        if let Some(comment) = self.comment {
            if Some(comment) == self.quote || Some(comment) == escape {
                return Err(ConfigError::CommentOverlap);
            }
        }

        let reserved =
            |c: char| Some(c) == self.quote || Some(c) == escape || Some(c) == self.comment;

        if let Some(row) = &self.row_delimiter {
            if row.is_empty() {
                return Err(ConfigError::EmptyRowDelimiter);
            }
            if row.chars().any(reserved) {
                return Err(ConfigError::ReservedInRowDelimiter(row.clone()));
            }
            if let Some(delimiter) = delimiters
                .iter()
                .find(|d| d.starts_with(row.as_str()) || row.starts_with(d.as_str()))
            {
                return Err(ConfigError::RowDelimiterOverlap {
                    row: row.clone(),
                    delimiter: delimiter.clone(),
                });
            }
        }

        let breaks_row = |c: char| self.row_delimiter.is_none() && matches!(c, '\r' | '\n');
        if let Some(bad) = delimiters
            .iter()
            .find(|d| d.chars().any(|c| reserved(c) || breaks_row(c)))
        {
            return Err(ConfigError::ReservedInDelimiter(bad.clone()));
        }

        let rename = match &self.headers {
            HeaderMode::Explicit(_) => self.rename_headers,
            _ if self.rename_headers => return Err(ConfigError::RenameWithoutHeaders),
            _ => false,
        };

        let mut specials: Vec<char> = delimiters.iter().filter_map(|d| d.chars().next()).collect();
        specials.extend([self.quote, escape, self.comment].into_iter().flatten());
        match &self.row_delimiter {
            Some(row) => specials.extend(row.chars().next()),
            None => specials.extend(['\r', '\n']),
        }
        specials.sort_unstable();
        specials.dedup();

        Ok(Dialect {
            delimiters,
            quote: self.quote,
            escape,
            comment: self.comment,
            row_delimiter: self.row_delimiter.clone(),
            specials,
            ltrim: self.trim || self.ltrim,
            rtrim: self.trim || self.rtrim,
            rename_headers: rename,
        })
    }
}

/// The validated, immutable form of [`ParserOptions`] used to classify
/// tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    delimiters: Vec<String>,
    quote: Option<char>,
    escape: Option<char>,
    comment: Option<char>,
    row_delimiter: Option<String>,
    specials: Vec<char>,
    ltrim: bool,
    rtrim: bool,
    rename_headers: bool,
}

impl Dialect {
    /// Delimiter candidates, longest first.
    #[must_use]
    pub fn delimiters(&self) -> &[String] {
        &self.delimiters
    }

    #[must_use]
    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    /// The effective escape character: the configured one, or the quote.
    #[must_use]
    pub fn escape(&self) -> Option<char> {
        self.escape
    }

    #[must_use]
    pub fn comment(&self) -> Option<char> {
        self.comment
    }

    #[must_use]
    pub fn row_delimiter(&self) -> Option<&str> {
        self.row_delimiter.as_deref()
    }

    /// `true` if `c` may start a token other than plain content.
    #[must_use]
    pub fn is_special(&self, c: char) -> bool {
        self.specials.binary_search(&c).is_ok()
    }

    /// Space or tab that is not claimed by the dialect.
    #[must_use]
    pub fn is_blank(&self, c: char) -> bool {
        matches!(c, ' ' | '\t') && !self.is_special(c)
    }

    pub(crate) fn rename_headers(&self) -> bool {
        self.rename_headers
    }

    pub(crate) fn trim<'a>(&self, s: &'a str) -> &'a str {
        let s = if self.ltrim { s.trim_start() } else { s };
        if self.rtrim { s.trim_end() } else { s }
    }
}
