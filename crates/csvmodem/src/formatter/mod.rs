//! Row formatter: the inverse of the parser.
//!
//! Each call to [`CsvFormatter::format`] returns the next chunk of CSV text.
//! Rows are separated by the row delimiter, written in front of every row
//! after the first, so a stream of chunks concatenates into a valid file.

#![allow(clippy::struct_excessive_bools)]

use crate::{error::FormatError, event::Row};

const BOM: char = '\u{FEFF}';

/// Configuration options for [`CsvFormatter`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatterOptions {
    /// Written between fields. May be longer than one character.
    pub delimiter: String,
    pub quote: char,
    /// Escapes quote characters inside quoted fields. `None` doubles them.
    pub escape: Option<char>,
    /// Written between rows.
    pub row_delimiter: String,
    /// Quote every data field.
    pub always_quote: bool,
    /// Quote every header field.
    pub quote_headers: bool,
    /// Column names. Taken from the first map row when not given.
    pub headers: Option<Vec<String>>,
    /// Write the header row, once, before the first data row.
    pub write_headers: bool,
    /// Terminate the last row with the row delimiter.
    pub include_end_row_delimiter: bool,
    /// Start the output with U+FEFF.
    pub write_bom: bool,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".to_owned(),
            quote: '"',
            escape: None,
            row_delimiter: "\n".to_owned(),
            always_quote: false,
            quote_headers: false,
            headers: None,
            write_headers: true,
            include_end_row_delimiter: false,
            write_bom: false,
        }
    }
}

/// Writes rows as CSV text.
///
/// # Examples
///
/// ```rust
/// use csvmodem::{CsvFormatter, FormatterOptions, row};
///
/// let mut formatter = CsvFormatter::new(FormatterOptions::default());
/// let mut out = formatter.format(&row! { "name" => "Smith, J", "note" => "said \"hi\"" })?;
/// out.push_str(&formatter.format(&row! { "name" => "Doe" })?);
/// out.push_str(&formatter.finish());
/// assert_eq!(out, "name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\nDoe,");
/// # Ok::<(), csvmodem::FormatError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    options: FormatterOptions,
    headers: Option<Vec<String>>,
    headers_written: bool,
    /// Whether any line has been written.
    started: bool,
}

impl CsvFormatter {
    /// Creates a formatter that has written nothing yet.
    #[must_use]
    pub fn new(mut options: FormatterOptions) -> Self {
        let headers = options.headers.take();
        Self {
            options,
            headers,
            headers_written: false,
            started: false,
        }
    }

    /// Formats one row, preceded by the header row the first time headers
    /// are known.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::ColumnCount`] when a field row does not match
    /// the number of headers.
    pub fn format(&mut self, row: &Row) -> Result<String, FormatError> {
        if let (None, Row::Map(map)) = (&self.headers, row) {
            self.headers = Some(map.keys().cloned().collect());
        }
        let values: Vec<&str> = match (row, &self.headers) {
            (Row::Map(map), Some(headers)) => headers
                .iter()
                .map(|name| map.get(name).map_or("", String::as_str))
                .collect(),
            (Row::Fields(fields), Some(headers)) if fields.len() != headers.len() => {
                return Err(FormatError::ColumnCount {
                    expected: headers.len(),
                    actual: fields.len(),
                });
            }
            _ => row.values().collect(),
        };

        let mut out = String::new();
        self.write_headers(&mut out);
        self.begin_line(&mut out);
        self.write_line(&mut out, &values, self.options.always_quote);
        Ok(out)
    }

    /// Returns the trailing text: the header row when no row was formatted,
    /// and the final row delimiter if requested.
    #[must_use]
    pub fn finish(mut self) -> String {
        let mut out = String::new();
        self.write_headers(&mut out);
        if self.started && self.options.include_end_row_delimiter {
            out.push_str(&self.options.row_delimiter);
        }
        out
    }

    fn write_headers(&mut self, out: &mut String) {
        if self.headers_written || !self.options.write_headers {
            return;
        }
        let Some(headers) = self.headers.take() else {
            return;
        };
        self.headers_written = true;
        let names: Vec<&str> = headers.iter().map(String::as_str).collect();
        self.begin_line(out);
        self.write_line(out, &names, self.options.quote_headers);
        self.headers = Some(headers);
    }

    fn begin_line(&mut self, out: &mut String) {
        if self.started {
            out.push_str(&self.options.row_delimiter);
        } else if self.options.write_bom {
            out.push(BOM);
        }
        self.started = true;
    }

    fn write_line(&self, out: &mut String, fields: &[&str], force_quotes: bool) {
        // A lone empty field would otherwise read back as a blank line.
        let lone_empty = matches!(fields, [""]);
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push_str(&self.options.delimiter);
            }
            if force_quotes || lone_empty || self.needs_quoting(field) {
                self.write_quoted(out, field);
            } else {
                out.push_str(field);
            }
        }
    }

    fn write_quoted(&self, out: &mut String, field: &str) {
        let quote = self.options.quote;
        let escape = self.options.escape.unwrap_or(quote);
        out.push(quote);
        for c in field.chars() {
            if c == quote || c == escape {
                out.push(escape);
            }
            out.push(c);
        }
        out.push(quote);
    }

    fn needs_quoting(&self, field: &str) -> bool {
        let options = &self.options;
        field.chars().any(|c| {
            c == options.quote
                || options.escape == Some(c)
                || c == '\r'
                || c == '\n'
                || options.delimiter.contains(c)
                || options.row_delimiter.contains(c)
        })
    }
}
