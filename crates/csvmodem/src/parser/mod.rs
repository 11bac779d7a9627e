//! CSV streaming parser.
//!
//! Overview
//! - [`CsvParser`] owns a [`Scanner`] and pulls whole rows out of it. The
//!   cursor only moves once a row is complete. A row cut off by a chunk
//!   boundary stays half read in the row reader, which picks up at the
//!   blocked token after the next feed.
//! - Every completed row passes through fixed stages, in order: comment
//!   lines, `ignore_empty`, `skip_lines`, header resolution, `skip_rows`,
//!   header mapping, validation, transformation and emission.
//!
//! States
//! - `AwaitingHeaders`: the next surviving row names the columns.
//! - `Streaming`: rows are emitted.
//! - `Finished`: input is exhausted, `max_rows` was reached or the parser was
//!   cancelled. `End` is reported once, unless cancelled.
//! - `Failed`: a fatal error was returned. Nothing follows.
//!
//! Backpressure
//! - Parsing is lazy. [`CsvParser::feed`] only buffers; rows are parsed as the
//!   returned [`Events`] iterator is pulled. Unpulled input stays buffered.
//!
//! The asynchronous driver in `stream` reuses `CsvParser::next_staged` and
//! runs its callbacks between staging a row and emitting it.

use tracing::{debug, trace, warn};

use crate::{
    column::{Step, SyntaxFault},
    error::{CallbackError, ConfigError, ErrorSource, ParserError},
    event::{ParseEvent, Record, Row, ValidationFailure},
    headers::{HeaderState, Headers},
    hooks::{Applied, Hooks, Stage, Verdict},
    options::{Dialect, HeaderMode, ParserOptions},
    row::{RowOutcome, RowReader},
    scanner::Scanner,
    token::Span,
};

const BOM: char = '\u{FEFF}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingHeaders,
    Streaming,
    Finished,
    Failed,
}

/// What [`CsvParser::next_staged`] produced.
#[derive(Debug)]
pub(crate) enum Staged {
    /// Ready to emit as is.
    Event(ParseEvent),
    /// A shaped row that still has to pass validation and transformation.
    Candidate(Record),
    /// The buffered input ends inside a row.
    NeedMore,
    /// Nothing will ever be produced again.
    Done,
}

/// The streaming CSV parser.
///
/// Feed it text or bytes in chunks of any size and pull [`ParseEvent`]s from
/// the iterator each feed returns, or from the parser itself.
///
/// # Examples
///
/// ```rust
/// use csvmodem::{CsvParser, ParseEvent, ParserOptions, Row};
///
/// let mut parser = CsvParser::builder(ParserOptions::default())
///     .validate(|row| row.field(0) != Some("skip"))
///     .transform(|row| Row::Fields(row.values().map(str::to_uppercase).collect()))
///     .build()
///     .unwrap();
///
/// let events: Vec<_> = parser.feed("a,b\nskip,c\nd,e\n").collect();
/// assert_eq!(events.len(), 3);
/// assert!(matches!(&events[1], Ok(ParseEvent::Invalid(_))));
/// ```
#[derive(Debug)]
pub struct CsvParser {
    scanner: Scanner,
    reader: RowReader,
    dialect: Dialect,
    options: ParserOptions,
    state: State,
    headers: HeaderState,
    /// Header names waiting to be emitted.
    announce: Option<Vec<String>>,
    bom_resolved: bool,
    /// Non-comment rows read so far, for error positions.
    rows_seen: usize,
    lines_skipped: usize,
    rows_skipped: usize,
    /// Rows offered to validation.
    candidates: usize,
    row_count: usize,
    end_reported: bool,
    hooks: Hooks,
}

/// Builder that attaches callbacks to a [`CsvParser`].
#[derive(Debug)]
#[must_use]
pub struct CsvParserBuilder {
    options: ParserOptions,
    hooks: Hooks,
}

impl CsvParserBuilder {
    /// Drops rows for which `f` returns `false` or [`Verdict::Invalid`].
    pub fn validate<F, V>(mut self, mut f: F) -> Self
    where
        F: FnMut(&Row) -> V + Send + 'static,
        V: Into<Verdict>,
    {
        self.hooks.validate = Some(Box::new(move |row: &Row| -> Result<Verdict, CallbackError> {
            Ok(f(row).into())
        }));
        self
    }

    /// Like [`validate`](Self::validate), but an `Err` ends the parse.
    pub fn try_validate<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Row) -> Result<Verdict, CallbackError> + Send + 'static,
    {
        self.hooks.validate = Some(Box::new(f));
        self
    }

    /// Replaces each valid row before it is emitted.
    pub fn transform<F>(mut self, mut f: F) -> Self
    where
        F: FnMut(Row) -> Row + Send + 'static,
    {
        self.hooks.transform = Some(Box::new(move |row: Row| -> Result<Row, CallbackError> {
            Ok(f(row))
        }));
        self
    }

    /// Like [`transform`](Self::transform), but an `Err` ends the parse.
    pub fn try_transform<F>(mut self, f: F) -> Self
    where
        F: FnMut(Row) -> Result<Row, CallbackError> + Send + 'static,
    {
        self.hooks.transform = Some(Box::new(f));
        self
    }

    /// Derives column names from the first row. Returning `None` for a
    /// position drops that column.
    ///
    /// Turns on [`HeaderMode::FirstRow`] if headers were disabled. Ignored
    /// with explicit headers.
    pub fn header_transform<F>(mut self, f: F) -> Self
    where
        F: FnMut(Vec<String>) -> Vec<Option<String>> + Send + 'static,
    {
        if self.options.headers == HeaderMode::Disabled {
            self.options.headers = HeaderMode::FirstRow;
        }
        self.hooks.headers = Some(Box::new(f));
        self
    }

    /// Validates the options and creates the parser.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid options.
    pub fn build(self) -> Result<CsvParser, ConfigError> {
        let dialect = self.options.compile()?;
        let strict = self.options.strict_column_handling;
        let mut state = State::Streaming;
        let mut announce = None;
        let headers = match &self.options.headers {
            HeaderMode::Disabled => HeaderState::Disabled,
            HeaderMode::FirstRow => {
                state = State::AwaitingHeaders;
                HeaderState::Pending { replacement: None }
            }
            HeaderMode::Explicit(columns) => {
                let resolved = Headers::new(columns.clone(), strict)?;
                if dialect.rename_headers() {
                    state = State::AwaitingHeaders;
                    HeaderState::Pending {
                        replacement: Some(columns.clone()),
                    }
                } else {
                    announce = Some(resolved.names());
                    HeaderState::Resolved(resolved)
                }
            }
        };

        Ok(CsvParser {
            scanner: Scanner::new(),
            reader: RowReader::default(),
            dialect,
            options: self.options,
            state,
            headers,
            announce,
            bom_resolved: false,
            rows_seen: 0,
            lines_skipped: 0,
            rows_skipped: 0,
            candidates: 0,
            row_count: 0,
            end_reported: false,
            hooks: self.hooks,
        })
    }
}

impl CsvParser {
    /// Creates a parser without callbacks.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid options.
    pub fn new(options: ParserOptions) -> Result<Self, ConfigError> {
        Self::builder(options).build()
    }

    /// Starts a parser with callbacks.
    pub fn builder(options: ParserOptions) -> CsvParserBuilder {
        CsvParserBuilder {
            options,
            hooks: Hooks::default(),
        }
    }

    /// Buffers a chunk of text and returns an iterator over the events that
    /// became available.
    ///
    /// Input fed after the parser has finished or failed is ignored.
    pub fn feed(&mut self, text: &str) -> Events<'_> {
        if self.accepts_input() {
            self.scanner.feed(text);
        }
        Events { parser: self }
    }

    /// Buffers a chunk of UTF-8 bytes. A multi-byte character split across
    /// chunks is reassembled; invalid bytes become U+FFFD.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Events<'_> {
        self.push_bytes(bytes);
        Events { parser: self }
    }

    /// Closes the input and returns an iterator over the remaining events,
    /// ending with [`ParseEvent::End`].
    pub fn finish(mut self) -> ClosedCsvParser {
        self.close_input();
        ClosedCsvParser { parser: self }
    }

    /// Stops parsing and drops buffered input. No callbacks run afterwards
    /// and no `End` event is reported.
    pub fn cancel(&mut self) {
        debug!(row_count = self.row_count, "parser cancelled");
        self.state = State::Finished;
        self.end_reported = true;
        self.announce = None;
        self.drop_input();
    }

    /// Rows emitted so far.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    fn accepts_input(&self) -> bool {
        matches!(self.state, State::AwaitingHeaders | State::Streaming)
    }

    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
        if self.accepts_input() {
            self.scanner.feed_bytes(bytes);
        }
    }

    pub(crate) fn close_input(&mut self) {
        self.scanner.close();
    }

    fn next_event(&mut self) -> Option<Result<ParseEvent, ParserError>> {
        match self.next_staged() {
            Ok(Staged::Event(event)) => Some(Ok(event)),
            Ok(Staged::Candidate(record)) => Some(self.process(record)),
            Ok(Staged::NeedMore | Staged::Done) => None,
            Err(err) => Some(Err(err)),
        }
    }

    /// Advances to the next row that needs callbacks, or the next event that
    /// needs none.
    pub(crate) fn next_staged(&mut self) -> Result<Staged, ParserError> {
        loop {
            if let Some(names) = self.announce.take() {
                return Ok(Staged::Event(ParseEvent::Headers { names }));
            }
            match self.state {
                State::Failed => return Ok(Staged::Done),
                State::Finished => return Ok(self.report_end()),
                State::AwaitingHeaders | State::Streaming => {}
            }
            if self.options.max_rows.is_some_and(|max| self.row_count >= max) {
                debug!(row_count = self.row_count, "row limit reached");
                self.state = State::Finished;
                self.drop_input();
                continue;
            }
            if !self.bom_resolved && !self.resolve_bom() {
                return Ok(Staged::NeedMore);
            }

            let raw = match self.reader.next_row(&self.scanner, &self.dialect) {
                Ok(Step::Done(RowOutcome::Row(raw))) => raw,
                Ok(Step::Done(RowOutcome::Comment { end })) => {
                    trace!(end, "comment skipped");
                    self.scanner.commit(end);
                    continue;
                }
                Ok(Step::Done(RowOutcome::EndOfInput)) => {
                    self.state = State::Finished;
                    continue;
                }
                Ok(Step::NeedMore) => {
                    if !self.reader.in_comment() {
                        let span = Span::new(self.scanner.cursor(), self.scanner.buffered_end());
                        self.check_row_size(span.len(), span, self.rows_seen + 1)?;
                    }
                    trace!(pending = self.scanner.pending_len(), "row needs more input");
                    return Ok(Staged::NeedMore);
                }
                Err(SyntaxFault { error, span }) => {
                    return Err(self.fail(error.into(), span, self.rows_seen + 1));
                }
            };

            self.scanner.commit(raw.end);
            self.rows_seen += 1;
            self.check_row_size(raw.end - raw.span.start, raw.span, self.rows_seen)?;

            if self.options.ignore_empty && raw.is_blank() {
                debug!(row = self.rows_seen, "empty row ignored");
                continue;
            }
            if self.lines_skipped < self.options.skip_lines {
                self.lines_skipped += 1;
                debug!(row = self.rows_seen, "line skipped");
                continue;
            }
            if self.state == State::AwaitingHeaders {
                self.resolve_headers(raw.fields, raw.span)?;
                continue;
            }
            if self.rows_skipped < self.options.skip_rows {
                self.rows_skipped += 1;
                debug!(row = self.rows_seen, "row skipped");
                continue;
            }

            let row = match self.shape(raw.fields) {
                Ok(row) => row,
                Err(source) => return Err(self.fail(source, raw.span, self.rows_seen)),
            };
            self.candidates += 1;
            return Ok(Staged::Candidate(Record {
                row,
                span: raw.span,
                number: self.candidates,
            }));
        }
    }

    /// Runs the synchronous callbacks on a staged row.
    pub(crate) fn process(&mut self, record: Record) -> Result<ParseEvent, ParserError> {
        let Record { row, span, number } = record;
        match self.hooks.apply(row) {
            Ok(Applied::Accepted(row)) => Ok(self.accept(Record { row, span, number })),
            Ok(Applied::Rejected { row, reason }) => {
                Ok(self.reject(Record { row, span, number }, reason))
            }
            Err(Stage::Validate(err)) => Err(self.fail_callback(ErrorSource::Validate(err), span)),
            Err(Stage::Transform(err)) => {
                Err(self.fail_callback(ErrorSource::Transform(err), span))
            }
        }
    }

    /// Runs only the synchronous validator.
    #[cfg(feature = "async")]
    pub(crate) fn check(&mut self, record: &Record) -> Result<Verdict, ParserError> {
        match self.hooks.check(&record.row) {
            Ok(verdict) => Ok(verdict),
            Err(err) => Err(self.fail_callback(ErrorSource::Validate(err), record.span)),
        }
    }

    /// Runs only the synchronous transform.
    #[cfg(feature = "async")]
    pub(crate) fn reshape(&mut self, record: Record) -> Result<Record, ParserError> {
        let Record { row, span, number } = record;
        match self.hooks.reshape(row) {
            Ok(row) => Ok(Record { row, span, number }),
            Err(err) => Err(self.fail_callback(ErrorSource::Transform(err), span)),
        }
    }

    pub(crate) fn accept(&mut self, record: Record) -> ParseEvent {
        self.row_count += 1;
        trace!(number = record.number, span = %record.span, "row emitted");
        ParseEvent::Row(record)
    }

    pub(crate) fn reject(&mut self, record: Record, reason: Option<String>) -> ParseEvent {
        debug!(number = record.number, reason = ?reason, "row failed validation");
        ParseEvent::Invalid(ValidationFailure {
            row: record.row,
            span: record.span,
            number: record.number,
            reason,
        })
    }

    /// Fails because a callback on the most recently staged row failed.
    pub(crate) fn fail_callback(&mut self, source: ErrorSource, span: Span) -> ParserError {
        self.fail(source, span, self.rows_seen)
    }

    fn fail(&mut self, source: ErrorSource, span: Span, row: usize) -> ParserError {
        self.state = State::Failed;
        self.announce = None;
        self.drop_input();
        let err = ParserError::new(source, span, row);
        warn!(error = %err, "csv parse failed");
        err
    }

    fn report_end(&mut self) -> Staged {
        if self.end_reported {
            return Staged::Done;
        }
        self.end_reported = true;
        debug!(row_count = self.row_count, "parse finished");
        Staged::Event(ParseEvent::End {
            row_count: self.row_count,
        })
    }

    /// Returns `false` while it cannot yet tell whether input starts with a
    /// byte order mark.
    fn resolve_bom(&mut self) -> bool {
        if self.options.strip_bom {
            let cursor = self.scanner.cursor();
            let first = self.scanner.rest_at(cursor).chars().next();
            match first {
                None if !self.scanner.is_closed() => return false,
                Some(BOM) => self.scanner.commit(cursor + BOM.len_utf8()),
                _ => {}
            }
        }
        self.bom_resolved = true;
        true
    }

    fn drop_input(&mut self) {
        self.scanner.clear();
        self.reader.reset();
    }

    /// `actual` counts decoded bytes from the start of the row, row delimiter
    /// included, whether or not the row is complete yet.
    fn check_row_size(&mut self, actual: usize, span: Span, row: usize) -> Result<(), ParserError> {
        match self.options.max_row_bytes {
            Some(limit) if actual > limit => {
                Err(self.fail(ErrorSource::RowTooLarge { limit, actual }, span, row))
            }
            _ => Ok(()),
        }
    }

    fn resolve_headers(&mut self, fields: Vec<String>, span: Span) -> Result<(), ParserError> {
        let replacement = match &mut self.headers {
            HeaderState::Pending { replacement } => replacement.take(),
            HeaderState::Disabled | HeaderState::Resolved(_) => None,
        };
        let columns = match (replacement, self.hooks.headers.as_mut()) {
            (Some(columns), _) => columns,
            (None, Some(derive)) => derive(fields),
            (None, None) => fields.into_iter().map(Some).collect(),
        };
        let headers = match Headers::new(columns, self.options.strict_column_handling) {
            Ok(headers) => headers,
            Err(err) => return Err(self.fail(err.into(), span, self.rows_seen)),
        };
        let names = headers.names();
        debug!(?names, "headers resolved");
        self.announce = Some(names);
        self.headers = HeaderState::Resolved(headers);
        self.state = State::Streaming;
        Ok(())
    }

    fn shape(&self, fields: Vec<String>) -> Result<Row, ErrorSource> {
        match &self.headers {
            HeaderState::Resolved(headers) => headers
                .map_row(
                    fields,
                    self.options.strict_column_handling,
                    self.options.discard_unmapped_columns,
                )
                .map(Row::Map),
            HeaderState::Disabled | HeaderState::Pending { .. } => Ok(Row::Fields(fields)),
        }
    }
}

impl Iterator for CsvParser {
    type Item = Result<ParseEvent, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

/// Events available after a [`CsvParser::feed`].
///
/// Ends when the parser needs more input. Dropping it early leaves the
/// remaining rows buffered for the next pull.
#[derive(Debug)]
pub struct Events<'p> {
    parser: &'p mut CsvParser,
}

impl Iterator for Events<'_> {
    type Item = Result<ParseEvent, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.next_event()
    }
}

/// A [`CsvParser`] closed to further input.
///
/// Returned by [`CsvParser::finish`]. Yields the remaining events, ending
/// with [`ParseEvent::End`] unless an error occurs.
#[derive(Debug)]
pub struct ClosedCsvParser {
    parser: CsvParser,
}

impl ClosedCsvParser {
    /// Rows emitted so far.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.parser.row_count
    }
}

impl Iterator for ClosedCsvParser {
    type Item = Result<ParseEvent, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.next_event()
    }
}
