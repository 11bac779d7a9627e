//! Row assembly: fields separated by delimiters up to a row delimiter.

use crate::{
    column::{Field, FieldState, Step, SyntaxFault},
    options::Dialect,
    scanner::{Peeked, Scanner},
    token::Span,
};

/// Raw field values of one row.
///
/// `span` covers the row's text without its row delimiter. `end` is where
/// the next row starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawRow {
    pub(crate) fields: Vec<String>,
    pub(crate) span: Span,
    pub(crate) end: usize,
}

impl RawRow {
    /// Every field is empty or whitespace.
    pub(crate) fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.trim().is_empty())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RowOutcome {
    Row(RawRow),
    /// A comment line ending at `end`.
    Comment { end: usize },
    EndOfInput,
}

/// Reads the row at the scanner cursor without committing it.
///
/// A row cut off by the end of the buffered input is kept half read: the
/// fields finished so far and the progress of the current one. The next call
/// resumes at the token that could not be read, so a row fed in many small
/// chunks is still scanned once.
#[derive(Debug, Default)]
pub(crate) struct RowReader {
    progress: Option<Progress>,
}

#[derive(Debug)]
enum Progress {
    /// Inside a comment line, read up to `pos`.
    Comment { pos: usize },
    Row {
        start: usize,
        fields: Vec<String>,
        at: At,
    },
}

#[derive(Debug)]
enum At {
    Field(FieldState),
    /// The last field ended at this position; a terminator follows.
    FieldEnd(usize),
}

impl RowReader {
    /// Whether a comment line is being read.
    pub(crate) fn in_comment(&self) -> bool {
        matches!(self.progress, Some(Progress::Comment { .. }))
    }

    /// Forgets a half-read row, for when the buffer is dropped.
    pub(crate) fn reset(&mut self) {
        self.progress = None;
    }

    pub(crate) fn next_row(
        &mut self,
        scanner: &Scanner,
        dialect: &Dialect,
    ) -> Result<Step<RowOutcome>, SyntaxFault> {
        let progress = match &mut self.progress {
            Some(progress) => progress,
            None => {
                let start = scanner.cursor();
                let progress = match scanner.peek_at(start, dialect) {
                    Peeked::NeedMore => return Ok(Step::NeedMore),
                    Peeked::EndOfInput => return Ok(Step::Done(RowOutcome::EndOfInput)),
                    Peeked::Token(token) if token.is_comment(dialect) => Progress::Comment {
                        pos: token.end_cursor(),
                    },
                    Peeked::Token(_) => Progress::Row {
                        start,
                        fields: Vec::new(),
                        at: At::Field(FieldState::new(start)),
                    },
                };
                self.progress.insert(progress)
            }
        };

        let outcome = match progress {
            Progress::Comment { pos } => Ok(skip_comment(scanner, dialect, pos)),
            Progress::Row { start, fields, at } => {
                read_fields(scanner, dialect, *start, fields, at)
            }
        };
        if !matches!(outcome, Ok(Step::NeedMore)) {
            self.progress = None;
        }
        outcome
    }
}

fn read_fields(
    scanner: &Scanner,
    dialect: &Dialect,
    start: usize,
    fields: &mut Vec<String>,
    at: &mut At,
) -> Result<Step<RowOutcome>, SyntaxFault> {
    loop {
        let end = match at {
            At::Field(field) => match field.advance(scanner, dialect)? {
                Step::NeedMore => return Ok(Step::NeedMore),
                Step::Done(Field { value, end }) => {
                    fields.push(value);
                    *at = At::FieldEnd(end);
                    end
                }
            },
            At::FieldEnd(end) => *end,
        };

        let next = match scanner.peek_at(end, dialect) {
            Peeked::Token(token) if token.is_delimiter(dialect) => {
                *at = At::Field(FieldState::new(token.end_cursor()));
                continue;
            }
            Peeked::Token(token) => token.end_cursor(),
            Peeked::EndOfInput => end,
            Peeked::NeedMore => return Ok(Step::NeedMore),
        };
        return Ok(Step::Done(RowOutcome::Row(RawRow {
            fields: core::mem::take(fields),
            span: Span::new(start, end),
            end: next,
        })));
    }
}

fn skip_comment(scanner: &Scanner, dialect: &Dialect, pos: &mut usize) -> Step<RowOutcome> {
    loop {
        match scanner.peek_at(*pos, dialect) {
            Peeked::NeedMore => return Step::NeedMore,
            Peeked::EndOfInput => return Step::Done(RowOutcome::Comment { end: *pos }),
            Peeked::Token(token) if token.is_row_delimiter(dialect) => {
                return Step::Done(RowOutcome::Comment {
                    end: token.end_cursor(),
                });
            }
            Peeked::Token(token) => *pos = token.end_cursor(),
        }
    }
}
