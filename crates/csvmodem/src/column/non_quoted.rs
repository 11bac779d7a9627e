use super::{Field, Step};
use crate::{
    options::Dialect,
    scanner::{Peeked, Scanner},
};

/// An unquoted field that started at `start` and has been read up to `pos`.
#[derive(Debug)]
pub(crate) struct Progress {
    start: usize,
    pos: usize,
}

impl Progress {
    pub(super) fn new(start: usize) -> Self {
        Self { start, pos: start }
    }

    /// Reads tokens up to the next delimiter, row delimiter or end of input.
    ///
    /// The field text is the contiguous slice of input, so any token
    /// boundaries in between leave no trace in the value.
    pub(super) fn advance(&mut self, scanner: &Scanner, dialect: &Dialect) -> Step<Field> {
        loop {
            match scanner.peek_at(self.pos, dialect) {
                Peeked::NeedMore => return Step::NeedMore,
                Peeked::EndOfInput => break,
                Peeked::Token(token) if token.is_terminator(dialect) => break,
                Peeked::Token(token) => self.pos = token.end_cursor(),
            }
        }
        Step::Done(Field {
            value: dialect.trim(scanner.slice(self.start, self.pos)).to_owned(),
            end: self.pos,
        })
    }
}
