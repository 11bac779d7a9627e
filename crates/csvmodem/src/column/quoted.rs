use super::{Field, Step, SyntaxFault, skip_blanks};
use crate::{
    error::SyntaxError,
    options::Dialect,
    scanner::{Peeked, Scanner},
    token::Span,
};

/// A quoted field opened at `open`, with its unescaped value read up to
/// `pos`.
#[derive(Debug)]
pub(crate) struct Progress {
    open: usize,
    pos: usize,
    value: String,
    closed: bool,
}

impl Progress {
    pub(super) fn new(quote: Span) -> Self {
        Self {
            open: quote.start,
            pos: quote.end,
            value: String::new(),
            closed: false,
        }
    }

    /// Reads on until the field is closed and the next terminator is seen.
    ///
    /// - An escape character (when distinct from the quote) followed by a
    ///   quote or another escape yields the second character literally.
    /// - A quote followed by a quote yields one literal quote and the field
    ///   goes on.
    /// - Any other quote closes the field. Only blanks may follow before the
    ///   next delimiter, row delimiter or the end of input.
    pub(super) fn advance(
        &mut self,
        scanner: &Scanner,
        dialect: &Dialect,
    ) -> Result<Step<Field>, SyntaxFault> {
        if !self.closed {
            if let Step::NeedMore = self.read_inside(scanner, dialect)? {
                return Ok(Step::NeedMore);
            }
            self.closed = true;
        }

        self.pos = skip_blanks(scanner, dialect, self.pos);
        match scanner.peek_at(self.pos, dialect) {
            Peeked::NeedMore => Ok(Step::NeedMore),
            Peeked::EndOfInput => Ok(Step::Done(self.take_field())),
            Peeked::Token(token) if token.is_terminator(dialect) => {
                Ok(Step::Done(self.take_field()))
            }
            Peeked::Token(token) => {
                let found = token.content().chars().next().unwrap_or_default();
                Err(SyntaxFault {
                    error: SyntaxError::UnexpectedAfterQuote(found),
                    span: Span::new(self.pos, self.pos + found.len_utf8()),
                })
            }
        }
    }

    /// Consumes text up to and including the closing quote.
    fn read_inside(
        &mut self,
        scanner: &Scanner,
        dialect: &Dialect,
    ) -> Result<Step<()>, SyntaxFault> {
        let distinct_escape = dialect.escape() != dialect.quote();
        loop {
            let token = match scanner.peek_at(self.pos, dialect) {
                Peeked::NeedMore => return Ok(Step::NeedMore),
                Peeked::EndOfInput => {
                    return Err(SyntaxFault {
                        error: SyntaxError::UnterminatedQuote,
                        span: Span::new(self.open, self.pos),
                    });
                }
                Peeked::Token(token) => token,
            };

            let escapes = distinct_escape && token.is_escape(dialect);
            if escapes || token.is_quote(dialect) {
                // The pair is decided by the token after it, so a quote at the
                // buffered end is read again on the next call.
                match scanner.peek_at(token.end_cursor(), dialect) {
                    Peeked::NeedMore => return Ok(Step::NeedMore),
                    Peeked::Token(next)
                        if next.is_quote(dialect) || (escapes && next.is_escape(dialect)) =>
                    {
                        self.value.push_str(next.content());
                        self.pos = next.end_cursor();
                        continue;
                    }
                    _ if escapes => {}
                    _ => {
                        self.pos = token.end_cursor();
                        return Ok(Step::Done(()));
                    }
                }
            }

            self.value.push_str(token.content());
            self.pos = token.end_cursor();
        }
    }

    fn take_field(&mut self) -> Field {
        Field {
            value: core::mem::take(&mut self.value),
            end: self.pos,
        }
    }
}
