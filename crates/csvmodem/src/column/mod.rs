//! Field assembly.
//!
//! Both column readers look ahead through [`Scanner::peek_at`] and never
//! commit: the row reader commits once the whole row is known. A reader that
//! runs out of buffered input returns [`Step::NeedMore`] and keeps its
//! position and partial value, so the next feed resumes at the token that
//! could not be read yet.

mod non_quoted;
mod quoted;

use crate::{
    error::SyntaxError,
    options::Dialect,
    scanner::{Peeked, Scanner},
    token::Span,
};

/// Outcome of a parse step that may run out of buffered input.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step<T> {
    Done(T),
    NeedMore,
}

/// A parsed field value and the position of whatever follows it: a
/// delimiter, a row delimiter or the end of input.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Field {
    pub(crate) value: String,
    pub(crate) end: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SyntaxFault {
    pub(crate) error: SyntaxError,
    pub(crate) span: Span,
}

/// Progress through one field.
#[derive(Debug)]
pub(crate) enum FieldState {
    /// Looking for an opening quote past the blanks at `scan`.
    Start { start: usize, scan: usize },
    Unquoted(non_quoted::Progress),
    Quoted(quoted::Progress),
}

impl FieldState {
    pub(crate) fn new(start: usize) -> Self {
        FieldState::Start { start, scan: start }
    }

    /// Reads on from where the previous call stopped.
    ///
    /// Leading blanks before an opening quote are skipped. Anything else is
    /// an unquoted field, blanks included.
    pub(crate) fn advance(
        &mut self,
        scanner: &Scanner,
        dialect: &Dialect,
    ) -> Result<Step<Field>, SyntaxFault> {
        match self {
            FieldState::Start { start, scan } => {
                let start = *start;
                let Step::Done(open) = opening_quote(scanner, dialect, scan) else {
                    return Ok(Step::NeedMore);
                };
                *self = match open {
                    Some(quote) => FieldState::Quoted(quoted::Progress::new(quote)),
                    None => FieldState::Unquoted(non_quoted::Progress::new(start)),
                };
                self.advance(scanner, dialect)
            }
            FieldState::Unquoted(progress) => Ok(progress.advance(scanner, dialect)),
            FieldState::Quoted(progress) => progress.advance(scanner, dialect),
        }
    }
}

/// Span of the opening quote after the blanks at `scan`, or `None` for an
/// unquoted field.
fn opening_quote(scanner: &Scanner, dialect: &Dialect, scan: &mut usize) -> Step<Option<Span>> {
    if dialect.quote().is_none() {
        return Step::Done(None);
    }
    *scan = skip_blanks(scanner, dialect, *scan);
    match scanner.peek_at(*scan, dialect) {
        Peeked::NeedMore => Step::NeedMore,
        Peeked::Token(token) if token.is_quote(dialect) => Step::Done(Some(token.span())),
        Peeked::Token(_) | Peeked::EndOfInput => Step::Done(None),
    }
}

pub(crate) fn skip_blanks(scanner: &Scanner, dialect: &Dialect, start: usize) -> usize {
    let rest = scanner.rest_at(start);
    let blank: usize = rest
        .chars()
        .take_while(|&c| dialect.is_blank(c))
        .map(char::len_utf8)
        .sum();
    start + blank
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParserOptions;

    fn column(
        input: &str,
        options: ParserOptions,
        closed: bool,
    ) -> Result<Step<Field>, SyntaxFault> {
        let dialect = options.compile().unwrap();
        let mut scanner = Scanner::new();
        scanner.feed(input);
        if closed {
            scanner.close();
        }
        FieldState::new(0).advance(&scanner, &dialect)
    }

    fn done(value: &str, end: usize) -> Result<Step<Field>, SyntaxFault> {
        Ok(Step::Done(Field {
            value: value.to_string(),
            end,
        }))
    }

    #[test]
    fn unquoted_stops_at_delimiter() {
        assert_eq!(column("abc,def", ParserOptions::default(), false), done("abc", 3));
    }

    #[test]
    fn unquoted_keeps_inner_quotes() {
        assert_eq!(column("a\"b\"c\n", ParserOptions::default(), false), done("a\"b\"c", 5));
    }

    #[test]
    fn unquoted_at_open_tail_needs_more() {
        assert_eq!(column("abc", ParserOptions::default(), false), Ok(Step::NeedMore));
        assert_eq!(column("abc", ParserOptions::default(), true), done("abc", 3));
    }

    #[test]
    fn trim_applies_to_unquoted() {
        let options = ParserOptions {
            trim: true,
            ..Default::default()
        };
        assert_eq!(column("  a b  ,", options, false), done("a b", 7));
    }

    #[test]
    fn blanks_before_quote_are_skipped() {
        assert_eq!(column("  \"a,b\"  ,", ParserOptions::default(), false), done("a,b", 9));
    }

    #[test]
    fn only_blanks_at_open_tail_needs_more() {
        assert_eq!(column("   ", ParserOptions::default(), false), Ok(Step::NeedMore));
        assert_eq!(column("   ", ParserOptions::default(), true), done("   ", 3));
    }

    #[test]
    fn quoting_disabled() {
        let options = ParserOptions {
            quote: None,
            ..Default::default()
        };
        assert_eq!(column("\"a,b\"", options, true), done("\"a", 2));
    }

    #[test]
    fn blanks_split_before_a_quote_resume() {
        let dialect = ParserOptions::default().compile().unwrap();
        let mut scanner = Scanner::new();
        let mut field = FieldState::new(0);
        scanner.feed("  ");
        assert_eq!(field.advance(&scanner, &dialect), Ok(Step::NeedMore));
        scanner.feed(" \"x\",");
        assert_eq!(field.advance(&scanner, &dialect), done("x", 6));
    }
}
