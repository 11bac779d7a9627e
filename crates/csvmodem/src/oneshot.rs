//! Whole-input helpers over [`CsvParser`].

use crate::{
    error::CsvError,
    event::{ParseEvent, Row},
    options::ParserOptions,
    parser::CsvParser,
};

/// Parses a complete input and collects every event.
///
/// # Errors
///
/// Returns the configuration error or the first fatal parse error.
///
/// # Examples
///
/// ```rust
/// use csvmodem::{ParseEvent, ParserOptions, parse_str};
///
/// let events = parse_str(ParserOptions::default(), "a,b\nc,d\n").unwrap();
/// assert_eq!(events.len(), 3);
/// assert_eq!(events[2], ParseEvent::End { row_count: 2 });
/// ```
pub fn parse_str(options: ParserOptions, input: &str) -> Result<Vec<ParseEvent>, CsvError> {
    let mut parser = CsvParser::new(options)?;
    let mut events = parser.feed(input).collect::<Result<Vec<_>, _>>()?;
    for event in parser.finish() {
        events.push(event?);
    }
    Ok(events)
}

/// Parses a complete input and keeps only the emitted rows.
///
/// # Errors
///
/// Same as [`parse_str`].
pub fn parse_rows(options: ParserOptions, input: &str) -> Result<Vec<Row>, CsvError> {
    let rows = parse_str(options, input)?
        .into_iter()
        .filter_map(|event| match event {
            ParseEvent::Row(record) => Some(record.row),
            _ => None,
        })
        .collect();
    Ok(rows)
}
