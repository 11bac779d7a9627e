use quickcheck::{Arbitrary, Gen};

use crate::{CsvParser, ParseEvent, ParserError, ParserOptions, Row};

/// Feeds `chunks` one after another and collects every event, stopping at
/// the first error.
pub fn parse_chunks<S: AsRef<str>>(
    options: ParserOptions,
    chunks: &[S],
) -> Result<Vec<ParseEvent>, ParserError> {
    let mut parser = CsvParser::new(options).expect("valid options");
    let mut events = Vec::new();
    for chunk in chunks {
        for event in parser.feed(chunk.as_ref()) {
            events.push(event?);
        }
    }
    for event in parser.finish() {
        events.push(event?);
    }
    Ok(events)
}

pub fn parse_whole(options: ParserOptions, input: &str) -> Result<Vec<ParseEvent>, ParserError> {
    parse_chunks(options, &[input])
}

pub fn rows(events: &[ParseEvent]) -> Vec<Row> {
    events
        .iter()
        .filter_map(|event| match event {
            ParseEvent::Row(record) => Some(record.row.clone()),
            _ => None,
        })
        .collect()
}

pub fn fields(events: &[ParseEvent]) -> Vec<Vec<String>> {
    rows(events).into_iter().map(Row::into_fields).collect()
}

/// Cuts `text` into char-aligned chunks whose sizes are derived from
/// `splits`.
pub fn split_at_points(text: &str, splits: &[usize]) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut idx = 0;
    for s in splits {
        let remaining = chars.len() - idx;
        if remaining == 0 {
            break;
        }
        let end = idx + 1 + (s % remaining);
        chunks.push(chars[idx..end].iter().collect());
        idx = end;
    }
    if idx < chars.len() {
        chunks.push(chars[idx..].iter().collect());
    }
    chunks
}

pub fn quickcheck_tests() -> u64 {
    if cfg!(feature = "test-fast") {
        return 50;
    }
    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;
    tests
}

/// A field drawn from an alphabet rich in characters the parser treats
/// specially.
#[derive(Debug, Clone)]
pub struct Field(pub String);

impl Arbitrary for Field {
    fn arbitrary(g: &mut Gen) -> Self {
        const ALPHABET: &[char] = &[
            'a', 'b', 'z', '0', ' ', '\t', ',', ';', ':', '"', '\\', '#', '\r', '\n', 'é', '€',
            '𝄞',
        ];
        let len = usize::arbitrary(g) % 8;
        Field(
            (0..len)
                .map(|_| *g.choose(ALPHABET).unwrap_or(&'a'))
                .collect(),
        )
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Field))
    }
}

/// A table with a fixed column count so it survives header mapping.
#[derive(Debug, Clone)]
pub struct Table(pub Vec<Vec<String>>);

impl Arbitrary for Table {
    fn arbitrary(g: &mut Gen) -> Self {
        let columns = 1 + usize::arbitrary(g) % 4;
        let rows = usize::arbitrary(g) % 6;
        Table(
            (0..rows)
                .map(|_| (0..columns).map(|_| Field::arbitrary(g).0).collect())
                .collect(),
        )
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let rows = self.0.clone();
        Box::new((0..rows.len()).map(move |skip| {
            Table(
                rows.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip)
                    .map(|(_, row)| row.clone())
                    .collect(),
            )
        }))
    }
}
