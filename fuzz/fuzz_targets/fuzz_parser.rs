#![no_main]

use arbitrary::Arbitrary;
use csvmodem::{CsvParser, Delimiter, HeaderMode, ParseEvent, ParserError, ParserOptions};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    text: String,
    splits: Vec<u16>,
    dialect: u8,
    strict: bool,
}

fn options(input: &Input) -> ParserOptions {
    let mut options = match input.dialect % 4 {
        0 => ParserOptions::default(),
        1 => ParserOptions {
            headers: HeaderMode::FirstRow,
            ignore_empty: true,
            ..Default::default()
        },
        2 => ParserOptions {
            delimiter: Delimiter::Any(vec![",".into(), ",,".into(), "ab".into()]),
            escape: Some('\\'),
            comment: Some('#'),
            trim: true,
            ..Default::default()
        },
        _ => ParserOptions {
            row_delimiter: Some("\r\n\r\n".into()),
            skip_rows: 1,
            ..Default::default()
        },
    };
    options.strict_column_handling = input.strict;
    options
}

fn drain(
    events: impl Iterator<Item = Result<ParseEvent, ParserError>>,
    out: &mut (Vec<ParseEvent>, Option<String>),
) {
    for event in events {
        match event {
            Ok(event) => out.0.push(event),
            Err(err) => out.1 = Some(err.to_string()),
        }
    }
}

fn run(options: ParserOptions, chunks: &[&[u8]]) -> (Vec<ParseEvent>, Option<String>) {
    let Ok(mut parser) = CsvParser::new(options) else {
        return (Vec::new(), None);
    };
    let mut out = (Vec::new(), None);
    for chunk in chunks {
        drain(parser.feed_bytes(chunk), &mut out);
    }
    drain(parser.finish(), &mut out);
    out
}

fuzz_target!(|input: Input| {
    let bytes = input.text.as_bytes();
    let mut chunks: Vec<&[u8]> = Vec::new();
    let mut idx = 0;
    for split in &input.splits {
        if idx == bytes.len() {
            break;
        }
        let end = idx + 1 + usize::from(*split) % (bytes.len() - idx);
        chunks.push(&bytes[idx..end]);
        idx = end;
    }
    chunks.push(&bytes[idx..]);

    let whole = run(options(&input), &[bytes]);
    let split = run(options(&input), &chunks);
    assert_eq!(whole, split, "chunking changed the result for {input:?}");
});
