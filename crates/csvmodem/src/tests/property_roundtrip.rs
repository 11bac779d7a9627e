use quickcheck::QuickCheck;

use super::utils::{Table, fields, parse_whole, quickcheck_tests};
use crate::{CsvFormatter, Delimiter, FormatterOptions, ParserOptions, Row};

/// Matching formatter and parser settings.
fn dialects(selector: u8) -> (FormatterOptions, ParserOptions) {
    match selector % 3 {
        0 => (FormatterOptions::default(), ParserOptions::default()),
        1 => (
            FormatterOptions {
                delimiter: ";".into(),
                escape: Some('\\'),
                row_delimiter: "\r\n".into(),
                ..Default::default()
            },
            ParserOptions {
                delimiter: Delimiter::Single(';'),
                escape: Some('\\'),
                ..Default::default()
            },
        ),
        _ => (
            FormatterOptions {
                delimiter: "::".into(),
                row_delimiter: "|\n".into(),
                always_quote: true,
                ..Default::default()
            },
            ParserOptions {
                delimiter: Delimiter::from("::"),
                row_delimiter: Some("|\n".into()),
                ..Default::default()
            },
        ),
    }
}

fn format(options: FormatterOptions, rows: &[Vec<String>], end_delimiter: bool) -> String {
    let mut formatter = CsvFormatter::new(FormatterOptions {
        include_end_row_delimiter: end_delimiter,
        ..options
    });
    let mut out = String::new();
    for row in rows {
        out.push_str(&formatter.format(&Row::Fields(row.clone())).unwrap());
    }
    out.push_str(&formatter.finish());
    out
}

/// Property: formatted rows parse back to the same fields.
#[test]
fn format_then_parse_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(table: Table, selector: u8, end_delimiter: bool) -> bool {
        let (formatter, parser) = dialects(selector);
        let text = format(formatter, &table.0, end_delimiter);
        parse_whole(parser, &text).is_ok_and(|events| fields(&events) == table.0)
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Table, u8, bool) -> bool);
}

/// Property: parsing, formatting and parsing again is stable.
#[test]
fn reparse_is_idempotent_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(table: Table, selector: u8) -> bool {
        let (formatter, parser) = dialects(selector);
        let text = format(formatter.clone(), &table.0, false);
        let Ok(first) = parse_whole(parser.clone(), &text) else {
            return false;
        };
        let again = format(formatter, &fields(&first), false);
        parse_whole(parser, &again).is_ok_and(|second| fields(&second) == fields(&first))
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Table, u8) -> bool);
}
