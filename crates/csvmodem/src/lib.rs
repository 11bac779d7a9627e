//! A streaming, chunk-safe CSV parser and formatter.
//!
//! Input may arrive in arbitrarily sized chunks: a quoted field, a
//! multi-character delimiter or a `\r\n` pair can straddle two calls to
//! [`CsvParser::feed`] and the parser yields exactly the rows it would have
//! produced for the whole input at once.
//!
//! ```rust
//! use csvmodem::{CsvParser, HeaderMode, ParseEvent, ParserOptions, row};
//!
//! let mut parser = CsvParser::new(ParserOptions {
//!     headers: HeaderMode::FirstRow,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let mut events = Vec::new();
//! for chunk in ["na", "me,ag", "e\nal", "ice,3", "0"] {
//!     events.extend(parser.feed(chunk));
//! }
//! events.extend(parser.finish());
//!
//! let rows: Vec<_> = events
//!     .into_iter()
//!     .filter_map(|event| match event.unwrap() {
//!         ParseEvent::Row(record) => Some(record.row),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(rows, vec![row! { "name" => "alice", "age" => "30" }]);
//! ```

#![allow(missing_docs)]

mod column;
mod error;
mod event;
mod formatter;
mod headers;
mod hooks;
mod oneshot;
mod options;
mod parser;
mod row;
mod scanner;
#[cfg(feature = "async")]
mod stream;
mod token;

#[cfg(test)]
mod tests;

pub use error::{
    CallbackError, ConfigError, CsvError, ErrorSource, FormatError, HeaderError, ParserError,
    SyntaxError,
};
pub use event::{ParseEvent, Record, Row, ValidationFailure};
pub use formatter::{CsvFormatter, FormatterOptions};
pub use hooks::Verdict;
#[doc(hidden)]
pub use indexmap::IndexMap;
pub use oneshot::{parse_rows, parse_str};
pub use options::{Delimiter, Dialect, HeaderMode, ParserOptions};
pub use parser::{ClosedCsvParser, CsvParser, CsvParserBuilder, Events};
pub use scanner::{Peeked, Scanner};
#[cfg(feature = "async")]
pub use stream::{AsyncTransformFn, AsyncValidateFn, RowStream, StreamError};
pub use token::{Span, Token};

/// Builds a [`Row`] from a list of fields or from `key => value` pairs.
///
/// ```rust
/// # use csvmodem::{row, Row};
/// let fields = row!["a", "b"];
/// assert_eq!(fields, Row::Fields(vec!["a".into(), "b".into()]));
///
/// let map = row! { "id" => "1", "name" => "x" };
/// assert_eq!(map.get("name"), Some("x"));
/// ```
#[macro_export]
macro_rules! row {
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut map = $crate::IndexMap::new();
        $( map.insert(::std::string::String::from($key), ::std::string::String::from($value)); )+
        $crate::Row::Map(map)
    }};
    ( $( $field:expr ),* $(,)? ) => {
        $crate::Row::Fields(::std::vec![$( ::std::string::String::from($field) ),*])
    };
}
