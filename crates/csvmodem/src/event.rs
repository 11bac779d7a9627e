//! Rows and events emitted by the streaming CSV parser.
//!
//! A parse run yields an optional [`ParseEvent::Headers`], then one
//! [`ParseEvent::Row`] per accepted row or [`ParseEvent::Invalid`] per row a
//! validator rejected, and finally [`ParseEvent::End`] with the row count.
//!
//! # Examples
//!
//! ```
//! use csvmodem::{CsvParser, ParseEvent, ParserOptions, Record, Row, Span};
//!
//! let mut parser = CsvParser::new(ParserOptions::default()).unwrap();
//! let mut events: Vec<_> = parser.feed("a,b").map(Result::unwrap).collect();
//! events.extend(parser.finish().map(Result::unwrap));
//! assert_eq!(
//!     events,
//!     vec![
//!         ParseEvent::Row(Record {
//!             row: Row::Fields(vec!["a".into(), "b".into()]),
//!             span: Span::new(0, 3),
//!             number: 1,
//!         }),
//!         ParseEvent::End { row_count: 1 },
//!     ]
//! );
//! ```

use indexmap::IndexMap;

use crate::token::Span;

/// One row of data: a plain field list, or a map from header name to value
/// when headers are active.
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(any(test, feature = "serde"), serde(untagged))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// Values in input order.
    Fields(Vec<String>),
    /// Values keyed by header, in header order.
    Map(IndexMap<String, String>),
}

impl Row {
    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Row::Fields(fields) => fields.len(),
            Row::Map(map) => map.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of a named column. Always `None` for field lists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        match self {
            Row::Fields(_) => None,
            Row::Map(map) => map.get(name).map(String::as_str),
        }
    }

    /// Value at a column position, for either shape.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&str> {
        match self {
            Row::Fields(fields) => fields.get(index).map(String::as_str),
            Row::Map(map) => map.get_index(index).map(|(_, v)| v.as_str()),
        }
    }

    /// Values in column order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let (fields, map) = match self {
            Row::Fields(fields) => (Some(fields.iter()), None),
            Row::Map(map) => (None, Some(map.values())),
        };
        fields
            .into_iter()
            .flatten()
            .chain(map.into_iter().flatten())
            .map(String::as_str)
    }

    #[must_use]
    pub fn as_fields(&self) -> Option<&[String]> {
        match self {
            Row::Fields(fields) => Some(fields),
            Row::Map(_) => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Row::Map(map) => Some(map),
            Row::Fields(_) => None,
        }
    }

    /// Column values in order, dropping names.
    #[must_use]
    pub fn into_fields(self) -> Vec<String> {
        match self {
            Row::Fields(fields) => fields,
            Row::Map(map) => map.into_values().collect(),
        }
    }
}

impl From<Vec<String>> for Row {
    fn from(fields: Vec<String>) -> Self {
        Row::Fields(fields)
    }
}

impl From<IndexMap<String, String>> for Row {
    fn from(map: IndexMap<String, String>) -> Self {
        Row::Map(map)
    }
}

/// An accepted row with its position in the input.
///
/// `number` counts rows offered to validation, starting at 1, so rejected
/// rows leave gaps.
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub row: Row,
    /// The row's text, without its row delimiter.
    pub span: Span,
    pub number: usize,
}

/// A row that a validator rejected. Parsing continues.
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub row: Row,
    pub span: Span,
    pub number: usize,
    /// Set when the validator returned [`Verdict::invalid`](crate::Verdict::invalid).
    #[cfg_attr(
        any(test, feature = "serde"),
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub reason: Option<String>,
}

/// Events produced by the CSV parser.
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(any(test, feature = "serde"), serde(tag = "kind"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// Column names, once resolved from the first row or the configuration.
    Headers { names: Vec<String> },
    /// A row that passed validation and transformation.
    Row(Record),
    /// A row rejected by the validator.
    Invalid(ValidationFailure),
    /// Normal completion. Not emitted after a fatal error.
    End { row_count: usize },
}
