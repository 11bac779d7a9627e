//! Header resolution and row-to-map conversion.

use indexmap::IndexMap;

use crate::error::{ErrorSource, HeaderError};

/// Where the parser stands on column names.
#[derive(Debug)]
pub(crate) enum HeaderState {
    /// Rows are emitted as field lists.
    Disabled,
    /// The next data row is the header row. With `replacement`, that row is
    /// consumed but the given names are used instead.
    Pending {
        replacement: Option<Vec<Option<String>>>,
    },
    Resolved(Headers),
}

/// Resolved column names. A `None` column is dropped from every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Headers {
    columns: Vec<Option<String>>,
}

impl Headers {
    /// Checks names for emptiness and duplicates.
    ///
    /// In strict mode either is an error. Otherwise duplicates are renamed
    /// with a `_1`, `_2`, ... suffix and empty names are kept.
    pub(crate) fn new(columns: Vec<Option<String>>, strict: bool) -> Result<Self, HeaderError> {
        let mut seen: IndexMap<String, usize> = IndexMap::with_capacity(columns.len());
        let mut out = Vec::with_capacity(columns.len());
        for (position, column) in columns.into_iter().enumerate() {
            let Some(name) = column else {
                out.push(None);
                continue;
            };
            if strict && name.trim().is_empty() {
                return Err(HeaderError::Empty(position));
            }
            let name = match seen.get(&name).copied() {
                None => name,
                Some(_) if strict => return Err(HeaderError::Duplicate(name)),
                Some(last) => {
                    let mut suffix = last + 1;
                    while seen.contains_key(&format!("{name}_{suffix}")) {
                        suffix += 1;
                    }
                    seen.insert(name.clone(), suffix);
                    format!("{name}_{suffix}")
                }
            };
            seen.insert(name.clone(), 0);
            out.push(Some(name));
        }
        Ok(Self { columns: out })
    }

    /// Names of the kept columns, in order.
    pub(crate) fn names(&self) -> Vec<String> {
        self.columns.iter().flatten().cloned().collect()
    }

    /// Maps a row's fields onto the header names.
    ///
    /// Extra fields are an error only in strict mode without
    /// `discard_unmapped`. Missing fields are an error in strict mode and are
    /// filled with empty strings otherwise.
    pub(crate) fn map_row(
        &self,
        fields: Vec<String>,
        strict: bool,
        discard_unmapped: bool,
    ) -> Result<IndexMap<String, String>, ErrorSource> {
        let expected = self.columns.len();
        let actual = fields.len();
        if strict && (actual < expected || (actual > expected && !discard_unmapped)) {
            return Err(ErrorSource::ColumnCount { expected, actual });
        }

        let mut fields = fields.into_iter();
        let mut map = IndexMap::with_capacity(expected);
        for column in &self.columns {
            let value = fields.next().unwrap_or_default();
            if let Some(name) = column {
                map.insert(name.clone(), value);
            }
        }
        Ok(map)
    }
}
