//! Purpose: Caller-supplied mapping from physical column index to column name.
//! Exports: `Schema`.
//! Role: Selects and relabels columns of decoded rows.
//! Invariants: Immutable once built; iteration is in ascending index order.
//! Invariants: Indices need not be contiguous nor start at zero.

use crate::core::error::{Error, ErrorKind};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Schema {
    columns: BTreeMap<u32, String>,
}

impl Schema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(index, name)| (index, name.into()))
                .collect(),
        }
    }

    /// Parses `INDEX=NAME`, as accepted by `--column`.
    pub fn parse_column(raw: &str) -> Result<(u32, String), Error> {
        let Some((index, name)) = raw.split_once('=') else {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("column must be INDEX=NAME, got {raw:?}")));
        };
        let index = index.trim().parse::<u32>().map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("column index must be a non-negative integer, got {index:?}"))
                .with_source(err)
        })?;
        if name.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("column name must not be empty"));
        }
        Ok((index, name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn name(&self, index: u32) -> Option<&str> {
        self.columns.get(&index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.columns
            .iter()
            .map(|(index, name)| (*index, name.as_str()))
    }
}

impl<S: Into<String>> FromIterator<(u32, S)> for Schema {
    fn from_iter<I: IntoIterator<Item = (u32, S)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::Schema;
    use crate::core::error::ErrorKind;

    #[test]
    fn iterates_in_index_order() {
        let schema = Schema::new([(5, "c"), (0, "a"), (2, "b")]);
        let order: Vec<_> = schema.iter().collect();
        assert_eq!(order, vec![(0, "a"), (2, "b"), (5, "c")]);
        assert_eq!(schema.name(2), Some("b"));
        assert_eq!(schema.name(1), None);
    }

    #[test]
    fn parse_column_accepts_index_and_name() {
        let (index, name) = Schema::parse_column("2=name").expect("column");
        assert_eq!(index, 2);
        assert_eq!(name, "name");
    }

    #[test]
    fn parse_column_rejects_missing_separator() {
        let err = Schema::parse_column("2").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn parse_column_rejects_negative_index() {
        let err = Schema::parse_column("-1=x").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn parse_column_rejects_empty_name() {
        let err = Schema::parse_column("0=").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
