//! Purpose: Prune structurally invalid rows and decode the rest into named records.
//! Exports: `Record`, `filter_rows`, `decode_row`.
//! Role: Pure stages between the seqnum check and the caller.
//! Invariants: A zero field count yields no rows at all.
//! Invariants: Surviving rows keep their original relative order.
//! Invariants: Schema indices past the end of a row decode as null.

use crate::core::schema::Schema;
use crate::core::value::{FieldValue, classify};
use crate::core::wire::RawRow;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn into_fields(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }
}

impl<S: Into<String>> FromIterator<(S, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (S, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

/// Tombstones and short or long rows are dropped without error.
pub fn filter_rows(field_count: usize, rows: Vec<RawRow>) -> Vec<RawRow> {
    if field_count == 0 {
        return Vec::new();
    }
    rows.into_iter()
        .filter(|row| row.len() == field_count)
        .collect()
}

pub fn decode_row(schema: &Schema, row: &RawRow) -> Record {
    schema
        .iter()
        .map(|(index, name)| {
            let value = row
                .get(index as usize)
                .map(classify)
                .unwrap_or(FieldValue::Null);
            (name, value)
        })
        .collect()
}
