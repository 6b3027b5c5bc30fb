//! Purpose: Wire-level shapes returned by a model's `Clone` call.
//! Exports: `WireValue`, `RawRow`, `RawSnapshot`.
//! Role: Transport-neutral form every bus implementation converts into.
//! Invariants: A non-empty row carries one value per declared column.
//! Invariants: Positions and change types are passed through, never interpreted.

use bytes::Bytes;

/// A single cell as it arrived on the wire.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WireValue {
    Null,
    Raw(Bytes),
}

impl WireValue {
    pub fn raw(bytes: impl Into<Bytes>) -> Self {
        Self::Raw(bytes.into())
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            WireValue::Null => None,
            WireValue::Raw(bytes) => Some(&bytes[..]),
        }
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        Self::Raw(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        Self::Raw(Bytes::from(value))
    }
}

/// An empty row is a tombstone for a deleted slot.
pub type RawRow = Vec<WireValue>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSnapshot {
    pub dataset_name: String,
    pub column_types: Vec<String>,
    pub rows: Vec<RawRow>,
    pub positions: Vec<u64>,
    pub change_types: Vec<u8>,
    pub seqnum_before: u64,
    pub seqnum_after: u64,
}

impl RawSnapshot {
    /// Physical field count; every non-tombstone row has this length.
    pub fn field_count(&self) -> usize {
        self.column_types.len()
    }
}
