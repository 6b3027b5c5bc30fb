//! Purpose: Decoded cell values and the lexical number-vs-text classifier.
//! Exports: `FieldValue`, `classify`, `is_numeric_literal`.
//! Role: Pure conversion from raw wire bytes to a typed value.
//! Invariants: Classification looks only at the bytes, never at declared column types.
//! Invariants: Non-numeric bytes decode as UTF-8 with invalid sequences replaced.

use crate::core::wire::WireValue;
use bstr::ByteSlice;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

pub fn classify(value: &WireValue) -> FieldValue {
    let Some(bytes) = value.as_bytes() else {
        return FieldValue::Null;
    };
    if is_numeric_literal(bytes) {
        // The grammar below is a subset of what f64 parsing accepts.
        // Literals that overflow f64 stay text; JSON has no infinity.
        if let Some(number) = std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| text.parse::<f64>().ok())
            .filter(|number| number.is_finite())
        {
            return FieldValue::Number(number);
        }
    }
    FieldValue::Text(bytes.to_str_lossy().into_owned())
}

/// Decimal literal: `[+-]? (digits [. digits*] | . digits) ([eE] [+-]? digits)?`.
pub fn is_numeric_literal(bytes: &[u8]) -> bool {
    let mut pos = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        pos += 1;
    }

    let int_digits = count_digits(&bytes[pos..]);
    pos += int_digits;

    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        frac_digits = count_digits(&bytes[pos..]);
        pos += frac_digits;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_digits = count_digits(&bytes[pos..]);
        if exp_digits == 0 {
            return false;
        }
        pos += exp_digits;
    }

    pos == bytes.len()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|byte| byte.is_ascii_digit()).count()
}
