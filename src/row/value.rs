// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Typed field values.

use std::cmp::Ordering;

use crate::schema::ColumnType;

/// A decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Returns the column type this value belongs to.
    #[inline]
    pub fn typ(&self) -> ColumnType {
        match self {
            FieldValue::Int(_) => ColumnType::Int,
            FieldValue::Uint(_) => ColumnType::Uint,
            FieldValue::Float(_) => ColumnType::Float,
            FieldValue::Bytes(_) => ColumnType::Bytes,
        }
    }

    /// Compares two values of the same type.
    ///
    /// Returns `None` when the types differ, or for float comparisons
    /// involving NaN.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Uint(a), FieldValue::Uint(b)) => Some(a.cmp(b)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
            (FieldValue::Bytes(a), FieldValue::Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Uint(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(v: &[u8]) -> Self {
        FieldValue::Bytes(v.to_vec())
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Bytes(v.as_bytes().to_vec())
    }
}
