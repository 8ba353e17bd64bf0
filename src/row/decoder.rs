// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Row decoding and filtering.

use std::collections::BTreeMap;

use crate::schema::{ColumnType, TableSchema};
use crate::txn::TxnError;

use super::encode::{TAG_BYTES, TAG_FLOAT, TAG_INT, TAG_UINT};
use super::filter::Match;
use super::value::FieldValue;

/// A decoded row: commit version plus column values.
///
/// Transient projection owned by the scan call that produces it; discarded
/// once the row is emitted or filtered out.
#[derive(Debug)]
pub struct TxnRowValue {
    version: u64,
    fields: BTreeMap<u64, FieldValue>,
}

impl TxnRowValue {
    /// Creates an empty row at the given version.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            fields: BTreeMap::new(),
        }
    }

    /// Returns the commit version.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the value of a column, if present.
    #[inline]
    pub fn field(&self, col: u64) -> Option<&FieldValue> {
        self.fields.get(&col)
    }

    /// Adds a column value. Returns false if the column was already present.
    pub fn add_field(&mut self, col: u64, value: FieldValue) -> bool {
        self.fields.insert(col, value).is_none()
    }

    /// Returns the number of decoded columns.
    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Decodes stored row bytes against a schema and applies match predicates.
pub struct TxnRowDecoder<'a> {
    schema: &'a TableSchema,
    filters: Vec<Match>,
}

impl<'a> TxnRowDecoder<'a> {
    /// Creates a decoder for a schema and a conjunction of predicates.
    pub fn new(schema: &'a TableSchema, filters: Vec<Match>) -> Self {
        Self { schema, filters }
    }

    /// Decodes a row and evaluates the filters.
    ///
    /// Returns `Ok(Some(row))` when the row satisfies every predicate,
    /// `Ok(None)` when it is filtered out, and an error on corrupt bytes or
    /// a malformed predicate.
    pub fn decode_and_filter(&self, buf: &[u8]) -> Result<Option<TxnRowValue>, TxnError> {
        let row = self.decode(buf)?;
        for filter in &self.filters {
            if !filter.eval(&row)? {
                return Ok(None);
            }
        }
        Ok(Some(row))
    }

    fn decode(&self, buf: &[u8]) -> Result<TxnRowValue, TxnError> {
        let version = super::encode::decode_version(buf)?;
        let mut row = TxnRowValue::new(version);

        let mut pos = 8;
        while pos < buf.len() {
            // [col id: u64][tag: u8][len: u32][payload]
            if buf.len() - pos < 13 {
                return Err(TxnError::Corruption(format!(
                    "truncated field header at offset {pos}"
                )));
            }
            let col_id = u64::from_be_bytes(buf[pos..pos + 8].try_into().map_err(|_| {
                TxnError::Corruption(format!("bad column id at offset {pos}"))
            })?);
            let tag = buf[pos + 8];
            let len = u32::from_be_bytes(buf[pos + 9..pos + 13].try_into().map_err(|_| {
                TxnError::Corruption(format!("bad field length at offset {pos}"))
            })?) as usize;
            pos += 13;

            if buf.len() - pos < len {
                return Err(TxnError::Corruption(format!(
                    "field payload for column {col_id} overruns buffer"
                )));
            }
            let payload = &buf[pos..pos + len];
            pos += len;

            // Unknown columns are corruption, never skipped: silently losing
            // a primary-key column would break filter correctness.
            let column = self.schema.column(col_id).ok_or_else(|| {
                TxnError::Corruption(format!("row references unknown column {col_id}"))
            })?;

            let value = decode_field(col_id, column.typ, tag, payload)?;
            if !row.add_field(col_id, value) {
                return Err(TxnError::Corruption(format!(
                    "duplicate column {col_id} in row"
                )));
            }
        }

        Ok(row)
    }
}

fn decode_field(
    col_id: u64,
    expected: ColumnType,
    tag: u8,
    payload: &[u8],
) -> Result<FieldValue, TxnError> {
    let fixed8 = |payload: &[u8]| -> Result<[u8; 8], TxnError> {
        payload.try_into().map_err(|_| {
            TxnError::Corruption(format!(
                "column {col_id}: fixed-width field has {} payload bytes",
                payload.len()
            ))
        })
    };

    let value = match tag {
        TAG_INT => FieldValue::Int(i64::from_be_bytes(fixed8(payload)?)),
        TAG_UINT => FieldValue::Uint(u64::from_be_bytes(fixed8(payload)?)),
        TAG_FLOAT => FieldValue::Float(f64::from_bits(u64::from_be_bytes(fixed8(payload)?))),
        TAG_BYTES => FieldValue::Bytes(payload.to_vec()),
        other => {
            return Err(TxnError::Corruption(format!(
                "column {col_id}: unknown field tag {other}"
            )))
        }
    };

    if value.typ() != expected {
        return Err(TxnError::Corruption(format!(
            "column {col_id}: stored type {:?} does not match schema type {expected:?}",
            value.typ()
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::encode::encode_row;
    use crate::row::filter::MatchOp;
    use crate::schema::Column;

    fn test_schema() -> TableSchema {
        TableSchema::new(vec![
            Column::new(1, "id", ColumnType::Uint).primary(),
            Column::new(2, "name", ColumnType::Bytes),
            Column::new(3, "score", ColumnType::Float),
            Column::new(4, "delta", ColumnType::Int),
        ])
    }

    #[test]
    fn test_decode_roundtrip() {
        let schema = test_schema();
        let decoder = TxnRowDecoder::new(&schema, vec![]);

        let buf = encode_row(
            9,
            &[
                (1, FieldValue::Uint(100)),
                (2, FieldValue::from("alice")),
                (3, FieldValue::Float(1.5)),
                (4, FieldValue::Int(-3)),
            ],
        );

        let row = decoder.decode_and_filter(&buf).unwrap().unwrap();
        assert_eq!(row.version(), 9);
        assert_eq!(row.field_count(), 4);
        assert_eq!(row.field(1), Some(&FieldValue::Uint(100)));
        assert_eq!(row.field(2), Some(&FieldValue::from("alice")));
        assert_eq!(row.field(3), Some(&FieldValue::Float(1.5)));
        assert_eq!(row.field(4), Some(&FieldValue::Int(-3)));
    }

    #[test]
    fn test_filters_are_conjunction() {
        let schema = test_schema();
        let buf = encode_row(1, &[(1, FieldValue::Uint(100)), (2, FieldValue::from("bob"))]);

        let decoder = TxnRowDecoder::new(
            &schema,
            vec![
                Match::new(1, MatchOp::Eq, FieldValue::Uint(100)),
                Match::new(2, MatchOp::Eq, FieldValue::from("bob")),
            ],
        );
        assert!(decoder.decode_and_filter(&buf).unwrap().is_some());

        let decoder = TxnRowDecoder::new(
            &schema,
            vec![
                Match::new(1, MatchOp::Eq, FieldValue::Uint(100)),
                Match::new(2, MatchOp::Eq, FieldValue::from("alice")),
            ],
        );
        assert!(decoder.decode_and_filter(&buf).unwrap().is_none());
    }

    #[test]
    fn test_unknown_column_is_corruption() {
        let schema = test_schema();
        let decoder = TxnRowDecoder::new(&schema, vec![]);

        let buf = encode_row(1, &[(99, FieldValue::Uint(1))]);
        assert!(matches!(
            decoder.decode_and_filter(&buf),
            Err(TxnError::Corruption(_))
        ));
    }

    #[test]
    fn test_truncated_payload_is_corruption() {
        let schema = test_schema();
        let decoder = TxnRowDecoder::new(&schema, vec![]);

        let mut buf = encode_row(1, &[(2, FieldValue::from("hello"))]);
        buf.truncate(buf.len() - 2);
        assert!(matches!(
            decoder.decode_and_filter(&buf),
            Err(TxnError::Corruption(_))
        ));
    }

    #[test]
    fn test_truncated_header_is_corruption() {
        let schema = test_schema();
        let decoder = TxnRowDecoder::new(&schema, vec![]);

        let mut buf = encode_row(1, &[(1, FieldValue::Uint(5))]);
        buf.truncate(12); // version + partial field header
        assert!(matches!(
            decoder.decode_and_filter(&buf),
            Err(TxnError::Corruption(_))
        ));
    }

    #[test]
    fn test_type_mismatch_is_corruption() {
        let schema = test_schema();
        let decoder = TxnRowDecoder::new(&schema, vec![]);

        // Column 1 is Uint in the schema but stored as Bytes.
        let buf = encode_row(1, &[(1, FieldValue::from("oops"))]);
        assert!(matches!(
            decoder.decode_and_filter(&buf),
            Err(TxnError::Corruption(_))
        ));
    }

    #[test]
    fn test_duplicate_column_is_corruption() {
        let schema = test_schema();
        let decoder = TxnRowDecoder::new(&schema, vec![]);

        let buf = encode_row(1, &[(1, FieldValue::Uint(1)), (1, FieldValue::Uint(2))]);
        assert!(matches!(
            decoder.decode_and_filter(&buf),
            Err(TxnError::Corruption(_))
        ));
    }
}
