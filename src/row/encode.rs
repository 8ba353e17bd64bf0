// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Committed-row encoding.
//!
//! Format: `[version: u64 BE]` followed by zero or more fields, each
//! `[column id: u64 BE][type tag: u8][payload len: u32 BE][payload]`.
//!
//! The layout is self-describing enough to detect corruption: every length is
//! checked against the buffer, fixed-width tags must carry exactly 8 payload
//! bytes, and a length or tag mismatch always surfaces as corruption rather
//! than a missing field.

use crate::txn::TxnError;

use super::value::FieldValue;

/// Type tag for a signed 64-bit integer field.
pub const TAG_INT: u8 = 1;
/// Type tag for an unsigned 64-bit integer field.
pub const TAG_UINT: u8 = 2;
/// Type tag for a 64-bit float field.
pub const TAG_FLOAT: u8 = 3;
/// Type tag for a variable-length bytes field.
pub const TAG_BYTES: u8 = 4;

/// Encodes column fields without a version prefix.
///
/// This is the payload a client supplies in an insert/update intent; the
/// commit version is prepended when the intent is materialized.
pub fn encode_fields(fields: &[(u64, FieldValue)]) -> Vec<u8> {
    let mut buf = Vec::new();
    for (col_id, value) in fields {
        buf.extend_from_slice(&col_id.to_be_bytes());
        match value {
            FieldValue::Int(v) => {
                buf.push(TAG_INT);
                buf.extend_from_slice(&8u32.to_be_bytes());
                buf.extend_from_slice(&v.to_be_bytes());
            }
            FieldValue::Uint(v) => {
                buf.push(TAG_UINT);
                buf.extend_from_slice(&8u32.to_be_bytes());
                buf.extend_from_slice(&v.to_be_bytes());
            }
            FieldValue::Float(v) => {
                buf.push(TAG_FLOAT);
                buf.extend_from_slice(&8u32.to_be_bytes());
                buf.extend_from_slice(&v.to_bits().to_be_bytes());
            }
            FieldValue::Bytes(v) => {
                buf.push(TAG_BYTES);
                buf.extend_from_slice(&(v.len() as u32).to_be_bytes());
                buf.extend_from_slice(v);
            }
        }
    }
    buf
}

/// Prepends the commit version to an encoded field payload.
pub fn row_with_version(version: u64, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + payload.len());
    buf.extend_from_slice(&version.to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Encodes a complete committed row.
pub fn encode_row(version: u64, fields: &[(u64, FieldValue)]) -> Vec<u8> {
    row_with_version(version, &encode_fields(fields))
}

/// Reads the commit version from a stored row.
pub fn decode_version(buf: &[u8]) -> Result<u64, TxnError> {
    let prefix: [u8; 8] = buf
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            TxnError::Corruption(format!("row too short for version prefix: {} bytes", buf.len()))
        })?;
    Ok(u64::from_be_bytes(prefix))
}
