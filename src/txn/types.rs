// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transaction data model and the durable lock-record codec.

use serde::{Deserialize, Serialize};

use crate::storage::{Key, Value};

use super::error::TxnError;

/// Globally unique, client-assigned transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxnId(pub String);

impl TxnId {
    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TxnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TxnId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for TxnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of mutation an intent proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    Insert,
    Update,
    Delete,
}

/// Status of a transaction as recorded on its primary lock.
///
/// Monotonic: `Init` transitions exactly once to `Committed` or `Aborted`,
/// never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnStatus {
    Init,
    Committed,
    Aborted,
}

/// A single proposed mutation within a transaction, not yet visible to
/// readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Target storage key.
    pub key: Key,
    /// Proposed payload; present for inserts and updates, absent for deletes.
    pub value: Option<Value>,
    /// Mutation kind.
    pub op: OpKind,
    /// Exactly one intent per transaction is the primary.
    pub is_primary: bool,
    /// Precondition: fail if a committed row already exists at the key.
    pub check_unique: bool,
    /// Precondition: fail unless the committed row's version matches
    /// (0 meaning no committed row).
    pub expected_version: Option<u64>,
}

impl Intent {
    /// Creates an insert intent.
    pub fn insert(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        Self::new(key.into(), OpKind::Insert, Some(value.into()))
    }

    /// Creates an update intent.
    pub fn update(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        Self::new(key.into(), OpKind::Update, Some(value.into()))
    }

    /// Creates a delete intent.
    pub fn delete(key: impl Into<Key>) -> Self {
        Self::new(key.into(), OpKind::Delete, None)
    }

    fn new(key: Key, op: OpKind, value: Option<Value>) -> Self {
        Self {
            key,
            value,
            op,
            is_primary: false,
            check_unique: false,
            expected_version: None,
        }
    }

    /// Marks this intent as the transaction's primary.
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Requires that no committed row exists at the key.
    pub fn check_unique(mut self) -> Self {
        self.check_unique = true;
        self
    }

    /// Requires the committed row's version to match.
    pub fn expect_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// The durable lock record persisted in the `txn` column family, keyed by
/// `intent.key`. Its presence is the lock on that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxnValue {
    /// Owning transaction.
    pub txn_id: TxnId,
    /// The intent this record stages and locks.
    pub intent: Intent,
    /// Key of the transaction's primary intent (stored on every record).
    pub primary_key: Key,
    /// Commit version assigned by the coordinator at prepare time.
    pub version: u64,
    /// Wall-clock deadline (unix ms) after which other transactions may treat
    /// the lock as stale and drive resolution. Advisory; never enforced here.
    pub expired_at: u64,
    /// Secondary-key fan-out; populated only on the primary's record, for
    /// crash recovery.
    pub secondary_keys: Vec<Key>,
    /// Transaction status; starts `Init`, transitions exactly once.
    pub status: TxnStatus,
}

impl TxnValue {
    /// Serializes the record for storage.
    pub fn encode(&self) -> Result<Vec<u8>, TxnError> {
        bincode::serialize(self)
            .map_err(|e| TxnError::Corruption(format!("serialize txn value: {e}")))
    }

    /// Deserializes a stored record. A failure here is always corruption,
    /// never not-found: the bytes were present but unreadable.
    pub fn decode(buf: &[u8]) -> Result<Self, TxnError> {
        bincode::deserialize(buf)
            .map_err(|e| TxnError::Corruption(format!("parse txn value ({} bytes): {e}", buf.len())))
    }
}

/// Phase-1 request: stage every intent of a transaction.
#[derive(Debug, Clone)]
pub struct PrepareRequest {
    /// Transaction identifier.
    pub txn_id: TxnId,
    /// Key of the primary intent.
    pub primary_key: Key,
    /// Lock TTL in milliseconds; `expired_at` is prepare time plus this.
    pub lock_ttl_ms: u64,
    /// Commit version assigned by the coordinator.
    pub version: u64,
    /// The transaction's full secondary-key fan-out. Recorded on the primary's
    /// lock only; supplied by the caller because a node may hold just a subset
    /// of the transaction's intents.
    pub secondary_keys: Vec<Key>,
    /// Intents to stage, in a caller-significant order.
    pub intents: Vec<Intent>,
}

/// Phase-2 request: resolve previously staged intents.
#[derive(Debug, Clone)]
pub struct DecideRequest {
    /// Transaction identifier.
    pub txn_id: TxnId,
    /// Target status; must be `Committed` or `Aborted`.
    pub status: TxnStatus,
    /// Keys to resolve.
    pub keys: Vec<Key>,
    /// When set, secondary keys found on a primary's record are reported back
    /// so a coordinator recovering an in-flight transaction learns the
    /// fan-out to re-drive.
    pub recover: bool,
}

/// Result of a decide call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DecideOutcome {
    /// Bytes accounted for insert intents (key length + value length), for
    /// caller-side quota and throughput accounting.
    pub bytes_written: u64,
    /// Secondary keys reported in recovery mode, in prepare order.
    pub secondary_keys: Vec<Key>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_value() -> TxnValue {
        TxnValue {
            txn_id: TxnId::from("txn-1"),
            intent: Intent::insert("k1", "v1").primary(),
            primary_key: Key::from("k1"),
            version: 42,
            expired_at: 1_700_000_000_000,
            secondary_keys: vec![Key::from("k2"), Key::from("k3")],
            status: TxnStatus::Init,
        }
    }

    #[test]
    fn test_codec_roundtrip() {
        let value = sample_value();
        let buf = value.encode().unwrap();
        let decoded = TxnValue::decode(&buf).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_decode_garbage_is_corruption() {
        let result = TxnValue::decode(&[0xff, 0x01, 0x02]);
        assert!(matches!(result, Err(TxnError::Corruption(_))));
    }

    #[test]
    fn test_intent_builders() {
        let intent = Intent::update("k", "v").check_unique().expect_version(7);
        assert_eq!(intent.op, OpKind::Update);
        assert!(!intent.is_primary);
        assert!(intent.check_unique);
        assert_eq!(intent.expected_version, Some(7));

        let del = Intent::delete("k").primary();
        assert_eq!(del.op, OpKind::Delete);
        assert!(del.value.is_none());
        assert!(del.is_primary);
    }
}
