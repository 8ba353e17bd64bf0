// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Lock inspection types.

use crate::storage::Key;

use super::types::{TxnId, TxnStatus, TxnValue};

/// What the lock inspector found at a key.
#[derive(Debug)]
pub enum LockState {
    /// No lock record exists; the key is free.
    Free,
    /// The requesting transaction already holds the lock (idempotent
    /// re-prepare).
    OwnedBySelf,
    /// A different transaction holds the lock.
    Conflict(LockConflict),
}

/// Everything a caller needs to drive resolution of a conflicting lock
/// without a second round trip.
#[derive(Debug, Clone)]
pub struct LockConflict {
    /// The locked key.
    pub key: Key,
    /// The holder's transaction id.
    pub txn_id: TxnId,
    /// Whether the holder's TTL has elapsed; stale locks are worth
    /// proactively resolving.
    pub expired: bool,
    /// Whether the holding intent is its transaction's primary.
    pub is_primary: bool,
    /// The holder's primary key (stored on every lock record).
    pub primary_key: Key,
    /// The holder's status; known only when the lock is itself a primary.
    pub status: Option<TxnStatus>,
    /// The holder's secondary fan-out; populated only for a primary lock.
    pub secondary_keys: Vec<Key>,
}

impl LockConflict {
    /// Builds a conflict descriptor from the holder's lock record.
    pub(crate) fn from_value(value: &TxnValue, now_ms: u64) -> Self {
        let is_primary = value.intent.is_primary;
        Self {
            key: value.intent.key.clone(),
            txn_id: value.txn_id.clone(),
            expired: now_ms > value.expired_at,
            is_primary,
            primary_key: value.primary_key.clone(),
            status: is_primary.then_some(value.status),
            secondary_keys: if is_primary {
                value.secondary_keys.clone()
            } else {
                Vec::new()
            },
        }
    }
}
