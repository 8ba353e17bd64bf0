// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transaction error types.

use crate::storage::{Key, StorageError};

use super::lock::LockConflict;
use super::types::TxnStatus;

/// Errors produced by the intent store.
///
/// `Locked`, `UniqueViolation` and `VersionMismatch` are business-level,
/// per-intent facts: prepare collects them and still returns `Ok`. Everything
/// else fails the whole call. Nothing is retried internally; retry policy
/// belongs to the coordinating caller.
#[derive(Debug, thiserror::Error)]
pub enum TxnError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("corruption: {0}")]
    Corruption(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("key {:?} locked by transaction {}", .0.key, .0.txn_id)]
    Locked(Box<LockConflict>),

    #[error("status conflict: transaction already decided as {existing:?}")]
    StatusConflict { existing: TxnStatus },

    #[error("unique check failed: committed row exists at key {key:?}")]
    UniqueViolation { key: Key },

    #[error("version mismatch at key {key:?}: expected {expected}, actual {actual}")]
    VersionMismatch {
        key: Key,
        expected: u64,
        actual: u64,
    },
}

impl TxnError {
    /// Returns true for per-intent business errors that prepare collects
    /// rather than failing on.
    pub fn is_per_intent(&self) -> bool {
        matches!(
            self,
            TxnError::Locked(_) | TxnError::UniqueViolation { .. } | TxnError::VersionMismatch { .. }
        )
    }
}
