// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Engine trait and the atomic write-batch builder.

use super::error::StorageError;

/// Logical column families exposed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFamily {
    /// Committed row data.
    Data,
    /// Transaction lock records (intents).
    Txn,
}

impl ColumnFamily {
    /// Returns the on-disk column family name.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            ColumnFamily::Data => "data",
            ColumnFamily::Txn => "txn",
        }
    }
}

/// A single staged mutation.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Put {
        cf: ColumnFamily,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: ColumnFamily,
        key: Vec<u8>,
    },
}

/// An engine-agnostic write batch.
///
/// Owned exclusively by the call stack of one prepare or decide invocation:
/// mutations accumulate here and become visible all-or-nothing when the batch
/// is handed to [`KvEngine::write`] exactly once. Dropping the batch discards
/// everything staged in it.
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a put.
    pub fn put(&mut self, cf: ColumnFamily, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put { cf, key, value });
    }

    /// Stages a delete.
    pub fn delete(&mut self, cf: ColumnFamily, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { cf, key });
    }

    /// Returns the number of staged operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if nothing is staged.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consumes the batch, yielding the staged operations in order.
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// The embedded key-value engine seam.
///
/// The transaction layer assumes the engine serializes writes to the same key
/// at the batch-commit boundary (last writer wins) and that a committed batch
/// is atomic and durable; replication of those writes happens elsewhere.
pub trait KvEngine: Send + Sync {
    /// Point lookup. Returns `None` when the key is absent.
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Commits a batch atomically.
    fn write(&self, batch: WriteBatch) -> Result<(), StorageError>;

    /// Deletes a single key outside of any batch.
    fn delete(&self, cf: ColumnFamily, key: &[u8]) -> Result<(), StorageError>;

    /// Scans `[start, end)` in key order, returning at most `limit` entries.
    fn scan(
        &self,
        cf: ColumnFamily,
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_accumulates_in_order() {
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());

        batch.put(ColumnFamily::Txn, b"a".to_vec(), b"1".to_vec());
        batch.delete(ColumnFamily::Data, b"b".to_vec());
        assert_eq!(batch.len(), 2);

        let ops = batch.into_ops();
        assert!(matches!(&ops[0], BatchOp::Put { cf: ColumnFamily::Txn, .. }));
        assert!(matches!(&ops[1], BatchOp::Delete { cf: ColumnFamily::Data, .. }));
    }

    #[test]
    fn test_cf_names() {
        assert_eq!(ColumnFamily::Data.name(), "data");
        assert_eq!(ColumnFamily::Txn.name(), "txn");
    }
}
