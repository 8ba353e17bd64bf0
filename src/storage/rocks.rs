// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! RocksDB-backed engine implementation.

use std::path::Path;

use rocksdb::{
    ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options,
    WriteOptions,
};

use super::engine::{BatchOp, ColumnFamily, KvEngine, WriteBatch};
use super::error::StorageError;
use super::types::{MAX_KEY_SIZE, MAX_VALUE_SIZE};

/// Durability mode for write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Writes are synced to WAL but not fsynced to disk.
    /// Durable against process crashes but not power failures.
    /// This is the default mode, balancing performance and safety.
    #[default]
    WalOnly,
    /// Writes are fsynced to disk on every operation.
    /// Durable against power failures but slower.
    FsyncEveryWrite,
}

/// RocksDB-backed engine with the `data` and `txn` column families.
pub struct RocksEngine {
    db: DBWithThreadMode<MultiThreaded>,
    write_opts: WriteOptions,
}

impl RocksEngine {
    /// Opens or creates a database at the given path.
    ///
    /// Uses `DurabilityMode::WalOnly` by default (fast, durable against
    /// process crash).
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Self::open_with_durability(path, DurabilityMode::default())
    }

    /// Opens or creates a database with the specified durability mode.
    pub fn open_with_durability(
        path: &Path,
        durability: DurabilityMode,
    ) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        // Optimize for our workload
        opts.set_write_buffer_size(64 * 1024 * 1024); // 64MB
        opts.set_max_write_buffer_number(4);
        opts.set_target_file_size_base(64 * 1024 * 1024);
        opts.set_level_compaction_dynamic_level_bytes(true);

        // Enable bloom filters for point lookups
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);

        let cfs = vec![
            ColumnFamilyDescriptor::new(ColumnFamily::Data.name(), Options::default()),
            ColumnFamilyDescriptor::new(ColumnFamily::Txn.name(), Options::default()),
        ];
        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cfs)?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(durability == DurabilityMode::FsyncEveryWrite);

        Ok(Self { db, write_opts })
    }

    /// Forces a flush to disk.
    pub fn sync(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn validate(key: &[u8], value: Option<&[u8]>) -> Result<(), StorageError> {
        if key.len() > MAX_KEY_SIZE {
            return Err(StorageError::KeyTooLarge {
                size: key.len(),
                max: MAX_KEY_SIZE,
            });
        }
        if let Some(value) = value {
            if value.len() > MAX_VALUE_SIZE {
                return Err(StorageError::ValueTooLarge {
                    size: value.len(),
                    max: MAX_VALUE_SIZE,
                });
            }
        }
        Ok(())
    }

    fn cf_handle(
        &self,
        cf: ColumnFamily,
    ) -> Result<std::sync::Arc<rocksdb::BoundColumnFamily<'_>>, StorageError> {
        self.db
            .cf_handle(cf.name())
            .ok_or(StorageError::MissingColumnFamily(cf.name()))
    }
}

impl KvEngine for RocksEngine {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let handle = self.cf_handle(cf)?;
        Ok(self.db.get_cf(&handle, key)?)
    }

    fn write(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let mut db_batch = rocksdb::WriteBatch::default();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { cf, key, value } => {
                    Self::validate(&key, Some(&value))?;
                    let handle = self.cf_handle(cf)?;
                    db_batch.put_cf(&handle, key, value);
                }
                BatchOp::Delete { cf, key } => {
                    Self::validate(&key, None)?;
                    let handle = self.cf_handle(cf)?;
                    db_batch.delete_cf(&handle, key);
                }
            }
        }
        self.db.write_opt(db_batch, &self.write_opts)?;
        Ok(())
    }

    fn delete(&self, cf: ColumnFamily, key: &[u8]) -> Result<(), StorageError> {
        let handle = self.cf_handle(cf)?;
        self.db.delete_cf_opt(&handle, key, &self.write_opts)?;
        Ok(())
    }

    fn scan(
        &self,
        cf: ColumnFamily,
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let handle = self.cf_handle(cf)?;
        let mut results = Vec::with_capacity(limit.min(1024));

        let iter = self
            .db
            .iterator_cf(&handle, IteratorMode::From(start, Direction::Forward));

        for item in iter {
            if results.len() >= limit {
                break;
            }
            let (key, value) = item?;
            if key.as_ref() >= end {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_engine() -> (RocksEngine, TempDir) {
        let dir = TempDir::new().unwrap();
        let engine = RocksEngine::open(dir.path()).unwrap();
        (engine, dir)
    }

    #[test]
    fn test_batch_put_get() {
        let (engine, _dir) = create_test_engine();

        let mut batch = WriteBatch::new();
        batch.put(ColumnFamily::Data, b"k1".to_vec(), b"v1".to_vec());
        batch.put(ColumnFamily::Txn, b"k1".to_vec(), b"lock".to_vec());
        engine.write(batch).unwrap();

        assert_eq!(
            engine.get(ColumnFamily::Data, b"k1").unwrap(),
            Some(b"v1".to_vec())
        );
        assert_eq!(
            engine.get(ColumnFamily::Txn, b"k1").unwrap(),
            Some(b"lock".to_vec())
        );
    }

    #[test]
    fn test_get_absent_is_none() {
        let (engine, _dir) = create_test_engine();
        assert_eq!(engine.get(ColumnFamily::Data, b"missing").unwrap(), None);
    }

    #[test]
    fn test_column_families_isolated() {
        let (engine, _dir) = create_test_engine();

        let mut batch = WriteBatch::new();
        batch.put(ColumnFamily::Txn, b"key".to_vec(), b"lock".to_vec());
        engine.write(batch).unwrap();

        // Same key, different family: invisible.
        assert_eq!(engine.get(ColumnFamily::Data, b"key").unwrap(), None);
    }

    #[test]
    fn test_batch_delete() {
        let (engine, _dir) = create_test_engine();

        let mut batch = WriteBatch::new();
        batch.put(ColumnFamily::Data, b"k".to_vec(), b"v".to_vec());
        engine.write(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.delete(ColumnFamily::Data, b"k".to_vec());
        engine.write(batch).unwrap();

        assert_eq!(engine.get(ColumnFamily::Data, b"k").unwrap(), None);
    }

    #[test]
    fn test_direct_delete() {
        let (engine, _dir) = create_test_engine();

        let mut batch = WriteBatch::new();
        batch.put(ColumnFamily::Txn, b"k".to_vec(), b"v".to_vec());
        engine.write(batch).unwrap();

        engine.delete(ColumnFamily::Txn, b"k").unwrap();
        assert_eq!(engine.get(ColumnFamily::Txn, b"k").unwrap(), None);
    }

    #[test]
    fn test_scan_range_and_limit() {
        let (engine, _dir) = create_test_engine();

        let mut batch = WriteBatch::new();
        for k in ["aaa", "bbb", "ccc", "ddd"] {
            batch.put(ColumnFamily::Data, k.as_bytes().to_vec(), b"v".to_vec());
        }
        engine.write(batch).unwrap();

        // [bbb, ddd) yields bbb, ccc
        let results = engine.scan(ColumnFamily::Data, b"bbb", b"ddd", 100).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, b"bbb");
        assert_eq!(results[1].0, b"ccc");

        let limited = engine.scan(ColumnFamily::Data, b"aaa", b"zzz", 3).unwrap();
        assert_eq!(limited.len(), 3);
    }

    #[test]
    fn test_oversized_key_rejected() {
        let (engine, _dir) = create_test_engine();

        let mut batch = WriteBatch::new();
        batch.put(ColumnFamily::Data, vec![0u8; MAX_KEY_SIZE + 1], b"v".to_vec());
        let result = engine.write(batch);
        assert!(matches!(result, Err(StorageError::KeyTooLarge { .. })));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let (engine, _dir) = create_test_engine();
        engine.write(WriteBatch::new()).unwrap();
    }
}
