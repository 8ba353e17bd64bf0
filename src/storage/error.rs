// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Storage error types.

/// Errors that can occur in storage operations.
///
/// Absence of a key is not an error; reads return `Option::None` for it.
/// `Corruption` is reserved for bytes that exist but cannot be interpreted —
/// it is never collapsed into a not-found result.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("key too large: {size} > {max}")]
    KeyTooLarge { size: usize, max: usize },

    #[error("value too large: {size} > {max}")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage corruption: {0}")]
    Corruption(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rocksdb error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("missing column family: {0}")]
    MissingColumnFamily(&'static str),
}
