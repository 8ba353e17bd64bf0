// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Key-value engine adapter.
//!
//! The transaction layer consumes an embedded engine through the [`KvEngine`]
//! trait: point lookup, atomic multi-key write batch, delete, and a bounded
//! forward range scan, over two logical column families — [`ColumnFamily::Data`]
//! for committed rows and [`ColumnFamily::Txn`] for lock records.
//!
//! All-or-nothing visibility of a prepare or decide call rests entirely on the
//! engine's atomic batch commit; nothing in this crate holds a lock across a
//! batch write.

mod engine;
mod error;
mod rocks;
mod types;

pub use engine::{BatchOp, ColumnFamily, KvEngine, WriteBatch};
pub use error::StorageError;
pub use rocks::{DurabilityMode, RocksEngine};
pub use types::{Key, Value, MAX_KEY_SIZE, MAX_VALUE_SIZE};
