// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! TabletStore: the transactional intent store of a storage node for a
//! distributed, horizontally-partitioned SQL/KV database.
//!
//! Writes arrive as per-key *intents* staged by a client-coordinated
//! transaction. This crate turns those intents into durable, atomically
//! visible committed state using a Percolator-style two-phase protocol
//! (prepare / decide / cleanup) on top of an embedded key-value engine with
//! two column families: `data` for committed rows and `txn` for lock records.
//! The durable lock record itself is the lock; there is no in-process lock
//! manager.

pub mod row;
pub mod schema;
pub mod storage;
pub mod txn;

pub use row::{FieldValue, Match, MatchOp, TxnRowDecoder, TxnRowFetcher, TxnRowValue};
pub use schema::{Column, ColumnType, TableSchema};
pub use storage::{
    ColumnFamily, DurabilityMode, Key, KvEngine, RocksEngine, StorageError, Value, WriteBatch,
};
pub use txn::{
    DecideOutcome, DecideRequest, Intent, LockConflict, LockState, OpKind, PrepareRequest,
    TxnError, TxnId, TxnStatus, TxnStore, TxnValue,
};
