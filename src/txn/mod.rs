// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transactional intent store.
//!
//! Implements the storage-node side of a Percolator-style two-phase commit:
//!
//! - **Prepare** stages every intent of a transaction as a durable lock
//!   record ([`TxnValue`]) in the `txn` column family, all in one atomic
//!   batch, reporting per-intent conflicts without failing the call.
//! - **Decide** transitions staged intents to committed or aborted state,
//!   materializing committed mutations into the `data` column family.
//! - **Cleanup** removes a fully resolved primary lock record.
//!
//! Presence of a `TxnValue` at a key *is* the lock on that key. Conflict
//! detection is read-then-conditionally-write and therefore optimistic: two
//! prepares racing on the same key can both observe it free, and the engine
//! serializes their batch commits (last writer wins). Callers needing strict
//! mutual exclusion re-check ownership after the batch lands. Lock TTLs are
//! advisory data for other transactions' conflict resolution; this layer
//! never expires a lock on its own.

mod error;
mod lock;
mod store;
mod types;

pub use error::TxnError;
pub use lock::{LockConflict, LockState};
pub use store::TxnStore;
pub use types::{
    DecideOutcome, DecideRequest, Intent, OpKind, PrepareRequest, TxnId, TxnStatus, TxnValue,
};
