// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The intent store: lock inspection and the prepare / decide / cleanup
//! coordinators.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::row::encode::{decode_version, row_with_version};
use crate::storage::{ColumnFamily, Key, KvEngine, WriteBatch};

use super::error::TxnError;
use super::lock::{LockConflict, LockState};
use super::types::{
    DecideOutcome, DecideRequest, Intent, OpKind, PrepareRequest, TxnId, TxnStatus, TxnValue,
};

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The transactional intent store over a key-value engine.
///
/// All mutation paths stage into a [`WriteBatch`] owned by the call and commit
/// it at most once; atomicity of a prepare or decide rests entirely on the
/// engine's batch commit. Calls are synchronous and run to completion.
pub struct TxnStore<E: KvEngine> {
    engine: Arc<E>,
}

impl<E: KvEngine> TxnStore<E> {
    /// Creates a store over the given engine.
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Returns the underlying engine.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Loads and decodes the lock record at `key`, if any.
    ///
    /// Bytes that exist but fail to decode are corruption, never absence.
    fn get_txn_value(&self, key: &[u8]) -> Result<Option<TxnValue>, TxnError> {
        let buf = match self.engine.get(ColumnFamily::Txn, key)? {
            Some(buf) => buf,
            None => return Ok(None),
        };
        let value = TxnValue::decode(&buf)?;
        if value.intent.key.as_bytes() != key {
            return Err(TxnError::Corruption(format!(
                "lock record at {key:?} claims key {:?}",
                value.intent.key
            )));
        }
        Ok(Some(value))
    }

    fn stage_txn_value(&self, value: &TxnValue, batch: &mut WriteBatch) -> Result<(), TxnError> {
        let buf = value.encode()?;
        batch.put(ColumnFamily::Txn, value.intent.key.as_bytes().to_vec(), buf);
        Ok(())
    }

    /// Lock inspector: determines whether `key` is free, held by the
    /// requesting transaction, or held by a conflicting one.
    pub fn inspect(&self, key: &Key, txn_id: &TxnId) -> Result<LockState, TxnError> {
        match self.get_txn_value(key.as_bytes())? {
            None => Ok(LockState::Free),
            Some(value) if value.txn_id == *txn_id => Ok(LockState::OwnedBySelf),
            Some(value) => Ok(LockState::Conflict(LockConflict::from_value(
                &value,
                unix_ms(),
            ))),
        }
    }

    /// Evaluates an intent's declared preconditions against committed state.
    ///
    /// Returns `Ok(Some(err))` for a business-level precondition failure and
    /// `Err` for systemic failures (engine I/O, corrupt committed row).
    fn check_preconditions(&self, intent: &Intent) -> Result<Option<TxnError>, TxnError> {
        let committed = self.engine.get(ColumnFamily::Data, intent.key.as_bytes())?;

        if intent.check_unique && committed.is_some() {
            return Ok(Some(TxnError::UniqueViolation {
                key: intent.key.clone(),
            }));
        }

        if let Some(expected) = intent.expected_version {
            let actual = match &committed {
                Some(buf) => decode_version(buf)?,
                None => 0,
            };
            if actual != expected {
                return Ok(Some(TxnError::VersionMismatch {
                    key: intent.key.clone(),
                    expected,
                    actual,
                }));
            }
        }

        Ok(None)
    }

    /// Stages one intent. `Ok(Some(err))` is a per-intent business error;
    /// `Ok(None)` means staged (or already staged by this transaction).
    fn prepare_intent(
        &self,
        req: &PrepareRequest,
        intent: &Intent,
        batch: &mut WriteBatch,
    ) -> Result<Option<TxnError>, TxnError> {
        match self.inspect(&intent.key, &req.txn_id)? {
            LockState::OwnedBySelf => return Ok(None), // idempotent re-prepare
            LockState::Conflict(conflict) => {
                return Ok(Some(TxnError::Locked(Box::new(conflict))));
            }
            LockState::Free => {}
        }

        if intent.check_unique || intent.expected_version.is_some() {
            if let Some(err) = self.check_preconditions(intent)? {
                return Ok(Some(err));
            }
        }

        let value = TxnValue {
            txn_id: req.txn_id.clone(),
            intent: intent.clone(),
            primary_key: req.primary_key.clone(),
            version: req.version,
            expired_at: unix_ms().saturating_add(req.lock_ttl_ms),
            secondary_keys: if intent.is_primary {
                req.secondary_keys.clone()
            } else {
                Vec::new()
            },
            status: TxnStatus::Init,
        };
        self.stage_txn_value(&value, batch)
            .map(|_| None)
    }

    /// Phase 1: stages every intent of the transaction into one atomic batch.
    ///
    /// Per-intent conflicts (`Locked`, precondition failures) are collected
    /// and returned as `Ok(errors)`; intents are processed in the supplied
    /// order. A systemic failure (engine I/O, corruption) discards the
    /// collected list and fails the call.
    ///
    /// The batch is committed only when no `Locked` conflict was observed
    /// against the primary intent; otherwise nothing is written and the
    /// coordinator decides how to retry.
    pub fn prepare(&self, req: &PrepareRequest) -> Result<Vec<TxnError>, TxnError> {
        let mut errors = Vec::new();
        let mut primary_lockable = true;
        let mut batch = WriteBatch::new();

        for intent in &req.intents {
            match self.prepare_intent(req, intent, &mut batch)? {
                None => {}
                Some(err) => {
                    debug_assert!(err.is_per_intent());
                    if intent.is_primary && matches!(err, TxnError::Locked(_)) {
                        primary_lockable = false;
                    }
                    errors.push(err);
                }
            }
        }

        if primary_lockable {
            debug!(
                txn_id = %req.txn_id,
                intents = req.intents.len(),
                conflicts = errors.len(),
                "committing prepare batch"
            );
            // A write failure here supersedes the collected per-intent errors.
            self.engine.write(batch)?;
        } else {
            warn!(
                txn_id = %req.txn_id,
                conflicts = errors.len(),
                "primary not lockable, prepare batch discarded"
            );
        }

        Ok(errors)
    }

    /// Applies a committed intent's effect to the `data` column family.
    fn materialize(
        &self,
        intent: &Intent,
        version: u64,
        batch: &mut WriteBatch,
    ) -> Result<(), TxnError> {
        match intent.op {
            OpKind::Insert | OpKind::Update => {
                let payload = intent.value.as_ref().ok_or_else(|| {
                    TxnError::Corruption(format!(
                        "staged {:?} intent at {:?} has no value",
                        intent.op, intent.key
                    ))
                })?;
                batch.put(
                    ColumnFamily::Data,
                    intent.key.as_bytes().to_vec(),
                    row_with_version(version, payload.as_bytes()),
                );
            }
            OpKind::Delete => {
                batch.delete(ColumnFamily::Data, intent.key.as_bytes().to_vec());
            }
        }
        Ok(())
    }

    fn decide_primary(
        &self,
        value: &TxnValue,
        status: TxnStatus,
        batch: &mut WriteBatch,
    ) -> Result<(), TxnError> {
        if value.status != TxnStatus::Init {
            if value.status != status {
                // The decision was already made differently; a protocol
                // violation by the caller, surfaced loudly.
                return Err(TxnError::StatusConflict {
                    existing: value.status,
                });
            }
            return Ok(()); // already decided the same way
        }

        let mut updated = value.clone();
        updated.status = status;
        // The primary record stays until cleanup; only its status changes.
        self.stage_txn_value(&updated, batch)?;

        if status == TxnStatus::Committed {
            self.materialize(&value.intent, value.version, batch)?;
        }
        Ok(())
    }

    fn decide_secondary(
        &self,
        value: &TxnValue,
        status: TxnStatus,
        batch: &mut WriteBatch,
    ) -> Result<(), TxnError> {
        // Secondary locks are not retained past the decision.
        batch.delete(ColumnFamily::Txn, value.intent.key.as_bytes().to_vec());
        if status == TxnStatus::Committed {
            self.materialize(&value.intent, value.version, batch)?;
        }
        Ok(())
    }

    fn decide_key(
        &self,
        req: &DecideRequest,
        key: &Key,
        batch: &mut WriteBatch,
        outcome: &mut DecideOutcome,
    ) -> Result<(), TxnError> {
        let value = match self.get_txn_value(key.as_bytes())? {
            // Already resolved (e.g. cleaned up); decide is idempotent.
            None => return Ok(()),
            Some(value) => value,
        };
        if value.txn_id != req.txn_id {
            // A different transaction owns this key now; nothing to do.
            return Ok(());
        }

        if value.intent.is_primary {
            self.decide_primary(&value, req.status, batch)?;
        } else {
            self.decide_secondary(&value, req.status, batch)?;
        }

        if value.intent.op == OpKind::Insert {
            let value_len = value.intent.value.as_ref().map_or(0, |v| v.len());
            outcome.bytes_written += (value.intent.key.len() + value_len) as u64;
        }
        if req.recover {
            outcome
                .secondary_keys
                .extend(value.secondary_keys.iter().cloned());
        }
        Ok(())
    }

    /// Phase 2: transitions staged intents to committed or aborted state.
    ///
    /// All keys resolve into one atomic batch; any per-key error aborts the
    /// whole call with nothing written and zero bytes accounted. Unlike
    /// prepare there is no partial reporting — an inconsistency here is a
    /// protocol-level bug.
    pub fn decide(&self, req: &DecideRequest) -> Result<DecideOutcome, TxnError> {
        if !matches!(req.status, TxnStatus::Committed | TxnStatus::Aborted) {
            return Err(TxnError::InvalidArgument(format!(
                "decide status must be Committed or Aborted, got {:?}",
                req.status
            )));
        }

        let mut outcome = DecideOutcome::default();
        let mut batch = WriteBatch::new();
        for key in &req.keys {
            self.decide_key(req, key, &mut batch, &mut outcome)?;
        }

        debug!(
            txn_id = %req.txn_id,
            status = ?req.status,
            keys = req.keys.len(),
            bytes_written = outcome.bytes_written,
            "committing decide batch"
        );
        self.engine.write(batch)?;
        Ok(outcome)
    }

    /// Phase 3: removes a fully resolved primary lock record.
    ///
    /// Issued by the coordinator once the transaction's outcome is durably
    /// known everywhere. A missing record or a record owned by a newer
    /// transaction is success; a non-primary target is a malformed request.
    /// An undecided (still `Init`) primary is rejected: its removal would
    /// erase the authoritative record of an in-flight transaction.
    pub fn cleanup(&self, txn_id: &TxnId, primary_key: &Key) -> Result<(), TxnError> {
        let value = match self.get_txn_value(primary_key.as_bytes())? {
            None => return Ok(()), // already cleaned
            Some(value) => value,
        };
        if value.txn_id != *txn_id {
            return Ok(()); // a newer transaction owns the key now
        }
        if !value.intent.is_primary {
            return Err(TxnError::InvalidArgument(
                "cleanup target key is not a primary lock".to_string(),
            ));
        }
        if value.status == TxnStatus::Init {
            return Err(TxnError::InvalidArgument(format!(
                "cleanup of undecided transaction {txn_id}"
            )));
        }

        debug!(txn_id = %txn_id, key = ?primary_key, status = ?value.status, "cleaning up primary lock");
        self.engine.delete(ColumnFamily::Txn, primary_key.as_bytes())?;
        Ok(())
    }
}
