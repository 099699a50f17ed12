//! Transfer log
//!
//! This module provides `InMemoryTransferLog`, the default `TransferLog`. It is
//! the single owner of `Transfer` records: entries are appended once and only
//! their status and resolution time ever change afterwards.
//!
//! # Thread Safety
//!
//! Records live in a `DashMap`; `resolve` checks and updates the status while
//! holding the entry's shard lock, which makes the pending-to-terminal
//! transition a compare-and-set.

use crate::core::traits::TransferLog;
use crate::types::{EngineError, Transfer, TransferId, TransferStatus};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct LoggedTransfer {
    /// Insertion sequence, used to list transfers in creation order
    seq: u64,
    transfer: Transfer,
}

/// Thread-safe in-memory transfer log
#[derive(Debug, Default)]
pub struct InMemoryTransferLog {
    transfers: DashMap<TransferId, LoggedTransfer>,
    next_seq: AtomicU64,
}

impl InMemoryTransferLog {
    pub fn new() -> Self {
        Self {
            transfers: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}

impl TransferLog for InMemoryTransferLog {
    fn append(&self, transfer: Transfer) -> Result<(), EngineError> {
        match self.transfers.entry(transfer.id) {
            Entry::Occupied(_) => Err(EngineError::duplicate_transfer(transfer.id)),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(LoggedTransfer { seq, transfer });
                Ok(())
            }
        }
    }

    fn get(&self, id: TransferId) -> Option<Transfer> {
        self.transfers.get(&id).map(|entry| entry.transfer.clone())
    }

    fn resolve(
        &self,
        id: TransferId,
        status: TransferStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<Transfer, EngineError> {
        let mut entry = self
            .transfers
            .get_mut(&id)
            .ok_or_else(|| EngineError::transfer_not_found(id))?;

        let transfer = &mut entry.transfer;
        if transfer.status.is_terminal() {
            return Err(EngineError::already_resolved(id, transfer.status));
        }

        transfer.status = status;
        transfer.resolved_at = Some(resolved_at);
        Ok(transfer.clone())
    }

    fn list(&self) -> Vec<Transfer> {
        let mut logged: Vec<LoggedTransfer> = self
            .transfers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        logged.sort_by_key(|entry| entry.seq);
        logged.into_iter().map(|entry| entry.transfer).collect()
    }
}
