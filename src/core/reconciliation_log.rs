//! Append-only reconciliation audit log

use crate::core::traits::ReconciliationLog;
use crate::types::{ContainerRef, EngineError, ReconciliationRecord};
use std::sync::{PoisonError, RwLock};

/// In-memory reconciliation log
///
/// Records are only ever pushed; nothing is updated or removed.
#[derive(Debug, Default)]
pub struct InMemoryReconciliationLog {
    records: RwLock<Vec<ReconciliationRecord>>,
}

impl InMemoryReconciliationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReconciliationLog for InMemoryReconciliationLog {
    fn append(&self, record: ReconciliationRecord) -> Result<(), EngineError> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }

    fn history(&self, container: &ContainerRef) -> Vec<ReconciliationRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| {
                record.account_kind() == container.kind && record.account_id() == container.id
            })
            .cloned()
            .collect()
    }

    fn list(&self) -> Vec<ReconciliationRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
