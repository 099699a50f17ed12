//! Core traits for containers, their registry, the audit logs and the clock
//!
//! The transfer and reconciliation engines depend only on these traits. Concrete
//! stores are injected once at construction, so new account kinds or storage
//! backends can be added without touching the engines.

use crate::types::{
    ContainerKind, ContainerRef, ContainerSnapshot, EngineError, ReconciliationRecord, Transfer,
    TransferId, TransferStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Uniform view over any account-like entity
///
/// Implementations translate their native field names to this shape once; the
/// engines never look at a concrete kind. A container does not validate, log or
/// compute fees: `set_balance` simply stores the value it is given.
pub trait MoneyContainer: Send + Debug {
    fn kind(&self) -> ContainerKind;

    fn id(&self) -> &str;

    /// Human-readable label, denormalized into audit records
    fn display_name(&self) -> String;

    fn balance(&self) -> Decimal;

    fn set_balance(&mut self, new_balance: Decimal);

    fn container_ref(&self) -> ContainerRef {
        ContainerRef::new(self.kind(), self.id())
    }
}

/// Shared, individually lockable container
pub type ContainerHandle = Arc<Mutex<Box<dyn MoneyContainer>>>;

/// Lock a container handle
///
/// Balances are only written after every check of an operation has passed, so
/// a guard poisoned by a panicking holder still protects a consistent value and
/// is recovered rather than propagated.
pub fn lock_container(handle: &ContainerHandle) -> MutexGuard<'_, Box<dyn MoneyContainer>> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lookup of containers by `(kind, id)`
pub trait ContainerRegistry: Send + Sync {
    /// Resolve a reference to its lockable handle
    fn resolve_container(&self, container: &ContainerRef) -> Result<ContainerHandle, EngineError>;

    /// Every container, sorted by reference
    ///
    /// Each container is read under its own lock; the snapshot as a whole is
    /// not atomic across containers.
    fn snapshot(&self) -> Vec<ContainerSnapshot>;

    /// Read a container's balance under its lock
    fn get_balance(&self, container: &ContainerRef) -> Result<Decimal, EngineError> {
        let handle = self.resolve_container(container)?;
        let guard = lock_container(&handle);
        Ok(guard.balance())
    }

    /// Overwrite a container's balance under its lock
    fn set_balance(&self, container: &ContainerRef, new_balance: Decimal) -> Result<(), EngineError> {
        let handle = self.resolve_container(container)?;
        let mut guard = lock_container(&handle);
        guard.set_balance(new_balance);
        Ok(())
    }
}

/// Persistence sink for transfers
pub trait TransferLog: Send + Sync {
    /// Record a newly created transfer
    fn append(&self, transfer: Transfer) -> Result<(), EngineError>;

    fn get(&self, id: TransferId) -> Option<Transfer>;

    /// Move a pending transfer to a terminal status
    ///
    /// This is a compare-and-set: it fails with `AlreadyResolved` when the
    /// transfer is no longer pending, so at most one caller ever wins.
    fn resolve(
        &self,
        id: TransferId,
        status: TransferStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<Transfer, EngineError>;

    /// All transfers in creation order
    fn list(&self) -> Vec<Transfer>;
}

/// Append-only sink for reconciliation records
pub trait ReconciliationLog: Send + Sync {
    fn append(&self, record: ReconciliationRecord) -> Result<(), EngineError>;

    /// Records for one container, oldest first
    fn history(&self, container: &ContainerRef) -> Vec<ReconciliationRecord>;

    /// All records, oldest first
    fn list(&self) -> Vec<ReconciliationRecord>;
}

/// Source of timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
