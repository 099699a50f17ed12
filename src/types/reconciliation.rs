//! Reconciliation audit records
//!
//! A `ReconciliationRecord` is append-only: it is built once, its fields are
//! read through getters, and `difference` is always derived from the two
//! balances it was built from.

use super::container::{ContainerKind, ContainerRef};
use super::error::EngineError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Reconciliation record identifier
pub type ReconciliationId = Uuid;

/// Immutable audit entry for one reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationRecord {
    id: ReconciliationId,
    account_kind: ContainerKind,
    account_id: String,
    account_name: String,
    system_balance: Decimal,
    actual_balance: Decimal,
    difference: Decimal,
    notes: Option<String>,
    reconciled_at: DateTime<Utc>,
}

impl ReconciliationRecord {
    /// Build a record; `difference` is computed as `actual - system`
    ///
    /// # Errors
    ///
    /// `ArithmeticOverflow` if the difference does not fit in a `Decimal`.
    pub fn new(
        container: &ContainerRef,
        account_name: impl Into<String>,
        system_balance: Decimal,
        actual_balance: Decimal,
        notes: Option<String>,
        reconciled_at: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        let difference = actual_balance
            .checked_sub(system_balance)
            .ok_or_else(|| EngineError::arithmetic_overflow("reconcile", container))?;

        Ok(ReconciliationRecord {
            id: Uuid::new_v4(),
            account_kind: container.kind,
            account_id: container.id.clone(),
            account_name: account_name.into(),
            system_balance,
            actual_balance,
            difference,
            notes,
            reconciled_at,
        })
    }

    pub fn id(&self) -> ReconciliationId {
        self.id
    }

    pub fn container(&self) -> ContainerRef {
        ContainerRef::new(self.account_kind, self.account_id.clone())
    }

    pub fn account_kind(&self) -> ContainerKind {
        self.account_kind
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Balance the system held before the reconciliation
    pub fn system_balance(&self) -> Decimal {
        self.system_balance
    }

    /// Externally counted balance
    pub fn actual_balance(&self) -> Decimal {
        self.actual_balance
    }

    /// Signed adjustment: `actual_balance - system_balance`
    pub fn difference(&self) -> Decimal {
        self.difference
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn reconciled_at(&self) -> DateTime<Utc> {
        self.reconciled_at
    }
}

/// Result of a reconciliation request
///
/// Callers can tell "nothing to do" apart from "adjusted", even though both
/// carry a record.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationOutcome {
    /// The balance was overwritten and the record appended to the audit log
    Adjusted(ReconciliationRecord),
    /// The counted balance matched within tolerance; nothing was mutated or
    /// logged and the record's difference is zero
    AlreadyReconciled(ReconciliationRecord),
}

impl ReconciliationOutcome {
    pub fn record(&self) -> &ReconciliationRecord {
        match self {
            ReconciliationOutcome::Adjusted(record)
            | ReconciliationOutcome::AlreadyReconciled(record) => record,
        }
    }

    pub fn into_record(self) -> ReconciliationRecord {
        match self {
            ReconciliationOutcome::Adjusted(record)
            | ReconciliationOutcome::AlreadyReconciled(record) => record,
        }
    }

    pub fn is_adjusted(&self) -> bool {
        matches!(self, ReconciliationOutcome::Adjusted(_))
    }
}
