//! Treasury facade
//!
//! `Treasury` is built once from the injected collaborators and exposes the
//! core operations (transfers, resolution, reconciliation, fee quotes) plus
//! read-only queries over containers and the two audit logs.

use crate::config::EngineConfig;
use crate::core::fee::compute_fee_with_precision;
use crate::core::reconciliation_engine::ReconciliationEngine;
use crate::core::traits::{Clock, ContainerRegistry, ReconciliationLog, TransferLog};
use crate::core::transfer_engine::TransferEngine;
use crate::core::{InMemoryReconciliationLog, InMemoryTransferLog, SystemClock};
use crate::types::{
    ContainerRef, ContainerSnapshot, EngineError, FeePolicy, ReconciliationOutcome,
    ReconciliationRecord, Resolution, Transfer, TransferId, TransferRequest, TransferStatus,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Entry point to the transfer and reconciliation engines
pub struct Treasury {
    registry: Arc<dyn ContainerRegistry>,
    transfer_log: Arc<dyn TransferLog>,
    reconciliation_log: Arc<dyn ReconciliationLog>,
    transfers: TransferEngine,
    reconciliations: ReconciliationEngine,
    config: EngineConfig,
}

impl Treasury {
    /// Create a treasury over the given registry with in-memory logs and the
    /// system clock
    pub fn new(registry: Arc<dyn ContainerRegistry>, config: EngineConfig) -> Self {
        Self::with_collaborators(
            registry,
            Arc::new(InMemoryTransferLog::new()),
            Arc::new(InMemoryReconciliationLog::new()),
            Arc::new(SystemClock),
            config,
        )
    }

    /// Create a treasury from explicit collaborators
    pub fn with_collaborators(
        registry: Arc<dyn ContainerRegistry>,
        transfer_log: Arc<dyn TransferLog>,
        reconciliation_log: Arc<dyn ReconciliationLog>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let transfers = TransferEngine::new(
            Arc::clone(&registry),
            Arc::clone(&transfer_log),
            Arc::clone(&clock),
            &config,
        );
        let reconciliations = ReconciliationEngine::new(
            Arc::clone(&registry),
            Arc::clone(&reconciliation_log),
            clock,
            &config,
        );

        Treasury {
            registry,
            transfer_log,
            reconciliation_log,
            transfers,
            reconciliations,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// See [`TransferEngine::create_transfer`]
    pub fn create_transfer(&self, request: TransferRequest) -> Result<Transfer, EngineError> {
        self.transfers.create_transfer(request)
    }

    /// See [`TransferEngine::resolve_pending`]
    pub fn resolve_pending(
        &self,
        id: TransferId,
        resolution: Resolution,
    ) -> Result<Transfer, EngineError> {
        self.transfers.resolve_pending(id, resolution)
    }

    /// See [`ReconciliationEngine::reconcile`]
    pub fn reconcile(
        &self,
        container: &ContainerRef,
        actual: Decimal,
        notes: Option<String>,
    ) -> Result<ReconciliationOutcome, EngineError> {
        self.reconciliations.reconcile(container, actual, notes)
    }

    /// Quote the fee for `amount` at the configured precision
    pub fn compute_fee(&self, amount: Decimal, policy: &FeePolicy) -> Result<Decimal, EngineError> {
        compute_fee_with_precision(amount, policy, self.config.fee_precision)
    }

    pub fn balance(&self, container: &ContainerRef) -> Result<Decimal, EngineError> {
        self.registry.get_balance(container)
    }

    /// All containers, sorted by reference
    pub fn containers(&self) -> Vec<ContainerSnapshot> {
        self.registry.snapshot()
    }

    pub fn transfer(&self, id: TransferId) -> Option<Transfer> {
        self.transfer_log.get(id)
    }

    /// All transfers in creation order
    pub fn transfers(&self) -> Vec<Transfer> {
        self.transfer_log.list()
    }

    pub fn pending_transfers(&self) -> Vec<Transfer> {
        self.transfer_log
            .list()
            .into_iter()
            .filter(|transfer| transfer.status == TransferStatus::Pending)
            .collect()
    }

    /// All reconciliation records, oldest first
    pub fn reconciliations(&self) -> Vec<ReconciliationRecord> {
        self.reconciliation_log.list()
    }

    pub fn reconciliation_history(&self, container: &ContainerRef) -> Vec<ReconciliationRecord> {
        self.reconciliation_log.history(container)
    }
}
