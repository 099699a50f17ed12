//! Reconciliation engine
//!
//! Aligns a container's system balance with an externally counted balance and
//! records the signed adjustment in the reconciliation log. The container lock
//! is held from the balance read until the balance write, so a concurrent
//! transfer cannot slip in between.

use crate::config::EngineConfig;
use crate::core::traits::{lock_container, Clock, ContainerRegistry, ReconciliationLog};
use crate::types::{ContainerRef, EngineError, ReconciliationOutcome, ReconciliationRecord};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Balance reconciliation engine
pub struct ReconciliationEngine {
    registry: Arc<dyn ContainerRegistry>,
    log: Arc<dyn ReconciliationLog>,
    clock: Arc<dyn Clock>,
    epsilon: Decimal,
}

impl ReconciliationEngine {
    pub fn new(
        registry: Arc<dyn ContainerRegistry>,
        log: Arc<dyn ReconciliationLog>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        ReconciliationEngine {
            registry,
            log,
            clock,
            epsilon: config.reconciliation_epsilon,
        }
    }

    /// Reconcile a container against a counted balance
    ///
    /// # Arguments
    ///
    /// * `container` - The container to reconcile
    /// * `actual` - Externally counted balance; must be non-negative
    /// * `notes` - Free text stored on the audit record
    ///
    /// # Returns
    ///
    /// * `Ok(ReconciliationOutcome::Adjusted(record))` - the record was
    ///   appended and the balance set to `actual`
    /// * `Ok(ReconciliationOutcome::AlreadyReconciled(record))` - the
    ///   difference was below epsilon; the record (difference zero) was not
    ///   appended and nothing changed
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `actual` is negative (`InvalidBalance`)
    /// - The container does not exist (`ContainerNotFound`)
    pub fn reconcile(
        &self,
        container: &ContainerRef,
        actual: Decimal,
        notes: Option<String>,
    ) -> Result<ReconciliationOutcome, EngineError> {
        if actual < Decimal::ZERO {
            return Err(EngineError::invalid_balance(container, actual));
        }

        let handle = self.registry.resolve_container(container)?;
        let mut guard = lock_container(&handle);

        let system = guard.balance();
        let name = guard.display_name();
        let now = self.clock.now();

        let difference = actual
            .checked_sub(system)
            .ok_or_else(|| EngineError::arithmetic_overflow("reconcile", container))?;
        if difference.abs() < self.epsilon {
            tracing::debug!(
                container = %container,
                system = %system,
                actual = %actual,
                "container already reconciled"
            );
            let record = ReconciliationRecord::new(container, name, system, system, notes, now)?;
            return Ok(ReconciliationOutcome::AlreadyReconciled(record));
        }

        let record = ReconciliationRecord::new(container, name, system, actual, notes, now)?;
        self.log.append(record.clone())?;
        guard.set_balance(actual);

        tracing::info!(
            container = %container,
            system = %system,
            actual = %actual,
            difference = %record.difference(),
            "balance reconciled"
        );
        Ok(ReconciliationOutcome::Adjusted(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::containers::build_container;
    use crate::core::reconciliation_log::InMemoryReconciliationLog;
    use crate::core::registry::InMemoryRegistry;
    use crate::core::transfer_engine::TransferEngine;
    use crate::core::transfer_log::InMemoryTransferLog;
    use crate::types::{ContainerKind, TransferRequest};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use std::thread;

    struct Fixture {
        engine: ReconciliationEngine,
        registry: Arc<InMemoryRegistry>,
        log: Arc<InMemoryReconciliationLog>,
    }

    fn fixture(kind: ContainerKind, id: &str, name: &str, balance: Decimal) -> Fixture {
        let registry = Arc::new(InMemoryRegistry::new());
        registry
            .register(build_container(kind, id, name, balance))
            .unwrap();
        let log = Arc::new(InMemoryReconciliationLog::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 6, 30, 17, 0, 0).unwrap(),
        ));
        let engine = ReconciliationEngine::new(
            registry.clone(),
            log.clone(),
            clock,
            &EngineConfig::default(),
        );
        Fixture {
            engine,
            registry,
            log,
        }
    }

    fn bank() -> ContainerRef {
        ContainerRef::new(ContainerKind::BankAccount, "acc-7")
    }

    #[test]
    fn test_reconcile_adjusts_balance() {
        let fx = fixture(ContainerKind::BankAccount, "acc-7", "Main Bank", Decimal::new(2300, 0));

        let outcome = fx
            .engine
            .reconcile(&bank(), Decimal::new(2500, 0), Some("month end".to_string()))
            .unwrap();

        assert!(outcome.is_adjusted());
        let record = outcome.record();
        assert_eq!(record.system_balance(), Decimal::new(2300, 0));
        assert_eq!(record.actual_balance(), Decimal::new(2500, 0));
        assert_eq!(record.difference(), Decimal::new(200, 0));
        assert_eq!(record.account_name(), "Main Bank");
        assert_eq!(record.notes(), Some("month end"));
        assert_eq!(fx.registry.get_balance(&bank()).unwrap(), Decimal::new(2500, 0));
        assert_eq!(fx.log.list(), vec![record.clone()]);
    }

    #[test]
    fn test_negative_difference_is_recorded() {
        let fx = fixture(ContainerKind::BankAccount, "acc-7", "Main Bank", Decimal::new(2300, 0));

        let outcome = fx.engine.reconcile(&bank(), Decimal::new(2000, 0), None).unwrap();

        assert_eq!(outcome.record().difference(), Decimal::new(-300, 0));
        assert_eq!(fx.registry.get_balance(&bank()).unwrap(), Decimal::new(2000, 0));
    }

    #[test]
    fn test_second_reconcile_is_a_no_op() {
        let fx = fixture(ContainerKind::BankAccount, "acc-7", "Main Bank", Decimal::new(2300, 0));

        fx.engine.reconcile(&bank(), Decimal::new(2500, 0), None).unwrap();
        let second = fx.engine.reconcile(&bank(), Decimal::new(2500, 0), None).unwrap();

        assert!(!second.is_adjusted());
        assert_eq!(second.record().difference(), Decimal::ZERO);
        assert_eq!(fx.log.len(), 1);
        assert_eq!(fx.registry.get_balance(&bank()).unwrap(), Decimal::new(2500, 0));
    }

    #[rstest]
    #[case::within_epsilon(Decimal::new(100000, 2), Decimal::new(100001, 2) - Decimal::new(1, 3), false)]
    #[case::exactly_epsilon(Decimal::new(100000, 2), Decimal::new(100001, 2), true)]
    #[case::below_by_epsilon(Decimal::new(100000, 2), Decimal::new(99999, 2), true)]
    #[case::far_off(Decimal::new(100000, 2), Decimal::new(120000, 2), true)]
    fn test_epsilon_boundary(
        #[case] system: Decimal,
        #[case] actual: Decimal,
        #[case] adjusted: bool,
    ) {
        let fx = fixture(ContainerKind::BankAccount, "acc-7", "Main Bank", system);

        let outcome = fx.engine.reconcile(&bank(), actual, None).unwrap();

        assert_eq!(outcome.is_adjusted(), adjusted);
        let expected = if adjusted { actual } else { system };
        assert_eq!(fx.registry.get_balance(&bank()).unwrap(), expected);
        assert_eq!(fx.log.len(), usize::from(adjusted));
    }

    #[test]
    fn test_negative_actual_is_rejected() {
        let fx = fixture(ContainerKind::BankAccount, "acc-7", "Main Bank", Decimal::new(10, 0));

        let result = fx.engine.reconcile(&bank(), Decimal::new(-1, 0), None);

        assert_eq!(
            result.unwrap_err(),
            EngineError::invalid_balance(&bank(), Decimal::new(-1, 0))
        );
        assert!(fx.log.is_empty());
    }

    #[test]
    fn test_unknown_container() {
        let fx = fixture(ContainerKind::BankAccount, "acc-7", "Main Bank", Decimal::new(10, 0));
        let missing = ContainerRef::new(ContainerKind::CashVault, "acc-7");

        assert_eq!(
            fx.engine.reconcile(&missing, Decimal::ONE, None).unwrap_err(),
            EngineError::container_not_found(&missing)
        );
    }

    #[test]
    fn test_reconcile_credit_card_sets_amount_owed() {
        let fx = fixture(ContainerKind::CreditCard, "card-9", "Visa", Decimal::new(450, 0));
        let card = ContainerRef::new(ContainerKind::CreditCard, "card-9");

        let outcome = fx.engine.reconcile(&card, Decimal::new(480, 0), None).unwrap();

        assert_eq!(outcome.record().difference(), Decimal::new(30, 0));
        assert_eq!(fx.registry.get_balance(&card).unwrap(), Decimal::new(480, 0));
    }

    #[test]
    fn test_reconcile_serializes_with_concurrent_transfers() {
        let fx = fixture(ContainerKind::CashVault, "vault-1", "Safe", Decimal::new(1000, 0));
        fx.registry
            .register(build_container(ContainerKind::EWallet, "wallet-2", "PayWallet", Decimal::ZERO))
            .unwrap();
        let vault = ContainerRef::new(ContainerKind::CashVault, "vault-1");
        let wallet = ContainerRef::new(ContainerKind::EWallet, "wallet-2");

        let transfers = Arc::new(TransferEngine::new(
            fx.registry.clone(),
            Arc::new(InMemoryTransferLog::new()),
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 6, 30, 17, 0, 0).unwrap())),
            &EngineConfig::default(),
        ));
        let reconciler = Arc::new(fx.engine);

        let transfer_threads: Vec<_> = (0..8)
            .map(|_| {
                let transfers = Arc::clone(&transfers);
                let (vault, wallet) = (vault.clone(), wallet.clone());
                thread::spawn(move || {
                    (0..50)
                        .filter(|_| {
                            transfers
                                .create_transfer(TransferRequest::new(vault.clone(), wallet.clone(), Decimal::TEN))
                                .is_ok()
                        })
                        .count()
                })
            })
            .collect();
        let reconcile_threads: Vec<_> = (0..2)
            .map(|_| {
                let reconciler = Arc::clone(&reconciler);
                let vault = vault.clone();
                thread::spawn(move || {
                    for _ in 0..20 {
                        reconciler.reconcile(&vault, Decimal::new(1000, 0), None).unwrap();
                    }
                })
            })
            .collect();

        let moved: usize = transfer_threads
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .sum();
        for handle in reconcile_threads {
            handle.join().unwrap();
        }

        let records = fx.log.list();
        let adjustments: Decimal = records.iter().map(|record| record.difference()).sum();
        let vault_balance = fx.registry.get_balance(&vault).unwrap();
        let wallet_balance = fx.registry.get_balance(&wallet).unwrap();

        // Every transfer and every adjustment is reflected exactly once
        assert_eq!(wallet_balance, Decimal::TEN * Decimal::from(moved));
        assert_eq!(vault_balance + wallet_balance, Decimal::new(1000, 0) + adjustments);

        // Reachable vault balances are multiples of 10 between 0 and 1000
        assert!(vault_balance >= Decimal::ZERO && vault_balance <= Decimal::new(1000, 0));
        assert_eq!(vault_balance % Decimal::TEN, Decimal::ZERO);
        for record in &records {
            let system = record.system_balance();
            assert!(system >= Decimal::ZERO && system < Decimal::new(1000, 0));
            assert_eq!(system % Decimal::TEN, Decimal::ZERO);
            assert_eq!(record.actual_balance(), Decimal::new(1000, 0));
        }
    }
}
