//! Transfer engine
//!
//! This module provides the TransferEngine that moves value between two money
//! containers by coordinating the container registry, the transfer log and the
//! clock.
//!
//! The engine enforces business rules such as:
//! - Amount and fee validation before any container is touched
//! - Polarity-aware postings (asset debits cannot overdraw, liability debits
//!   grow the amount owed)
//! - A `pending → successful | failed` lifecycle for deferred transfers, where
//!   the terminal transition happens at most once
//!
//! # Locking
//!
//! Both container handles are resolved before any lock is taken. The two
//! container mutexes are then acquired in `ContainerRef` order, and the
//! transfer log is only written while they are held. Balances are written back
//! last, after every check has passed.

use crate::config::EngineConfig;
use crate::core::fee::compute_fee_with_precision;
use crate::core::traits::{
    lock_container, Clock, ContainerHandle, ContainerRegistry, MoneyContainer, TransferLog,
};
use crate::types::{
    ContainerRef, EngineError, ExecutionMode, Posting, Resolution, Transfer, TransferId,
    TransferRequest, TransferStatus,
};
use rust_decimal::Decimal;
use std::sync::{Arc, MutexGuard};
use uuid::Uuid;

type ContainerGuard<'a> = MutexGuard<'a, Box<dyn MoneyContainer>>;

/// Transfer processing engine
///
/// Holds its collaborators as trait objects; it is `Send + Sync` and meant to
/// be shared behind an `Arc`.
pub struct TransferEngine {
    registry: Arc<dyn ContainerRegistry>,
    log: Arc<dyn TransferLog>,
    clock: Arc<dyn Clock>,
    fee_precision: u32,
}

impl TransferEngine {
    /// Create a new TransferEngine
    ///
    /// # Arguments
    ///
    /// * `registry` - Lookup for the containers transfers move value between
    /// * `log` - Owner of every transfer record
    /// * `clock` - Source of `created_at` / `resolved_at`
    /// * `config` - Engine tunables; only the fee precision is used here
    pub fn new(
        registry: Arc<dyn ContainerRegistry>,
        log: Arc<dyn TransferLog>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        TransferEngine {
            registry,
            log,
            clock,
            fee_precision: config.fee_precision,
        }
    }

    /// Create a transfer and, in immediate mode, execute it
    ///
    /// # Arguments
    ///
    /// * `request` - Source, destination, base amount, fee policy, mode, notes
    ///
    /// # Returns
    ///
    /// * `Ok(Transfer)` - `successful` for immediate mode, `pending` for deferred
    /// * `Err(EngineError)` if the transfer was rejected; nothing was mutated
    ///   and nothing was logged
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Source and destination are the same container (`SameAccount`)
    /// - The base amount is not positive (`InvalidAmount`)
    /// - The fee policy is invalid or the fee is not below the amount
    /// - Either container does not exist (`ContainerNotFound`)
    /// - Immediate mode only: the source cannot cover amount plus fee
    ///   (`InsufficientFunds`)
    pub fn create_transfer(&self, request: TransferRequest) -> Result<Transfer, EngineError> {
        let TransferRequest {
            from,
            to,
            base_amount,
            fee_policy,
            mode,
            notes,
        } = request;

        if from == to {
            return Err(EngineError::same_account(&from));
        }

        if base_amount <= Decimal::ZERO {
            return Err(EngineError::invalid_amount(base_amount));
        }

        let fee_amount = compute_fee_with_precision(base_amount, &fee_policy, self.fee_precision)?;
        if fee_amount >= base_amount {
            return Err(EngineError::fee_exceeds_amount(fee_amount, base_amount));
        }

        let from_handle = self.registry.resolve_container(&from)?;
        let to_handle = self.registry.resolve_container(&to)?;

        let now = self.clock.now();
        let mut transfer = Transfer {
            id: Uuid::new_v4(),
            from,
            to,
            base_amount,
            fee_policy,
            fee_amount,
            status: TransferStatus::Pending,
            created_at: now,
            resolved_at: None,
            notes,
        };
        // Amount plus fee must be representable in either mode
        total_debit(&transfer)?;

        match mode {
            ExecutionMode::Deferred => {
                self.log.append(transfer.clone())?;
                tracing::debug!(
                    transfer = %transfer.id,
                    from = %transfer.from,
                    to = %transfer.to,
                    amount = %transfer.base_amount,
                    fee = %transfer.fee_amount,
                    "deferred transfer recorded"
                );
                Ok(transfer)
            }
            ExecutionMode::Immediate => {
                let (mut from_guard, mut to_guard) =
                    lock_pair(&transfer.from, &from_handle, &transfer.to, &to_handle)?;
                let (from_balance, to_balance) =
                    plan_postings(&transfer, from_guard.balance(), to_guard.balance())?;

                transfer.status = TransferStatus::Successful;
                transfer.resolved_at = Some(now);
                self.log.append(transfer.clone())?;

                from_guard.set_balance(from_balance);
                to_guard.set_balance(to_balance);

                tracing::info!(
                    transfer = %transfer.id,
                    from = %transfer.from,
                    to = %transfer.to,
                    amount = %transfer.base_amount,
                    fee = %transfer.fee_amount,
                    "transfer executed"
                );
                Ok(transfer)
            }
        }
    }

    /// Resolve a pending transfer
    ///
    /// A `Successful` resolution re-validates the source balance as it is now
    /// and applies the postings with the fee stored at creation. A `Failed`
    /// resolution only records the outcome.
    ///
    /// # Arguments
    ///
    /// * `id` - The pending transfer
    /// * `resolution` - Outcome to assign
    ///
    /// # Returns
    ///
    /// * `Ok(Transfer)` - The transfer in its terminal state
    /// * `Err(EngineError)` if the resolution was rejected
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transfer does not exist (`TransferNotFound`)
    /// - The transfer is not pending, including when a concurrent resolution
    ///   won the race (`AlreadyResolved`)
    /// - A successful resolution cannot be covered (`InsufficientFunds`); the
    ///   transfer then stays pending
    pub fn resolve_pending(
        &self,
        id: TransferId,
        resolution: Resolution,
    ) -> Result<Transfer, EngineError> {
        let transfer = self
            .log
            .get(id)
            .ok_or_else(|| EngineError::transfer_not_found(id))?;

        if transfer.status.is_terminal() {
            return Err(EngineError::already_resolved(id, transfer.status));
        }

        match resolution {
            Resolution::Failed => {
                let resolved = self.log.resolve(id, TransferStatus::Failed, self.clock.now())?;
                tracing::info!(transfer = %id, "pending transfer failed");
                Ok(resolved)
            }
            Resolution::Successful => {
                let from_handle = self.registry.resolve_container(&transfer.from)?;
                let to_handle = self.registry.resolve_container(&transfer.to)?;

                let (mut from_guard, mut to_guard) =
                    lock_pair(&transfer.from, &from_handle, &transfer.to, &to_handle)?;
                let (from_balance, to_balance) =
                    plan_postings(&transfer, from_guard.balance(), to_guard.balance())?;

                // Claim the transfer; a loser of the race leaves balances alone
                let resolved =
                    self.log
                        .resolve(id, TransferStatus::Successful, self.clock.now())?;

                from_guard.set_balance(from_balance);
                to_guard.set_balance(to_balance);

                tracing::info!(
                    transfer = %id,
                    from = %resolved.from,
                    to = %resolved.to,
                    amount = %resolved.base_amount,
                    fee = %resolved.fee_amount,
                    "pending transfer executed"
                );
                Ok(resolved)
            }
        }
    }
}

/// Amount debited from the source: base amount plus fee
fn total_debit(transfer: &Transfer) -> Result<Decimal, EngineError> {
    transfer
        .base_amount
        .checked_add(transfer.fee_amount)
        .ok_or_else(|| EngineError::arithmetic_overflow("total_debit", &transfer.from))
}

/// Compute the post-transfer balances of source and destination
///
/// Nothing is written; both postings must succeed before the caller applies
/// either.
fn plan_postings(
    transfer: &Transfer,
    from_balance: Decimal,
    to_balance: Decimal,
) -> Result<(Decimal, Decimal), EngineError> {
    let new_from = transfer.from.polarity().post(
        &transfer.from,
        from_balance,
        Posting::Debit(total_debit(transfer)?),
    )?;
    let new_to = transfer.to.polarity().post(
        &transfer.to,
        to_balance,
        Posting::Credit(transfer.base_amount),
    )?;
    Ok((new_from, new_to))
}

/// Lock source and destination in `ContainerRef` order
///
/// Returns the guards as `(from, to)` regardless of acquisition order.
fn lock_pair<'a>(
    from: &ContainerRef,
    from_handle: &'a ContainerHandle,
    to: &ContainerRef,
    to_handle: &'a ContainerHandle,
) -> Result<(ContainerGuard<'a>, ContainerGuard<'a>), EngineError> {
    // A registry mapping two refs onto one container would self-deadlock below
    if Arc::ptr_eq(from_handle, to_handle) {
        return Err(EngineError::same_account(from));
    }

    if from < to {
        let from_guard = lock_container(from_handle);
        let to_guard = lock_container(to_handle);
        Ok((from_guard, to_guard))
    } else {
        let to_guard = lock_container(to_handle);
        let from_guard = lock_container(from_handle);
        Ok((from_guard, to_guard))
    }
}
