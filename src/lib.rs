//! Treasury Engine Library
//! # Overview
//!
//! This library moves value between heterogeneous money containers and
//! reconciles their recorded balances against counted ones.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (containers, transfers, reconciliation records, errors)
//! - [`config`] - Engine tunables
//! - [`core`] - Business logic components:
//!   - [`core::transfer_engine`] - Transfer creation and pending resolution
//!   - [`core::reconciliation_engine`] - Balance reconciliation
//!   - [`core::registry`] - Container registry with per-container locks
//!   - [`core::treasury`] - Facade over the engines and their logs
//! - [`io`] - CSV handling for the replay files
//! - [`replay`] - Runs an operations file against a set of containers
//! - [`cli`] / [`logging`] - Command-line and tracing setup for the binary
//!
//! # Containers
//!
//! Every container kind is an asset (its balance is money held or receivable)
//! except `credit_card`, which is a liability (its balance is the amount
//! owed). Spending from a credit card increases its balance; paying it off
//! decreases it.
//!
//! # Transfers
//!
//! A transfer debits `amount + fee` from the source and credits `amount` to
//! the destination; the fee leaves the system. Transfers run either
//! immediately or deferred, in which case they stay pending until resolved
//! as successful (balances move, re-validated at that moment) or failed.
//!
//! # Reconciliation
//!
//! Reconciling sets a container's balance to an externally counted amount and
//! appends an immutable record of the signed difference. Differences below the
//! configured epsilon are a no-op.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod replay;
pub mod types;

pub use config::EngineConfig;
pub use crate::core::{InMemoryRegistry, Treasury};
pub use types::{
    ContainerKind, ContainerRef, EngineError, ExecutionMode, FeePolicy, FeeType, Resolution,
    Transfer, TransferId, TransferRequest, TransferStatus,
};
