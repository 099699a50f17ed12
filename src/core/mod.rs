//! Core business logic module
//!
//! This module contains the transfer and reconciliation components:
//! - `traits` - Trait abstractions for containers, registry, logs and clock
//! - `containers` - One `MoneyContainer` adapter per container kind
//! - `registry` - In-memory container registry
//! - `fee` - Fee calculation
//! - `transfer_engine` - Transfer creation and pending resolution
//! - `reconciliation_engine` - Balance reconciliation
//! - `transfer_log` / `reconciliation_log` - In-memory audit logs
//! - `clock` - System and manual clocks
//! - `treasury` - Facade over all of the above

pub mod clock;
pub mod containers;
pub mod fee;
pub mod reconciliation_engine;
pub mod reconciliation_log;
pub mod registry;
pub mod traits;
pub mod transfer_engine;
pub mod transfer_log;
pub mod treasury;

pub use clock::{ManualClock, SystemClock};
pub use containers::build_container;
pub use fee::{compute_fee, compute_fee_with_precision};
pub use reconciliation_engine::ReconciliationEngine;
pub use reconciliation_log::InMemoryReconciliationLog;
pub use registry::InMemoryRegistry;
pub use traits::{Clock, ContainerRegistry, MoneyContainer, ReconciliationLog, TransferLog};
pub use transfer_engine::TransferEngine;
pub use transfer_log::InMemoryTransferLog;
pub use treasury::Treasury;
