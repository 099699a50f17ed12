//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `container`: Container identity, kinds and polarity
//! - `transfer`: Transfer requests, fee policies and the transfer lifecycle
//! - `reconciliation`: Reconciliation audit records
//! - `error`: Error types for the engine

pub mod container;
pub mod error;
pub mod reconciliation;
pub mod transfer;

pub use container::{ContainerKind, ContainerRef, ContainerSnapshot, Polarity, Posting};
pub use error::EngineError;
pub use reconciliation::{ReconciliationId, ReconciliationOutcome, ReconciliationRecord};
pub use transfer::{
    ExecutionMode, FeePolicy, FeeType, Resolution, Transfer, TransferId, TransferRequest,
    TransferStatus,
};
