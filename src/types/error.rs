//! Error types for the Treasury Engine
//!
//! This module defines all error types that can occur while moving or
//! reconciling money, plus the I/O and parse errors of the replay shell.
//! Every variant carries enough context (container, amounts, transfer id) for a
//! caller to render a user-facing message.
//!
//! # Error Categories
//!
//! - **Validation Errors**: invalid amount, same account, fee too large, bad fee policy
//! - **Balance Errors**: insufficient funds, invalid counted balance, overflow
//! - **Lookup Errors**: unknown container or transfer, duplicates
//! - **Lifecycle Errors**: resolving a transfer that is no longer pending
//! - **File I/O / CSV Errors**: raised only by the replay shell

use super::container::ContainerRef;
use super::transfer::{TransferId, TransferStatus};
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the engine
///
/// None of these are retried internally. An operation that returns one of them
/// has left every balance and log unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Transfer amount is zero or negative
    #[error("Invalid amount {amount}: must be greater than zero")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Source and destination are the same container
    #[error("Cannot transfer from {container} to itself")]
    SameAccount {
        /// The container named on both sides
        container: ContainerRef,
    },

    /// The computed fee consumes the whole transferred amount
    #[error("Fee {fee} is not less than the transfer amount {amount}")]
    FeeExceedsAmount {
        /// Computed fee
        fee: Decimal,
        /// Base amount of the transfer
        amount: Decimal,
    },

    /// An asset container cannot cover a debit
    #[error("Insufficient funds in {container}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Container being debited
        container: ContainerRef,
        /// Balance at the time of the check
        available: Decimal,
        /// Total debit that was attempted
        requested: Decimal,
    },

    /// No container is registered under this reference
    #[error("Container {container} not found")]
    ContainerNotFound {
        /// The unknown reference
        container: ContainerRef,
    },

    /// No transfer is recorded under this id
    #[error("Transfer {transfer} not found")]
    TransferNotFound {
        /// The unknown transfer id
        transfer: TransferId,
    },

    /// The transfer already left the pending state
    #[error("Transfer {transfer} is already {status}")]
    AlreadyResolved {
        /// Transfer id
        transfer: TransferId,
        /// Its terminal status
        status: TransferStatus,
    },

    /// A counted balance is negative
    #[error("Invalid balance {balance} for {container}: must not be negative")]
    InvalidBalance {
        /// Container being reconciled
        container: ContainerRef,
        /// The rejected balance
        balance: Decimal,
    },

    /// A fee policy value is negative
    #[error("Invalid fee policy value {value}: must not be negative")]
    InvalidFeePolicy {
        /// The rejected policy value
        value: Decimal,
    },

    /// Arithmetic overflow would occur
    #[error(
        "Arithmetic overflow in {operation}{}",
        .container.as_ref().map(|c| format!(" for {}", c)).unwrap_or_default()
    )]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Container involved, if any
        container: Option<ContainerRef>,
    },

    /// A transfer id is already present in the log
    #[error("Duplicate transfer {transfer}")]
    DuplicateTransfer {
        /// The duplicated id
        transfer: TransferId,
    },

    /// A container reference is already registered
    #[error("Duplicate container {container}")]
    DuplicateContainer {
        /// The duplicated reference
        container: ContainerRef,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl EngineError {
    /// Stable machine-readable code for the error
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidAmount { .. } => "INVALID_AMOUNT",
            EngineError::SameAccount { .. } => "SAME_ACCOUNT",
            EngineError::FeeExceedsAmount { .. } => "FEE_EXCEEDS_AMOUNT",
            EngineError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            EngineError::ContainerNotFound { .. } => "CONTAINER_NOT_FOUND",
            EngineError::TransferNotFound { .. } => "TRANSFER_NOT_FOUND",
            EngineError::AlreadyResolved { .. } => "ALREADY_RESOLVED",
            EngineError::InvalidBalance { .. } => "INVALID_BALANCE",
            EngineError::InvalidFeePolicy { .. } => "INVALID_FEE_POLICY",
            EngineError::ArithmeticOverflow { .. } => "ARITHMETIC_OVERFLOW",
            EngineError::DuplicateTransfer { .. } => "DUPLICATE_TRANSFER",
            EngineError::DuplicateContainer { .. } => "DUPLICATE_CONTAINER",
            EngineError::FileNotFound { .. } => "FILE_NOT_FOUND",
            EngineError::IoError { .. } => "IO_ERROR",
            EngineError::ParseError { .. } => "PARSE_ERROR",
        }
    }
}

// Conversion from io::Error to EngineError
impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to EngineError
impl From<csv::Error> for EngineError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        EngineError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl EngineError {
    pub fn invalid_amount(amount: Decimal) -> Self {
        EngineError::InvalidAmount { amount }
    }

    pub fn same_account(container: &ContainerRef) -> Self {
        EngineError::SameAccount {
            container: container.clone(),
        }
    }

    pub fn fee_exceeds_amount(fee: Decimal, amount: Decimal) -> Self {
        EngineError::FeeExceedsAmount { fee, amount }
    }

    pub fn insufficient_funds(container: &ContainerRef, available: Decimal, requested: Decimal) -> Self {
        EngineError::InsufficientFunds {
            container: container.clone(),
            available,
            requested,
        }
    }

    pub fn container_not_found(container: &ContainerRef) -> Self {
        EngineError::ContainerNotFound {
            container: container.clone(),
        }
    }

    pub fn transfer_not_found(transfer: TransferId) -> Self {
        EngineError::TransferNotFound { transfer }
    }

    pub fn already_resolved(transfer: TransferId, status: TransferStatus) -> Self {
        EngineError::AlreadyResolved { transfer, status }
    }

    pub fn invalid_balance(container: &ContainerRef, balance: Decimal) -> Self {
        EngineError::InvalidBalance {
            container: container.clone(),
            balance,
        }
    }

    pub fn invalid_fee_policy(value: Decimal) -> Self {
        EngineError::InvalidFeePolicy { value }
    }

    pub fn arithmetic_overflow(operation: &str, container: &ContainerRef) -> Self {
        EngineError::ArithmeticOverflow {
            operation: operation.to_string(),
            container: Some(container.clone()),
        }
    }

    /// Overflow in a computation not tied to one container, such as fee sizing
    pub fn arithmetic_overflow_in(operation: &str) -> Self {
        EngineError::ArithmeticOverflow {
            operation: operation.to_string(),
            container: None,
        }
    }

    pub fn duplicate_transfer(transfer: TransferId) -> Self {
        EngineError::DuplicateTransfer { transfer }
    }

    pub fn duplicate_container(container: &ContainerRef) -> Self {
        EngineError::DuplicateContainer {
            container: container.clone(),
        }
    }

    pub fn parse_error(line: Option<u64>, message: &str) -> Self {
        EngineError::ParseError {
            line,
            message: message.to_string(),
        }
    }
}
