//! Transfer-related types for the Treasury Engine
//!
//! This module defines fee policies, execution modes, the transfer status
//! lifecycle and the `Transfer` record owned by the transfer log.

use super::container::ContainerRef;
use super::error::EngineError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Transfer identifier
pub type TransferId = Uuid;

/// How a fee is sized from the transferred amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeType {
    /// `value` is a percentage of the amount (2 means 2%)
    Percentage,
    /// `value` is charged as-is
    Fixed,
}

impl FromStr for FeeType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percentage" | "percent" | "%" => Ok(FeeType::Percentage),
            "fixed" => Ok(FeeType::Fixed),
            other => Err(EngineError::parse_error(
                None,
                &format!("unknown fee type '{}'", other),
            )),
        }
    }
}

/// Fee policy attached to a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    #[serde(rename = "type")]
    pub fee_type: FeeType,
    pub value: Decimal,
}

impl FeePolicy {
    pub fn percentage(value: Decimal) -> Self {
        FeePolicy {
            fee_type: FeeType::Percentage,
            value,
        }
    }

    pub fn fixed(value: Decimal) -> Self {
        FeePolicy {
            fee_type: FeeType::Fixed,
            value,
        }
    }

    /// A policy that never charges anything
    pub fn none() -> Self {
        Self::fixed(Decimal::ZERO)
    }
}

impl fmt::Display for FeePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fee_type {
            FeeType::Percentage => write!(f, "{}%", self.value),
            FeeType::Fixed => write!(f, "{} fixed", self.value),
        }
    }
}

/// When the balances of a transfer are moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Balances move synchronously at creation time
    Immediate,
    /// The transfer is recorded as pending and moves nothing until resolved
    Deferred,
}

impl FromStr for ExecutionMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "immediate" => Ok(ExecutionMode::Immediate),
            "deferred" | "pending" => Ok(ExecutionMode::Deferred),
            other => Err(EngineError::parse_error(
                None,
                &format!("unknown execution mode '{}'", other),
            )),
        }
    }
}

/// Lifecycle state of a transfer
///
/// `Pending` is the only non-terminal state. A transfer leaves it at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Successful,
    Failed,
}

impl TransferStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Successful => "successful",
            TransferStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome a caller may assign to a pending transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Successful,
    Failed,
}

impl From<Resolution> for TransferStatus {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Successful => TransferStatus::Successful,
            Resolution::Failed => TransferStatus::Failed,
        }
    }
}

impl FromStr for Resolution {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "successful" | "success" => Ok(Resolution::Successful),
            "failed" | "fail" => Ok(Resolution::Failed),
            other => Err(EngineError::parse_error(
                None,
                &format!("unknown resolution '{}'", other),
            )),
        }
    }
}

/// Everything a caller supplies to request a transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub from: ContainerRef,
    pub to: ContainerRef,
    /// Amount moved to the destination, before the fee
    pub base_amount: Decimal,
    pub fee_policy: FeePolicy,
    pub mode: ExecutionMode,
    pub notes: Option<String>,
}

impl TransferRequest {
    /// An immediate, fee-free transfer; adjust the public fields for anything else
    pub fn new(from: ContainerRef, to: ContainerRef, base_amount: Decimal) -> Self {
        TransferRequest {
            from,
            to,
            base_amount,
            fee_policy: FeePolicy::none(),
            mode: ExecutionMode::Immediate,
            notes: None,
        }
    }

    pub fn with_fee(mut self, fee_policy: FeePolicy) -> Self {
        self.fee_policy = fee_policy;
        self
    }

    pub fn deferred(mut self) -> Self {
        self.mode = ExecutionMode::Deferred;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A recorded transfer between two containers
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub id: TransferId,
    pub from: ContainerRef,
    pub to: ContainerRef,
    /// Amount credited to `to`
    pub base_amount: Decimal,
    pub fee_policy: FeePolicy,
    /// Fee sized at creation time; debited from `from` on top of `base_amount`
    /// and never credited anywhere
    pub fee_amount: Decimal,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}
