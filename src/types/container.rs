//! Container-related types for the Treasury Engine
//!
//! This module defines the identity of a money container (`ContainerKind`,
//! `ContainerRef`) and the `Polarity` rule that decides what "increasing the
//! balance" means for each kind.

use super::error::EngineError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of balance-holding entities known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    BankAccount,
    CashVault,
    EWallet,
    PrepaidCard,
    CreditCard,
    PosAccount,
    Customer,
}

impl ContainerKind {
    /// All kinds, in sort order
    pub const ALL: [ContainerKind; 7] = [
        ContainerKind::BankAccount,
        ContainerKind::CashVault,
        ContainerKind::EWallet,
        ContainerKind::PrepaidCard,
        ContainerKind::CreditCard,
        ContainerKind::PosAccount,
        ContainerKind::Customer,
    ];

    /// Whether a larger balance means more assets or more debt
    ///
    /// Credit cards track the amount owed; every other kind tracks funds
    /// available (or, for customers, the amount receivable).
    pub fn polarity(self) -> Polarity {
        match self {
            ContainerKind::CreditCard => Polarity::Liability,
            ContainerKind::BankAccount
            | ContainerKind::CashVault
            | ContainerKind::EWallet
            | ContainerKind::PrepaidCard
            | ContainerKind::PosAccount
            | ContainerKind::Customer => Polarity::Asset,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerKind::BankAccount => "bank_account",
            ContainerKind::CashVault => "cash_vault",
            ContainerKind::EWallet => "e_wallet",
            ContainerKind::PrepaidCard => "prepaid_card",
            ContainerKind::CreditCard => "credit_card",
            ContainerKind::PosAccount => "pos_account",
            ContainerKind::Customer => "customer",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerKind {
    type Err = EngineError;

    /// Parse a kind name, accepting both snake_case and camelCase spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "bankaccount" | "bank" => Ok(ContainerKind::BankAccount),
            "cashvault" | "vault" => Ok(ContainerKind::CashVault),
            "ewallet" | "wallet" => Ok(ContainerKind::EWallet),
            "prepaidcard" => Ok(ContainerKind::PrepaidCard),
            "creditcard" => Ok(ContainerKind::CreditCard),
            "posaccount" | "pos" => Ok(ContainerKind::PosAccount),
            "customer" => Ok(ContainerKind::Customer),
            _ => Err(EngineError::parse_error(
                None,
                &format!("unknown container kind '{}'", s.trim()),
            )),
        }
    }
}

/// Direction of a balance change, independent of the container's polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posting {
    /// Value leaves the container (spend, transfer out)
    Debit(Decimal),
    /// Value enters the container (receive, repay)
    Credit(Decimal),
}

/// Meaning of the balance field for a container kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Balance is money the user holds; it may never go below zero
    Asset,
    /// Balance is money the user owes; debits increase it
    Liability,
}

impl Polarity {
    /// Compute the balance that results from applying `posting`
    ///
    /// This is the one place where polarity is branched on. It performs no
    /// mutation; callers write the returned balance back once every posting of
    /// an operation has been validated.
    ///
    /// # Errors
    ///
    /// - `InsufficientFunds` when an asset would drop below zero
    /// - `ArithmeticOverflow` when the result does not fit in a `Decimal`
    pub fn post(
        self,
        container: &ContainerRef,
        balance: Decimal,
        posting: Posting,
    ) -> Result<Decimal, EngineError> {
        let overflow = || EngineError::arithmetic_overflow("post", container);

        match (self, posting) {
            (Polarity::Asset, Posting::Debit(amount)) => {
                if balance < amount {
                    return Err(EngineError::insufficient_funds(container, balance, amount));
                }
                balance.checked_sub(amount).ok_or_else(overflow)
            }
            (Polarity::Asset, Posting::Credit(amount)) => {
                balance.checked_add(amount).ok_or_else(overflow)
            }
            (Polarity::Liability, Posting::Debit(amount)) => {
                balance.checked_add(amount).ok_or_else(overflow)
            }
            // Repaying past zero leaves a credit balance on the card
            (Polarity::Liability, Posting::Credit(amount)) => {
                balance.checked_sub(amount).ok_or_else(overflow)
            }
        }
    }

    /// Check a balance a container is opened with
    ///
    /// # Errors
    ///
    /// `InvalidBalance` for a negative asset balance. Liabilities may open
    /// negative (a credit balance).
    pub fn check_opening_balance(
        self,
        container: &ContainerRef,
        balance: Decimal,
    ) -> Result<(), EngineError> {
        if self == Polarity::Asset && balance < Decimal::ZERO {
            return Err(EngineError::invalid_balance(container, balance));
        }
        Ok(())
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Asset => f.write_str("asset"),
            Polarity::Liability => f.write_str("liability"),
        }
    }
}

/// Identity of a container: its kind plus the id inside that kind's store
///
/// The derived ordering (kind, then id) is the total order used to acquire
/// container locks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerRef {
    pub kind: ContainerKind,
    pub id: String,
}

impl ContainerRef {
    pub fn new(kind: ContainerKind, id: impl Into<String>) -> Self {
        ContainerRef {
            kind,
            id: id.into(),
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.kind.polarity()
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Point-in-time view of a registered container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSnapshot {
    pub container: ContainerRef,
    pub name: String,
    pub balance: Decimal,
}

impl ContainerSnapshot {
    pub fn polarity(&self) -> Polarity {
        self.container.polarity()
    }
}
