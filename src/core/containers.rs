//! Concrete container adapters
//!
//! Each account store names its balance differently (a bank account has a
//! current balance, a credit card an amount owed, a customer a receivable).
//! The adapters below keep those native names and map them onto the
//! `MoneyContainer` trait, so the engines never need per-kind field lookups.

use crate::core::traits::MoneyContainer;
use crate::types::ContainerKind;
use rust_decimal::Decimal;

/// Bank account
#[derive(Debug, Clone, PartialEq)]
pub struct BankAccount {
    pub id: String,
    pub bank_name: String,
    pub current_balance: Decimal,
}

impl MoneyContainer for BankAccount {
    fn kind(&self) -> ContainerKind {
        ContainerKind::BankAccount
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.bank_name.clone()
    }

    fn balance(&self) -> Decimal {
        self.current_balance
    }

    fn set_balance(&mut self, new_balance: Decimal) {
        self.current_balance = new_balance;
    }
}

/// Physical cash vault
#[derive(Debug, Clone, PartialEq)]
pub struct CashVault {
    pub id: String,
    pub name: String,
    pub balance: Decimal,
}

impl MoneyContainer for CashVault {
    fn kind(&self) -> ContainerKind {
        ContainerKind::CashVault
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn balance(&self) -> Decimal {
        self.balance
    }

    fn set_balance(&mut self, new_balance: Decimal) {
        self.balance = new_balance;
    }
}

/// E-wallet held with a payment provider
#[derive(Debug, Clone, PartialEq)]
pub struct EWallet {
    pub id: String,
    pub provider: String,
    pub wallet_balance: Decimal,
}

impl MoneyContainer for EWallet {
    fn kind(&self) -> ContainerKind {
        ContainerKind::EWallet
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.provider.clone()
    }

    fn balance(&self) -> Decimal {
        self.wallet_balance
    }

    fn set_balance(&mut self, new_balance: Decimal) {
        self.wallet_balance = new_balance;
    }
}

/// Prepaid card
#[derive(Debug, Clone, PartialEq)]
pub struct PrepaidCard {
    pub id: String,
    pub card_name: String,
    pub available_balance: Decimal,
}

impl MoneyContainer for PrepaidCard {
    fn kind(&self) -> ContainerKind {
        ContainerKind::PrepaidCard
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.card_name.clone()
    }

    fn balance(&self) -> Decimal {
        self.available_balance
    }

    fn set_balance(&mut self, new_balance: Decimal) {
        self.available_balance = new_balance;
    }
}

/// Credit card; its balance is the amount owed
///
/// Credit limits are enforced by the card store, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditCard {
    pub id: String,
    pub card_name: String,
    pub amount_owed: Decimal,
}

impl MoneyContainer for CreditCard {
    fn kind(&self) -> ContainerKind {
        ContainerKind::CreditCard
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.card_name.clone()
    }

    fn balance(&self) -> Decimal {
        self.amount_owed
    }

    fn set_balance(&mut self, new_balance: Decimal) {
        self.amount_owed = new_balance;
    }
}

/// Sub-account of a POS machine
#[derive(Debug, Clone, PartialEq)]
pub struct PosAccount {
    pub id: String,
    pub machine_name: String,
    pub settled_balance: Decimal,
}

impl MoneyContainer for PosAccount {
    fn kind(&self) -> ContainerKind {
        ContainerKind::PosAccount
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.machine_name.clone()
    }

    fn balance(&self) -> Decimal {
        self.settled_balance
    }

    fn set_balance(&mut self, new_balance: Decimal) {
        self.settled_balance = new_balance;
    }
}

/// Customer receivable; its balance is what the customer owes the business
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerAccount {
    pub id: String,
    pub customer_name: String,
    pub receivable: Decimal,
}

impl MoneyContainer for CustomerAccount {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Customer
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.customer_name.clone()
    }

    fn balance(&self) -> Decimal {
        self.receivable
    }

    fn set_balance(&mut self, new_balance: Decimal) {
        self.receivable = new_balance;
    }
}

/// Build the adapter for `kind` from canonical fields
pub fn build_container(
    kind: ContainerKind,
    id: impl Into<String>,
    name: impl Into<String>,
    balance: Decimal,
) -> Box<dyn MoneyContainer> {
    let id = id.into();
    let name = name.into();

    match kind {
        ContainerKind::BankAccount => Box::new(BankAccount {
            id,
            bank_name: name,
            current_balance: balance,
        }),
        ContainerKind::CashVault => Box::new(CashVault { id, name, balance }),
        ContainerKind::EWallet => Box::new(EWallet {
            id,
            provider: name,
            wallet_balance: balance,
        }),
        ContainerKind::PrepaidCard => Box::new(PrepaidCard {
            id,
            card_name: name,
            available_balance: balance,
        }),
        ContainerKind::CreditCard => Box::new(CreditCard {
            id,
            card_name: name,
            amount_owed: balance,
        }),
        ContainerKind::PosAccount => Box::new(PosAccount {
            id,
            machine_name: name,
            settled_balance: balance,
        }),
        ContainerKind::Customer => Box::new(CustomerAccount {
            id,
            customer_name: name,
            receivable: balance,
        }),
    }
}
