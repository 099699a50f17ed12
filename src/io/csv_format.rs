//! CSV format handling for the replay files
//!
//! This module centralizes all CSV format concerns, providing:
//! - `ContainerRecord` / `OperationRecord` structures for deserialization
//! - Conversion from CSV records to domain types
//! - Balance, transfer and reconciliation output serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::core::build_container;
use crate::core::MoneyContainer;
use crate::types::{
    ContainerKind, ContainerRef, ContainerSnapshot, EngineError, ExecutionMode, FeePolicy,
    FeeType, ReconciliationRecord, Resolution, Transfer, TransferId, TransferRequest,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Write;
use std::str::FromStr;

/// One row of the containers file
///
/// Columns: kind, id, name, balance. The account-store spellings
/// (`account_kind`, `accountId`, `current_balance`, ...) are accepted as well.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ContainerRecord {
    #[serde(alias = "account_kind", alias = "accountKind")]
    pub kind: String,
    #[serde(alias = "account_id", alias = "accountId")]
    pub id: String,
    #[serde(default, alias = "account_name", alias = "accountName")]
    pub name: Option<String>,
    #[serde(alias = "current_balance", alias = "currentBalance")]
    pub balance: String,
}

/// One row of the operations file
///
/// Columns: op, kind, id, to_kind, to_id, amount, fee_type, fee_value, mode,
/// ref, outcome, notes. Which columns are required depends on `op`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct OperationRecord {
    pub op: String,
    pub kind: Option<String>,
    pub id: Option<String>,
    pub to_kind: Option<String>,
    pub to_id: Option<String>,
    pub amount: Option<String>,
    pub fee_type: Option<String>,
    pub fee_value: Option<String>,
    pub mode: Option<String>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub outcome: Option<String>,
    pub notes: Option<String>,
}

/// A parsed replay operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create a transfer, optionally remembering it under `label`
    Transfer {
        label: Option<String>,
        request: TransferRequest,
    },
    /// Resolve the pending transfer created under `label`
    Resolve {
        label: String,
        resolution: Resolution,
    },
    /// Reconcile a container against a counted balance
    Reconcile {
        container: ContainerRef,
        actual: Decimal,
        notes: Option<String>,
    },
}

/// Convert a ContainerRecord to a container adapter
///
/// The name defaults to the id when the column is missing or empty.
///
/// # Errors
///
/// - `ParseError` for an unknown kind, an empty id or a malformed balance
/// - `InvalidBalance` for a negative opening balance on an asset kind
pub fn convert_container_record(
    record: ContainerRecord,
) -> Result<Box<dyn MoneyContainer>, EngineError> {
    let kind = ContainerKind::from_str(&record.kind)?;
    let id = required("id", Some(record.id.as_str()))?;
    let balance = parse_decimal("balance", &record.balance)?;

    kind.polarity().check_opening_balance(&ContainerRef::new(kind, id), balance)?;

    let name = record
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| id.to_string());

    Ok(build_container(kind, id, name, balance))
}

/// Convert an OperationRecord to an Operation
///
/// # Errors
///
/// Returns `ParseError` if the op is unknown, a required column is empty, or
/// a value does not parse. Amount and balance values are not range-checked
/// here; the engines do that.
pub fn convert_operation_record(record: OperationRecord) -> Result<Operation, EngineError> {
    let notes = non_empty(record.notes.as_deref()).map(str::to_string);
    let label = non_empty(record.reference.as_deref()).map(str::to_string);

    match record.op.trim().to_lowercase().as_str() {
        "transfer" => {
            let from = parse_container(record.kind.as_deref(), record.id.as_deref())?;
            let to = parse_container(record.to_kind.as_deref(), record.to_id.as_deref())?;
            let amount = parse_decimal("amount", required("amount", record.amount.as_deref())?)?;
            let fee_policy =
                parse_fee_policy(record.fee_type.as_deref(), record.fee_value.as_deref())?;
            let mode = ExecutionMode::from_str(record.mode.as_deref().unwrap_or_default())?;

            Ok(Operation::Transfer {
                label,
                request: TransferRequest {
                    from,
                    to,
                    base_amount: amount,
                    fee_policy,
                    mode,
                    notes,
                },
            })
        }
        "resolve" => {
            let label = label.ok_or_else(|| missing("ref"))?;
            let resolution = Resolution::from_str(required("outcome", record.outcome.as_deref())?)?;
            Ok(Operation::Resolve { label, resolution })
        }
        "reconcile" => {
            let container = parse_container(record.kind.as_deref(), record.id.as_deref())?;
            let actual = parse_decimal("amount", required("amount", record.amount.as_deref())?)?;
            Ok(Operation::Reconcile {
                container,
                actual,
                notes,
            })
        }
        other => Err(EngineError::parse_error(
            None,
            &format!("unknown operation '{}'", other),
        )),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn missing(field: &str) -> EngineError {
    EngineError::parse_error(None, &format!("missing required field '{}'", field))
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, EngineError> {
    non_empty(value).ok_or_else(|| missing(field))
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, EngineError> {
    Decimal::from_str(value.trim()).map_err(|_| {
        EngineError::parse_error(None, &format!("invalid {} '{}'", field, value.trim()))
    })
}

fn parse_container(kind: Option<&str>, id: Option<&str>) -> Result<ContainerRef, EngineError> {
    let kind = ContainerKind::from_str(required("kind", kind)?)?;
    let id = required("id", id)?;
    Ok(ContainerRef::new(kind, id))
}

fn parse_fee_policy(
    fee_type: Option<&str>,
    fee_value: Option<&str>,
) -> Result<FeePolicy, EngineError> {
    match (non_empty(fee_type), non_empty(fee_value)) {
        (None, None) => Ok(FeePolicy::none()),
        (None, Some(_)) => Err(missing("fee_type")),
        (Some(_), None) => Err(missing("fee_value")),
        (Some(fee_type), Some(value)) => Ok(FeePolicy {
            fee_type: FeeType::from_str(fee_type)?,
            value: parse_decimal("fee_value", value)?,
        }),
    }
}

/// Format an amount with at least `decimals` places
///
/// Shorter values are zero-padded; longer ones keep every significant digit.
fn format_amount(value: Decimal, decimals: u32) -> String {
    let mut value = value.normalize();
    if value.scale() < decimals {
        value.rescale(decimals);
    }
    value.to_string()
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Write container balances to CSV format
///
/// Columns: kind, id, name, polarity, balance. Rows are sorted by container
/// reference for deterministic output.
pub fn write_balances_csv(
    containers: &[ContainerSnapshot],
    decimals: u32,
    output: &mut dyn Write,
) -> Result<(), EngineError> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(["kind", "id", "name", "polarity", "balance"])?;

    let mut sorted: Vec<&ContainerSnapshot> = containers.iter().collect();
    sorted.sort_by(|a, b| a.container.cmp(&b.container));

    for snapshot in sorted {
        writer.write_record([
            snapshot.container.kind.as_str(),
            snapshot.container.id.as_str(),
            snapshot.name.as_str(),
            &snapshot.polarity().to_string(),
            &format_amount(snapshot.balance, decimals),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the transfer log to CSV format, in the order given
///
/// `labels` maps transfer ids back to the `ref` they were created under.
pub fn write_transfers_csv(
    transfers: &[Transfer],
    labels: &HashMap<TransferId, String>,
    decimals: u32,
    output: &mut dyn Write,
) -> Result<(), EngineError> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record([
        "id",
        "ref",
        "from",
        "to",
        "base_amount",
        "fee_amount",
        "status",
        "created_at",
        "resolved_at",
        "notes",
    ])?;

    for transfer in transfers {
        writer.write_record([
            transfer.id.to_string().as_str(),
            labels.get(&transfer.id).map(String::as_str).unwrap_or_default(),
            &transfer.from.to_string(),
            &transfer.to.to_string(),
            &format_amount(transfer.base_amount, decimals),
            &format_amount(transfer.fee_amount, decimals),
            transfer.status.as_str(),
            &format_timestamp(transfer.created_at),
            &transfer.resolved_at.map(format_timestamp).unwrap_or_default(),
            transfer.notes.as_deref().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write reconciliation records to CSV format, in the order given
pub fn write_reconciliations_csv(
    records: &[ReconciliationRecord],
    decimals: u32,
    output: &mut dyn Write,
) -> Result<(), EngineError> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record([
        "id",
        "kind",
        "account_id",
        "name",
        "system_balance",
        "actual_balance",
        "difference",
        "reconciled_at",
        "notes",
    ])?;

    for record in records {
        writer.write_record([
            record.id().to_string().as_str(),
            record.account_kind().as_str(),
            record.account_id(),
            record.account_name(),
            &format_amount(record.system_balance(), decimals),
            &format_amount(record.actual_balance(), decimals),
            &format_amount(record.difference(), decimals),
            &format_timestamp(record.reconciled_at()),
            record.notes().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransferStatus;
    use chrono::TimeZone;
    use rstest::rstest;
    use uuid::Uuid;

    fn container_record(kind: &str, id: &str, name: Option<&str>, balance: &str) -> ContainerRecord {
        ContainerRecord {
            kind: kind.to_string(),
            id: id.to_string(),
            name: name.map(str::to_string),
            balance: balance.to_string(),
        }
    }

    fn transfer_record(amount: &str) -> OperationRecord {
        OperationRecord {
            op: "transfer".to_string(),
            kind: Some("cash_vault".to_string()),
            id: Some("vault-1".to_string()),
            to_kind: Some("e_wallet".to_string()),
            to_id: Some("wallet-2".to_string()),
            amount: Some(amount.to_string()),
            ..OperationRecord::default()
        }
    }

    #[rstest]
    #[case::snake_case("bank_account", ContainerKind::BankAccount)]
    #[case::camel_case("creditCard", ContainerKind::CreditCard)]
    #[case::alias("wallet", ContainerKind::EWallet)]
    fn test_convert_container_record(#[case] kind: &str, #[case] expected: ContainerKind) {
        let container =
            convert_container_record(container_record(kind, "c-1", Some("Label"), "12.50")).unwrap();

        assert_eq!(container.kind(), expected);
        assert_eq!(container.id(), "c-1");
        assert_eq!(container.display_name(), "Label");
        assert_eq!(container.balance(), Decimal::new(1250, 2));
    }

    #[test]
    fn test_credit_card_may_open_with_credit_balance() {
        let container =
            convert_container_record(container_record("credit_card", "card-9", None, "-20.50"))
                .unwrap();
        assert_eq!(container.balance(), Decimal::new(-2050, 2));
    }

    #[rstest]
    #[case::missing(None)]
    #[case::blank(Some("  "))]
    fn test_container_name_defaults_to_id(#[case] name: Option<&str>) {
        let container =
            convert_container_record(container_record("cash_vault", "vault-1", name, "0")).unwrap();
        assert_eq!(container.display_name(), "vault-1");
    }

    #[rstest]
    #[case::unknown_kind(container_record("piggy_bank", "x", None, "1"), "PARSE_ERROR")]
    #[case::empty_id(container_record("cash_vault", " ", None, "1"), "PARSE_ERROR")]
    #[case::bad_balance(container_record("cash_vault", "x", None, "abc"), "PARSE_ERROR")]
    #[case::negative_balance(container_record("cash_vault", "x", None, "-1"), "INVALID_BALANCE")]
    fn test_convert_container_record_errors(#[case] record: ContainerRecord, #[case] code: &str) {
        assert_eq!(convert_container_record(record).unwrap_err().code(), code);
    }

    #[test]
    fn test_convert_transfer_with_fee_and_mode() {
        let record = OperationRecord {
            fee_type: Some("percentage".to_string()),
            fee_value: Some("2".to_string()),
            mode: Some("deferred".to_string()),
            reference: Some("t1".to_string()),
            notes: Some("rent".to_string()),
            ..transfer_record("500")
        };

        let operation = convert_operation_record(record).unwrap();

        assert_eq!(
            operation,
            Operation::Transfer {
                label: Some("t1".to_string()),
                request: TransferRequest::new(
                    ContainerRef::new(ContainerKind::CashVault, "vault-1"),
                    ContainerRef::new(ContainerKind::EWallet, "wallet-2"),
                    Decimal::new(500, 0),
                )
                .with_fee(FeePolicy::percentage(Decimal::new(2, 0)))
                .deferred()
                .with_notes("rent"),
            }
        );
    }

    #[test]
    fn test_convert_transfer_defaults() {
        match convert_operation_record(transfer_record("10")).unwrap() {
            Operation::Transfer { label, request } => {
                assert_eq!(label, None);
                assert_eq!(request.fee_policy, FeePolicy::none());
                assert_eq!(request.mode, ExecutionMode::Immediate);
                assert_eq!(request.notes, None);
            }
            other => panic!("expected a transfer, got {:?}", other),
        }
    }

    #[test]
    fn test_convert_resolve_and_reconcile() {
        let resolve = OperationRecord {
            op: "Resolve".to_string(),
            reference: Some("t1".to_string()),
            outcome: Some("failed".to_string()),
            ..OperationRecord::default()
        };
        assert_eq!(
            convert_operation_record(resolve).unwrap(),
            Operation::Resolve {
                label: "t1".to_string(),
                resolution: Resolution::Failed,
            }
        );

        let reconcile = OperationRecord {
            op: "reconcile".to_string(),
            kind: Some("bank_account".to_string()),
            id: Some("acc-7".to_string()),
            amount: Some("2500".to_string()),
            ..OperationRecord::default()
        };
        assert_eq!(
            convert_operation_record(reconcile).unwrap(),
            Operation::Reconcile {
                container: ContainerRef::new(ContainerKind::BankAccount, "acc-7"),
                actual: Decimal::new(2500, 0),
                notes: None,
            }
        );
    }

    #[rstest]
    #[case::unknown_op(OperationRecord { op: "refund".to_string(), ..OperationRecord::default() }, "unknown operation")]
    #[case::missing_amount(OperationRecord { amount: None, ..transfer_record("1") }, "'amount'")]
    #[case::bad_amount(transfer_record("ten"), "invalid amount")]
    #[case::missing_destination(OperationRecord { to_id: None, ..transfer_record("1") }, "'id'")]
    #[case::fee_value_without_type(OperationRecord { fee_value: Some("1".to_string()), ..transfer_record("1") }, "'fee_type'")]
    #[case::fee_type_without_value(OperationRecord { fee_type: Some("fixed".to_string()), ..transfer_record("1") }, "'fee_value'")]
    #[case::bad_mode(OperationRecord { mode: Some("later".to_string()), ..transfer_record("1") }, "execution mode")]
    #[case::resolve_without_ref(OperationRecord { op: "resolve".to_string(), outcome: Some("failed".to_string()), ..OperationRecord::default() }, "'ref'")]
    #[case::resolve_without_outcome(OperationRecord { op: "resolve".to_string(), reference: Some("t1".to_string()), ..OperationRecord::default() }, "'outcome'")]
    fn test_convert_operation_record_errors(#[case] record: OperationRecord, #[case] expected: &str) {
        let error = convert_operation_record(record).unwrap_err();
        assert_eq!(error.code(), "PARSE_ERROR");
        assert!(
            error.to_string().contains(expected),
            "'{}' does not mention {}",
            error,
            expected
        );
    }

    #[test]
    fn test_write_balances_csv_sorted_with_polarity() {
        let snapshots = vec![
            ContainerSnapshot {
                container: ContainerRef::new(ContainerKind::CreditCard, "card-9"),
                name: "Visa".to_string(),
                balance: Decimal::new(505, 0),
            },
            ContainerSnapshot {
                container: ContainerRef::new(ContainerKind::BankAccount, "acc-7"),
                name: "Main Bank".to_string(),
                balance: Decimal::new(250005, 3),
            },
        ];

        let mut output = Vec::<u8>::new();
        write_balances_csv(&snapshots, 2, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "kind,id,name,polarity,balance\n\
             bank_account,acc-7,Main Bank,asset,250.005\n\
             credit_card,card-9,Visa,liability,505.00\n"
        );
    }

    #[test]
    fn test_amounts_keep_every_recorded_digit() {
        assert_eq!(format_amount(Decimal::new(100005, 3), 2), "100.005");
        assert_eq!(format_amount(Decimal::new(5, 3), 2), "0.005");
        assert_eq!(format_amount(Decimal::new(-95, 0), 2), "-95.00");
        assert_eq!(format_amount(Decimal::new(12000, 3), 2), "12.00");
        assert_eq!(format_amount(Decimal::new(1, 1), 4), "0.1000");
    }

    #[test]
    fn test_write_balances_csv_empty() {
        let mut output = Vec::<u8>::new();
        write_balances_csv(&[], 2, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "kind,id,name,polarity,balance\n");
    }

    #[test]
    fn test_write_transfers_csv() {
        let created = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();
        let transfer = Transfer {
            id: Uuid::nil(),
            from: ContainerRef::new(ContainerKind::CashVault, "vault-1"),
            to: ContainerRef::new(ContainerKind::EWallet, "wallet-2"),
            base_amount: Decimal::new(500, 0),
            fee_policy: FeePolicy::fixed(Decimal::new(10, 0)),
            fee_amount: Decimal::new(10, 0),
            status: TransferStatus::Pending,
            created_at: created,
            resolved_at: None,
            notes: Some("rent".to_string()),
        };
        let labels = HashMap::from([(Uuid::nil(), "t1".to_string())]);

        let mut output = Vec::<u8>::new();
        write_transfers_csv(&[transfer], &labels, 2, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,ref,from,to,base_amount,fee_amount,status,created_at,resolved_at,notes\n\
             00000000-0000-0000-0000-000000000000,t1,cash_vault:vault-1,e_wallet:wallet-2,500.00,10.00,pending,2026-04-01T09:00:00.000Z,,rent\n"
        );
    }

    #[test]
    fn test_write_reconciliations_csv() {
        let at = Utc.with_ymd_and_hms(2026, 6, 30, 17, 0, 0).unwrap();
        let record = ReconciliationRecord::new(
            &ContainerRef::new(ContainerKind::BankAccount, "acc-7"),
            "Main Bank",
            Decimal::new(2300, 0),
            Decimal::new(2500, 0),
            None,
            at,
        )
        .unwrap();
        let id = record.id();

        let mut output = Vec::<u8>::new();
        write_reconciliations_csv(&[record], 2, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!(
                "id,kind,account_id,name,system_balance,actual_balance,difference,reconciled_at,notes\n\
                 {},bank_account,acc-7,Main Bank,2300.00,2500.00,200.00,2026-06-30T17:00:00.000Z,\n",
                id
            )
        );
    }
}
