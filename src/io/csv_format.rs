//! CSV format handling for ledger operations and the balance report
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV rows to typed operations
//! - Balance report serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! Input columns: `op,account,to,node,amount`. Which fields a row needs
//! depends on its `op`; unused fields are left empty.

use crate::types::{BalanceSummary, NodeId, Operation, TransferRequest, TransferSource};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// All fields except `op` are optional at the CSV level; the conversion step
/// enforces per-operation requirements.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub op: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

/// Convert a CsvRecord into a typed Operation
///
/// This function:
/// - Parses the operation name (case-insensitive)
/// - Parses the amount string into a Decimal where present
/// - Enforces which fields each operation requires
///
/// Field requirements:
/// - `create`: `account` (name), `node` (counterparty); `amount` optional
/// - `issue`: `amount`; `node` optional (defaults to the local node)
/// - `transfer`: `account` (source, empty or `NODE` for the sentinel),
///   `to`, `amount`
/// - `move`: `node` (new holder), `amount`
/// - `redeem`: `amount`
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<Operation, String> {
    let amount = parse_amount(csv_record.amount.as_deref())?;

    match csv_record.op.to_lowercase().as_str() {
        "create" => {
            let name = non_empty(csv_record.account.as_deref())
                .ok_or("create requires an account name")?;
            let counterparty = non_empty(csv_record.node.as_deref())
                .ok_or("create requires a counterparty node")?;
            Ok(Operation::CreateAccount {
                name: name.to_string(),
                counterparty: NodeId::new(counterparty),
                opening_balance: amount,
            })
        }
        "issue" => Ok(Operation::Issue {
            holder: non_empty(csv_record.node.as_deref()).map(NodeId::new),
            amount: amount.ok_or("issue requires an amount")?,
        }),
        "transfer" => {
            let source =
                TransferSource::from_name(csv_record.account.as_deref().unwrap_or(""));
            // An absent destination flows through as empty so the engine can
            // reject it as InvalidDestination rather than a parse failure.
            let to = csv_record.to.unwrap_or_default();
            Ok(Operation::Transfer(TransferRequest {
                source,
                to,
                amount: amount.ok_or("transfer requires an amount")?,
            }))
        }
        "move" => {
            let new_holder = non_empty(csv_record.node.as_deref())
                .ok_or("move requires a destination node")?;
            Ok(Operation::NodeTransfer {
                new_holder: NodeId::new(new_holder),
                amount: amount.ok_or("move requires an amount")?,
            })
        }
        "redeem" => Ok(Operation::Redeem {
            amount: amount.ok_or("redeem requires an amount")?,
        }),
        other => Err(format!("Invalid operation '{}'", other)),
    }
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.filter(|value| !value.trim().is_empty()).map(str::trim)
}

fn parse_amount(field: Option<&str>) -> Result<Option<Decimal>, String> {
    match field {
        Some(raw) if !raw.trim().is_empty() => Decimal::from_str(raw.trim())
            .map(Some)
            .map_err(|_| format!("Invalid amount '{}'", raw)),
        _ => Ok(None),
    }
}

/// Write the final balance report to CSV
///
/// Columns: name, owner, counterparty, token, balance. Rows are written in
/// the order given (the engine emits them sorted by name); balances are
/// rendered with `fraction_digits` decimal places for deterministic output.
pub fn write_balances_csv(
    summaries: &[BalanceSummary],
    fraction_digits: u32,
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["name", "owner", "counterparty", "token", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for summary in summaries {
        writer
            .write_record(&[
                summary.name.clone(),
                summary.owner.clone(),
                summary.counterparty.clone(),
                summary.token.clone().unwrap_or_default(),
                format!("{:.1$}", summary.balance, fraction_digits as usize),
            ])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(
        op: &str,
        account: Option<&str>,
        to: Option<&str>,
        node: Option<&str>,
        amount: Option<&str>,
    ) -> CsvRecord {
        CsvRecord {
            op: op.to_string(),
            account: account.map(str::to_string),
            to: to.map(str::to_string),
            node: node.map(str::to_string),
            amount: amount.map(str::to_string),
        }
    }

    #[test]
    fn test_convert_create_with_opening_balance() {
        let operation = convert_csv_record(record(
            "create",
            Some("alice"),
            None,
            Some("PartyB"),
            Some("100"),
        ))
        .unwrap();

        assert_eq!(
            operation,
            Operation::CreateAccount {
                name: "alice".to_string(),
                counterparty: NodeId::new("PartyB"),
                opening_balance: Some(Decimal::new(100, 0)),
            }
        );
    }

    #[test]
    fn test_convert_create_without_amount() {
        let operation =
            convert_csv_record(record("create", Some("alice"), None, Some("PartyB"), None))
                .unwrap();

        assert!(matches!(
            operation,
            Operation::CreateAccount {
                opening_balance: None,
                ..
            }
        ));
    }

    #[test]
    fn test_convert_transfer_between_accounts() {
        let operation = convert_csv_record(record(
            "transfer",
            Some("alice"),
            Some("bob"),
            None,
            Some("30"),
        ))
        .unwrap();

        match operation {
            Operation::Transfer(request) => {
                assert_eq!(request.source, TransferSource::Account("alice".to_string()));
                assert_eq!(request.to, "bob");
                assert_eq!(request.amount, Decimal::new(30, 0));
            }
            other => panic!("expected transfer, got {:?}", other),
        }
    }

    #[rstest]
    #[case::sentinel(Some("NODE"))]
    #[case::empty(Some(""))]
    #[case::absent(None)]
    fn test_convert_transfer_from_node(#[case] account: Option<&str>) {
        let operation =
            convert_csv_record(record("transfer", account, Some("alice"), None, Some("40")))
                .unwrap();

        match operation {
            Operation::Transfer(request) => assert_eq!(request.source, TransferSource::Node),
            other => panic!("expected transfer, got {:?}", other),
        }
    }

    #[test]
    fn test_convert_transfer_preserves_empty_destination() {
        // Empty destinations reach the engine so it can reject them as
        // InvalidDestination with state untouched.
        let operation =
            convert_csv_record(record("transfer", Some("alice"), None, None, Some("40")))
                .unwrap();

        match operation {
            Operation::Transfer(request) => assert_eq!(request.to, ""),
            other => panic!("expected transfer, got {:?}", other),
        }
    }

    #[test]
    fn test_convert_issue_move_redeem() {
        assert_eq!(
            convert_csv_record(record("issue", None, None, None, Some("1000"))).unwrap(),
            Operation::Issue {
                holder: None,
                amount: Decimal::new(1000, 0)
            }
        );
        assert_eq!(
            convert_csv_record(record("move", None, None, Some("PartyB"), Some("25"))).unwrap(),
            Operation::NodeTransfer {
                new_holder: NodeId::new("PartyB"),
                amount: Decimal::new(25, 0)
            }
        );
        assert_eq!(
            convert_csv_record(record("redeem", None, None, None, Some("5"))).unwrap(),
            Operation::Redeem {
                amount: Decimal::new(5, 0)
            }
        );
    }

    #[rstest]
    #[case::unknown_op(record("mint", None, None, None, Some("1")), "Invalid operation")]
    #[case::create_missing_name(record("create", None, None, Some("PartyB"), None), "account name")]
    #[case::create_missing_counterparty(record("create", Some("a"), None, None, None), "counterparty")]
    #[case::issue_missing_amount(record("issue", None, None, None, None), "requires an amount")]
    #[case::transfer_missing_amount(record("transfer", Some("a"), Some("b"), None, None), "requires an amount")]
    #[case::move_missing_node(record("move", None, None, None, Some("1")), "destination node")]
    #[case::bad_amount(record("issue", None, None, None, Some("abc")), "Invalid amount")]
    fn test_convert_errors(#[case] csv_record: CsvRecord, #[case] expected: &str) {
        let error = convert_csv_record(csv_record).unwrap_err();
        assert!(
            error.contains(expected),
            "error '{}' should contain '{}'",
            error,
            expected
        );
    }

    #[test]
    fn test_case_insensitive_operations() {
        assert!(convert_csv_record(record("CREATE", Some("a"), None, Some("PartyB"), None)).is_ok());
        assert!(convert_csv_record(record("Redeem", None, None, None, Some("1"))).is_ok());
    }

    #[test]
    fn test_write_balances_csv_formats_fraction_digits() {
        let summaries = vec![
            BalanceSummary {
                name: "alice".to_string(),
                owner: "PartyA".to_string(),
                counterparty: "PartyB".to_string(),
                token: Some("DVT".to_string()),
                balance: Decimal::new(7000, 2),
            },
            BalanceSummary {
                name: "bob".to_string(),
                owner: "PartyA".to_string(),
                counterparty: "PartyB".to_string(),
                token: None,
                balance: Decimal::ZERO,
            },
        ];

        let mut output = Vec::new();
        write_balances_csv(&summaries, 2, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name,owner,counterparty,token,balance");
        assert_eq!(lines[1], "alice,PartyA,PartyB,DVT,70.00");
        assert_eq!(lines[2], "bob,PartyA,PartyB,,0.00");
    }
}
