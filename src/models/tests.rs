use super::{Account, AccountStatus, ErrorKind, LedgerError, Transaction, TransactionStatus, TransferRequest};

use std::str::FromStr;

use anyhow::Result;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::Currency;

fn create_request(sender: &str, receiver: &str, amount: &str) -> Result<TransferRequest> {
    Ok(TransferRequest::new(sender, receiver, Decimal::from_str(amount)?, Currency::Usd))
}

#[test]
fn test_new_account_starts_active_and_open() -> Result<()> {
    let account = Account::new("alice", Decimal::from_str("100.00")?, Currency::Usd);

    assert!(account.is_active());
    assert!(!account.is_closed());
    assert_eq!(account.created_at, account.updated_at);
    assert_eq!(account.status_label(), "active");

    Ok(())
}

#[test]
fn test_closing_an_account_also_deactivates_it() {
    let mut account = Account::new("alice", Decimal::ZERO, Currency::Usd);
    account.close();

    assert_eq!(account.status, AccountStatus::Inactive);
    assert!(account.is_closed());
    assert_eq!(account.status_label(), "closed");
}

#[test]
fn test_pending_is_the_only_status_that_can_move() {
    use TransactionStatus::*;

    assert!(Pending.can_transition_to(Completed));
    assert!(Pending.can_transition_to(Failed));

    for terminal in [Completed, Failed] {
        assert!(terminal.is_terminal());

        for next in [Pending, Completed, Failed] {
            assert!(!terminal.can_transition_to(next));
        }
    }

    assert!(!Pending.can_transition_to(Pending));
}

#[test]
fn test_transfer_record_captures_request_and_starts_pending() -> Result<()> {
    let request = create_request("alice", "bob", "25.50")?
        .with_description("rent")
        .with_payment_details("march");
    let transaction = Transaction::transfer(&request);

    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert_eq!(transaction.debit_account_id, "alice");
    assert_eq!(transaction.credit_account_id, "bob");
    assert_eq!(transaction.amount, Decimal::from_str("25.50")?);
    assert_eq!(transaction.description.as_deref(), Some("rent"));
    assert_eq!(transaction.payment_details.as_deref(), Some("march"));
    assert_ne!(transaction.id, Transaction::transfer(&request).id);

    Ok(())
}

#[test]
fn test_only_completed_transactions_affect_balances() -> Result<()> {
    let mut transaction = Transaction::transfer(&create_request("alice", "bob", "10")?);

    assert!(transaction.involves("alice"));
    assert!(!transaction.involves("carol"));
    assert!(transaction.net_effect_on("alice").is_zero());

    transaction.status = TransactionStatus::Completed;

    assert_eq!(transaction.net_effect_on("alice"), Decimal::from(-10));
    assert_eq!(transaction.net_effect_on("bob"), Decimal::from(10));
    assert!(transaction.net_effect_on("carol").is_zero());

    Ok(())
}

#[test]
fn test_aborted_transfers_report_the_underlying_error_kind() {
    let inner = LedgerError::wallet_inactive("bob");
    let aborted = LedgerError::aborted(Uuid::new_v4(), LedgerError::inconsistency("credit write lost"));

    assert_eq!(inner.kind(), ErrorKind::WalletInactive);
    assert_eq!(aborted.kind(), ErrorKind::InternalInconsistency);
    assert_eq!(LedgerError::account_not_found("x").kind().as_str(), "NOT_FOUND");
    assert!(aborted.to_string().contains("credit write lost"));
}
