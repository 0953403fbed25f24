use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{TransactionStatus, TransactionType};
use crate::types::{AccountId, Currency, TransactionId};

/// A single ledger record describing the movement of funds between two accounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub debit_account_id: AccountId,
    pub credit_account_id: AccountId,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub transaction_type: TransactionType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<String>
}

impl Transaction {
    /// Builds the pending record for a transfer request with a freshly minted id.
    pub fn transfer(request: &TransferRequest) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            debit_account_id: request.sender_id.clone(),
            credit_account_id: request.receiver_id.clone(),
            amount: request.amount,
            currency: request.currency,
            status: TransactionStatus::Pending,
            transaction_type: TransactionType::Transfer,
            created_at: now,
            updated_at: now,
            description: request.description.clone(),
            payment_details: request.payment_details.clone()
        }
    }

    pub fn involves(&self, account_id: &str) -> bool {
        self.debit_account_id == account_id || self.credit_account_id == account_id
    }

    /// Signed effect of this transaction on the given account's balance.
    ///
    /// Only completed transactions move money.
    pub fn net_effect_on(&self, account_id: &str) -> Decimal {
        if self.status != TransactionStatus::Completed {
            return Decimal::ZERO;
        }

        if self.debit_account_id == account_id {
            -self.amount
        } else if self.credit_account_id == account_id {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}

/// Caller-facing description of a transfer.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: Decimal,
    pub currency: Currency,
    pub description: Option<String>,
    pub payment_details: Option<String>
}

impl TransferRequest {
    pub fn new(sender_id: impl Into<AccountId>, receiver_id: impl Into<AccountId>, amount: Decimal, currency: Currency) -> Self {
        Self {
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            amount,
            currency,
            description: None,
            payment_details: None
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_payment_details(mut self, payment_details: impl Into<String>) -> Self {
        self.payment_details = Some(payment_details.into());
        self
    }
}
