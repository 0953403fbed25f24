use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::AccountStatus;
use crate::types::{AccountId, Currency};

/// Balance-holding wallet owned by a single account holder.
///
/// Instances handed out by the store are snapshots; mutating one has no
/// effect on the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Equal to the owner identifier.
    pub id: AccountId,
    pub balance: Decimal,
    pub currency: Currency,
    #[serde(rename = "wallet_status")]
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. Closed accounts are also inactive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>
}

impl Account {
    /// Creates a new, active account for the given owner.
    pub fn new(id: impl Into<AccountId>, balance: Decimal, currency: Currency) -> Self {
        let now = Utc::now();

        Self {
            id: id.into(),
            balance,
            currency,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
            closed_at: None
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    pub fn deactivate(&mut self) {
        self.status = AccountStatus::Inactive;
        self.updated_at = Utc::now();
    }

    pub fn close(&mut self) {
        self.deactivate();
        self.closed_at = Some(self.updated_at);
    }

    /// Status label used by the replay output.
    pub fn status_label(&self) -> &'static str {
        match (self.is_closed(), self.status) {
            (true, _) => "closed",
            (false, AccountStatus::Active) => "active",
            (false, AccountStatus::Inactive) => "inactive"
        }
    }
}
