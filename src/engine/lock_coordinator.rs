use std::time::Duration;

use tokio::time::timeout;
use tracing::trace;

use crate::models::LedgerError;
use crate::storage::{AccountGuard, AccountStore};

/// Both update locks a transfer needs, labelled by role rather than by acquisition order.
#[derive(Debug)]
pub struct LockedPair {
    pub debit: AccountGuard,
    pub credit: AccountGuard
}

/// Acquires pairs of account locks in a single global order.
///
/// Locks are always taken in ascending identifier order, whichever side of
/// the transfer an account is on. Two transfers over the same accounts can
/// therefore never each hold one lock while waiting for the other.
#[derive(Debug, Clone, Default)]
pub struct LockCoordinator {
    lock_timeout: Option<Duration>
}

impl LockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds every individual lock wait. Without it a stalled holder blocks waiters forever.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = Some(lock_timeout);
        self
    }

    pub async fn acquire_pair<S: AccountStore>(&self, store: &S, debit_id: &str, credit_id: &str) -> Result<LockedPair, LedgerError> {
        if debit_id == credit_id {
            return Err(LedgerError::same_account(debit_id));
        }

        let debit_first = debit_id < credit_id;
        let (first_id, second_id) = if debit_first { (debit_id, credit_id) } else { (credit_id, debit_id) };

        let first = self.acquire(store, first_id).await?;
        //NOTE: If the second acquisition fails the first guard is dropped here, so nothing leaks on the error path.
        let second = self.acquire(store, second_id).await?;

        let (debit, credit) = if debit_first { (first, second) } else { (second, first) };

        Ok(LockedPair { debit, credit })
    }

    async fn acquire<S: AccountStore>(&self, store: &S, account_id: &str) -> Result<AccountGuard, LedgerError> {
        trace!("Acquiring update lock for account [{account_id}]");

        match self.lock_timeout {
            Some(limit) => timeout(limit, store.acquire_for_update(account_id)).await
                .map_err(|_| LedgerError::lock_timeout(account_id, limit))?,
            None => store.acquire_for_update(account_id).await
        }
    }
}
