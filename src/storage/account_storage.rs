use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::models::{Account, LedgerError};
use crate::storage::AccountStore;
use crate::types::{AccountId, Currency};

/// Owns an account record together with its update lock so both share one lifecycle.
struct AccountSlot {
    account: Account,
    lock: Arc<Mutex<()>>
}

/// Exclusive update rights over one account, released on drop.
///
/// Changes made through the guard are staged on it and discarded with it
/// unless they were committed first.
#[derive(Debug)]
pub struct AccountGuard {
    staged: Account,
    permit: OwnedMutexGuard<()>
}

impl AccountGuard {
    pub fn account_id(&self) -> &str {
        &self.staged.id
    }

    /// State of the account as seen under the lock, staged changes included.
    pub fn account(&self) -> &Account {
        &self.staged
    }

    pub fn release(self) {
        drop(self);
    }

    fn holds(&self, lock: &Arc<Mutex<()>>) -> bool {
        Arc::ptr_eq(OwnedMutexGuard::mutex(&self.permit), lock)
    }
}

pub struct AccountStorage {
    accounts: DashMap<AccountId, AccountSlot>,
    //NOTE: Taken exclusively only while a commit writes its slots. Readers share it, which keeps a
    //      multi-account commit all-or-nothing from their point of view without touching update locks.
    commit_gate: RwLock<()>
}

impl AccountStorage {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            commit_gate: RwLock::new(())
        }
    }

    /// Every account including closed ones, ordered by id, as of a single point between commits.
    pub fn snapshot(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = {
            let _gate = self.commit_gate.read();

            self.accounts.iter()
                .map(|slot| slot.account.clone())
                .collect()
        };

        accounts.sort_by(|left, right| left.id.cmp(&right.id));
        accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn read_committed(&self, account_id: &str) -> Result<Account, LedgerError> {
        self.accounts.get(account_id)
            .filter(|slot| !slot.account.is_closed())
            .map(|slot| slot.account.clone())
            .ok_or_else(|| LedgerError::account_not_found(account_id))
    }

    fn ensure_holder(&self, guard: &AccountGuard) -> Result<(), LedgerError> {
        let slot = self.accounts.get(guard.account_id()).ok_or_else(|| {
            LedgerError::inconsistency(format!("Lock held but wallet missing for account [{}]", guard.account_id()))
        })?;

        if !guard.holds(&slot.lock) {
            return Err(LedgerError::inconsistency(format!("Guard does not own the lock for account [{}]", guard.account_id())));
        }

        Ok(())
    }

    fn update_locked<F>(&self, guard: &mut AccountGuard, update: F) -> Result<Account, LedgerError>
    where
        F: FnOnce(&mut Account)
    {
        update(&mut guard.staged);
        self.commit(&[&*guard])?;

        Ok(guard.staged.clone())
    }
}

impl Default for AccountStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for AccountStorage {
    fn create(&self, account_id: &str, initial_balance: Decimal, currency: Currency) -> Result<Account, LedgerError> {
        if initial_balance < Decimal::ZERO {
            return Err(LedgerError::invalid_amount(initial_balance));
        }

        match self.accounts.entry(account_id.to_string()) {
            Entry::Occupied(_) => Err(LedgerError::account_already_exists(account_id)),
            Entry::Vacant(entry) => {
                let account = Account::new(account_id, initial_balance, currency);

                entry.insert(AccountSlot {
                    account: account.clone(),
                    lock: Arc::new(Mutex::new(()))
                });

                debug!("Wallet for account [{account_id}] opened with [{initial_balance}] [{currency}]");

                Ok(account)
            }
        }
    }

    fn get(&self, account_id: &str) -> Result<Account, LedgerError> {
        let _gate = self.commit_gate.read();
        self.read_committed(account_id)
    }

    fn get_many(&self, account_ids: &[&str]) -> Result<Vec<Account>, LedgerError> {
        let _gate = self.commit_gate.read();

        account_ids.iter()
            .map(|account_id| self.read_committed(account_id))
            .collect()
    }

    async fn disable(&self, account_id: &str) -> Result<(), LedgerError> {
        let mut guard = self.acquire_for_update(account_id).await?;

        if guard.account().is_closed() {
            return Err(LedgerError::account_not_found(account_id));
        }

        self.update_locked(&mut guard, Account::deactivate)?;

        Ok(())
    }

    async fn close(&self, account_id: &str) -> Result<(), LedgerError> {
        let mut guard = self.acquire_for_update(account_id).await?;

        if guard.account().is_closed() {
            return Err(LedgerError::account_not_found(account_id));
        }

        self.update_locked(&mut guard, Account::close)?;

        Ok(())
    }

    async fn acquire_for_update(&self, account_id: &str) -> Result<AccountGuard, LedgerError> {
        //NOTE: The shard reference must be gone before awaiting, otherwise a waiter would block every other
        //      account living in the same shard.
        let lock = self.accounts.get(account_id)
            .map(|slot| slot.lock.clone())
            .ok_or_else(|| LedgerError::account_not_found(account_id))?;

        let permit = lock.lock_owned().await;

        let staged = self.accounts.get(account_id)
            .map(|slot| slot.account.clone())
            .ok_or_else(|| {
                LedgerError::inconsistency(format!("Lock found but wallet missing for account [{account_id}]"))
            })?;

        Ok(AccountGuard { staged, permit })
    }

    fn set_balance(&self, guard: &mut AccountGuard, balance: Decimal) -> Result<Account, LedgerError> {
        self.ensure_holder(guard)?;

        guard.staged.balance = balance;
        guard.staged.updated_at = Utc::now();

        Ok(guard.staged.clone())
    }

    fn commit(&self, guards: &[&AccountGuard]) -> Result<(), LedgerError> {
        let _gate = self.commit_gate.write();

        for guard in guards {
            self.ensure_holder(guard)?;
        }

        for guard in guards {
            if let Some(mut slot) = self.accounts.get_mut(guard.account_id()) {
                slot.account = guard.staged.clone();
            }
        }

        Ok(())
    }
}
