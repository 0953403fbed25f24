use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, error, warn};

use crate::engine::lock_coordinator::{LockCoordinator, LockedPair};
use crate::models::{Account, LedgerError, Transaction, TransactionStatus, TransferRequest};
use crate::storage::{AccountGuard, AccountStorage, AccountStore, LedgerStorage};
use crate::types::{Currency, TransactionId};

/// Why the balance mutations of a transfer did not go through.
enum ApplyError {
    /// Nothing is left applied, either because no write happened or because the debit was compensated.
    RolledBack(LedgerError),
    /// The store refused to compensate the staged debit, so it can no longer be trusted with this account.
    Unrecoverable(LedgerError)
}

/// Moves funds between wallets and exposes the read side of the ledger.
///
/// A transfer holds both account locks from validation until the final status
/// is written, so every account observes transfers in a single serial order
/// and no balance is ever checked against a stale value. Both new balances
/// are staged on the guards and published in a single commit, so a reader
/// sees either the pre-transfer or the post-transfer pair.
pub struct TransferEngine<S: AccountStore = AccountStorage> {
    accounts: Arc<S>,
    ledger: Arc<LedgerStorage>,
    coordinator: LockCoordinator
}

impl<S: AccountStore> TransferEngine<S> {
    /// Creates a new engine over the provided stores.
    pub fn new(accounts: Arc<S>, ledger: Arc<LedgerStorage>) -> Self {
        Self {
            accounts,
            ledger,
            coordinator: LockCoordinator::new()
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.coordinator = self.coordinator.with_lock_timeout(lock_timeout);
        self
    }

    pub fn accounts(&self) -> &Arc<S> {
        &self.accounts
    }

    pub fn ledger(&self) -> &Arc<LedgerStorage> {
        &self.ledger
    }

    pub fn create_account(&self, owner_id: &str, initial_balance: Decimal, currency: Currency) -> Result<Account, LedgerError> {
        self.accounts.create(owner_id, initial_balance, currency)
    }

    pub fn get_account(&self, owner_id: &str) -> Result<Account, LedgerError> {
        self.accounts.get(owner_id)
    }

    /// Reads several wallets at once. No transfer is ever half visible across the returned accounts.
    pub fn get_accounts(&self, owner_ids: &[&str]) -> Result<Vec<Account>, LedgerError> {
        self.accounts.get_many(owner_ids)
    }

    pub async fn disable_account(&self, owner_id: &str) -> Result<(), LedgerError> {
        self.accounts.disable(owner_id).await?;
        debug!("Wallet for account [{owner_id}] disabled");

        Ok(())
    }

    /// Soft-deletes the account: it stops accepting transfers and disappears from reads.
    pub async fn close_account(&self, owner_id: &str) -> Result<(), LedgerError> {
        self.accounts.close(owner_id).await?;
        debug!("Wallet for account [{owner_id}] closed");

        Ok(())
    }

    pub fn get_transaction(&self, transaction_id: TransactionId) -> Result<Transaction, LedgerError> {
        self.ledger.get(transaction_id)
    }

    pub fn list_transactions_by_account(&self, owner_id: &str) -> Vec<Transaction> {
        self.ledger.list_by_participant(owner_id)
    }

    pub fn list_all_transactions(&self) -> Vec<Transaction> {
        self.ledger.list_all()
    }

    /// Transfers `request.amount` from the sender's wallet to the receiver's.
    ///
    /// # Errors
    /// Returns `LedgerError` if:
    /// - Sender and receiver are the same account, or the amount is not positive.
    /// - Either account does not exist, or its lock could not be taken in time.
    /// - The sender cannot cover the amount.
    /// - Either wallet is inactive or held in another currency.
    /// - A balance write failed (`TransferAborted`), in which case the recorded
    ///   transaction is `Failed` and no funds have moved.
    pub async fn transfer(&self, request: TransferRequest) -> Result<Transaction, LedgerError> {
        let result = self.execute(&request).await;

        match &result {
            Ok(transaction) => {
                debug!("Transaction [{}] moved [{}] [{}] from [{}] to [{}]", transaction.id, transaction.amount, transaction.currency, transaction.debit_account_id, transaction.credit_account_id);
            },
            Err(error) => {
                warn!("Transfer of [{}] [{}] from [{}] to [{}] rejected: {error}", request.amount, request.currency, request.sender_id, request.receiver_id);
            }
        }

        result
    }

    async fn execute(&self, request: &TransferRequest) -> Result<Transaction, LedgerError> {
        if request.sender_id == request.receiver_id {
            return Err(LedgerError::same_account(&request.sender_id));
        }

        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(request.amount));
        }

        // Both guards live until this function returns, on every path.
        let mut pair = self.coordinator
            .acquire_pair(self.accounts.as_ref(), &request.sender_id, &request.receiver_id)
            .await?;

        Self::validate(&pair, request)?;

        let transaction = self.ledger.append(Transaction::transfer(request));

        match self.apply(&mut pair, request.amount) {
            Ok(()) => self.ledger.update_status(transaction.id, TransactionStatus::Completed),
            Err(ApplyError::RolledBack(cause)) => {
                self.ledger.update_status(transaction.id, TransactionStatus::Failed)?;
                Err(LedgerError::aborted(transaction.id, cause))
            },
            Err(ApplyError::Unrecoverable(cause)) => {
                if let Err(status_error) = self.ledger.update_status(transaction.id, TransactionStatus::Failed) {
                    error!("Could not mark transaction [{}] as failed: {status_error}", transaction.id);
                }

                Err(cause)
            }
        }
    }

    fn validate(pair: &LockedPair, request: &TransferRequest) -> Result<(), LedgerError> {
        let debit = pair.debit.account();
        let credit = pair.credit.account();

        if debit.balance < request.amount {
            return Err(LedgerError::insufficient_balance(&debit.id, debit.balance, request.amount));
        }

        for account in [debit, credit] {
            if !account.is_active() {
                return Err(LedgerError::wallet_inactive(&account.id));
            }
        }

        for account in [debit, credit] {
            if account.currency != request.currency {
                return Err(LedgerError::currency_mismatch(&account.id, account.currency, request.currency));
            }
        }

        Ok(())
    }

    fn apply(&self, pair: &mut LockedPair, amount: Decimal) -> Result<(), ApplyError> {
        let debited = pair.debit.account().balance.checked_sub(amount)
            .ok_or_else(|| LedgerError::overflow(pair.debit.account_id()))
            .map_err(ApplyError::RolledBack)?;

        self.accounts.set_balance(&mut pair.debit, debited)
            .map_err(ApplyError::RolledBack)?;

        let credited = pair.credit.account().balance.checked_add(amount)
            .ok_or_else(|| LedgerError::overflow(pair.credit.account_id()));

        let credit_result = credited.and_then(|balance| self.accounts.set_balance(&mut pair.credit, balance));

        if let Err(cause) = credit_result {
            self.compensate(&mut pair.debit, amount, &cause)?;
            return Err(ApplyError::RolledBack(cause));
        }

        //NOTE: Until this point both balances only exist on the guards, readers still see the pre-transfer state.
        self.accounts.commit(&[&pair.debit, &pair.credit])
            .map_err(ApplyError::RolledBack)
    }

    /// Adds the debited amount back onto the sender's staged balance, so nothing of the debit is left to commit.
    fn compensate(&self, debit: &mut AccountGuard, amount: Decimal, cause: &LedgerError) -> Result<(), ApplyError> {
        let restored = debit.account().balance.checked_add(amount)
            .ok_or_else(|| LedgerError::overflow(debit.account_id()));

        let outcome = match restored {
            Ok(balance) => self.accounts.set_balance(debit, balance),
            Err(error) => Err(error)
        };

        match outcome {
            Ok(account) => {
                warn!("Credit failed ({cause}), restored account [{}] to [{}]", account.id, account.balance);
                Ok(())
            },
            Err(compensation_error) => {
                error!("Compensation for account [{}] failed after credit error ({cause}): {compensation_error}", debit.account_id());

                Err(ApplyError::Unrecoverable(LedgerError::inconsistency(format!(
                    "Account [{}] was debited [{amount}] but could not be restored: {compensation_error}",
                    debit.account_id()
                ))))
            }
        }
    }
}
