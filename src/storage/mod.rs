mod account_storage;
mod ledger_storage;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{Account, LedgerError};
use crate::types::Currency;

pub use account_storage::{AccountGuard, AccountStorage};
pub use ledger_storage::LedgerStorage;

/// Wallet persistence seam used by the transfer engine.
///
/// Every balance or status mutation must happen while holding the account's
/// update lock, which is represented by an [`AccountGuard`]. Mutations are
/// staged on the guard and only become visible to readers once committed.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    fn create(&self, account_id: &str, initial_balance: Decimal, currency: Currency) -> Result<Account, LedgerError>;

    /// Snapshot read of the last committed state that never waits on the update lock.
    fn get(&self, account_id: &str) -> Result<Account, LedgerError>;

    /// Reads several accounts as of a single point between commits.
    fn get_many(&self, account_ids: &[&str]) -> Result<Vec<Account>, LedgerError>;

    async fn disable(&self, account_id: &str) -> Result<(), LedgerError>;

    async fn close(&self, account_id: &str) -> Result<(), LedgerError>;

    /// Waits until the account's update lock is free and returns it together with the current snapshot.
    async fn acquire_for_update(&self, account_id: &str) -> Result<AccountGuard, LedgerError>;

    /// Stages a new balance on the guard. Readers keep seeing the committed balance.
    fn set_balance(&self, guard: &mut AccountGuard, balance: Decimal) -> Result<Account, LedgerError>;

    /// Publishes the staged state of every guard at once, or none of it.
    fn commit(&self, guards: &[&AccountGuard]) -> Result<(), LedgerError>;
}
