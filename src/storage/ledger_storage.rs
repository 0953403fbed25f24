use chrono::Utc;
use dashmap::DashMap;

use crate::models::{LedgerError, Transaction, TransactionStatus};
use crate::types::TransactionId;

/// In-memory transaction journal.
///
/// Each record is only ever mutated by the transfer that created it, so the
/// map's own sharded locking is all the coordination required.
pub struct LedgerStorage {
    transactions: DashMap<TransactionId, Transaction>
}

impl LedgerStorage {
    pub fn new() -> Self {
        Self {
            transactions: DashMap::new()
        }
    }

    pub fn append(&self, transaction: Transaction) -> Transaction {
        self.transactions.insert(transaction.id, transaction.clone());
        transaction
    }

    pub fn get(&self, transaction_id: TransactionId) -> Result<Transaction, LedgerError> {
        self.transactions.get(&transaction_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::transaction_not_found(transaction_id))
    }

    pub fn update_status(&self, transaction_id: TransactionId, status: TransactionStatus) -> Result<Transaction, LedgerError> {
        let mut entry = self.transactions.get_mut(&transaction_id)
            .ok_or_else(|| LedgerError::transaction_not_found(transaction_id))?;

        if !entry.status.can_transition_to(status) {
            return Err(LedgerError::IllegalTransition {
                transaction_id,
                from: entry.status,
                to: status
            });
        }

        entry.status = status;
        entry.updated_at = Utc::now();

        Ok(entry.value().clone())
    }

    pub fn list_by_participant(&self, account_id: &str) -> Vec<Transaction> {
        self.transactions.iter()
            .filter(|entry| entry.involves(account_id))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn list_all(&self) -> Vec<Transaction> {
        self.transactions.iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl Default for LedgerStorage {
    fn default() -> Self {
        Self::new()
    }
}
