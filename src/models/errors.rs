use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::TransactionStatus;
use crate::types::{AccountId, Currency, TransactionId};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Wallet not found for account [{account_id}]")]
    AccountNotFound {
        account_id: AccountId
    },
    #[error("Wallet already exists for account [{account_id}]")]
    AccountAlreadyExists {
        account_id: AccountId
    },
    #[error("Transaction [{transaction_id}] was not found")]
    TransactionNotFound {
        transaction_id: TransactionId
    },
    #[error("Sender and receiver cannot be the same account [{account_id}]")]
    SameAccount {
        account_id: AccountId
    },
    #[error("Amount [{amount}] must be positive")]
    InvalidAmount {
        amount: Decimal
    },
    #[error("Insufficient balance in account [{account_id}]: balance [{balance}] is below amount [{amount}]")]
    InsufficientBalance {
        account_id: AccountId,
        balance: Decimal,
        amount: Decimal
    },
    #[error("Wallet for account [{account_id}] is inactive, balance cannot be updated")]
    WalletInactive {
        account_id: AccountId
    },
    #[error("Wallet for account [{account_id}] holds [{held}] but the transfer is in [{requested}]")]
    CurrencyMismatch {
        account_id: AccountId,
        held: Currency,
        requested: Currency
    },
    #[error("Transaction [{transaction_id}] cannot move from [{from:?}] to [{to:?}]")]
    IllegalTransition {
        transaction_id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus
    },
    #[error("Timed out after [{waited:?}] waiting for the lock on account [{account_id}]")]
    LockTimeout {
        account_id: AccountId,
        waited: Duration
    },
    #[error("Numeric overflow occurred for account [{account_id}]")]
    Overflow {
        account_id: AccountId
    },
    #[error("Transaction [{transaction_id}] failed and was rolled back: {source}")]
    TransferAborted {
        transaction_id: TransactionId,
        source: Box<LedgerError>
    },
    #[error("Ledger inconsistency: {message}")]
    InternalInconsistency {
        message: String
    }
}

/// Stable, transport-independent classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    SameAccount,
    InvalidAmount,
    InsufficientBalance,
    WalletInactive,
    CurrencyMismatch,
    LockTimeout,
    InternalInconsistency
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::SameAccount => "SAME_ACCOUNT",
            ErrorKind::InvalidAmount => "INVALID_AMOUNT",
            ErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorKind::WalletInactive => "WALLET_INACTIVE",
            ErrorKind::CurrencyMismatch => "CURRENCY_MISMATCH",
            ErrorKind::LockTimeout => "LOCK_TIMEOUT",
            ErrorKind::InternalInconsistency => "INTERNAL_INCONSISTENCY"
        }
    }
}

impl LedgerError {
    //NOTE: Same factory approach as the original account errors, it keeps the call sites in the stores and the
    //      engine down to a single line instead of repeating struct literals everywhere.

    pub fn account_not_found(account_id: &str) -> Self {
        Self::AccountNotFound { account_id: account_id.to_string() }
    }

    pub fn account_already_exists(account_id: &str) -> Self {
        Self::AccountAlreadyExists { account_id: account_id.to_string() }
    }

    pub fn transaction_not_found(transaction_id: TransactionId) -> Self {
        Self::TransactionNotFound { transaction_id }
    }

    pub fn same_account(account_id: &str) -> Self {
        Self::SameAccount { account_id: account_id.to_string() }
    }

    pub fn invalid_amount(amount: Decimal) -> Self {
        Self::InvalidAmount { amount }
    }

    pub fn insufficient_balance(account_id: &str, balance: Decimal, amount: Decimal) -> Self {
        Self::InsufficientBalance { account_id: account_id.to_string(), balance, amount }
    }

    pub fn wallet_inactive(account_id: &str) -> Self {
        Self::WalletInactive { account_id: account_id.to_string() }
    }

    pub fn currency_mismatch(account_id: &str, held: Currency, requested: Currency) -> Self {
        Self::CurrencyMismatch { account_id: account_id.to_string(), held, requested }
    }

    pub fn lock_timeout(account_id: &str, waited: Duration) -> Self {
        Self::LockTimeout { account_id: account_id.to_string(), waited }
    }

    pub fn overflow(account_id: &str) -> Self {
        Self::Overflow { account_id: account_id.to_string() }
    }

    pub fn aborted(transaction_id: TransactionId, source: LedgerError) -> Self {
        Self::TransferAborted { transaction_id, source: Box::new(source) }
    }

    pub fn inconsistency(message: impl Into<String>) -> Self {
        Self::InternalInconsistency { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound { .. } | Self::TransactionNotFound { .. } => ErrorKind::NotFound,
            Self::AccountAlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::SameAccount { .. } => ErrorKind::SameAccount,
            Self::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::WalletInactive { .. } => ErrorKind::WalletInactive,
            Self::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
            Self::LockTimeout { .. } => ErrorKind::LockTimeout,
            Self::TransferAborted { source, .. } => source.kind(),
            Self::IllegalTransition { .. } | Self::Overflow { .. } | Self::InternalInconsistency { .. } => {
                ErrorKind::InternalInconsistency
            }
        }
    }
}
