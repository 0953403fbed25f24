use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::{AccountId, Currency};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Open,
    Transfer,
    Disable,
    Close
}

/// Represents a single row from a replay CSV file.
///
/// Only `transfer` rows use every column. `open` reads `amount` as the initial
/// balance and `currency` as the wallet denomination, while `disable` and
/// `close` only need the `account` column.
#[derive(Debug, Clone, Deserialize)]
pub struct Command {
    #[serde(rename = "command")]
    pub kind: CommandKind,
    pub account: AccountId,
    #[serde(default)]
    pub counterparty: Option<AccountId>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub description: Option<String>
}
