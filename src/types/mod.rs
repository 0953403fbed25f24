mod currency;
mod errors;
#[cfg(test)]
mod tests;

pub use currency::Currency;
pub use errors::CurrencyError;

pub type AccountId = String;
pub type TransactionId = uuid::Uuid;
