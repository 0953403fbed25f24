use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error("Currency error: unsupported currency code [{0}]")]
    Unsupported(String),
    #[error("Currency error: empty currency code")]
    Empty
}
