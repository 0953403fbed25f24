use super::{Currency, CurrencyError};
use anyhow::Result;
use std::str::FromStr;

#[test]
fn test_currency_parses_known_codes_case_insensitively() -> Result<()> {
    let test_cases = vec![
        ("USD", Currency::Usd),
        ("usd", Currency::Usd),
        ("  eur ", Currency::Eur),
        ("Gbp", Currency::Gbp),
        ("INR", Currency::Inr),
        ("jpy", Currency::Jpy),
    ];

    for (input_string, expected) in test_cases {
        assert_eq!(Currency::from_str(input_string)?, expected);
    }

    Ok(())
}

#[test]
fn test_currency_rejects_unknown_and_empty_codes() {
    assert!(matches!(Currency::from_str("BTC"), Err(CurrencyError::Unsupported(_))));
    assert!(matches!(Currency::from_str("   "), Err(CurrencyError::Empty)));
}

#[test]
fn test_currency_displays_as_iso_code_and_defaults_to_usd() {
    assert_eq!(Currency::default(), Currency::Usd);
    assert_eq!(Currency::Eur.to_string(), "EUR");
}
