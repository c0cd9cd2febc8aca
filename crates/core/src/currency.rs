//! CurrencyCode - ISO-style three-letter currency codes
//!
//! The bank settles everything against a single reference currency (BGN).
//! Transfer amounts are carried both in their own currency and in BGN.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing currency codes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Empty currency code")]
    EmptyCode,

    #[error("Invalid currency code format (expected 3 letters): {0}")]
    InvalidFormat(String),
}

/// A three-letter currency code (e.g., BGN, EUR, USD).
///
/// Codes are normalized to uppercase on construction.
///
/// # Example
/// ```
/// use corebank_core::CurrencyCode;
///
/// let eur: CurrencyCode = "eur".parse().unwrap();
/// assert_eq!(eur.as_str(), "EUR");
/// assert!(!eur.is_reference());
/// assert!(CurrencyCode::bgn().is_reference());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

/// The reference currency every amount is re-expressed in.
pub const REFERENCE_CURRENCY: &str = "BGN";

impl CurrencyCode {
    /// The reference currency (Bulgarian lev).
    pub fn bgn() -> Self {
        Self(REFERENCE_CURRENCY.to_string())
    }

    /// Common-currency constructors
    pub fn eur() -> Self {
        Self("EUR".to_string())
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    /// Get the code as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this is the reference currency
    pub fn is_reference(&self) -> bool {
        self.0 == REFERENCE_CURRENCY
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();

        if s.is_empty() {
            return Err(CurrencyError::EmptyCode);
        }

        if s.len() != 3 || !s.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyError::InvalidFormat(s));
        }

        Ok(Self(s))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let code: CurrencyCode = "usd".parse().unwrap();
        assert_eq!(code.as_str(), "USD");
    }

    #[test]
    fn test_reference_currency() {
        assert!(CurrencyCode::bgn().is_reference());
        let eur: CurrencyCode = "EUR".parse().unwrap();
        assert!(!eur.is_reference());
    }

    #[test]
    fn test_empty_rejected() {
        let result = "".parse::<CurrencyCode>();
        assert!(matches!(result, Err(CurrencyError::EmptyCode)));
    }

    #[test]
    fn test_bad_format_rejected() {
        assert!("BG".parse::<CurrencyCode>().is_err());
        assert!("BGNX".parse::<CurrencyCode>().is_err());
        assert!("B1N".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let code: CurrencyCode = "EUR".parse().unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"EUR\"");
        let parsed: CurrencyCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, parsed);
    }
}
