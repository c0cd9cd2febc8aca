//! Iban - International Bank Account Number
//!
//! IBANs key every account in the ledger. Beneficiary IBANs are allowed to
//! point outside the bank, so validation is structural only: country code,
//! check digits, length and charset.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing IBANs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IbanError {
    #[error("IBAN too short (minimum 15 characters): {0}")]
    TooShort(String),

    #[error("IBAN too long (maximum 34 characters): {0}")]
    TooLong(String),

    #[error("IBAN must start with a two-letter country code: {0}")]
    InvalidCountryCode(String),

    #[error("IBAN check digits must be numeric: {0}")]
    InvalidCheckDigits(String),

    #[error("IBAN contains invalid characters: {0}")]
    InvalidCharacter(String),
}

/// A structurally validated IBAN.
///
/// Normalized on construction: whitespace stripped, uppercased.
///
/// # Example
/// ```
/// use corebank_core::Iban;
///
/// let iban: Iban = "bg80 bnbg 9661 1020 3456 78".parse().unwrap();
/// assert_eq!(iban.as_str(), "BG80BNBG96611020345678");
/// assert_eq!(iban.country_code(), "BG");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iban(String);

impl Iban {
    /// Get the IBAN as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two-letter country code prefix
    pub fn country_code(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for Iban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Iban {
    type Err = IbanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        if !s.is_ascii() {
            return Err(IbanError::InvalidCharacter(s));
        }
        if s.len() < 15 {
            return Err(IbanError::TooShort(s));
        }
        if s.len() > 34 {
            return Err(IbanError::TooLong(s));
        }
        if !s[..2].chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(IbanError::InvalidCountryCode(s));
        }
        if !s[2..4].chars().all(|c| c.is_ascii_digit()) {
            return Err(IbanError::InvalidCheckDigits(s));
        }
        if !s[4..].chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IbanError::InvalidCharacter(s));
        }

        Ok(Self(s))
    }
}

impl TryFrom<String> for Iban {
    type Error = IbanError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Iban> for String {
    fn from(iban: Iban) -> Self {
        iban.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_normalize() {
        let iban: Iban = "bg80 bnbg 9661 1020 3456 78".parse().unwrap();
        assert_eq!(iban.as_str(), "BG80BNBG96611020345678");
        assert_eq!(iban.country_code(), "BG");
    }

    #[test]
    fn test_too_short_rejected() {
        let result = "BG80BNBG".parse::<Iban>();
        assert!(matches!(result, Err(IbanError::TooShort(_))));
    }

    #[test]
    fn test_bad_country_code_rejected() {
        let result = "1G80BNBG96611020345678".parse::<Iban>();
        assert!(matches!(result, Err(IbanError::InvalidCountryCode(_))));
    }

    #[test]
    fn test_bad_check_digits_rejected() {
        let result = "BGX0BNBG96611020345678".parse::<Iban>();
        assert!(matches!(result, Err(IbanError::InvalidCheckDigits(_))));
    }

    #[test]
    fn test_serde_roundtrip() {
        let iban: Iban = "BG97DJNG828020USD00015".parse().unwrap();
        let json = serde_json::to_string(&iban).unwrap();
        let parsed: Iban = serde_json::from_str(&json).unwrap();
        assert_eq!(iban, parsed);
    }
}
