//! Rate table errors

use corebank_core::CurrencyCode;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateError {
    #[error("No rate configured for currency: {0}")]
    UnknownCurrency(CurrencyCode),

    #[error("Rate must be positive, got {rate} for {currency}")]
    NonPositiveRate { currency: CurrencyCode, rate: Decimal },
}
