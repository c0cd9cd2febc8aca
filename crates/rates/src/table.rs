//! Rate table trait and the in-memory implementation

use corebank_core::CurrencyCode;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::RateError;

/// Currency Rate Table - maps a currency code to its rate against BGN.
///
/// `amount_bgn = amount * rate_to_bgn(currency)`. The reference currency
/// itself always has rate 1.
pub trait RateTable: Send + Sync {
    /// Get the conversion rate of a currency to the reference currency
    fn rate_to_bgn(&self, currency: &CurrencyCode) -> Result<Decimal, RateError>;

    /// Check if a currency has a configured rate
    fn is_supported(&self, currency: &CurrencyCode) -> bool {
        self.rate_to_bgn(currency).is_ok()
    }
}

/// In-memory rate table with programmatically set rates.
///
/// Used both as the test fixture and as the runtime table loaded from
/// configuration at startup.
pub struct FixedRateTable {
    rates: RwLock<HashMap<CurrencyCode, Decimal>>,
}

impl FixedRateTable {
    /// Create an empty table holding only the reference currency at rate 1
    pub fn new() -> Self {
        let table = Self {
            rates: RwLock::new(HashMap::new()),
        };
        table
            .rates
            .write()
            .expect("rate table lock poisoned")
            .insert(CurrencyCode::bgn(), Decimal::ONE);
        table
    }

    /// Create a table with the fixed central-bank rates used in demos
    pub fn with_defaults() -> Self {
        let table = Self::new();

        let mut rates = table.rates.write().expect("rate table lock poisoned");
        rates.insert(CurrencyCode::eur(), Decimal::new(195583, 5)); // 1.95583
        rates.insert(CurrencyCode::usd(), Decimal::new(18095, 4)); // 1.8095
        drop(rates);

        table
    }

    /// Set or replace the rate for a currency.
    ///
    /// Rates must be strictly positive.
    pub fn set_rate(&self, currency: CurrencyCode, rate: Decimal) -> Result<(), RateError> {
        if rate <= Decimal::ZERO {
            return Err(RateError::NonPositiveRate { currency, rate });
        }
        self.rates
            .write()
            .expect("rate table lock poisoned")
            .insert(currency, rate);
        Ok(())
    }

    /// List all configured currencies
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        self.rates
            .read()
            .expect("rate table lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for FixedRateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RateTable for FixedRateTable {
    fn rate_to_bgn(&self, currency: &CurrencyCode) -> Result<Decimal, RateError> {
        self.rates
            .read()
            .expect("rate table lock poisoned")
            .get(currency)
            .copied()
            .ok_or_else(|| RateError::UnknownCurrency(currency.clone()))
    }
}
