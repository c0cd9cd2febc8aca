//! Account - a ledger record keyed by IBAN

use corebank_core::{Amount, CurrencyCode, Iban};
use serde::{Deserialize, Serialize};

/// A bank account held in the ledger.
///
/// # Invariant
/// The balance never goes negative as a result of settlement; the
/// settlement engine checks funds before the debit leg and the store
/// rejects negative balances on write.
///
/// `version` is the optimistic-concurrency token: every balance write
/// bumps it, and a write carrying a stale version fails with `Conflict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account number
    pub iban: Iban,

    /// The currency the balance is denominated in
    pub currency: CurrencyCode,

    /// Current balance, non-negative
    pub balance: Amount,

    /// Concurrency token, bumped on every balance write
    pub version: u64,
}

impl Account {
    /// Create a fresh account record at version 0
    pub fn new(iban: Iban, currency: CurrencyCode, balance: Amount) -> Self {
        Self {
            iban,
            currency,
            balance,
            version: 0,
        }
    }
}
