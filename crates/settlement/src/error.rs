//! Settlement errors

use corebank_core::{AmountError, Iban};
use corebank_ledger::LedgerError;
use corebank_rates::RateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Insufficient funds on {iban}: available {available}, required {required}")]
    InsufficientFunds {
        iban: Iban,
        available: String,
        required: String,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Rate error: {0}")]
    Rate(#[from] RateError),

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Gave up settling {0} after repeated balance conflicts")]
    RetriesExhausted(Iban),

    #[error("Debit on {0} could not be compensated after a failed credit leg")]
    CompensationFailed(Iban),
}
