//! Ledger store errors

use corebank_core::Iban;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    NotFound(Iban),

    #[error("Account already exists: {0}")]
    AlreadyExists(Iban),

    #[error("Concurrent update conflict on account {0}")]
    Conflict(Iban),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Stored record is corrupt for {iban}: {detail}")]
    CorruptRecord { iban: String, detail: String },
}
