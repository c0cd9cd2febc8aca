//! Transfer errors

use corebank_authorization::AuthorizationError;
use corebank_core::{AmountError, TransferId, UserId};
use corebank_ledger::LedgerError;
use corebank_rates::RateError;
use corebank_settlement::SettlementError;
use thiserror::Error;

use crate::transfer::TransferStatus;

/// Errors from the transfer store layer
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Transfer not found: {0}")]
    NotFound(TransferId),

    #[error("Stored transfer {id} is corrupt: {detail}")]
    Corrupt { id: i64, detail: String },
}

/// Errors surfaced by the transfer state machine
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Status '{0}' cannot be requested by a caller")]
    InvalidStatusValue(String),

    #[error("Transfer not found: {0}")]
    NotFound(TransferId),

    #[error("Transfer {id} is already {status}; re-read before retrying")]
    Stale {
        id: TransferId,
        status: TransferStatus,
    },

    #[error("Transition from {from} to {to} is not allowed")]
    TransitionNotAllowed {
        from: TransferStatus,
        to: TransferStatus,
    },

    #[error("Only Initiated transfers may be edited or deleted (status: {0})")]
    NotEditable(TransferStatus),

    #[error("User {0} does not own this transfer")]
    NotOwner(UserId),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error("Rate error: {0}")]
    Rate(#[from] RateError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => TransferError::NotFound(id),
            other => TransferError::Storage(other),
        }
    }
}
