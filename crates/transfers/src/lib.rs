//! CoreBank Transfers - the fund-transfer state machine
//!
//! Owns the transfer record and its lifecycle:
//! `Initiated -> {Approved, Rejected, Processed, Processed with error}`,
//! `Approved -> {Processed, Processed with error}`. A transition is one
//! serialized unit of work: credential/limit checks (authorization
//! engine), the dual-entry balance move (settlement engine), then the
//! status write. Also provides listings and account statements.

mod error;
mod machine;
mod statement;
mod store;
mod transfer;
mod update;

pub use error::{StoreError, TransferError};
pub use machine::TransferEngine;
pub use statement::{build_statement, StatementEntry};
pub use store::{TransferFilter, TransferStore};
pub use transfer::{FundTransfer, PaymentSystem, TransferStatus};
pub use update::{TransferRequest, TransferUpdate};
