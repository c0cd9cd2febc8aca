//! CoreBank Ledger - durable account records keyed by IBAN
//!
//! The ledger is the settlement engine's collaborator: it supports atomic
//! read-modify-write of a single account's balance through versioned
//! compare-and-swap updates. Two implementations are provided, an
//! in-memory one for tests/demos and a SQLite one for real runs.

mod account;
mod error;
mod sqlite;
mod store;

pub use account::Account;
pub use error::LedgerError;
pub use sqlite::SqliteLedger;
pub use store::{InMemoryLedger, LedgerStore};
