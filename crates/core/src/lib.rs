//! CoreBank Core - Domain types
//!
//! This crate contains the fundamental types used across CoreBank:
//! - `Amount`: Non-negative decimal wrapper for monetary amounts
//! - `CurrencyCode`: Three-letter currency codes with a BGN reference
//! - `Iban`: Structurally validated account numbers
//! - `TransferId` / `UserId`: Identifier newtypes

pub mod amount;
pub mod currency;
pub mod iban;
pub mod ids;

pub use amount::{Amount, AmountError};
pub use currency::{CurrencyCode, CurrencyError, REFERENCE_CURRENCY};
pub use iban::{Iban, IbanError};
pub use ids::{TransferId, UserId};
