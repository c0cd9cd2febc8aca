//! Authorization errors

use corebank_core::{Amount, UserId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("No role-bearing identity for user: {0}")]
    UnrecognizedActor(UserId),

    #[error("Submitted credential does not match PIN and OTP")]
    InvalidCredential,

    #[error("Transfer of {amount_bgn} BGN exceeds the manager limit of {limit} BGN")]
    LimitExceeded { limit: Amount, amount_bgn: Amount },

    #[error("Role {0} is not permitted to authorize transfers")]
    Forbidden(&'static str),
}
