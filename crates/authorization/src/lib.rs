//! CoreBank Authorization - who may move money, and under what proof
//!
//! Validates a requested transfer transition before settlement: resolves
//! the acting identity, verifies the PIN+OTP credential, enforces manager
//! per-transfer limits and role permissions. Authorization is a pure
//! predicate; it never mutates state.

mod actor;
mod directory;
mod engine;
mod error;

pub use actor::{Actor, Role};
pub use directory::ActorDirectory;
pub use engine::{AuthorizationEngine, AuthorizationRequest};
pub use error::AuthorizationError;
