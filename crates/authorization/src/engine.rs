//! Authorization engine - the pre-settlement gatekeeper

use corebank_core::{Amount, UserId};
use std::sync::Arc;

use crate::actor::{Actor, Role};
use crate::directory::ActorDirectory;
use crate::error::AuthorizationError;

/// Everything the engine needs to decide one authorization attempt.
///
/// `credential` is the caller-submitted string; when present it must equal
/// the actor's PIN concatenated with `otp_generated`, byte for byte.
/// A missing credential is the staff/manager override path.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest<'a> {
    pub actor: &'a UserId,
    pub credential: Option<&'a str>,
    pub otp_generated: Option<&'a str>,
    pub amount_bgn: Amount,
}

/// Authorization Engine.
///
/// A pure predicate over current state plus the submitted credential: it
/// never mutates anything. Checks run in a fixed order: actor resolution,
/// credential, manager limit, role permission.
pub struct AuthorizationEngine {
    directory: Arc<ActorDirectory>,
}

impl AuthorizationEngine {
    pub fn new(directory: Arc<ActorDirectory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &ActorDirectory {
        &self.directory
    }

    /// Decide whether settlement may proceed.
    ///
    /// Returns the resolved actor on success so the caller can record the
    /// approving identity.
    pub fn authorize(&self, request: &AuthorizationRequest<'_>) -> Result<Actor, AuthorizationError> {
        let actor = self
            .directory
            .resolve(request.actor)
            .ok_or_else(|| AuthorizationError::UnrecognizedActor(request.actor.clone()))?;

        if let Some(credential) = request.credential {
            let expected = format!(
                "{}{}",
                actor.pin.as_deref().unwrap_or(""),
                request.otp_generated.unwrap_or("")
            );
            if !constant_time_eq(credential.as_bytes(), expected.as_bytes()) {
                return Err(AuthorizationError::InvalidCredential);
            }
        }

        if actor.role == Role::Manager {
            if let Some(limit) = actor.transfer_limit {
                if request.amount_bgn > limit {
                    return Err(AuthorizationError::LimitExceeded {
                        limit,
                        amount_bgn: request.amount_bgn,
                    });
                }
            }
        }

        if actor.role == Role::Accountant {
            return Err(AuthorizationError::Forbidden(actor.role.as_str()));
        }

        Ok(actor)
    }
}

/// Byte comparison that does not short-circuit on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
