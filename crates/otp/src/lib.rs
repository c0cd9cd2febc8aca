//! CoreBank OTP Issuer
//!
//! Generates the one-time code bound to a pending transfer. The code is
//! recorded on the transfer record by the state machine and later compared
//! (concatenated after the actor's PIN) during authorization. Delivery to
//! the customer goes through the notification dispatcher.

use corebank_core::TransferId;
use rand::Rng;

/// Number of digits in a generated code
pub const OTP_LENGTH: usize = 6;

/// OTP Issuer - produces a fresh one-time code for a transfer.
///
/// Issuing a new code invalidates the previous one: the state machine
/// overwrites `otp_generated` on the transfer record.
pub trait OtpIssuer: Send + Sync {
    /// Generate a code for the given transfer
    fn generate(&self, transfer_id: TransferId) -> String;
}

/// Random 6-digit issuer used in production.
pub struct RandomOtpIssuer;

impl OtpIssuer for RandomOtpIssuer {
    fn generate(&self, _transfer_id: TransferId) -> String {
        let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{:06}", code)
    }
}

/// Fixed issuer for tests - always returns the configured code.
pub struct FixedOtpIssuer {
    code: String,
}

impl FixedOtpIssuer {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl OtpIssuer for FixedOtpIssuer {
    fn generate(&self, _transfer_id: TransferId) -> String {
        self.code.clone()
    }
}
