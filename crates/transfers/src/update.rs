//! Caller-facing request shapes

use corebank_core::{Amount, CurrencyCode, Iban};
use serde::{Deserialize, Serialize};

use crate::transfer::{PaymentSystem, TransferStatus};

/// Fields for creating a new transfer; it always starts Initiated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub account: Iban,
    pub beneficiary_iban: Iban,
    pub beneficiary_bic: String,
    pub beneficiary_bank: String,
    pub beneficiary_name: String,
    pub amount: Amount,
    pub currency: CurrencyCode,
    pub details: String,
    pub payment_system: PaymentSystem,
}

/// A status-changing update request.
///
/// `status` is what the caller proposes (only Initiated, Approved or
/// Rejected are accepted; the processed states are system-assigned).
/// Every other field follows merge-overwrite: `None` keeps the prior
/// value. `credential` is the PIN‖OTP string that authorizes settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferUpdate {
    pub status: TransferStatus,
    pub amount: Option<Amount>,
    pub currency: Option<CurrencyCode>,
    pub beneficiary_iban: Option<Iban>,
    pub beneficiary_bic: Option<String>,
    pub beneficiary_bank: Option<String>,
    pub beneficiary_name: Option<String>,
    pub details: Option<String>,
    pub payment_system: Option<PaymentSystem>,
    pub credential: Option<String>,
}

impl TransferUpdate {
    /// An update that only proposes a status change
    pub fn status_only(status: TransferStatus) -> Self {
        Self {
            status,
            amount: None,
            currency: None,
            beneficiary_iban: None,
            beneficiary_bic: None,
            beneficiary_bank: None,
            beneficiary_name: None,
            details: None,
            payment_system: None,
            credential: None,
        }
    }

    /// A status proposal carrying the PIN‖OTP credential
    pub fn with_credential(status: TransferStatus, credential: impl Into<String>) -> Self {
        Self {
            credential: Some(credential.into()),
            ..Self::status_only(status)
        }
    }
}
