//! FundTransfer - the transfer record and its lifecycle states

use chrono::{DateTime, Utc};
use corebank_core::{Amount, CurrencyCode, Iban, TransferId, UserId};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Lifecycle status of a fund transfer.
///
/// Stored as a single letter; `Initiated` is the only state a caller may
/// freely edit, and `Rejected`/`Processed`/`ProcessedWithError` are
/// terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum TransferStatus {
    #[strum(serialize = "Initiated")]
    Initiated,

    #[strum(serialize = "Approved")]
    Approved,

    #[strum(serialize = "Rejected")]
    Rejected,

    #[strum(serialize = "Processed")]
    Processed,

    #[strum(serialize = "Processed with error")]
    ProcessedWithError,
}

impl TransferStatus {
    /// Single-letter storage code
    pub fn code(&self) -> &'static str {
        match self {
            TransferStatus::Initiated => "I",
            TransferStatus::Approved => "A",
            TransferStatus::Rejected => "R",
            TransferStatus::Processed => "P",
            TransferStatus::ProcessedWithError => "E",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "I" => Some(TransferStatus::Initiated),
            "A" => Some(TransferStatus::Approved),
            "R" => Some(TransferStatus::Rejected),
            "P" => Some(TransferStatus::Processed),
            "E" => Some(TransferStatus::ProcessedWithError),
            _ => None,
        }
    }

    /// No transitions leave a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Rejected
                | TransferStatus::Processed
                | TransferStatus::ProcessedWithError
        )
    }

    /// The transition graph: `I -> {A, R, P, E}`, `A -> {P, E}`
    pub fn can_transition_to(&self, target: TransferStatus) -> bool {
        match self {
            TransferStatus::Initiated => matches!(
                target,
                TransferStatus::Approved
                    | TransferStatus::Rejected
                    | TransferStatus::Processed
                    | TransferStatus::ProcessedWithError
            ),
            TransferStatus::Approved => matches!(
                target,
                TransferStatus::Processed | TransferStatus::ProcessedWithError
            ),
            _ => false,
        }
    }
}

/// Clearing channel the transfer is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum PaymentSystem {
    /// Batch clearing (domestic)
    #[strum(serialize = "Bisera")]
    Bisera,

    /// Real-time gross settlement
    #[strum(serialize = "Rings")]
    Rings,

    /// Book transfer between own accounts
    #[strum(serialize = "Internal")]
    Internal,
}

impl PaymentSystem {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentSystem::Bisera => "B",
            PaymentSystem::Rings => "R",
            PaymentSystem::Internal => "I",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "B" => Some(PaymentSystem::Bisera),
            "R" => Some(PaymentSystem::Rings),
            "I" => Some(PaymentSystem::Internal),
            _ => None,
        }
    }
}

impl Default for PaymentSystem {
    fn default() -> Self {
        PaymentSystem::Bisera
    }
}

/// A fund transfer.
///
/// # Invariants
/// - `amount_bgn` is derived from `amount` at the current rate and is
///   recomputed at every transition boundary, never trusted from storage.
/// - `reference` and `approved_by` never change once the status is
///   terminal; `reference` is assigned exactly once, at Processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundTransfer {
    pub id: TransferId,

    /// Owner - the user who created the transfer
    pub user_id: UserId,

    /// Originating account; must exist in the ledger
    pub account: Iban,

    /// Beneficiary account; may be outside this bank
    pub beneficiary_iban: Iban,
    pub beneficiary_bic: String,
    pub beneficiary_bank: String,
    pub beneficiary_name: String,

    /// Amount in the transfer currency
    pub amount: Amount,

    /// Amount re-expressed in BGN (derived)
    pub amount_bgn: Amount,

    pub currency: CurrencyCode,

    /// Free-text payment details
    pub details: String,

    pub payment_system: PaymentSystem,

    pub status: TransferStatus,

    /// Last code produced by the OTP issuer for this transfer
    pub otp_generated: Option<String>,

    /// OTP part of the last submitted credential
    pub otp_received: Option<String>,

    /// Identity that approved or rejected the transfer
    pub approved_by: Option<UserId>,

    /// Bank reference code, set at Processed
    pub reference: Option<String>,

    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,

    /// Write counter, bumped by the store on every save
    pub version: u64,
}

impl FundTransfer {
    /// Only Initiated transfers may be edited or deleted by their owner
    pub fn is_editable(&self) -> bool {
        self.status == TransferStatus::Initiated
    }
}
