//! Transfer state machine - orchestrates authorization, settlement and
//! persistence for one transfer transition at a time

use chrono::Utc;
use corebank_authorization::{ActorDirectory, AuthorizationEngine, AuthorizationRequest};
use corebank_core::{TransferId, UserId};
use corebank_ledger::LedgerStore;
use corebank_notify::{dispatch_or_log, Notification, NotificationDispatcher};
use corebank_otp::OtpIssuer;
use corebank_rates::RateTable;
use corebank_settlement::{reference_code, SettlementEngine, SettlementError};
use std::sync::Arc;

use crate::error::TransferError;
use crate::statement::{build_statement, StatementEntry};
use crate::store::{TransferFilter, TransferStore};
use crate::transfer::{FundTransfer, TransferStatus};
use crate::update::{TransferRequest, TransferUpdate};

/// The Transfer State Machine.
///
/// Owns the lifecycle of transfer records: callers never mutate a stored
/// transfer except through `request_transition`, which runs the
/// authorization check, the settlement legs and the status write as one
/// serialized unit of work. Concurrent submissions on the same transfer
/// are serialized by the store; the loser observes the terminal state and
/// fails with `Stale`.
pub struct TransferEngine {
    store: Arc<TransferStore>,
    ledger: Arc<dyn LedgerStore>,
    rates: Arc<dyn RateTable>,
    authorization: AuthorizationEngine,
    settlement: SettlementEngine,
    otp: Arc<dyn OtpIssuer>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl TransferEngine {
    pub fn new(
        store: Arc<TransferStore>,
        ledger: Arc<dyn LedgerStore>,
        rates: Arc<dyn RateTable>,
        directory: Arc<ActorDirectory>,
        otp: Arc<dyn OtpIssuer>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let authorization = AuthorizationEngine::new(directory);
        let settlement = SettlementEngine::new(ledger.clone(), rates.clone());
        Self {
            store,
            ledger,
            rates,
            authorization,
            settlement,
            otp,
            dispatcher,
        }
    }

    /// Create a transfer in Initiated status.
    ///
    /// The originating account must exist in the ledger; `amount_bgn` is
    /// computed from the current rate.
    pub fn create(
        &self,
        request: TransferRequest,
        owner: &UserId,
    ) -> Result<FundTransfer, TransferError> {
        self.ledger.get_account(&request.account)?;

        let rate = self.rates.rate_to_bgn(&request.currency)?;
        let amount_bgn = request.amount.to_reference(rate)?;

        let transfer = self.store.insert(&request, owner, amount_bgn)?;
        tracing::info!(
            id = %transfer.id,
            account = %transfer.account,
            amount = %transfer.amount,
            currency = %transfer.currency,
            "Transfer initiated"
        );
        Ok(transfer)
    }

    /// Generate and record a fresh OTP for a pending transfer, then send
    /// it to the owner's phone (fire-and-forget).
    ///
    /// Each issuance overwrites the previous code.
    pub fn issue_otp(&self, id: TransferId) -> Result<FundTransfer, TransferError> {
        let code = self
            .store
            .update_with::<_, TransferError, _>(id, |transfer| {
                if transfer.status.is_terminal() {
                    return Err(TransferError::Stale {
                        id: transfer.id,
                        status: transfer.status,
                    });
                }
                let code = self.otp.generate(transfer.id);
                transfer.otp_generated = Some(code.clone());
                Ok(code)
            })?;

        let transfer = self.store.get(id)?;

        if let Some(phone) = self
            .authorization
            .directory()
            .resolve(&transfer.user_id)
            .and_then(|actor| actor.mobile_phone)
        {
            dispatch_or_log(
                self.dispatcher.as_ref(),
                Notification::sms(phone, format!("CoreBank OTP for transfer {id}: {code}")),
            );
        } else {
            tracing::debug!(id = %id, user = %transfer.user_id, "No phone on file, OTP not sent");
        }

        Ok(transfer)
    }

    /// Apply a caller-proposed update to a transfer.
    ///
    /// Callers may propose Initiated (plain save), Approved or Rejected;
    /// the processed states are assigned here and only here. Settlement
    /// runs when the proposal is Approved, or when it is Initiated and a
    /// PIN‖OTP credential is supplied.
    pub fn request_transition(
        &self,
        id: TransferId,
        update: &TransferUpdate,
        actor: &UserId,
    ) -> Result<FundTransfer, TransferError> {
        let proposed = update.status;
        if !matches!(
            proposed,
            TransferStatus::Initiated | TransferStatus::Approved | TransferStatus::Rejected
        ) {
            return Err(TransferError::InvalidStatusValue(proposed.to_string()));
        }

        let settlement_failure = self
            .store
            .update_with::<_, TransferError, _>(id, |transfer| {
                self.apply_transition(transfer, update, proposed, actor)
            })?;

        let transfer = self.store.get(id)?;

        if let Some(e) = settlement_failure {
            return Err(TransferError::Settlement(e));
        }

        if transfer.status == TransferStatus::Processed {
            self.notify_processed(&transfer);
        }

        Ok(transfer)
    }

    /// The single-transfer unit of work. Runs under the store lock;
    /// returning Err discards every field change.
    fn apply_transition(
        &self,
        transfer: &mut FundTransfer,
        update: &TransferUpdate,
        proposed: TransferStatus,
        actor: &UserId,
    ) -> Result<Option<SettlementError>, TransferError> {
        let current = transfer.status;

        if current.is_terminal() {
            return Err(TransferError::Stale {
                id: transfer.id,
                status: current,
            });
        }

        if proposed != current && !current.can_transition_to(proposed) {
            return Err(TransferError::TransitionNotAllowed {
                from: current,
                to: proposed,
            });
        }

        merge_fields(transfer, update);

        // The BGN amount is derived state: recompute from the live rate
        // before any decision, never trust the stored value.
        let rate = self.rates.rate_to_bgn(&transfer.currency)?;
        transfer.amount_bgn = transfer.amount.to_reference(rate)?;

        if proposed == TransferStatus::Rejected {
            transfer.status = TransferStatus::Rejected;
            transfer.approved_by = Some(actor.clone());
            tracing::info!(id = %transfer.id, by = %actor, "Transfer rejected");
            return Ok(None);
        }

        let wants_settlement = proposed == TransferStatus::Approved
            || (current == TransferStatus::Initiated && update.credential.is_some());

        if !wants_settlement {
            // Plain save while the transfer stays Initiated: owner only
            if &transfer.user_id != actor {
                return Err(TransferError::NotOwner(actor.clone()));
            }
            tracing::debug!(id = %transfer.id, "Transfer fields updated");
            return Ok(None);
        }

        let approver = self.authorization.authorize(&AuthorizationRequest {
            actor,
            credential: update.credential.as_deref(),
            otp_generated: transfer.otp_generated.as_deref(),
            amount_bgn: transfer.amount_bgn,
        })?;

        if let Some(credential) = update.credential.as_deref() {
            let pin_len = approver.pin.as_deref().map(str::len).unwrap_or(0);
            transfer.otp_received = Some(credential.get(pin_len..).unwrap_or("").to_string());
        }

        match self.settlement.settle(
            &transfer.account,
            &transfer.beneficiary_iban,
            transfer.amount_bgn,
        ) {
            Ok(_receipt) => {
                transfer.status = TransferStatus::Processed;
                transfer.approved_by = Some(approver.user_id.clone());
                transfer.reference =
                    Some(reference_code(Utc::now().date_naive(), transfer.id));
                tracing::info!(
                    id = %transfer.id,
                    by = %approver.user_id,
                    reference = transfer.reference.as_deref().unwrap_or(""),
                    "Transfer processed"
                );
                Ok(None)
            }
            Err(e) => {
                // The record must still reach a terminal, auditable state;
                // the error itself is surfaced to the caller afterwards.
                transfer.status = TransferStatus::ProcessedWithError;
                tracing::error!(id = %transfer.id, error = %e, "Transfer processed with error");
                Ok(Some(e))
            }
        }
    }

    /// Delete an Initiated transfer. Owner only.
    pub fn delete(&self, id: TransferId, actor: &UserId) -> Result<(), TransferError> {
        let transfer = self.store.get(id)?;
        if &transfer.user_id != actor {
            return Err(TransferError::NotOwner(actor.clone()));
        }
        if !transfer.is_editable() {
            return Err(TransferError::NotEditable(transfer.status));
        }

        if !self.store.delete_if_initiated(id)? {
            let current = self.store.get(id)?;
            return Err(TransferError::NotEditable(current.status));
        }
        tracing::info!(id = %id, by = %actor, "Transfer deleted");
        Ok(())
    }

    /// Get a transfer by id
    pub fn get(&self, id: TransferId) -> Result<FundTransfer, TransferError> {
        Ok(self.store.get(id)?)
    }

    /// List transfers matching the filter
    pub fn list(&self, filter: &TransferFilter) -> Result<Vec<FundTransfer>, TransferError> {
        Ok(self.store.list(filter)?)
    }

    /// Account statement: processed debits and credits for an account in
    /// a time window, amounts in the account's own currency.
    pub fn statement(
        &self,
        account: &corebank_core::Iban,
        from: chrono::DateTime<Utc>,
        before: chrono::DateTime<Utc>,
    ) -> Result<Vec<StatementEntry>, TransferError> {
        build_statement(
            &self.store,
            self.ledger.as_ref(),
            self.rates.as_ref(),
            account,
            from,
            before,
        )
    }

    fn notify_processed(&self, transfer: &FundTransfer) {
        let Some(phone) = self
            .authorization
            .directory()
            .resolve(&transfer.user_id)
            .and_then(|actor| actor.mobile_phone)
        else {
            tracing::debug!(id = %transfer.id, "No phone on file, processed notice not sent");
            return;
        };

        let body = format!(
            "Fund transfer {} for {} {} processed. Reference {}.",
            transfer.id,
            transfer.amount,
            transfer.currency,
            transfer.reference.as_deref().unwrap_or("-")
        );
        dispatch_or_log(self.dispatcher.as_ref(), Notification::sms(phone, body));
    }
}

/// Merge-overwrite policy: unspecified fields keep their prior values.
/// Status, approver and reference are never merged here.
fn merge_fields(transfer: &mut FundTransfer, update: &TransferUpdate) {
    if let Some(amount) = update.amount {
        transfer.amount = amount;
    }
    if let Some(ref currency) = update.currency {
        transfer.currency = currency.clone();
    }
    if let Some(ref iban) = update.beneficiary_iban {
        transfer.beneficiary_iban = iban.clone();
    }
    if let Some(ref bic) = update.beneficiary_bic {
        transfer.beneficiary_bic = bic.clone();
    }
    if let Some(ref bank) = update.beneficiary_bank {
        transfer.beneficiary_bank = bank.clone();
    }
    if let Some(ref name) = update.beneficiary_name {
        transfer.beneficiary_name = name.clone();
    }
    if let Some(ref details) = update.details {
        transfer.details = details.clone();
    }
    if let Some(payment_system) = update.payment_system {
        transfer.payment_system = payment_system;
    }
}
