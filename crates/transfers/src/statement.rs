//! Account statements - processed movements in an account's own currency

use chrono::{DateTime, Utc};
use corebank_core::{Amount, Iban, TransferId};
use corebank_ledger::LedgerStore;
use corebank_rates::RateTable;
use serde::{Deserialize, Serialize};

use crate::error::TransferError;
use crate::store::{TransferFilter, TransferStore};
use crate::transfer::TransferStatus;

/// One statement line: a processed transfer seen from the account's side.
///
/// Amounts are converted from BGN into the account's currency; exactly
/// one of `amount_debit`/`amount_credit` is non-zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementEntry {
    pub transfer_id: TransferId,
    pub date: DateTime<Utc>,
    pub reference: Option<String>,
    pub beneficiary_name: String,
    pub details: String,
    pub amount_debit: Amount,
    pub amount_credit: Amount,
}

/// Build the statement for an account over `[from, before)`.
///
/// Debit lines are processed transfers drawn from the account; credit
/// lines are processed transfers whose beneficiary IBAN is the account's.
pub fn build_statement(
    store: &TransferStore,
    ledger: &dyn LedgerStore,
    rates: &dyn RateTable,
    account: &Iban,
    from: DateTime<Utc>,
    before: DateTime<Utc>,
) -> Result<Vec<StatementEntry>, TransferError> {
    let account_record = ledger.get_account(account)?;
    let rate = rates.rate_to_bgn(&account_record.currency)?;

    let window = TransferFilter {
        status: Some(TransferStatus::Processed),
        updated_from: Some(from),
        updated_before: Some(before),
        ..Default::default()
    };

    let credits = store.list(&TransferFilter {
        beneficiary_iban: Some(account.clone()),
        ..window.clone()
    })?;
    let debits = store.list(&TransferFilter {
        account: Some(account.clone()),
        ..window
    })?;

    let mut entries = Vec::with_capacity(credits.len() + debits.len());

    for transfer in credits {
        let credited = Amount::from_reference(transfer.amount_bgn, rate)?;
        entries.push(StatementEntry {
            transfer_id: transfer.id,
            date: transfer.last_updated,
            reference: transfer.reference,
            beneficiary_name: transfer.beneficiary_name,
            details: transfer.details,
            amount_debit: Amount::ZERO,
            amount_credit: credited,
        });
    }

    for transfer in debits {
        let debited = Amount::from_reference(transfer.amount_bgn, rate)?;
        entries.push(StatementEntry {
            transfer_id: transfer.id,
            date: transfer.last_updated,
            reference: transfer.reference,
            beneficiary_name: transfer.beneficiary_name,
            details: transfer.details,
            amount_debit: debited,
            amount_credit: Amount::ZERO,
        });
    }

    entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.transfer_id.cmp(&b.transfer_id)));
    Ok(entries)
}
