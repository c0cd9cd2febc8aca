//! CLI commands

use chrono::{NaiveDate, TimeZone, Utc};
use corebank_core::{Amount, CurrencyCode, Iban, TransferId, UserId};
use corebank_ledger::LedgerStore;
use corebank_transfers::{
    TransferFilter, TransferRequest, TransferStatus, TransferUpdate,
};
use rust_decimal::Decimal;

use crate::context::AppContext;

/// Open an account in the ledger
pub fn open_account(
    ctx: &AppContext,
    iban: &str,
    currency: &str,
    balance: Decimal,
) -> Result<(), anyhow::Error> {
    let iban: Iban = iban.parse()?;
    let currency: CurrencyCode = currency.parse()?;
    let account = ctx
        .ledger
        .open_account(iban, currency, Amount::new(balance)?)?;

    println!(
        "✅ Opened {} ({} {})",
        account.iban, account.balance, account.currency
    );
    Ok(())
}

/// Show every account and its balance
pub fn balances(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let accounts = ctx.ledger.accounts()?;
    if accounts.is_empty() {
        println!("No accounts.");
        return Ok(());
    }
    for account in accounts {
        println!(
            "{}  {:>14} {}",
            account.iban, account.balance, account.currency
        );
    }
    Ok(())
}

/// Create a fund transfer in Initiated status
#[allow(clippy::too_many_arguments)]
pub fn create_transfer(
    ctx: &AppContext,
    owner: &str,
    account: &str,
    beneficiary: &str,
    name: &str,
    amount: Decimal,
    currency: &str,
    details: &str,
) -> Result<(), anyhow::Error> {
    let request = TransferRequest {
        account: account.parse()?,
        beneficiary_iban: beneficiary.parse()?,
        beneficiary_bic: String::new(),
        beneficiary_bank: String::new(),
        beneficiary_name: name.to_string(),
        amount: Amount::new(amount)?,
        currency: currency.parse()?,
        details: details.to_string(),
        payment_system: Default::default(),
    };

    let transfer = ctx.engine.create(request, &UserId::new(owner))?;
    println!(
        "✅ Transfer {} initiated: {} {} ({} BGN) from {} to {}",
        transfer.id,
        transfer.amount,
        transfer.currency,
        transfer.amount_bgn,
        transfer.account,
        transfer.beneficiary_iban
    );
    Ok(())
}

/// Issue a fresh OTP for a transfer
pub fn issue_otp(ctx: &AppContext, id: u64) -> Result<(), anyhow::Error> {
    ctx.engine.issue_otp(TransferId(id))?;
    println!("✅ OTP issued for transfer {id}");
    Ok(())
}

/// Authorize a transfer with the owner's PIN‖OTP credential
pub fn authorize(
    ctx: &AppContext,
    id: u64,
    actor: &str,
    credential: &str,
) -> Result<(), anyhow::Error> {
    let update = TransferUpdate::with_credential(TransferStatus::Initiated, credential);
    finish_transition(ctx, TransferId(id), &update, actor)
}

/// Approve a transfer as staff (no credential check)
pub fn approve(ctx: &AppContext, id: u64, actor: &str) -> Result<(), anyhow::Error> {
    let update = TransferUpdate::status_only(TransferStatus::Approved);
    finish_transition(ctx, TransferId(id), &update, actor)
}

/// Reject a transfer
pub fn reject(ctx: &AppContext, id: u64, actor: &str) -> Result<(), anyhow::Error> {
    let update = TransferUpdate::status_only(TransferStatus::Rejected);
    let transfer = ctx
        .engine
        .request_transition(TransferId(id), &update, &UserId::new(actor))?;
    println!("✅ Transfer {} rejected by {}", transfer.id, actor);
    Ok(())
}

fn finish_transition(
    ctx: &AppContext,
    id: TransferId,
    update: &TransferUpdate,
    actor: &str,
) -> Result<(), anyhow::Error> {
    let transfer = ctx
        .engine
        .request_transition(id, update, &UserId::new(actor))?;
    println!(
        "✅ Transfer {} now {} (reference: {})",
        transfer.id,
        transfer.status,
        transfer.reference.as_deref().unwrap_or("-")
    );
    Ok(())
}

/// Show a transfer as JSON
pub fn show(ctx: &AppContext, id: u64) -> Result<(), anyhow::Error> {
    let transfer = ctx.engine.get(TransferId(id))?;
    println!("{}", serde_json::to_string_pretty(&transfer)?);
    Ok(())
}

/// Delete an Initiated transfer
pub fn delete(ctx: &AppContext, id: u64, actor: &str) -> Result<(), anyhow::Error> {
    ctx.engine.delete(TransferId(id), &UserId::new(actor))?;
    println!("✅ Transfer {id} deleted");
    Ok(())
}

/// List transfers, optionally filtered by account
pub fn list(ctx: &AppContext, account: Option<&str>) -> Result<(), anyhow::Error> {
    let filter = TransferFilter {
        account: account.map(str::parse::<Iban>).transpose()?,
        ..Default::default()
    };

    let transfers = ctx.engine.list(&filter)?;
    if transfers.is_empty() {
        println!("No transfers.");
        return Ok(());
    }
    for t in transfers {
        println!(
            "{:>6}  {:<22} -> {:<22}  {:>12} {}  [{}]  {}",
            t.id.value(),
            t.account,
            t.beneficiary_iban,
            t.amount,
            t.currency,
            t.status,
            t.reference.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Print an account statement for a date window (inclusive days)
pub fn statement(
    ctx: &AppContext,
    account: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<(), anyhow::Error> {
    let account: Iban = account.parse()?;
    let from = Utc.from_utc_datetime(&from.and_hms_opt(0, 0, 0).unwrap_or_default());
    let before = Utc.from_utc_datetime(
        &to.succ_opt()
            .unwrap_or(to)
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default(),
    );

    let entries = ctx.engine.statement(&account, from, before)?;
    if entries.is_empty() {
        println!("No movements.");
        return Ok(());
    }

    println!(
        "{:<12} {:>6} {:<20} {:>12} {:>12}  {}",
        "date", "id", "reference", "debit", "credit", "details"
    );
    for entry in entries {
        println!(
            "{:<12} {:>6} {:<20} {:>12} {:>12}  {}",
            entry.date.format("%Y-%m-%d"),
            entry.transfer_id.value(),
            entry.reference.as_deref().unwrap_or("-"),
            entry.amount_debit,
            entry.amount_credit,
            entry.details
        );
    }
    Ok(())
}
