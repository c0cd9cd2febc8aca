//! Integration tests for CoreBank
//!
//! Exercise the complete flow: accounts in the ledger, transfer creation,
//! OTP issuance, authorization, settlement and statements, including
//! persistence across a context restart.

use chrono::{Duration, Utc};
use corebank_core::{Amount, CurrencyCode, Iban, UserId};
use corebank_ledger::LedgerStore;
use corebank_rpc::AppContext;
use corebank_transfers::{
    TransferRequest, TransferStatus, TransferUpdate,
};
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn iban(s: &str) -> Iban {
    s.parse().unwrap()
}

fn amount(d: rust_decimal::Decimal) -> Amount {
    Amount::new(d).unwrap()
}

fn request(amount_val: rust_decimal::Decimal) -> TransferRequest {
    TransferRequest {
        account: iban("BG80BNBG96611020345678"),
        beneficiary_iban: iban("BG44UNCR70001522345678"),
        beneficiary_bic: "UNCRBGSF".to_string(),
        beneficiary_bank: "UniCredit Bulbank".to_string(),
        beneficiary_name: "Our company".to_string(),
        amount: amount(amount_val),
        currency: CurrencyCode::bgn(),
        details: "Invoice 1042".to_string(),
        payment_system: Default::default(),
    }
}

/// Create accounts -> create transfer -> OTP -> authorize -> settled.
#[test]
fn test_full_workflow_with_restart() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();

    let owner: UserId = "i.petrova".into();
    let transfer_id;

    {
        let ctx = AppContext::for_tests(data_path).unwrap();

        ctx.ledger
            .open_account(
                iban("BG80BNBG96611020345678"),
                CurrencyCode::bgn(),
                amount(dec!(1000)),
            )
            .unwrap();
        ctx.ledger
            .open_account(
                iban("BG44UNCR70001522345678"),
                CurrencyCode::bgn(),
                amount(dec!(500)),
            )
            .unwrap();

        let transfer = ctx.engine.create(request(dec!(250)), &owner).unwrap();
        transfer_id = transfer.id;
        assert_eq!(transfer.status, TransferStatus::Initiated);
        assert_eq!(transfer.amount_bgn.value(), dec!(250));

        // Issue an OTP and build the PIN‖OTP credential from it
        let with_otp = ctx.engine.issue_otp(transfer_id).unwrap();
        let otp = with_otp.otp_generated.unwrap();
        let credential = format!("0000{otp}");

        let processed = ctx
            .engine
            .request_transition(
                transfer_id,
                &TransferUpdate::with_credential(TransferStatus::Initiated, &credential),
                &owner,
            )
            .unwrap();

        assert_eq!(processed.status, TransferStatus::Processed);
        assert_eq!(processed.approved_by, Some(owner.clone()));

        let reference = processed.reference.unwrap();
        let today = Utc::now().date_naive().format("%Y%m%d").to_string();
        assert!(reference.starts_with(&format!("FT{today}")));
        assert_eq!(reference.len(), 18);

        assert_eq!(
            ctx.ledger
                .get_account(&iban("BG80BNBG96611020345678"))
                .unwrap()
                .balance
                .value(),
            dec!(750)
        );
        assert_eq!(
            ctx.ledger
                .get_account(&iban("BG44UNCR70001522345678"))
                .unwrap()
                .balance
                .value(),
            dec!(750)
        );
    }

    // Everything survives a restart
    let ctx = AppContext::for_tests(data_path).unwrap();
    let reloaded = ctx.engine.get(transfer_id).unwrap();
    assert_eq!(reloaded.status, TransferStatus::Processed);
    assert!(reloaded.reference.is_some());
    assert_eq!(
        ctx.ledger
            .get_account(&iban("BG80BNBG96611020345678"))
            .unwrap()
            .balance
            .value(),
        dec!(750)
    );

    // And terminal means terminal, even after a restart
    let retry = ctx.engine.request_transition(
        transfer_id,
        &TransferUpdate::status_only(TransferStatus::Approved),
        &"m.dimitrov".into(),
    );
    assert!(retry.is_err());
}

/// The demo manager carries a 6000 BGN limit.
#[test]
fn test_manager_limit_through_context() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = AppContext::for_tests(temp_dir.path()).unwrap();

    ctx.ledger
        .open_account(
            iban("BG80BNBG96611020345678"),
            CurrencyCode::bgn(),
            amount(dec!(10000)),
        )
        .unwrap();

    let transfer = ctx
        .engine
        .create(request(dec!(6001)), &"i.petrova".into())
        .unwrap();

    let result = ctx.engine.request_transition(
        transfer.id,
        &TransferUpdate::status_only(TransferStatus::Approved),
        &"m.dimitrov".into(),
    );
    assert!(result.is_err());

    // Nothing moved
    assert_eq!(
        ctx.ledger
            .get_account(&iban("BG80BNBG96611020345678"))
            .unwrap()
            .balance
            .value(),
        dec!(10000)
    );
}

/// Statement shows the processed transfer as a debit on the originating
/// account and a credit on the beneficiary account.
#[test]
fn test_statement_both_sides() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = AppContext::for_tests(temp_dir.path()).unwrap();

    ctx.ledger
        .open_account(
            iban("BG80BNBG96611020345678"),
            CurrencyCode::bgn(),
            amount(dec!(1000)),
        )
        .unwrap();
    ctx.ledger
        .open_account(
            iban("BG44UNCR70001522345678"),
            CurrencyCode::bgn(),
            amount(dec!(0)),
        )
        .unwrap();

    let transfer = ctx
        .engine
        .create(request(dec!(250)), &"i.petrova".into())
        .unwrap();
    ctx.engine
        .request_transition(
            transfer.id,
            &TransferUpdate::status_only(TransferStatus::Approved),
            &"m.dimitrov".into(),
        )
        .unwrap();

    let from = Utc::now() - Duration::days(1);
    let before = Utc::now() + Duration::days(1);

    let debit_side = ctx
        .engine
        .statement(&iban("BG80BNBG96611020345678"), from, before)
        .unwrap();
    assert_eq!(debit_side.len(), 1);
    assert_eq!(debit_side[0].amount_debit.value(), dec!(250));
    assert!(debit_side[0].amount_credit.is_zero());

    let credit_side = ctx
        .engine
        .statement(&iban("BG44UNCR70001522345678"), from, before)
        .unwrap();
    assert_eq!(credit_side.len(), 1);
    assert_eq!(credit_side[0].amount_credit.value(), dec!(250));
    assert!(credit_side[0].amount_debit.is_zero());
}

/// Unknown beneficiary: debit leg applies, transfer processes.
#[test]
fn test_interbank_transfer() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = AppContext::for_tests(temp_dir.path()).unwrap();

    ctx.ledger
        .open_account(
            iban("BG80BNBG96611020345678"),
            CurrencyCode::bgn(),
            amount(dec!(1000)),
        )
        .unwrap();

    let mut req = request(dec!(300));
    req.beneficiary_iban = iban("DE89370400440532013000");
    let transfer = ctx.engine.create(req, &"i.petrova".into()).unwrap();

    let processed = ctx
        .engine
        .request_transition(
            transfer.id,
            &TransferUpdate::status_only(TransferStatus::Approved),
            &"m.dimitrov".into(),
        )
        .unwrap();

    assert_eq!(processed.status, TransferStatus::Processed);
    assert_eq!(
        ctx.ledger
            .get_account(&iban("BG80BNBG96611020345678"))
            .unwrap()
            .balance
            .value(),
        dec!(700)
    );
}
