//! Settlement engine - the atomic dual-entry balance mutation

use corebank_core::{Amount, Iban};
use corebank_ledger::{Account, LedgerError, LedgerStore};
use corebank_rates::RateTable;
use std::sync::Arc;

use crate::error::SettlementError;

/// How many times a leg re-reads and retries after a version conflict
/// before giving up.
const MAX_CAS_RETRIES: usize = 8;

/// What the engine did, for the caller's audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReceipt {
    /// Amount taken from the debit account, in its own currency
    pub debited: Amount,

    /// Amount added to the credit account in its own currency, or None
    /// when the beneficiary IBAN is outside this ledger
    pub credited: Option<Amount>,
}

/// Settlement Engine.
///
/// Moves `amount_bgn` (already expressed in the reference currency) from
/// the debit account to the credit account. Each leg converts into the
/// account's own currency at the current rate, rounding half-to-even to
/// cents. Both legs use the same strategy, or conservation breaks at the
/// cent level.
///
/// The credit IBAN is allowed to be unknown: that is an interbank
/// transfer and the credit leg is a no-op. If the credit leg fails after
/// the debit has been applied, the debit is compensated before the error
/// is surfaced; money never silently vanishes.
pub struct SettlementEngine {
    ledger: Arc<dyn LedgerStore>,
    rates: Arc<dyn RateTable>,
}

impl SettlementEngine {
    pub fn new(ledger: Arc<dyn LedgerStore>, rates: Arc<dyn RateTable>) -> Self {
        Self { ledger, rates }
    }

    /// Settle a transfer of `amount_bgn` between the two accounts.
    pub fn settle(
        &self,
        debit_iban: &Iban,
        credit_iban: &Iban,
        amount_bgn: Amount,
    ) -> Result<SettlementReceipt, SettlementError> {
        let debited = self.apply_debit(debit_iban, amount_bgn)?;

        let credited = match self.apply_credit(credit_iban, amount_bgn) {
            Ok(credited) => credited,
            Err(e) => {
                tracing::error!(
                    debit = %debit_iban,
                    credit = %credit_iban,
                    error = %e,
                    "Credit leg failed, compensating debit"
                );
                self.compensate_debit(debit_iban, debited)?;
                return Err(e);
            }
        };

        tracing::info!(
            debit = %debit_iban,
            credit = %credit_iban,
            amount_bgn = %amount_bgn,
            debited = %debited,
            credited = ?credited.as_ref().map(Amount::to_string),
            "Settled"
        );

        Ok(SettlementReceipt { debited, credited })
    }

    /// Convert `amount_bgn` into the account's own currency at the current rate.
    fn leg_amount(&self, account: &Account, amount_bgn: Amount) -> Result<Amount, SettlementError> {
        let rate = self.rates.rate_to_bgn(&account.currency)?;
        Ok(Amount::from_reference(amount_bgn, rate)?)
    }

    fn apply_debit(
        &self,
        debit_iban: &Iban,
        amount_bgn: Amount,
    ) -> Result<Amount, SettlementError> {
        for _ in 0..MAX_CAS_RETRIES {
            let account = self.ledger.get_account(debit_iban)?;
            let debit_amount = self.leg_amount(&account, amount_bgn)?;

            let new_balance = account.balance.checked_sub(&debit_amount).ok_or_else(|| {
                SettlementError::InsufficientFunds {
                    iban: debit_iban.clone(),
                    available: account.balance.to_string(),
                    required: debit_amount.to_string(),
                }
            })?;

            match self.ledger.update_balance(&account, new_balance) {
                Ok(()) => return Ok(debit_amount),
                Err(LedgerError::Conflict(_)) => {
                    tracing::debug!(iban = %debit_iban, "Debit leg lost a balance race, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(SettlementError::RetriesExhausted(debit_iban.clone()))
    }

    /// Returns Ok(None) when the beneficiary is not held in this ledger.
    fn apply_credit(
        &self,
        credit_iban: &Iban,
        amount_bgn: Amount,
    ) -> Result<Option<Amount>, SettlementError> {
        for _ in 0..MAX_CAS_RETRIES {
            let account = match self.ledger.get_account(credit_iban) {
                Ok(account) => account,
                Err(LedgerError::NotFound(_)) => {
                    tracing::debug!(iban = %credit_iban, "Beneficiary outside the ledger, credit leg skipped");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            let credit_amount = self.leg_amount(&account, amount_bgn)?;
            let new_balance = account
                .balance
                .checked_add(&credit_amount)
                .ok_or(corebank_core::AmountError::Overflow)?;

            match self.ledger.update_balance(&account, new_balance) {
                Ok(()) => return Ok(Some(credit_amount)),
                Err(LedgerError::Conflict(_)) => {
                    tracing::debug!(iban = %credit_iban, "Credit leg lost a balance race, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(SettlementError::RetriesExhausted(credit_iban.clone()))
    }

    /// Put the already-debited amount back. Must succeed before the
    /// original failure may be reported.
    fn compensate_debit(&self, debit_iban: &Iban, debited: Amount) -> Result<(), SettlementError> {
        for _ in 0..MAX_CAS_RETRIES {
            let account = match self.ledger.get_account(debit_iban) {
                Ok(account) => account,
                Err(_) => break,
            };

            let restored = match account.balance.checked_add(&debited) {
                Some(restored) => restored,
                None => break,
            };

            match self.ledger.update_balance(&account, restored) {
                Ok(()) => {
                    tracing::warn!(iban = %debit_iban, amount = %debited, "Debit compensated");
                    return Ok(());
                }
                Err(LedgerError::Conflict(_)) => continue,
                Err(_) => break,
            }
        }

        tracing::error!(iban = %debit_iban, amount = %debited, "Compensation failed");
        Err(SettlementError::CompensationFailed(debit_iban.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corebank_core::CurrencyCode;
    use corebank_ledger::InMemoryLedger;
    use corebank_rates::FixedRateTable;
    use rust_decimal_macros::dec;

    fn iban(s: &str) -> Iban {
        s.parse().unwrap()
    }

    fn amount(d: rust_decimal::Decimal) -> Amount {
        Amount::new(d).unwrap()
    }

    fn setup() -> (Arc<InMemoryLedger>, SettlementEngine) {
        let ledger = Arc::new(InMemoryLedger::new());
        let rates = Arc::new(FixedRateTable::with_defaults());
        let engine = SettlementEngine::new(ledger.clone(), rates);
        (ledger, engine)
    }

    #[test]
    fn test_settle_between_internal_bgn_accounts() {
        let (ledger, engine) = setup();
        let debit = iban("BG80BNBG96611020345678");
        let credit = iban("BG44UNCR70001522345678");
        ledger
            .open_account(debit.clone(), CurrencyCode::bgn(), amount(dec!(1000)))
            .unwrap();
        ledger
            .open_account(credit.clone(), CurrencyCode::bgn(), amount(dec!(500)))
            .unwrap();

        let receipt = engine.settle(&debit, &credit, amount(dec!(250))).unwrap();
        assert_eq!(receipt.debited.value(), dec!(250));
        assert_eq!(receipt.credited.unwrap().value(), dec!(250));

        assert_eq!(
            ledger.get_account(&debit).unwrap().balance.value(),
            dec!(750)
        );
        assert_eq!(
            ledger.get_account(&credit).unwrap().balance.value(),
            dec!(750)
        );
    }

    #[test]
    fn test_insufficient_funds_no_mutation() {
        let (ledger, engine) = setup();
        let debit = iban("BG80BNBG96611020345678");
        let credit = iban("BG44UNCR70001522345678");
        ledger
            .open_account(debit.clone(), CurrencyCode::bgn(), amount(dec!(1000)))
            .unwrap();
        ledger
            .open_account(credit.clone(), CurrencyCode::bgn(), amount(dec!(0)))
            .unwrap();

        let result = engine.settle(&debit, &credit, amount(dec!(1200)));
        assert!(matches!(
            result,
            Err(SettlementError::InsufficientFunds { .. })
        ));

        // Balance untouched
        assert_eq!(
            ledger.get_account(&debit).unwrap().balance.value(),
            dec!(1000)
        );
        assert_eq!(ledger.get_account(&credit).unwrap().balance.value(), dec!(0));
    }

    #[test]
    fn test_unknown_beneficiary_is_external_noop() {
        let (ledger, engine) = setup();
        let debit = iban("BG80BNBG96611020345678");
        let external = iban("DE89370400440532013000");
        ledger
            .open_account(debit.clone(), CurrencyCode::bgn(), amount(dec!(1000)))
            .unwrap();

        let receipt = engine.settle(&debit, &external, amount(dec!(300))).unwrap();
        assert_eq!(receipt.debited.value(), dec!(300));
        assert!(receipt.credited.is_none());

        assert_eq!(
            ledger.get_account(&debit).unwrap().balance.value(),
            dec!(700)
        );
    }

    #[test]
    fn test_cross_currency_legs_convert_at_own_rates() {
        let (ledger, engine) = setup();
        let debit = iban("BG97DJNG828020USD00015");
        let credit = iban("BG80BNBG96611020345678");
        ledger
            .open_account(debit.clone(), "USD".parse().unwrap(), amount(dec!(1000)))
            .unwrap();
        ledger
            .open_account(credit.clone(), "EUR".parse().unwrap(), amount(dec!(0)))
            .unwrap();

        // 100 BGN: debit leg 100 / 1.8095 = 55.26 USD, credit leg 100 / 1.95583 = 51.13 EUR
        let receipt = engine.settle(&debit, &credit, amount(dec!(100))).unwrap();
        assert_eq!(receipt.debited.value(), dec!(55.26));
        assert_eq!(receipt.credited.unwrap().value(), dec!(51.13));

        assert_eq!(
            ledger.get_account(&debit).unwrap().balance.value(),
            dec!(944.74)
        );
        assert_eq!(
            ledger.get_account(&credit).unwrap().balance.value(),
            dec!(51.13)
        );
    }

    #[test]
    fn test_conservation_same_currency() {
        let (ledger, engine) = setup();
        let debit = iban("BG80BNBG96611020345678");
        let credit = iban("BG44UNCR70001522345678");
        ledger
            .open_account(debit.clone(), CurrencyCode::bgn(), amount(dec!(777.77)))
            .unwrap();
        ledger
            .open_account(credit.clone(), CurrencyCode::bgn(), amount(dec!(222.23)))
            .unwrap();

        engine.settle(&debit, &credit, amount(dec!(123.45))).unwrap();

        let total = ledger
            .get_account(&debit)
            .unwrap()
            .balance
            .checked_add(&ledger.get_account(&credit).unwrap().balance)
            .unwrap();
        assert_eq!(total.value(), dec!(1000.00));
    }

    #[test]
    fn test_debit_to_exact_zero() {
        let (ledger, engine) = setup();
        let debit = iban("BG80BNBG96611020345678");
        let external = iban("DE89370400440532013000");
        ledger
            .open_account(debit.clone(), CurrencyCode::bgn(), amount(dec!(100)))
            .unwrap();

        engine.settle(&debit, &external, amount(dec!(100))).unwrap();
        assert!(ledger.get_account(&debit).unwrap().balance.is_zero());
    }

    /// Ledger whose balance writes fail for one account, to force the
    /// credit leg to break after the debit has been applied.
    struct BrokenCreditLedger {
        inner: InMemoryLedger,
        broken: Iban,
    }

    impl LedgerStore for BrokenCreditLedger {
        fn get_account(&self, iban: &Iban) -> Result<corebank_ledger::Account, LedgerError> {
            self.inner.get_account(iban)
        }

        fn update_balance(
            &self,
            account: &corebank_ledger::Account,
            new_balance: Amount,
        ) -> Result<(), LedgerError> {
            if account.iban == self.broken {
                return Err(LedgerError::CorruptRecord {
                    iban: account.iban.to_string(),
                    detail: "simulated storage failure".to_string(),
                });
            }
            self.inner.update_balance(account, new_balance)
        }

        fn open_account(
            &self,
            iban: Iban,
            currency: CurrencyCode,
            opening_balance: Amount,
        ) -> Result<corebank_ledger::Account, LedgerError> {
            self.inner.open_account(iban, currency, opening_balance)
        }

        fn accounts(&self) -> Result<Vec<corebank_ledger::Account>, LedgerError> {
            self.inner.accounts()
        }
    }

    #[test]
    fn test_failed_credit_leg_compensates_debit() {
        let debit = iban("BG80BNBG96611020345678");
        let credit = iban("BG44UNCR70001522345678");

        let ledger = Arc::new(BrokenCreditLedger {
            inner: InMemoryLedger::new(),
            broken: credit.clone(),
        });
        ledger
            .open_account(debit.clone(), CurrencyCode::bgn(), amount(dec!(1000)))
            .unwrap();
        ledger
            .open_account(credit.clone(), CurrencyCode::bgn(), amount(dec!(500)))
            .unwrap();

        let engine = SettlementEngine::new(ledger.clone(), Arc::new(FixedRateTable::with_defaults()));

        let result = engine.settle(&debit, &credit, amount(dec!(250)));
        assert!(matches!(result, Err(SettlementError::Ledger(_))));

        // The debit was applied and then compensated; no money vanished
        assert_eq!(
            ledger.get_account(&debit).unwrap().balance.value(),
            dec!(1000)
        );
        assert_eq!(
            ledger.get_account(&credit).unwrap().balance.value(),
            dec!(500)
        );
    }

    #[test]
    fn test_missing_debit_account() {
        let (_, engine) = setup();
        let result = engine.settle(
            &iban("BG80BNBG96611020345678"),
            &iban("BG44UNCR70001522345678"),
            amount(dec!(10)),
        );
        assert!(matches!(
            result,
            Err(SettlementError::Ledger(LedgerError::NotFound(_)))
        ));
    }
}
