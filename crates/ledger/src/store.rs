//! Ledger store trait and the in-memory implementation

use corebank_core::{Amount, CurrencyCode, Iban};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::account::Account;
use crate::error::LedgerError;

/// Ledger Store - durable account records with atomic balance updates.
///
/// `update_balance` is a compare-and-swap on the account's version: the
/// write succeeds only if nobody else has written the account since it was
/// read. Callers retry after re-reading on `Conflict`. This serializes
/// concurrent read-modify-write cycles per account without holding locks
/// across settlement legs.
pub trait LedgerStore: Send + Sync {
    /// Look up an account by IBAN
    fn get_account(&self, iban: &Iban) -> Result<Account, LedgerError>;

    /// Write a new balance for the account snapshot held by the caller.
    ///
    /// Fails with `Conflict` if the stored version no longer matches
    /// `account.version`, and with `NotFound` if the account vanished.
    fn update_balance(&self, account: &Account, new_balance: Amount) -> Result<(), LedgerError>;

    /// Open a new account with an opening balance
    fn open_account(
        &self,
        iban: Iban,
        currency: CurrencyCode,
        opening_balance: Amount,
    ) -> Result<Account, LedgerError>;

    /// List every account in the ledger
    fn accounts(&self) -> Result<Vec<Account>, LedgerError>;
}

/// In-memory ledger for tests and demos.
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<Iban, Account>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedger {
    fn get_account(&self, iban: &Iban) -> Result<Account, LedgerError> {
        self.accounts
            .read()
            .expect("ledger lock poisoned")
            .get(iban)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(iban.clone()))
    }

    fn update_balance(&self, account: &Account, new_balance: Amount) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write().expect("ledger lock poisoned");
        let stored = accounts
            .get_mut(&account.iban)
            .ok_or_else(|| LedgerError::NotFound(account.iban.clone()))?;

        if stored.version != account.version {
            return Err(LedgerError::Conflict(account.iban.clone()));
        }

        stored.balance = new_balance;
        stored.version += 1;
        Ok(())
    }

    fn open_account(
        &self,
        iban: Iban,
        currency: CurrencyCode,
        opening_balance: Amount,
    ) -> Result<Account, LedgerError> {
        let mut accounts = self.accounts.write().expect("ledger lock poisoned");
        if accounts.contains_key(&iban) {
            return Err(LedgerError::AlreadyExists(iban));
        }
        let account = Account::new(iban.clone(), currency, opening_balance);
        accounts.insert(iban, account.clone());
        Ok(account)
    }

    fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let mut all: Vec<Account> = self
            .accounts
            .read()
            .expect("ledger lock poisoned")
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.iban.cmp(&b.iban));
        Ok(all)
    }
}
