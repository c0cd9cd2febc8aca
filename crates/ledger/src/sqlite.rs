//! SQLite-backed ledger store

use corebank_core::{Amount, CurrencyCode, Iban};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use crate::account::Account;
use crate::error::LedgerError;
use crate::store::LedgerStore;

/// SQLite storage for accounts.
///
/// Balances are stored as decimal strings to avoid float drift. The
/// version column backs the optimistic-concurrency contract of
/// `LedgerStore::update_balance`.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Create a new store with the given database path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<(), LedgerError> {
        let conn = self.conn.lock().expect("ledger connection poisoned");
        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                iban TEXT PRIMARY KEY,
                currency TEXT NOT NULL,
                balance TEXT NOT NULL DEFAULT '0',
                version INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        Ok(())
    }

    fn row_to_account(iban: &str, currency: &str, balance: &str, version: u64) -> Result<Account, LedgerError> {
        let iban_parsed: Iban = iban.parse().map_err(|e| LedgerError::CorruptRecord {
            iban: iban.to_string(),
            detail: format!("bad iban: {e}"),
        })?;
        let currency: CurrencyCode = currency.parse().map_err(|e| LedgerError::CorruptRecord {
            iban: iban.to_string(),
            detail: format!("bad currency: {e}"),
        })?;
        let balance = balance
            .parse()
            .map_err(|_| LedgerError::CorruptRecord {
                iban: iban.to_string(),
                detail: format!("bad balance: {balance}"),
            })
            .and_then(|d| {
                Amount::new(d).map_err(|e| LedgerError::CorruptRecord {
                    iban: iban.to_string(),
                    detail: e.to_string(),
                })
            })?;
        Ok(Account {
            iban: iban_parsed,
            currency,
            balance,
            version,
        })
    }
}

impl LedgerStore for SqliteLedger {
    fn get_account(&self, iban: &Iban) -> Result<Account, LedgerError> {
        let conn = self.conn.lock().expect("ledger connection poisoned");
        let mut stmt =
            conn.prepare("SELECT iban, currency, balance, version FROM accounts WHERE iban = ?1")?;

        let row = stmt
            .query_row(params![iban.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u64>(3)?,
                ))
            })
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => LedgerError::NotFound(iban.clone()),
                other => LedgerError::Database(other),
            })?;

        Self::row_to_account(&row.0, &row.1, &row.2, row.3)
    }

    fn update_balance(&self, account: &Account, new_balance: Amount) -> Result<(), LedgerError> {
        let conn = self.conn.lock().expect("ledger connection poisoned");

        let changed = conn.execute(
            "UPDATE accounts SET balance = ?1, version = version + 1
             WHERE iban = ?2 AND version = ?3",
            params![
                new_balance.value().to_string(),
                account.iban.as_str(),
                account.version
            ],
        )?;

        if changed == 1 {
            return Ok(());
        }

        // Distinguish a vanished account from a lost race
        let exists: bool = conn
            .prepare("SELECT 1 FROM accounts WHERE iban = ?1")?
            .exists(params![account.iban.as_str()])?;

        if exists {
            Err(LedgerError::Conflict(account.iban.clone()))
        } else {
            Err(LedgerError::NotFound(account.iban.clone()))
        }
    }

    fn open_account(
        &self,
        iban: Iban,
        currency: CurrencyCode,
        opening_balance: Amount,
    ) -> Result<Account, LedgerError> {
        let conn = self.conn.lock().expect("ledger connection poisoned");

        let result = conn.execute(
            "INSERT INTO accounts (iban, currency, balance, version) VALUES (?1, ?2, ?3, 0)",
            params![
                iban.as_str(),
                currency.as_str(),
                opening_balance.value().to_string()
            ],
        );

        match result {
            Ok(_) => Ok(Account::new(iban, currency, opening_balance)),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::AlreadyExists(iban))
            }
            Err(e) => Err(LedgerError::Database(e)),
        }
    }

    fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let conn = self.conn.lock().expect("ledger connection poisoned");
        let mut stmt =
            conn.prepare("SELECT iban, currency, balance, version FROM accounts ORDER BY iban")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            let (iban, currency, balance, version) = row?;
            accounts.push(Self::row_to_account(&iban, &currency, &balance, version)?);
        }
        Ok(accounts)
    }
}
