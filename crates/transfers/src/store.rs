//! SQLite storage for fund transfers
//!
//! The store is also the concurrency gate: `update_with` runs the whole
//! read-mutate-write cycle of a transition under the connection lock, so
//! two callers racing on the same transfer are serialized and the loser
//! observes whatever terminal state the winner left behind.

use chrono::{DateTime, Utc};
use corebank_core::{Amount, CurrencyCode, Iban, TransferId, UserId};
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::transfer::{FundTransfer, PaymentSystem, TransferStatus};
use crate::update::TransferRequest;

/// Query filter for transfer listings.
///
/// All fields are conjunctive; date bounds are `from` inclusive,
/// `before` exclusive.
#[derive(Debug, Clone, Default)]
pub struct TransferFilter {
    pub id: Option<TransferId>,
    pub account: Option<Iban>,
    pub beneficiary_iban: Option<Iban>,
    pub status: Option<TransferStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub updated_from: Option<DateTime<Utc>>,
    pub updated_before: Option<DateTime<Utc>>,
}

const COLUMNS: &str = "id, user_id, account, beneficiary_iban, beneficiary_bic, beneficiary_bank, \
     beneficiary_name, amount, amount_bgn, currency, details, payment_system, status, \
     otp_generated, otp_received, approved_by, reference, created, last_updated, version";

/// SQLite storage for fund transfers.
pub struct TransferStore {
    conn: Mutex<Connection>,
}

impl TransferStore {
    /// Create a new store with the given database path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("transfer store lock poisoned");
        conn.execute(
            "CREATE TABLE IF NOT EXISTS transfers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                account TEXT NOT NULL,
                beneficiary_iban TEXT NOT NULL,
                beneficiary_bic TEXT NOT NULL DEFAULT '',
                beneficiary_bank TEXT NOT NULL DEFAULT '',
                beneficiary_name TEXT NOT NULL DEFAULT '',
                amount TEXT NOT NULL,
                amount_bgn TEXT NOT NULL,
                currency TEXT NOT NULL,
                details TEXT NOT NULL DEFAULT '',
                payment_system TEXT NOT NULL DEFAULT 'B',
                status TEXT NOT NULL DEFAULT 'I',
                otp_generated TEXT,
                otp_received TEXT,
                approved_by TEXT,
                reference TEXT,
                created TEXT NOT NULL,
                last_updated TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transfers_account ON transfers(account)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transfers_beneficiary ON transfers(beneficiary_iban)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transfers_status ON transfers(status)",
            [],
        )?;

        Ok(())
    }

    /// Insert a new transfer in Initiated status and return it with its id
    pub fn insert(
        &self,
        request: &TransferRequest,
        owner: &UserId,
        amount_bgn: Amount,
    ) -> Result<FundTransfer, StoreError> {
        let conn = self.conn.lock().expect("transfer store lock poisoned");
        let now = Utc::now();

        conn.execute(
            "INSERT INTO transfers
             (user_id, account, beneficiary_iban, beneficiary_bic, beneficiary_bank,
              beneficiary_name, amount, amount_bgn, currency, details, payment_system,
              status, created, last_updated, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'I', ?12, ?13, 0)",
            params![
                owner.as_str(),
                request.account.as_str(),
                request.beneficiary_iban.as_str(),
                request.beneficiary_bic,
                request.beneficiary_bank,
                request.beneficiary_name,
                request.amount.value().to_string(),
                amount_bgn.value().to_string(),
                request.currency.as_str(),
                request.details,
                request.payment_system.code(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;

        let id = TransferId(conn.last_insert_rowid() as u64);
        Self::fetch(&conn, id)
    }

    /// Get a transfer by id
    pub fn get(&self, id: TransferId) -> Result<FundTransfer, StoreError> {
        let conn = self.conn.lock().expect("transfer store lock poisoned");
        Self::fetch(&conn, id)
    }

    /// Run one transition as a serialized unit of work.
    ///
    /// The closure receives the current record and may mutate it; when it
    /// returns Ok the record is persisted with a bumped version and fresh
    /// `last_updated`, when it returns Err nothing is written. The
    /// connection lock is held throughout, so the closure must not
    /// re-enter this store.
    pub fn update_with<T, E, F>(&self, id: TransferId, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut FundTransfer) -> Result<T, E>,
        E: From<StoreError>,
    {
        let conn = self.conn.lock().expect("transfer store lock poisoned");
        let mut transfer = Self::fetch(&conn, id).map_err(E::from)?;

        let result = f(&mut transfer)?;

        transfer.version += 1;
        transfer.last_updated = Utc::now();
        Self::persist(&conn, &transfer).map_err(E::from)?;

        Ok(result)
    }

    /// Delete a transfer while it is still Initiated.
    ///
    /// Returns `false` if the record exists but has left Initiated.
    pub fn delete_if_initiated(&self, id: TransferId) -> Result<bool, StoreError> {
        let conn = self.conn.lock().expect("transfer store lock poisoned");

        let changed = conn.execute(
            "DELETE FROM transfers WHERE id = ?1 AND status = 'I'",
            params![id.value()],
        )?;
        if changed == 1 {
            return Ok(true);
        }

        // Row still there means it is no longer editable
        Self::fetch(&conn, id)?;
        Ok(false)
    }

    /// List transfers matching the filter, oldest update first
    pub fn list(&self, filter: &TransferFilter) -> Result<Vec<FundTransfer>, StoreError> {
        let conn = self.conn.lock().expect("transfer store lock poisoned");

        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if let Some(id) = filter.id {
            clauses.push(format!("id = ?{}", args.len() + 1));
            args.push(id.value().to_string());
        }
        if let Some(ref account) = filter.account {
            clauses.push(format!("account = ?{}", args.len() + 1));
            args.push(account.as_str().to_string());
        }
        if let Some(ref beneficiary) = filter.beneficiary_iban {
            clauses.push(format!("beneficiary_iban = ?{}", args.len() + 1));
            args.push(beneficiary.as_str().to_string());
        }
        if let Some(status) = filter.status {
            clauses.push(format!("status = ?{}", args.len() + 1));
            args.push(status.code().to_string());
        }
        if let Some(from) = filter.created_from {
            clauses.push(format!("created >= ?{}", args.len() + 1));
            args.push(from.to_rfc3339());
        }
        if let Some(before) = filter.created_before {
            clauses.push(format!("created < ?{}", args.len() + 1));
            args.push(before.to_rfc3339());
        }
        if let Some(from) = filter.updated_from {
            clauses.push(format!("last_updated >= ?{}", args.len() + 1));
            args.push(from.to_rfc3339());
        }
        if let Some(before) = filter.updated_before {
            clauses.push(format!("last_updated < ?{}", args.len() + 1));
            args.push(before.to_rfc3339());
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {COLUMNS} FROM transfers{where_clause} ORDER BY last_updated, id"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), Self::row_to_parts)?;

        let mut transfers = Vec::new();
        for row in rows {
            transfers.push(Self::parts_to_transfer(row?)?);
        }
        Ok(transfers)
    }

    fn fetch(conn: &Connection, id: TransferId) -> Result<FundTransfer, StoreError> {
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM transfers WHERE id = ?1"))?;

        let parts = stmt
            .query_row(params![id.value()], Self::row_to_parts)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(id),
                other => StoreError::Database(other),
            })?;

        Self::parts_to_transfer(parts)
    }

    fn persist(conn: &Connection, transfer: &FundTransfer) -> Result<(), StoreError> {
        conn.execute(
            "UPDATE transfers SET
                user_id = ?1, account = ?2, beneficiary_iban = ?3, beneficiary_bic = ?4,
                beneficiary_bank = ?5, beneficiary_name = ?6, amount = ?7, amount_bgn = ?8,
                currency = ?9, details = ?10, payment_system = ?11, status = ?12,
                otp_generated = ?13, otp_received = ?14, approved_by = ?15, reference = ?16,
                last_updated = ?17, version = ?18
             WHERE id = ?19",
            params![
                transfer.user_id.as_str(),
                transfer.account.as_str(),
                transfer.beneficiary_iban.as_str(),
                transfer.beneficiary_bic,
                transfer.beneficiary_bank,
                transfer.beneficiary_name,
                transfer.amount.value().to_string(),
                transfer.amount_bgn.value().to_string(),
                transfer.currency.as_str(),
                transfer.details,
                transfer.payment_system.code(),
                transfer.status.code(),
                transfer.otp_generated,
                transfer.otp_received,
                transfer.approved_by.as_ref().map(|u| u.as_str()),
                transfer.reference,
                transfer.last_updated.to_rfc3339(),
                transfer.version,
                transfer.id.value(),
            ],
        )?;
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn row_to_parts(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(
        i64,
        String,
        String,
        String,
        String,
        String,
        String,
        String,
        String,
        String,
        String,
        String,
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        String,
        String,
        u64,
    )> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
            row.get(12)?,
            row.get(13)?,
            row.get(14)?,
            row.get(15)?,
            row.get(16)?,
            row.get(17)?,
            row.get(18)?,
            row.get(19)?,
        ))
    }

    #[allow(clippy::type_complexity)]
    fn parts_to_transfer(
        parts: (
            i64,
            String,
            String,
            String,
            String,
            String,
            String,
            String,
            String,
            String,
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            String,
            String,
            u64,
        ),
    ) -> Result<FundTransfer, StoreError> {
        let id = parts.0;
        let corrupt = |detail: String| StoreError::Corrupt { id, detail };

        let account: Iban = parts
            .2
            .parse()
            .map_err(|e| corrupt(format!("bad account iban: {e}")))?;
        let beneficiary_iban: Iban = parts
            .3
            .parse()
            .map_err(|e| corrupt(format!("bad beneficiary iban: {e}")))?;
        let amount = parse_amount(&parts.7).map_err(&corrupt)?;
        let amount_bgn = parse_amount(&parts.8).map_err(&corrupt)?;
        let currency: CurrencyCode = parts
            .9
            .parse()
            .map_err(|e| corrupt(format!("bad currency: {e}")))?;
        let payment_system = PaymentSystem::from_code(&parts.11)
            .ok_or_else(|| corrupt(format!("bad payment system: {}", parts.11)))?;
        let status = TransferStatus::from_code(&parts.12)
            .ok_or_else(|| corrupt(format!("bad status: {}", parts.12)))?;
        let created = parse_datetime(&parts.17).map_err(&corrupt)?;
        let last_updated = parse_datetime(&parts.18).map_err(&corrupt)?;

        Ok(FundTransfer {
            id: TransferId(id as u64),
            user_id: UserId::new(parts.1),
            account,
            beneficiary_iban,
            beneficiary_bic: parts.4,
            beneficiary_bank: parts.5,
            beneficiary_name: parts.6,
            amount,
            amount_bgn,
            currency,
            details: parts.10,
            payment_system,
            status,
            otp_generated: parts.13,
            otp_received: parts.14,
            approved_by: parts.15.map(UserId::new),
            reference: parts.16,
            created,
            last_updated,
            version: parts.19,
        })
    }
}

fn parse_amount(s: &str) -> Result<Amount, String> {
    s.parse::<rust_decimal::Decimal>()
        .map_err(|e| format!("bad amount {s}: {e}"))
        .and_then(|d| Amount::new(d).map_err(|e| e.to_string()))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("bad datetime {s}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> TransferRequest {
        TransferRequest {
            account: "BG80BNBG96611020345678".parse().unwrap(),
            beneficiary_iban: "BG44UNCR70001522345678".parse().unwrap(),
            beneficiary_bic: "UNCRBGSF".to_string(),
            beneficiary_bank: "UniCredit Bulbank".to_string(),
            beneficiary_name: "Our company".to_string(),
            amount: Amount::new(dec!(250)).unwrap(),
            currency: CurrencyCode::bgn(),
            details: "Invoice 1042".to_string(),
            payment_system: PaymentSystem::Bisera,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = TransferStore::in_memory().unwrap();
        let transfer = store
            .insert(&request(), &UserId::new("i.petrova"), Amount::new(dec!(250)).unwrap())
            .unwrap();

        assert_eq!(transfer.status, TransferStatus::Initiated);
        assert_eq!(transfer.version, 0);
        assert!(transfer.reference.is_none());

        let fetched = store.get(transfer.id).unwrap();
        assert_eq!(fetched, transfer);
    }

    #[test]
    fn test_update_with_persists_on_ok() {
        let store = TransferStore::in_memory().unwrap();
        let transfer = store
            .insert(&request(), &UserId::new("i.petrova"), Amount::new(dec!(250)).unwrap())
            .unwrap();

        store
            .update_with::<_, StoreError, _>(transfer.id, |t| {
                t.details = "Corrected invoice".to_string();
                Ok(())
            })
            .unwrap();

        let fetched = store.get(transfer.id).unwrap();
        assert_eq!(fetched.details, "Corrected invoice");
        assert_eq!(fetched.version, 1);
    }

    #[test]
    fn test_update_with_discards_on_err() {
        let store = TransferStore::in_memory().unwrap();
        let transfer = store
            .insert(&request(), &UserId::new("i.petrova"), Amount::new(dec!(250)).unwrap())
            .unwrap();

        let result: Result<(), StoreError> = store.update_with(transfer.id, |t| {
            t.details = "should not stick".to_string();
            Err(StoreError::NotFound(t.id))
        });
        assert!(result.is_err());

        let fetched = store.get(transfer.id).unwrap();
        assert_eq!(fetched.details, "Invoice 1042");
        assert_eq!(fetched.version, 0);
    }

    #[test]
    fn test_delete_only_initiated() {
        let store = TransferStore::in_memory().unwrap();
        let transfer = store
            .insert(&request(), &UserId::new("i.petrova"), Amount::new(dec!(250)).unwrap())
            .unwrap();

        // Move it out of Initiated
        store
            .update_with::<_, StoreError, _>(transfer.id, |t| {
                t.status = TransferStatus::Processed;
                Ok(())
            })
            .unwrap();

        assert!(!store.delete_if_initiated(transfer.id).unwrap());
        assert!(store.get(transfer.id).is_ok());
    }

    #[test]
    fn test_delete_initiated() {
        let store = TransferStore::in_memory().unwrap();
        let transfer = store
            .insert(&request(), &UserId::new("i.petrova"), Amount::new(dec!(250)).unwrap())
            .unwrap();

        assert!(store.delete_if_initiated(transfer.id).unwrap());
        assert!(matches!(
            store.get(transfer.id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_filters() {
        let store = TransferStore::in_memory().unwrap();
        let owner = UserId::new("i.petrova");
        let a = store
            .insert(&request(), &owner, Amount::new(dec!(250)).unwrap())
            .unwrap();
        let mut other = request();
        other.account = "BG97DJNG828020USD00015".parse().unwrap();
        store
            .insert(&other, &owner, Amount::new(dec!(250)).unwrap())
            .unwrap();

        let by_account = store
            .list(&TransferFilter {
                account: Some("BG80BNBG96611020345678".parse().unwrap()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_account.len(), 1);
        assert_eq!(by_account[0].id, a.id);

        let by_status = store
            .list(&TransferFilter {
                status: Some(TransferStatus::Initiated),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_status.len(), 2);

        let by_id = store
            .list(&TransferFilter {
                id: Some(a.id),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_id.len(), 1);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let store = TransferStore::in_memory().unwrap();
        let owner = UserId::new("i.petrova");
        let first = store
            .insert(&request(), &owner, Amount::new(dec!(1)).unwrap())
            .unwrap();
        let second = store
            .insert(&request(), &owner, Amount::new(dec!(1)).unwrap())
            .unwrap();
        assert!(second.id.value() > first.id.value());
    }
}
