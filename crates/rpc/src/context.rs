//! Application context - wires everything together

use corebank_authorization::{Actor, ActorDirectory};
use corebank_core::CurrencyCode;
use corebank_ledger::SqliteLedger;
use corebank_notify::{MemoryDispatcher, NotificationDispatcher, NotifyError, Notification};
use corebank_otp::RandomOtpIssuer;
use corebank_rates::FixedRateTable;
use corebank_transfers::{TransferEngine, TransferStore};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Dispatcher that prints notifications to stdout.
///
/// Stands in for the SMS/mail gateway when running from the CLI.
struct ConsoleDispatcher;

impl NotificationDispatcher for ConsoleDispatcher {
    fn name(&self) -> &str {
        "console"
    }

    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        println!(
            "📨 [{}] to {}: {}",
            notification.channel.as_str(),
            notification.to,
            notification.contents
        );
        Ok(())
    }
}

/// Application context - wires together stores, rate table, directory and
/// the transfer engine.
pub struct AppContext {
    pub engine: Arc<TransferEngine>,
    pub ledger: Arc<SqliteLedger>,
    pub rates: Arc<FixedRateTable>,
    pub directory: Arc<ActorDirectory>,
    data_path: PathBuf,
}

impl AppContext {
    /// Create a context over the given data directory.
    ///
    /// Opens `ledger.db` and `transfers.db`, loads rates from `rates.json`
    /// (falling back to the built-in table) and actors from `actors.json`
    /// (falling back to a demo trio).
    pub fn new(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        Self::with_dispatcher(data_path, Arc::new(ConsoleDispatcher))
    }

    /// Context with an in-memory dispatcher, for tests
    pub fn for_tests(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        Self::with_dispatcher(data_path, Arc::new(MemoryDispatcher::new()))
    }

    fn with_dispatcher(
        data_path: impl AsRef<Path>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_path)?;

        let ledger = Arc::new(SqliteLedger::new(data_path.join("ledger.db"))?);
        let store = Arc::new(TransferStore::new(data_path.join("transfers.db"))?);
        let rates = Arc::new(load_rates(&data_path)?);
        let directory = Arc::new(load_directory(&data_path)?);

        let engine = Arc::new(TransferEngine::new(
            store,
            ledger.clone(),
            rates.clone(),
            directory.clone(),
            Arc::new(RandomOtpIssuer),
            dispatcher,
        ));

        Ok(Self {
            engine,
            ledger,
            rates,
            directory,
            data_path,
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

/// Rates come from `rates.json` (`{"EUR": "1.95583", ...}`) when present.
fn load_rates(data_path: &Path) -> Result<FixedRateTable, anyhow::Error> {
    let path = data_path.join("rates.json");
    if !path.exists() {
        return Ok(FixedRateTable::with_defaults());
    }

    let raw: HashMap<String, Decimal> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    let table = FixedRateTable::new();
    for (code, rate) in raw {
        let currency: CurrencyCode = code
            .parse()
            .map_err(|e| anyhow::anyhow!("bad currency in rates.json: {e}"))?;
        table
            .set_rate(currency, rate)
            .map_err(|e| anyhow::anyhow!("bad rate in rates.json: {e}"))?;
    }
    tracing::info!(path = %path.display(), "Loaded rate table");
    Ok(table)
}

/// Actors come from `actors.json` (a list of actor records) when present;
/// otherwise a demo person/manager/accountant trio is registered.
fn load_directory(data_path: &Path) -> Result<ActorDirectory, anyhow::Error> {
    let directory = ActorDirectory::new();

    let path = data_path.join("actors.json");
    if path.exists() {
        let actors: Vec<Actor> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        for actor in actors {
            directory.register(actor);
        }
        tracing::info!(path = %path.display(), "Loaded actor directory");
        return Ok(directory);
    }

    directory.register(Actor::person("i.petrova", "0000", "+359885000111"));
    directory.register(Actor::manager(
        "m.dimitrov",
        "1111",
        Some(corebank_core::Amount::new(Decimal::new(6000, 0))?),
        "+359885000222",
    ));
    directory.register(Actor::accountant("a.ivanova"));
    Ok(directory)
}
