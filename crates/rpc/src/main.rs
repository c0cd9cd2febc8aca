//! CoreBank CLI - Main entry point

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use corebank_rpc::{commands, AppContext};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "corebank")]
#[command(about = "CoreBank - retail banking back office", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an account in the ledger
    OpenAccount {
        /// Account IBAN
        iban: String,
        /// Currency code (e.g. BGN, EUR)
        currency: String,
        /// Opening balance
        #[arg(long, default_value = "0")]
        balance: Decimal,
    },

    /// Show every account and its balance
    Balances,

    /// Create a fund transfer (Initiated)
    Create {
        /// Owner user id
        owner: String,
        /// Originating account IBAN
        account: String,
        /// Beneficiary IBAN
        beneficiary: String,
        /// Amount in the transfer currency
        amount: Decimal,
        /// Transfer currency
        #[arg(long, default_value = "BGN")]
        currency: String,
        /// Beneficiary name
        #[arg(long, default_value = "")]
        name: String,
        /// Payment details
        #[arg(long, default_value = "")]
        details: String,
    },

    /// Issue a fresh OTP for a transfer
    Otp {
        /// Transfer id
        id: u64,
    },

    /// Authorize a transfer with a PIN‖OTP credential
    Authorize {
        /// Transfer id
        id: u64,
        /// Acting user id
        actor: String,
        /// PIN immediately followed by the OTP
        credential: String,
    },

    /// Approve a transfer as staff (no credential)
    Approve {
        /// Transfer id
        id: u64,
        /// Acting user id
        actor: String,
    },

    /// Reject a transfer
    Reject {
        /// Transfer id
        id: u64,
        /// Acting user id
        actor: String,
    },

    /// Show a transfer as JSON
    Show {
        /// Transfer id
        id: u64,
    },

    /// Delete an Initiated transfer
    Delete {
        /// Transfer id
        id: u64,
        /// Acting user id (must be the owner)
        actor: String,
    },

    /// List transfers
    List {
        /// Filter by originating account IBAN
        #[arg(long)]
        account: Option<String>,
    },

    /// Account statement over a date window
    Statement {
        /// Account IBAN
        account: String,
        /// First day (YYYY-MM-DD)
        from: NaiveDate,
        /// Last day (YYYY-MM-DD), inclusive
        to: NaiveDate,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let ctx = AppContext::new(&cli.data)?;

    match cli.command {
        Commands::OpenAccount {
            iban,
            currency,
            balance,
        } => commands::open_account(&ctx, &iban, &currency, balance)?,

        Commands::Balances => commands::balances(&ctx)?,

        Commands::Create {
            owner,
            account,
            beneficiary,
            amount,
            currency,
            name,
            details,
        } => commands::create_transfer(
            &ctx,
            &owner,
            &account,
            &beneficiary,
            &name,
            amount,
            &currency,
            &details,
        )?,

        Commands::Otp { id } => commands::issue_otp(&ctx, id)?,

        Commands::Authorize {
            id,
            actor,
            credential,
        } => commands::authorize(&ctx, id, &actor, &credential)?,

        Commands::Approve { id, actor } => commands::approve(&ctx, id, &actor)?,

        Commands::Reject { id, actor } => commands::reject(&ctx, id, &actor)?,

        Commands::Show { id } => commands::show(&ctx, id)?,

        Commands::Delete { id, actor } => commands::delete(&ctx, id, &actor)?,

        Commands::List { account } => commands::list(&ctx, account.as_deref())?,

        Commands::Statement { account, from, to } => {
            commands::statement(&ctx, &account, from, to)?
        }
    }

    Ok(())
}
