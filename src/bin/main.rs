// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


use bank_ledger::{
    AccountId, AccountView, AdminStore, BANK_ACCOUNT_ID, BookEntry, Lang, Ledger, LedgerError,
    SqliteStore, Tick, TransactionId,
};
use clap::{Parser, Subcommand};
use csv::Writer;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Bank Ledger - Administer and use a shared trust-based ledger
///
/// All state lives in a single SQLite file. Statements and the roster are
/// written to stdout as CSV; logs go to stderr (filter with RUST_LOG).
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "A trust-based ledger with scheduled and revocable transfers", long_about = None)]
struct Args {
    /// Path to the ledger database
    #[arg(long, env = "BANK_LEDGER_DB", default_value = "bank.db", value_name = "FILE")]
    db: PathBuf,

    /// Language for error messages (en, es)
    #[arg(long, env = "BANK_LEDGER_LANG", default_value = "en")]
    lang: Lang,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and the bank of record
    Init {
        /// Display name of the bank account
        #[arg(long, default_value = "The Bank")]
        bank: String,
    },
    /// Open a new holder account
    Open { holder: String },
    /// Pay money from the bank into an account
    Issue {
        #[arg(long)]
        to: i64,
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
        #[arg(long, default_value = "")]
        concept: String,
    },
    /// Transfer money between accounts
    Transfer {
        #[arg(long, allow_negative_numbers = true)]
        from: i64,
        #[arg(long, allow_negative_numbers = true)]
        to: i64,
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
        /// Settlement tick (defaults to today)
        #[arg(long)]
        due: Option<Tick>,
        #[arg(long, default_value = "")]
        concept: String,
    },
    /// Revoke a pending transaction
    Revoke {
        /// Account acting on the transaction
        #[arg(long, allow_negative_numbers = true)]
        account: i64,
        #[arg(long)]
        transaction: u64,
    },
    /// Print an account statement as CSV
    Show {
        #[arg(allow_negative_numbers = true)]
        account: i64,
    },
    /// Print the roster of account holders as CSV
    Book,
    /// Print the current tick
    Clock,
    /// Advance the clock and settle whatever became due
    Advance {
        #[arg(default_value_t = 1)]
        ticks: Tick,
    },
    /// Settle transactions due at or before the current tick
    Settle,
}

fn main() {
    init_tracing();
    let args = Args::parse();

    let store = match SqliteStore::open(&args.db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening ledger '{}': {}", args.db.display(), e);
            process::exit(2);
        }
    };
    let ledger = Ledger::new(Arc::new(store));

    if let Err(e) = run(&ledger, args.command, std::io::stdout()) {
        match e {
            CliError::Ledger(err) => {
                eprintln!("{}", err.user_message(args.lang));
                process::exit(if err.is_recoverable() { 1 } else { 2 });
            }
            CliError::Output(err) => {
                eprintln!("Error writing output: {}", err);
                process::exit(2);
            }
        }
    }
}

/// Logs to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Output(#[from] csv::Error),
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Output(err.into())
    }
}

/// Executes one command. The acting account of `transfer` and `revoke` is
/// resolved first, so an unknown id fails with `AccountNotFound`.
fn run<S: AdminStore, W: Write>(
    ledger: &Ledger<S>,
    command: Command,
    mut out: W,
) -> Result<(), CliError> {
    match command {
        Command::Init { bank } => {
            ledger.open_system_account(BANK_ACCOUNT_ID, &bank)?;
            writeln!(out, "ledger ready at tick {}", ledger.today()?)?;
        }
        Command::Open { holder } => {
            let id = ledger.open_account(&holder)?;
            writeln!(out, "{id}")?;
        }
        Command::Issue { to, amount, concept } => {
            let id = ledger.issue(AccountId(to), amount, concept)?;
            writeln!(out, "{id}")?;
        }
        Command::Transfer {
            from,
            to,
            amount,
            due,
            concept,
        } => {
            let from = AccountId(from);
            ledger.holder(from)?;
            let due = match due {
                Some(due) => due,
                None => ledger.today()?,
            };
            let id = ledger.transfer(from, AccountId(to), amount, due, concept)?;
            writeln!(out, "{id}")?;
        }
        Command::Revoke {
            account,
            transaction,
        } => {
            let actor = AccountId(account);
            ledger.holder(actor)?;
            ledger.revoke(actor, TransactionId(transaction))?;
        }
        Command::Show { account } => {
            let view = ledger.load(AccountId(account))?;
            write_statement(&view, out)?;
        }
        Command::Book => write_book(&ledger.book()?, out)?,
        Command::Clock => writeln!(out, "{}", ledger.today()?)?,
        Command::Advance { ticks } => {
            let tick = ledger.advance_clock(ticks)?;
            let settled = ledger.settle_due()?;
            writeln!(out, "tick {tick}, {settled} settled")?;
        }
        Command::Settle => {
            let settled = ledger.settle_due()?;
            writeln!(out, "{settled} settled")?;
        }
    }
    Ok(())
}

/// Write an account statement to a CSV writer.
///
/// A summary line precedes one row per live transaction, newest first.
///
/// # Example
///
/// ```csv
/// # 0001 Alice balance 70
/// id,date_created,date_due,concept,amount,direction,counterparty_id,counterparty,status
/// 3,0,1,dinner,-20,outgoing,2,Bob [0002],pending
/// 2,0,0,rent,-30,outgoing,2,Bob [0002],payed
/// 1,0,0,welcome,100,incoming,-1,The Bank,payed
/// ```
fn write_statement<W: Write>(view: &AccountView, mut writer: W) -> Result<(), CliError> {
    writeln!(
        writer,
        "# {:04} {} balance {}",
        view.id.0, view.holder, view.balance
    )?;
    let mut wtr = Writer::from_writer(writer);
    if view.transactions.is_empty() {
        wtr.write_record([
            "id",
            "date_created",
            "date_due",
            "concept",
            "amount",
            "direction",
            "counterparty_id",
            "counterparty",
            "status",
        ])?;
    }
    for tx in &view.transactions {
        wtr.serialize(tx)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the roster as `id,holder` CSV rows.
fn write_book<W: Write>(book: &[BookEntry], writer: W) -> Result<(), CliError> {
    let mut wtr = Writer::from_writer(writer);
    if book.is_empty() {
        wtr.write_record(["id", "holder"])?;
    }
    for entry in book {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    Ok(())
}
