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
    AccountNumber, AccountType, BankConfig, Command, DateRange, Dispatcher, Engine, LogMailer,
    NewAccount, Outbox, Owner, ReportScope, TransactionId,
};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Bank Ledger - Replay operation CSV files
///
/// Reads banking operations from a CSV file and outputs account states to stdout.
/// Supports account opening, deposits, withdrawals, loans, and transfers.
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "Replays banking operations from a CSV file", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: type,account,amount,recipient,loan,name,email,kind
    /// Example: cargo run -- operations.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Maximum number of approved loans an account may hold
    #[arg(long, default_value_t = bank_ledger::config::DEFAULT_LOAN_LIMIT)]
    loan_limit: usize,

    /// Aggregate used by date-range reports: account or all_accounts
    #[arg(long, default_value = "account")]
    report_scope: ReportScope,

    /// Print this account's transactions instead of the account states
    #[arg(long, value_name = "ACCOUNT")]
    report: Option<u32>,

    /// First day of the report range (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Last day of the report range (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Log filter, overrides RUST_LOG (e.g. "debug", "bank_ledger=trace")
    #[arg(long)]
    log: Option<String>,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.log.as_deref());

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let config = BankConfig::default()
        .with_loan_limit(args.loan_limit)
        .with_report_scope(args.report_scope);
    let (outbox, dispatcher) = Outbox::channel();
    let mailer = Dispatcher::spawn(dispatcher, Arc::new(LogMailer));
    let engine = Engine::with_config(config).with_outbox(outbox);

    let engine = match process_operations(BufReader::new(file), engine) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    let written = match args.report {
        Some(account) => {
            let range = match (args.start.as_deref(), args.end.as_deref()) {
                (Some(start), Some(end)) => match DateRange::parse(start, end) {
                    Ok(range) => Some(range),
                    Err(e) => {
                        eprintln!("Error in report range: {}", e);
                        process::exit(1);
                    }
                },
                _ => None,
            };
            write_report(&engine, AccountNumber(account), range, std::io::stdout())
        }
        None => write_accounts(&engine, std::io::stdout()),
    };
    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }

    // Closing the last outbox lets the dispatcher finish.
    drop(engine);
    match mailer.join() {
        Ok(stats) => tracing::info!(
            delivered = stats.delivered,
            failed = stats.failed,
            "notifications dispatched"
        ),
        Err(_) => tracing::error!("notification dispatcher panicked"),
    }
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, account, amount, recipient, loan, name, email, kind`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    op_type: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    account: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    recipient: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    loan: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

impl CsvRecord {
    /// Converts a CSV record to a [`Command`].
    ///
    /// Returns `None` for unknown operation types or missing required fields.
    fn into_command(self) -> Option<Command> {
        let account = self.account.map(AccountNumber);

        match self.op_type.to_lowercase().as_str() {
            "open" => {
                let account_type = match self.kind.as_deref() {
                    Some(kind) if !kind.is_empty() => kind.parse::<AccountType>().ok()?,
                    _ => AccountType::Savings,
                };
                Some(Command::OpenAccount(NewAccount {
                    number: account?,
                    owner: Owner::new(self.name.unwrap_or_default(), self.email.unwrap_or_default()),
                    account_type,
                }))
            }
            "deposit" => Some(Command::Deposit {
                account: account?,
                amount: self.amount?,
            }),
            "withdrawal" => Some(Command::Withdraw {
                account: account?,
                amount: self.amount?,
            }),
            "loan" => Some(Command::RequestLoan {
                account: account?,
                amount: self.amount?,
            }),
            "approve" => Some(Command::ApproveLoan {
                loan: TransactionId(self.loan?),
            }),
            "pay_loan" => Some(Command::PayLoan {
                account: account?,
                loan: TransactionId(self.loan?),
            }),
            "transfer" => Some(Command::Transfer {
                from: account?,
                to: AccountNumber(self.recipient?),
                amount: self.amount?,
            }),
            "suspend" => Some(Command::Suspend),
            "resume" => Some(Command::Resume),
            _ => None,
        }
    }
}

/// Replays operations from a CSV reader against `engine`.
///
/// Parsing is streaming, so arbitrarily large files are never loaded into
/// memory. Malformed rows and rejected operations are logged and skipped.
///
/// # CSV Format
///
/// Expected columns: `type, account, amount, recipient, loan, name, email, kind`
/// - `type`: open, deposit, withdrawal, loan, approve, pay_loan, transfer, suspend, resume
/// - `account`: Acting account number (u32)
/// - `amount`: Decimal amount (deposit, withdrawal, loan, transfer)
/// - `recipient`: Receiving account number (transfer)
/// - `loan`: Loan transaction id (approve, pay_loan)
/// - `name`, `email`, `kind`: Account holder details (open)
///
/// # Example
///
/// ```csv
/// type,account,amount,recipient,loan,name,email,kind
/// open,1,,,,Ada,ada@example.com,savings
/// deposit,1,100.00,,
/// loan,1,500.00,,
/// approve,,,,3
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn process_operations<R: Read>(reader: R, engine: Engine) -> Result<Engine, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for (row, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(row, error = %e, "skipping malformed row");
                continue;
            }
        };
        let op_type = record.op_type.clone();
        let Some(command) = record.into_command() else {
            tracing::warn!(row, op_type = %op_type, "skipping invalid operation record");
            continue;
        };

        let name = command.name();
        match engine.process(command) {
            Ok(receipt) => tracing::trace!(row, name, ?receipt, "operation processed"),
            Err(e) => tracing::debug!(row, name, error = %e, "operation skipped"),
        }
    }

    Ok(engine)
}

/// Write account states to a CSV writer, ordered by account number.
///
/// # CSV Format
///
/// Columns: `account, owner, email, type, balance`
///
/// # Example
///
/// ```csv
/// account,owner,email,type,balance
/// 1,Ada,ada@example.com,savings,60.00
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_accounts<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for account in engine.accounts() {
        wtr.serialize(account.as_ref())?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write an account's transactions to a CSV writer, followed by nothing else.
///
/// The report total goes to the log, since it has no row shape.
///
/// # Errors
///
/// Returns a CSV error if writing fails. An unknown account is logged and
/// produces no rows.
pub fn write_report<W: Write>(
    engine: &Engine,
    account: AccountNumber,
    range: Option<DateRange>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    match engine.report(account, range) {
        Ok(report) => {
            tracing::info!(account = %account, balance = %report.balance, "report generated");
            for transaction in &report.transactions {
                wtr.serialize(transaction)?;
            }
        }
        Err(e) => tracing::warn!(account = %account, error = %e, "report unavailable"),
    }

    wtr.flush()?;
    Ok(())
}
