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

//! # Bank Ledger
//!
//! This library implements the money-movement rules of a small retail bank:
//! deposits, withdrawals, loan requests and payments, transfers between
//! accounts, and transaction reports.
//!
//! ## Core Components
//!
//! - [`Engine`]: Central service that owns accounts, the ledger, and the bank status
//! - [`Account`]: Account holder record with a guarded balance
//! - [`Transaction`]: Ledger entry recorded for every successful operation
//! - [`BankError`]: Error types for rejected operations
//! - [`Mailer`]: Notification sink fed asynchronously through an [`Outbox`]
//!
//! ## Example
//!
//! ```
//! use bank_ledger::{AccountNumber, AccountType, Engine, NewAccount, Owner};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! engine
//!     .open_account(NewAccount {
//!         number: AccountNumber(1),
//!         owner: Owner::new("Ada", "ada@example.com"),
//!         account_type: AccountType::Savings,
//!     })
//!     .unwrap();
//!
//! engine.deposit(AccountNumber(1), dec!(100.00)).unwrap();
//! engine.withdraw(AccountNumber(1), dec!(40.00)).unwrap();
//!
//! let account = engine.get_account(&AccountNumber(1)).unwrap();
//! assert_eq!(account.balance(), dec!(60.00));
//! ```
//!
//! ## Thread Safety
//!
//! Operations on different accounts run in parallel. Operations touching the
//! same account are serialized, so concurrent withdrawals can never overdraw it.

pub mod account;
pub mod amount;
mod base;
pub mod clock;
mod command;
pub mod config;
mod engine;
pub mod error;
mod ledger;
pub mod notification;
pub mod report;
mod status;
mod transaction;

pub use account::{Account, AccountType, NewAccount, Owner};
pub use amount::{MAX_BALANCE, format_amount, validate_amount};
pub use base::{AccountNumber, TransactionId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, Receipt};
pub use config::BankConfig;
pub use engine::{Engine, PayLoanOutcome};
pub use error::BankError;
pub use ledger::Ledger;
pub use notification::{
    DispatchStats, Dispatcher, Email, LogMailer, MailError, Mailer, MemoryMailer, Outbox,
};
pub use report::{DateRange, Report, ReportScope};
pub use status::BankStatus;
pub use transaction::{NewTransaction, Transaction, TransactionType};
