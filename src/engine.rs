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

//! Balance mutation engine.
//!
//! The [`Engine`] owns the account store, the transaction ledger, and the
//! bank status. Every operation takes the account number it acts for.
//!
//! # Operations
//!
//! - **Deposits**: Credit an account.
//! - **Withdrawals**: Debit an account unless the bank is suspended.
//! - **Loan requests**: Record an unapproved loan, bounded by the loan limit.
//! - **Loan payments**: Debit an approved loan's amount and mark it paid.
//! - **Transfers**: Move money between two accounts in one step.
//! - **Reports**: List an account's transactions, optionally by date range.
//!
//! # Thread Safety
//!
//! Accounts live in a [`DashMap`], each behind its own mutex, so operations
//! on different accounts run in parallel while operations on one account are
//! serialized. Locks are always taken in the same order: bank status, then
//! accounts by ascending number, then the ledger. Notifications are queued
//! only after the locks are released.

use crate::account::{Account, NewAccount};
use crate::amount::validate_amount;
use crate::base::{AccountNumber, TransactionId};
use crate::clock::{Clock, SystemClock};
use crate::command::{Command, Receipt};
use crate::config::BankConfig;
use crate::ledger::Ledger;
use crate::notification::{Email, Outbox};
use crate::report::{DateRange, Report, ReportScope};
use crate::status::{BankStatus, StatusRegister};
use crate::transaction::{NewTransaction, Transaction, TransactionType};
use crate::BankError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Result of a loan payment that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayLoanOutcome {
    /// The loan was paid; carries the updated entry.
    Paid(Transaction),
    /// The loan has not been approved yet. Nothing changed.
    NotApproved,
    /// The loan was paid earlier. Nothing changed.
    AlreadyPaid,
}

/// Ledger engine managing accounts, transactions, and bank status.
///
/// # Invariants
///
/// - No balance is ever negative or above [`MAX_BALANCE`](crate::amount::MAX_BALANCE).
/// - Every successful mutation appends exactly one ledger entry (loan
///   payments update the loan's entry instead).
/// - While the bank is suspended no withdrawal succeeds.
/// - An account never holds more approved, unpaid loans than the configured
///   limit allows at request time.
pub struct Engine {
    accounts: DashMap<AccountNumber, Arc<Account>>,
    ledger: Ledger,
    status: StatusRegister,
    config: BankConfig,
    clock: Arc<dyn Clock>,
    outbox: Outbox,
}

impl Engine {
    /// Creates an engine with default rules, the system clock, and no
    /// notification listener.
    pub fn new() -> Self {
        Self::with_config(BankConfig::default())
    }

    pub fn with_config(config: BankConfig) -> Self {
        Engine {
            accounts: DashMap::new(),
            ledger: Ledger::new(),
            status: StatusRegister::new(),
            config,
            clock: Arc::new(SystemClock),
            outbox: Outbox::discard(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_outbox(mut self, outbox: Outbox) -> Self {
        self.outbox = outbox;
        self
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Dispatches a [`Command`] to the matching operation.
    pub fn process(&self, command: Command) -> Result<Receipt, BankError> {
        match command {
            Command::OpenAccount(new) => self.open_account(new).map(Receipt::Opened),
            Command::Deposit { account, amount } => {
                self.deposit(account, amount).map(Receipt::Recorded)
            }
            Command::Withdraw { account, amount } => {
                self.withdraw(account, amount).map(Receipt::Recorded)
            }
            Command::RequestLoan { account, amount } => {
                self.request_loan(account, amount).map(Receipt::Recorded)
            }
            Command::ApproveLoan { loan } => self.approve_loan(loan).map(Receipt::Recorded),
            Command::PayLoan { account, loan } => {
                self.pay_loan(account, loan).map(Receipt::LoanPayment)
            }
            Command::Transfer { from, to, amount } => {
                self.transfer(from, to, amount).map(Receipt::Recorded)
            }
            Command::Suspend => Ok(Receipt::Status(self.suspend())),
            Command::Resume => Ok(Receipt::Status(self.resume())),
        }
    }

    // === Accounts ===

    /// Registers a new account with a zero balance.
    ///
    /// # Errors
    ///
    /// - [`BankError::AccountExists`] - The number is already taken.
    pub fn open_account(&self, new: NewAccount) -> Result<AccountNumber, BankError> {
        let opened_on = self.clock.now().date_naive();
        match self.accounts.entry(new.number) {
            Entry::Occupied(_) => {
                tracing::warn!(account = %new.number, "account number already registered");
                Err(BankError::AccountExists)
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Account::new(
                    new.number,
                    new.owner,
                    new.account_type,
                    opened_on,
                )));
                tracing::info!(account = %new.number, "account opened");
                Ok(new.number)
            }
        }
    }

    /// Retrieves an account by number.
    pub fn get_account(&self, number: &AccountNumber) -> Option<Arc<Account>> {
        self.accounts.get(number).map(|entry| Arc::clone(entry.value()))
    }

    /// All accounts, ordered by number.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        let mut accounts: Vec<(AccountNumber, Arc<Account>)> = self
            .accounts
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        accounts.sort_by_key(|(number, _)| *number);
        accounts.into_iter().map(|(_, account)| account).collect()
    }

    // The map guard is released before the caller locks the account.
    fn account(&self, number: AccountNumber) -> Result<Arc<Account>, BankError> {
        self.get_account(&number).ok_or(BankError::AccountNotFound)
    }

    // === Balance mutations ===

    /// Credits `amount` to the account.
    ///
    /// # Errors
    ///
    /// - [`BankError::InvalidAmount`] - Amount is not a positive cent value.
    /// - [`BankError::AccountNotFound`] - Unknown account.
    /// - [`BankError::BalanceLimitExceeded`] - Balance would overflow.
    pub fn deposit(&self, number: AccountNumber, amount: Decimal) -> Result<Transaction, BankError> {
        let result = validate_amount(amount)
            .and_then(|amount| {
                let account = self.account(number)?;
                let mut data = account.lock();
                let balance = data.credit(amount)?;
                let transaction = self.record(number, None, amount, TransactionType::Deposit, balance);
                Ok((transaction, data.owner().clone()))
            })
            .map(|(transaction, owner)| {
                self.outbox.enqueue(Email::deposit(&owner, amount));
                transaction
            });
        log_outcome("deposit", number, &result);
        result
    }

    /// Debits `amount` from the account.
    ///
    /// # Errors
    ///
    /// - [`BankError::InvalidAmount`] - Amount is not a positive cent value.
    /// - [`BankError::AccountNotFound`] - Unknown account.
    /// - [`BankError::BankSuspended`] - The bank is suspended.
    /// - [`BankError::InsufficientFunds`] - Amount exceeds the balance.
    pub fn withdraw(&self, number: AccountNumber, amount: Decimal) -> Result<Transaction, BankError> {
        let result = validate_amount(amount)
            .and_then(|amount| {
                let account = self.account(number)?;
                let status = self.status.read();
                if status.is_suspended() {
                    return Err(BankError::BankSuspended);
                }
                let mut data = account.lock();
                let balance = data.debit(amount)?;
                let transaction =
                    self.record(number, None, amount, TransactionType::Withdrawal, balance);
                Ok((transaction, data.owner().clone()))
            })
            .map(|(transaction, owner)| {
                self.outbox.enqueue(Email::withdrawal(&owner, amount));
                transaction
            });
        log_outcome("withdraw", number, &result);
        result
    }

    /// Records a loan request. The balance is not touched until the loan is
    /// approved and paid.
    ///
    /// # Errors
    ///
    /// - [`BankError::InvalidAmount`] - Amount is not a positive cent value.
    /// - [`BankError::AccountNotFound`] - Unknown account.
    /// - [`BankError::LoanLimitExceeded`] - The account already holds the
    ///   maximum number of approved loans.
    pub fn request_loan(
        &self,
        number: AccountNumber,
        amount: Decimal,
    ) -> Result<Transaction, BankError> {
        let result = validate_amount(amount)
            .and_then(|amount| {
                let account = self.account(number)?;
                let data = account.lock();
                let approved = self
                    .ledger
                    .count(|tx| tx.account == number && tx.is_approved_loan());
                if approved >= self.config.loan_limit {
                    return Err(BankError::LoanLimitExceeded);
                }
                let transaction =
                    self.record(number, None, amount, TransactionType::Loan, data.balance());
                Ok((transaction, data.owner().clone()))
            })
            .map(|(transaction, owner)| {
                self.outbox.enqueue(Email::loan_request(&owner, amount));
                transaction
            });
        log_outcome("request_loan", number, &result);
        result
    }

    /// Approves a pending loan. Approving an approved or paid loan is a no-op.
    ///
    /// # Errors
    ///
    /// - [`BankError::TransactionNotFound`] - Unknown id.
    /// - [`BankError::NotALoan`] - The entry is not a loan.
    pub fn approve_loan(&self, loan_id: TransactionId) -> Result<Transaction, BankError> {
        let loan = self.ledger.get(loan_id).ok_or(BankError::TransactionNotFound)?;
        let account = self.account(loan.account)?;
        let _data = account.lock();

        let result = self
            .ledger
            .update(loan_id, |tx| match tx.transaction_type {
                TransactionType::Loan | TransactionType::LoanPaid => {
                    tx.loan_approve = true;
                    Ok(tx.clone())
                }
                _ => Err(BankError::NotALoan),
            })
            .ok_or(BankError::TransactionNotFound)?;
        log_outcome("approve_loan", loan.account, &result);
        result
    }

    /// Pays an approved loan from the owning account's balance.
    ///
    /// Paying a loan that is not approved, or already paid, changes nothing
    /// and is not an error.
    ///
    /// # Errors
    ///
    /// - [`BankError::TransactionNotFound`] - Unknown id.
    /// - [`BankError::AccountMismatch`] - The loan belongs to another account.
    /// - [`BankError::InsufficientFunds`] - The loan exceeds the balance.
    pub fn pay_loan(
        &self,
        number: AccountNumber,
        loan_id: TransactionId,
    ) -> Result<PayLoanOutcome, BankError> {
        let result = self
            .ledger
            .get(loan_id)
            .ok_or(BankError::TransactionNotFound)
            .and_then(|loan| {
                if loan.account != number {
                    return Err(BankError::AccountMismatch);
                }
                let account = self.account(number)?;
                let mut data = account.lock();
                // Re-read under the account lock: a concurrent payment may have won.
                self.ledger
                    .update(loan_id, |tx| match tx.transaction_type {
                        TransactionType::LoanPaid => Ok(PayLoanOutcome::AlreadyPaid),
                        TransactionType::Loan if tx.loan_approve => {
                            let balance = data.debit(tx.amount)?;
                            tx.balance_after_transaction = balance;
                            tx.transaction_type = TransactionType::LoanPaid;
                            Ok(PayLoanOutcome::Paid(tx.clone()))
                        }
                        _ => Ok(PayLoanOutcome::NotApproved),
                    })
                    .ok_or(BankError::TransactionNotFound)?
            });
        match &result {
            Ok(PayLoanOutcome::Paid(tx)) => {
                tracing::debug!(account = %number, loan = %loan_id, balance = %tx.balance_after_transaction, "loan paid");
            }
            Ok(outcome) => {
                tracing::debug!(account = %number, loan = %loan_id, ?outcome, "loan payment skipped");
            }
            Err(err) => {
                tracing::warn!(account = %number, loan = %loan_id, error = %err, "pay_loan rejected");
            }
        }
        result
    }

    /// Moves `amount` from `from` to the account numbered `to`.
    ///
    /// Both accounts are locked in ascending number order, so two opposite
    /// transfers between the same pair cannot deadlock.
    ///
    /// # Errors
    ///
    /// - [`BankError::InvalidAmount`] - Amount is not a positive cent value.
    /// - [`BankError::AccountNotFound`] - Unknown sender or recipient.
    /// - [`BankError::SelfTransfer`] - Sender and recipient are the same.
    /// - [`BankError::InsufficientFunds`] - Amount exceeds the sender's balance.
    /// - [`BankError::BalanceLimitExceeded`] - Recipient balance would overflow.
    pub fn transfer(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        amount: Decimal,
    ) -> Result<Transaction, BankError> {
        let result = validate_amount(amount)
            .and_then(|amount| {
                let sender = self.account(from)?;
                let recipient = self.account(to)?;
                if from == to {
                    return Err(BankError::SelfTransfer);
                }

                let (mut sender_data, mut recipient_data) = if from < to {
                    let sender_data = sender.lock();
                    (sender_data, recipient.lock())
                } else {
                    let recipient_data = recipient.lock();
                    (sender.lock(), recipient_data)
                };

                // Check both sides before mutating either.
                sender_data.can_debit(amount)?;
                recipient_data.can_credit(amount)?;
                let sender_balance = sender_data.debit(amount)?;
                recipient_data.credit(amount)?;

                let transaction = self.record(
                    from,
                    Some(to),
                    amount,
                    TransactionType::Transfer,
                    sender_balance,
                );
                Ok((
                    transaction,
                    sender_data.owner().clone(),
                    recipient_data.owner().clone(),
                ))
            })
            .map(|(transaction, sender, recipient)| {
                self.outbox.enqueue(Email::transfer_sent(&sender, &recipient, amount));
                self.outbox.enqueue(Email::transfer_received(&sender, &recipient, amount));
                transaction
            });
        log_outcome("transfer", from, &result);
        result
    }

    fn record(
        &self,
        account: AccountNumber,
        recipient_account: Option<AccountNumber>,
        amount: Decimal,
        transaction_type: TransactionType,
        balance_after_transaction: Decimal,
    ) -> Transaction {
        self.ledger.append(NewTransaction {
            account,
            recipient_account,
            amount,
            transaction_type,
            balance_after_transaction,
            timestamp: self.clock.now(),
        })
    }

    // === Bank status ===

    pub fn status(&self) -> BankStatus {
        self.status.current()
    }

    /// Halts all withdrawals until [`resume`](Self::resume) is called.
    pub fn suspend(&self) -> BankStatus {
        if self.status.suspend(self.clock.now()) {
            tracing::warn!("bank suspended, withdrawals halted");
        }
        self.status.current()
    }

    pub fn resume(&self) -> BankStatus {
        if self.status.resume() {
            tracing::info!("bank resumed operations");
        }
        self.status.current()
    }

    // === Queries ===

    pub fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.ledger.get(id)
    }

    /// Every ledger entry, oldest first.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.ledger.select(|_| true)
    }

    /// Transactions initiated by the account, optionally limited to a date
    /// range.
    ///
    /// Without a range the report carries the current balance. With a range
    /// it carries the sum of the amounts in range, over this account or over
    /// every account depending on [`BankConfig::report_scope`].
    ///
    /// # Errors
    ///
    /// - [`BankError::AccountNotFound`] - Unknown account.
    pub fn report(
        &self,
        number: AccountNumber,
        range: Option<DateRange>,
    ) -> Result<Report, BankError> {
        let account = self.account(number)?;
        let report = match range {
            None => Report {
                transactions: self.ledger.for_account(number),
                balance: account.balance(),
                range: None,
            },
            Some(range) => {
                let transactions = self
                    .ledger
                    .select(|tx| tx.account == number && range.includes(tx));
                let balance = match self.config.report_scope {
                    ReportScope::Account => {
                        transactions.iter().map(|tx| tx.amount).sum::<Decimal>()
                    }
                    ReportScope::AllAccounts => self.ledger.sum_amounts(|tx| range.includes(tx)),
                };
                Report {
                    transactions,
                    balance,
                    range: Some(range),
                }
            }
        };
        Ok(report)
    }

    /// Every loan-type transaction of the account, approved or not.
    ///
    /// # Errors
    ///
    /// - [`BankError::AccountNotFound`] - Unknown account.
    pub fn list_loans(&self, number: AccountNumber) -> Result<Vec<Transaction>, BankError> {
        self.account(number)?;
        Ok(self.ledger.select(|tx| tx.account == number && tx.is_loan()))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn log_outcome(operation: &str, account: AccountNumber, result: &Result<Transaction, BankError>) {
    match result {
        Ok(tx) => tracing::debug!(
            operation,
            account = %account,
            transaction = %tx.id,
            amount = %tx.amount,
            balance = %tx.balance_after_transaction,
            "operation applied"
        ),
        Err(err) => tracing::warn!(operation, account = %account, error = %err, "operation rejected"),
    }
}
