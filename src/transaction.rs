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

//! Ledger entries.
//!
//! Entries are immutable except for loans, which follow a small state machine:
//!
//! ```text
//! Loan (loan_approve = false) ──approve──► Loan (loan_approve = true) ──pay──► LoanPaid
//! ```

use crate::base::{AccountNumber, TransactionId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of money movement recorded by a ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Loan,
    LoanPaid,
    Transfer,
}

impl TransactionType {
    /// Stable numeric code, as stored by earlier versions of the ledger.
    pub fn code(&self) -> u8 {
        match self {
            Self::Deposit => 1,
            Self::Withdrawal => 2,
            Self::Loan => 3,
            Self::LoanPaid => 4,
            Self::Transfer => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Deposit),
            2 => Some(Self::Withdrawal),
            3 => Some(Self::Loan),
            4 => Some(Self::LoanPaid),
            5 => Some(Self::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Deposit => "Deposit",
            Self::Withdrawal => "Withdrawal",
            Self::Loan => "Loan",
            Self::LoanPaid => "Loan Paid",
            Self::Transfer => "Transfer",
        };
        f.write_str(label)
    }
}

/// A single ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    /// Account that initiated the operation (the payer for transfers).
    pub account: AccountNumber,
    /// Set only for transfers.
    pub recipient_account: Option<AccountNumber>,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    /// Payer balance right after the operation.
    pub balance_after_transaction: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Meaningful only for loans.
    pub loan_approve: bool,
}

impl Transaction {
    /// Calendar date of the entry, used by date-range reports.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn is_loan(&self) -> bool {
        self.transaction_type == TransactionType::Loan
    }

    /// An approved loan that has not been paid yet.
    pub fn is_approved_loan(&self) -> bool {
        self.is_loan() && self.loan_approve
    }
}

/// Fields of a new entry; the ledger assigns the id.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account: AccountNumber,
    pub recipient_account: Option<AccountNumber>,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub balance_after_transaction: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl NewTransaction {
    pub(crate) fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            account: self.account,
            recipient_account: self.recipient_account,
            amount: self.amount,
            transaction_type: self.transaction_type,
            balance_after_transaction: self.balance_after_transaction,
            timestamp: self.timestamp,
            loan_approve: false,
        }
    }
}
