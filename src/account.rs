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

//! Bank accounts.
//!
//! Every account keeps its mutable state behind its own mutex, so operations
//! on different accounts never contend. The engine holds the lock for the
//! whole check-then-mutate sequence of an operation.
//!
//! # Example
//!
//! ```
//! use bank_ledger::{Account, AccountNumber, AccountType, Owner};
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//!
//! let account = Account::new(
//!     AccountNumber(1001),
//!     Owner::new("Ada", "ada@example.com"),
//!     AccountType::Savings,
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//! );
//! assert_eq!(account.balance(), Decimal::ZERO);
//! ```

use crate::BankError;
use crate::amount::{DECIMAL_PLACES, MAX_BALANCE};
use crate::base::AccountNumber;
use chrono::NaiveDate;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Kind of account offered at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Savings,
    Current,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "savings",
            AccountType::Current => "current",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "savings" => Ok(AccountType::Savings),
            "current" => Ok(AccountType::Current),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

/// Account holder contact details. The email receives notifications.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub email: String,
}

impl Owner {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Registration request for a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub number: AccountNumber,
    pub owner: Owner,
    pub account_type: AccountType,
}

#[derive(Debug)]
pub(crate) struct AccountData {
    number: AccountNumber,
    owner: Owner,
    account_type: AccountType,
    opened_on: NaiveDate,
    balance: Decimal,
}

impl AccountData {
    fn new(
        number: AccountNumber,
        owner: Owner,
        account_type: AccountType,
        opened_on: NaiveDate,
    ) -> Self {
        Self {
            number,
            owner,
            account_type,
            opened_on,
            balance: Decimal::ZERO,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
        debug_assert!(
            self.balance <= MAX_BALANCE,
            "Invariant violated: balance exceeds maximum: {}",
            self.balance
        );
    }

    pub(crate) fn owner(&self) -> &Owner {
        &self.owner
    }

    pub(crate) fn balance(&self) -> Decimal {
        self.balance
    }

    /// Checks that a credit of `amount` fits without changing anything.
    pub(crate) fn can_credit(&self, amount: Decimal) -> Result<(), BankError> {
        if amount <= Decimal::ZERO {
            return Err(BankError::InvalidAmount);
        }
        if self.balance + amount > MAX_BALANCE {
            return Err(BankError::BalanceLimitExceeded);
        }
        Ok(())
    }

    /// Checks that a debit of `amount` is covered without changing anything.
    pub(crate) fn can_debit(&self, amount: Decimal) -> Result<(), BankError> {
        if amount <= Decimal::ZERO {
            return Err(BankError::InvalidAmount);
        }
        if amount > self.balance {
            return Err(BankError::InsufficientFunds);
        }
        Ok(())
    }

    /// Increases the balance. Returns the new balance.
    pub(crate) fn credit(&mut self, amount: Decimal) -> Result<Decimal, BankError> {
        self.can_credit(amount)?;
        self.balance += amount;
        self.assert_invariants();
        Ok(self.balance)
    }

    /// Decreases the balance. Returns the new balance.
    pub(crate) fn debit(&mut self, amount: Decimal) -> Result<Decimal, BankError> {
        self.can_debit(amount)?;
        self.balance -= amount;
        self.assert_invariants();
        Ok(self.balance)
    }
}

/// Bank account.
#[derive(Debug)]
pub struct Account {
    inner: Mutex<AccountData>,
}

impl Account {
    pub fn new(
        number: AccountNumber,
        owner: Owner,
        account_type: AccountType,
        opened_on: NaiveDate,
    ) -> Self {
        Self {
            inner: Mutex::new(AccountData::new(number, owner, account_type, opened_on)),
        }
    }

    pub fn number(&self) -> AccountNumber {
        self.inner.lock().number
    }

    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    pub fn owner(&self) -> Owner {
        self.inner.lock().owner.clone()
    }

    pub fn account_type(&self) -> AccountType {
        self.inner.lock().account_type
    }

    pub fn opened_on(&self) -> NaiveDate {
        self.inner.lock().opened_on
    }

    /// Locks the account for a read-modify-write sequence.
    pub(crate) fn lock(&self) -> MutexGuard<'_, AccountData> {
        self.inner.lock()
    }
}

/// Renders a balance with exactly two fraction digits.
fn display_balance(balance: Decimal) -> Decimal {
    let mut rounded = balance.round_dp(DECIMAL_PLACES);
    rounded.rescale(DECIMAL_PLACES);
    rounded
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Account", 5)?;
        state.serialize_field("account", &data.number)?;
        state.serialize_field("owner", &data.owner.name)?;
        state.serialize_field("email", &data.owner.email)?;
        state.serialize_field("type", &data.account_type)?;
        state.serialize_field("balance", &display_balance(data.balance))?;
        state.end()
    }
}
