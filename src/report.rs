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

//! Transaction reports.

use crate::BankError;
use crate::transaction::Transaction;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of calendar dates (UTC).
///
/// A range whose start lies after its end is valid and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parses `YYYY-MM-DD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, BankError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn includes(&self, transaction: &Transaction) -> bool {
        self.contains(transaction.date())
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, BankError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| BankError::InvalidDate(input.to_string()))
}

/// Which transactions feed the aggregate of a date-range report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportScope {
    /// Only the reported account's transactions.
    #[default]
    Account,
    /// Every account's transactions, as older versions computed it.
    AllAccounts,
}

impl FromStr for ReportScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "account" => Ok(ReportScope::Account),
            "all_accounts" | "all" => Ok(ReportScope::AllAccounts),
            other => Err(format!("unknown report scope: {other}")),
        }
    }
}

/// Result of a report query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The account's transactions, oldest first.
    pub transactions: Vec<Transaction>,
    /// Current balance without a range, sum of amounts in range otherwise.
    pub balance: Decimal,
    pub range: Option<DateRange>,
}
