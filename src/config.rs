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

//! Engine configuration.

use crate::report::ReportScope;
use serde::{Deserialize, Serialize};

/// Maximum number of approved, unpaid loans an account may hold.
pub const DEFAULT_LOAN_LIMIT: usize = 3;

/// Tunable business rules for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankConfig {
    /// A loan request is refused once the account holds this many approved loans.
    pub loan_limit: usize,
    /// Aggregate scope of date-range reports.
    pub report_scope: ReportScope,
}

impl BankConfig {
    pub fn with_loan_limit(mut self, loan_limit: usize) -> Self {
        self.loan_limit = loan_limit;
        self
    }

    pub fn with_report_scope(mut self, report_scope: ReportScope) -> Self {
        self.report_scope = report_scope;
        self
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            loan_limit: DEFAULT_LOAN_LIMIT,
            report_scope: ReportScope::Account,
        }
    }
}
