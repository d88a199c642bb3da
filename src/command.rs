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

//! Operation requests accepted by [`Engine::process`](crate::Engine::process).

use crate::account::NewAccount;
use crate::base::{AccountNumber, TransactionId};
use crate::engine::PayLoanOutcome;
use crate::status::BankStatus;
use crate::transaction::Transaction;
use rust_decimal::Decimal;

/// One ledger operation, on behalf of an explicit account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenAccount(NewAccount),
    Deposit {
        account: AccountNumber,
        amount: Decimal,
    },
    Withdraw {
        account: AccountNumber,
        amount: Decimal,
    },
    RequestLoan {
        account: AccountNumber,
        amount: Decimal,
    },
    ApproveLoan {
        loan: TransactionId,
    },
    PayLoan {
        account: AccountNumber,
        loan: TransactionId,
    },
    Transfer {
        from: AccountNumber,
        to: AccountNumber,
        amount: Decimal,
    },
    Suspend,
    Resume,
}

impl Command {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAccount(_) => "open_account",
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::RequestLoan { .. } => "request_loan",
            Self::ApproveLoan { .. } => "approve_loan",
            Self::PayLoan { .. } => "pay_loan",
            Self::Transfer { .. } => "transfer",
            Self::Suspend => "suspend",
            Self::Resume => "resume",
        }
    }
}

/// What a successful [`Command`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receipt {
    Opened(AccountNumber),
    Recorded(Transaction),
    LoanPayment(PayLoanOutcome),
    Status(BankStatus),
}
