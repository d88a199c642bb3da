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

//! Error types for ledger operations.

use thiserror::Error;

/// Errors returned by the balance mutation operations.
///
/// None of these are fatal: every operation leaves the engine in a
/// consistent state when it returns an error, and the caller is expected to
/// surface the message to the account holder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    /// Amount is zero, negative, or has more than two fraction digits
    #[error("invalid amount (must be positive with at most two decimal places)")]
    InvalidAmount,

    /// Debit would exceed the account balance
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Withdrawals are halted bank-wide
    #[error("the bank is bankrupt, withdrawals are suspended")]
    BankSuspended,

    /// Account already holds the maximum number of approved loans
    #[error("loan limit reached")]
    LoanLimitExceeded,

    /// No account with the given number
    #[error("account not found")]
    AccountNotFound,

    /// Account number is already registered
    #[error("account already exists")]
    AccountExists,

    /// Referenced transaction ID does not exist
    #[error("transaction not found")]
    TransactionNotFound,

    /// Referenced transaction is not a loan
    #[error("transaction is not a loan")]
    NotALoan,

    /// Account does not own the referenced transaction
    #[error("account does not own this transaction")]
    AccountMismatch,

    /// Sender and recipient are the same account
    #[error("cannot transfer to the same account")]
    SelfTransfer,

    /// Credit would push the balance past the representable maximum
    #[error("balance limit exceeded")]
    BalanceLimitExceeded,

    /// A report date could not be parsed
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

#[cfg(test)]
mod tests {
    use super::BankError;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            BankError::InvalidAmount.to_string(),
            "invalid amount (must be positive with at most two decimal places)"
        );
        assert_eq!(BankError::InsufficientFunds.to_string(), "insufficient funds");
        assert_eq!(
            BankError::BankSuspended.to_string(),
            "the bank is bankrupt, withdrawals are suspended"
        );
        assert_eq!(BankError::LoanLimitExceeded.to_string(), "loan limit reached");
        assert_eq!(BankError::AccountNotFound.to_string(), "account not found");
        assert_eq!(BankError::AccountExists.to_string(), "account already exists");
        assert_eq!(BankError::TransactionNotFound.to_string(), "transaction not found");
        assert_eq!(BankError::NotALoan.to_string(), "transaction is not a loan");
        assert_eq!(
            BankError::AccountMismatch.to_string(),
            "account does not own this transaction"
        );
        assert_eq!(
            BankError::SelfTransfer.to_string(),
            "cannot transfer to the same account"
        );
        assert_eq!(BankError::BalanceLimitExceeded.to_string(), "balance limit exceeded");
        assert_eq!(
            BankError::InvalidDate("2024-13-01".into()).to_string(),
            "invalid date: 2024-13-01"
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = BankError::InsufficientFunds;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
