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

//! Money amount rules.
//!
//! Balances are fixed-point with two fraction digits and at most twelve
//! digits in total, so the largest representable balance is
//! `9,999,999,999.99`.

use crate::BankError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Number of fraction digits kept for every amount and balance.
pub const DECIMAL_PLACES: u32 = 2;

/// Largest balance an account may hold.
pub const MAX_BALANCE: Decimal = dec!(9999999999.99);

/// Checks that `amount` can be moved: strictly positive, no more than two
/// fraction digits, and not larger than [`MAX_BALANCE`].
pub fn validate_amount(amount: Decimal) -> Result<Decimal, BankError> {
    if amount <= Decimal::ZERO {
        return Err(BankError::InvalidAmount);
    }
    if amount.normalize().scale() > DECIMAL_PLACES {
        return Err(BankError::InvalidAmount);
    }
    if amount > MAX_BALANCE {
        return Err(BankError::InvalidAmount);
    }
    Ok(amount)
}

/// Formats an amount with thousands separators and two decimals,
/// e.g. `1234.5` becomes `"1,234.50"`.
pub fn format_amount(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.round_dp(DECIMAL_PLACES));
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (units, cents) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}{grouped}.{cents}")
}
