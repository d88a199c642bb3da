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

//! Bank-wide operating status.
//!
//! A single status record decides whether withdrawals are allowed:
//!
//! ```text
//! Operating ──suspend──► Suspended { since } ──resume──► Operating
//! ```

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};

/// Current operating state of the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum BankStatus {
    Operating,
    /// Bankrupt: every withdrawal is refused until resumed.
    Suspended { since: DateTime<Utc> },
}

impl BankStatus {
    pub fn is_suspended(&self) -> bool {
        matches!(self, BankStatus::Suspended { .. })
    }
}

/// Shared holder of the [`BankStatus`].
///
/// Withdrawals keep a read guard for their whole critical section, so a
/// suspension waits for in-flight withdrawals and applies to every one that
/// starts afterwards.
#[derive(Debug)]
pub(crate) struct StatusRegister {
    state: RwLock<BankStatus>,
}

impl StatusRegister {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(BankStatus::Operating),
        }
    }

    pub(crate) fn current(&self) -> BankStatus {
        *self.state.read()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, BankStatus> {
        self.state.read()
    }

    /// Returns `false` if the bank was already suspended; the first
    /// `since` is kept in that case.
    pub(crate) fn suspend(&self, at: DateTime<Utc>) -> bool {
        let mut state = self.state.write();
        if state.is_suspended() {
            return false;
        }
        *state = BankStatus::Suspended { since: at };
        true
    }

    /// Returns `false` if the bank was already operating.
    pub(crate) fn resume(&self) -> bool {
        let mut state = self.state.write();
        if !state.is_suspended() {
            return false;
        }
        *state = BankStatus::Operating;
        true
    }
}
