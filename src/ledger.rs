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

//! Thread-safe, append-only transaction ledger.
//!
//! Entries are keyed by a monotonically increasing [`TransactionId`], so
//! creation order is recovered by sorting on the id.

use crate::base::{AccountNumber, TransactionId};
use crate::transaction::{NewTransaction, Transaction};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

/// An append-only ledger of transactions.
///
/// Backed by a [`DashMap`] so lookups and appends from different threads do
/// not contend on a single lock. Callers that also hold an account lock must
/// acquire it before touching the ledger, never the other way around.
#[derive(Debug)]
pub struct Ledger {
    entries: DashMap<TransactionId, Transaction>,
    next_id: AtomicU64,
}

impl Ledger {
    /// Creates an empty ledger. The first entry gets id `1`.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Appends an entry and returns it with its assigned id.
    pub fn append(&self, new: NewTransaction) -> Transaction {
        let id = TransactionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let transaction = new.into_transaction(id);
        self.entries.insert(id, transaction.clone());
        transaction
    }

    /// Returns a copy of the entry with the given id.
    pub fn get(&self, id: TransactionId) -> Option<Transaction> {
        self.entries.get(&id).map(|entry| entry.value().clone())
    }

    /// Applies `f` to the entry in place. Returns `None` if the id is unknown.
    pub fn update<F, R>(&self, id: TransactionId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Transaction) -> R,
    {
        self.entries.get_mut(&id).map(|mut entry| f(entry.value_mut()))
    }

    /// Entries matching `predicate`, in creation order.
    pub fn select<P>(&self, predicate: P) -> Vec<Transaction>
    where
        P: Fn(&Transaction) -> bool,
    {
        let mut selected: Vec<Transaction> = self
            .entries
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        selected.sort_by_key(|tx| tx.id);
        selected
    }

    /// Entries initiated by `account`, in creation order.
    pub fn for_account(&self, account: AccountNumber) -> Vec<Transaction> {
        self.select(|tx| tx.account == account)
    }

    /// Number of entries matching `predicate`.
    pub fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Transaction) -> bool,
    {
        self.entries.iter().filter(|entry| predicate(entry.value())).count()
    }

    /// Sum of the amounts of entries matching `predicate`. Zero when none match.
    pub fn sum_amounts<P>(&self, predicate: P) -> Decimal
    where
        P: Fn(&Transaction) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().amount)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
