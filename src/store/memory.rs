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


//! In-memory ledger store.
//!
//! Accounts and transactions live in [`DashMap`]s so that operations on
//! different accounts proceed concurrently. Ids and the clock are atomics.

use super::{AdminStore, LedgerStore};
use crate::account::AccountRecord;
use crate::base::{AccountId, Amount, Tick, TransactionId};
use crate::clock::ClockSource;
use crate::error::StoreError;
use crate::transaction::{NewTransaction, TransactionRecord};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Debug)]
pub struct MemoryStore {
    accounts: DashMap<AccountId, AccountRecord>,
    transactions: DashMap<TransactionId, TransactionRecord>,
    next_account_id: AtomicI64,
    next_transaction_id: AtomicU64,
    clock: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store with the clock at tick 0.
    pub fn new() -> Self {
        Self::with_clock(0)
    }

    pub fn with_clock(tick: Tick) -> Self {
        Self {
            accounts: DashMap::new(),
            transactions: DashMap::new(),
            next_account_id: AtomicI64::new(1),
            next_transaction_id: AtomicU64::new(1),
            clock: AtomicU64::new(tick),
        }
    }

    /// Number of stored transactions, revoked ones included.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Fails like SQLite's `SUM` when the total leaves the `i64` range.
    fn settled_sum(
        &self,
        matches: impl Fn(&TransactionRecord) -> bool,
    ) -> Result<Option<Amount>, StoreError> {
        self.transactions
            .iter()
            .filter(|tx| tx.payed && !tx.revoked && matches(tx.value()))
            .try_fold(None, |acc: Option<Amount>, tx| match acc {
                None => Ok(Some(tx.amount)),
                Some(sum) => sum
                    .checked_add(tx.amount)
                    .map(Some)
                    .ok_or_else(|| StoreError::new("integer overflow")),
            })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MemoryStore {
    fn read_tick(&self) -> Result<Tick, StoreError> {
        Ok(self.clock.load(Ordering::Acquire))
    }
}

impl LedgerStore for MemoryStore {
    fn account(&self, id: AccountId) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.accounts.get(&id).map(|account| account.clone()))
    }

    fn accounts(&self) -> Result<Vec<AccountRecord>, StoreError> {
        let mut accounts: Vec<AccountRecord> = self
            .accounts
            .iter()
            .map(|account| account.value().clone())
            .collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    fn transaction(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self.transactions.get(&id).map(|tx| tx.clone()))
    }

    fn insert_transaction(&self, tx: NewTransaction) -> Result<TransactionId, StoreError> {
        let id = TransactionId(self.next_transaction_id.fetch_add(1, Ordering::AcqRel));

        match self.transactions.entry(id) {
            Entry::Occupied(_) => Err(StoreError::new(format!("duplicate transaction id {id}"))),
            Entry::Vacant(entry) => {
                entry.insert(tx.into_record(id));
                Ok(id)
            }
        }
    }

    fn set_revoked(&self, id: TransactionId) -> Result<(), StoreError> {
        if let Some(mut tx) = self.transactions.get_mut(&id) {
            tx.revoked = true;
        }
        Ok(())
    }

    fn settled_credits(&self, account: AccountId) -> Result<Option<Amount>, StoreError> {
        self.settled_sum(|tx| tx.creditor_id == account)
    }

    fn settled_debits(&self, account: AccountId) -> Result<Option<Amount>, StoreError> {
        self.settled_sum(|tx| tx.debitor_id == account)
    }

    fn live_transactions(&self, account: AccountId) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut transactions: Vec<TransactionRecord> = self
            .transactions
            .iter()
            .filter(|tx| tx.is_live() && tx.involves(account))
            .map(|tx| tx.value().clone())
            .collect();
        transactions.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(transactions)
    }
}

impl AdminStore for MemoryStore {
    fn create_account(
        &self,
        holder: &str,
        registration_date: Tick,
    ) -> Result<AccountId, StoreError> {
        let id = AccountId(self.next_account_id.fetch_add(1, Ordering::AcqRel));
        self.accounts.insert(
            id,
            AccountRecord {
                id,
                holder: holder.to_string(),
                registration_date,
            },
        );
        Ok(id)
    }

    fn create_system_account(&self, id: AccountId, holder: &str) -> Result<bool, StoreError> {
        match self.accounts.entry(id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(AccountRecord {
                    id,
                    holder: holder.to_string(),
                    registration_date: 0,
                });
                Ok(true)
            }
        }
    }

    fn advance_clock(&self, ticks: Tick) -> Result<Tick, StoreError> {
        Ok(self.clock.fetch_add(ticks, Ordering::AcqRel) + ticks)
    }

    fn settle_due(&self, clock: Tick) -> Result<usize, StoreError> {
        let mut settled = 0;
        for mut tx in self.transactions.iter_mut() {
            if !tx.payed && !tx.revoked && tx.date_due <= clock {
                tx.payed = true;
                settled += 1;
            }
        }
        Ok(settled)
    }
}
