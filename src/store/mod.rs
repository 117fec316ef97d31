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


//! Persistence contract of the ledger.
//!
//! The engine talks to storage only through [`LedgerStore`]: point lookups,
//! one insert, one flag update, two aggregates and one ordered scan. Account
//! creation, clock advancement and settlement belong to the administrative
//! side and live in [`AdminStore`].
//!
//! Two implementations ship with the crate:
//! - [`MemoryStore`]: concurrent in-process maps, used by tests and benchmarks.
//! - [`SqliteStore`]: durable single-file store used by the CLI.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::account::AccountRecord;
use crate::base::{AccountId, Amount, Tick, TransactionId};
use crate::clock::ClockSource;
use crate::error::StoreError;
use crate::transaction::{NewTransaction, TransactionRecord};

/// Queries and mutations the ledger engine needs.
///
/// Transactions are insert-only apart from the `revoked` and `payed` flags,
/// and are never deleted.
pub trait LedgerStore: ClockSource {
    fn account(&self, id: AccountId) -> Result<Option<AccountRecord>, StoreError>;

    /// All accounts, ordered by id. Includes system accounts.
    fn accounts(&self) -> Result<Vec<AccountRecord>, StoreError>;

    fn transaction(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError>;

    /// Inserts a live transaction and returns its newly assigned id.
    fn insert_transaction(&self, tx: NewTransaction) -> Result<TransactionId, StoreError>;

    /// Sets `revoked` on the transaction. Updating a missing id is a no-op.
    fn set_revoked(&self, id: TransactionId) -> Result<(), StoreError>;

    /// Sum of payed, live amounts credited to `account`, `None` if there are none.
    fn settled_credits(&self, account: AccountId) -> Result<Option<Amount>, StoreError>;

    /// Sum of payed, live amounts debited from `account`, `None` if there are none.
    fn settled_debits(&self, account: AccountId) -> Result<Option<Amount>, StoreError>;

    /// Live transactions where `account` is either party, newest first.
    fn live_transactions(&self, account: AccountId) -> Result<Vec<TransactionRecord>, StoreError>;
}

/// Administrative operations performed outside the ledger engine.
pub trait AdminStore: LedgerStore {
    /// Creates a holder account with the next free positive id.
    fn create_account(&self, holder: &str, registration_date: Tick)
    -> Result<AccountId, StoreError>;

    /// Creates a system account under a fixed id. Returns `false` if the id
    /// already exists.
    fn create_system_account(&self, id: AccountId, holder: &str) -> Result<bool, StoreError>;

    /// Moves the clock forward and returns the new tick.
    fn advance_clock(&self, ticks: Tick) -> Result<Tick, StoreError>;

    /// Marks every live pending transaction due at or before `clock` as payed.
    /// Returns the number of settled transactions.
    fn settle_due(&self, clock: Tick) -> Result<usize, StoreError>;
}
