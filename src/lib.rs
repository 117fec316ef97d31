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


//! # Bank Ledger
//!
//! A small, trust-based ledger for a closed group of account holders. Balances
//! are derived from dated transfers; a transfer may be scheduled for a future
//! tick of the shared logical clock, and while it is pending either party may
//! revoke it.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Transfer admission, revocation and account views
//! - [`LedgerStore`]: Persistence contract, with [`MemoryStore`] and [`SqliteStore`]
//! - [`Clock`]: Cached reader of the shared clock ([`ClockSource`])
//! - [`AccountView`] / [`TransactionView`]: Read-only projections for display
//! - [`LedgerError`]: Error types, with localized user messages
//!
//! ## Example
//!
//! ```
//! use bank_ledger::{BANK_ACCOUNT_ID, Ledger, MemoryStore, TransactionStatus};
//! use std::sync::Arc;
//!
//! let ledger = Ledger::new(Arc::new(MemoryStore::new()));
//! ledger.open_system_account(BANK_ACCOUNT_ID, "The Bank").unwrap();
//! let alice = ledger.open_account("Alice").unwrap();
//! let bob = ledger.open_account("Bob").unwrap();
//! ledger.issue(alice, 100, "welcome").unwrap();
//!
//! // Due today: settled on admission.
//! ledger.transfer(alice, bob, 30, 0, "rent").unwrap();
//! assert_eq!(ledger.balance(alice).unwrap(), 70);
//!
//! // Due tomorrow: pending, and revocable until then.
//! let id = ledger.transfer(alice, bob, 20, 1, "dinner").unwrap();
//! assert_eq!(ledger.load(bob).unwrap().transactions[0].status, TransactionStatus::Pending);
//! ledger.revoke(bob, id).unwrap();
//! assert_eq!(ledger.balance(bob).unwrap(), 30);
//! ```
//!
//! ## Thread Safety
//!
//! [`Ledger`] is `Sync` when its store is. Transfers from the same account are
//! serialized; everything else runs concurrently against the store.

pub mod account;
mod admin;
mod base;
pub mod clock;
mod engine;
pub mod error;
pub mod store;
mod transaction;

pub use account::{AccountRecord, AccountView, BookEntry, Direction, TransactionView};
pub use base::{AccountId, Amount, BANK_ACCOUNT_ID, Tick, TransactionId};
pub use clock::{Clock, ClockSource, FixedClock};
pub use engine::Ledger;
pub use error::{ErrorKind, Lang, LedgerError, StoreError};
pub use store::{AdminStore, LedgerStore, MemoryStore, SqliteStore};
pub use transaction::{NewTransaction, TransactionRecord, TransactionStatus};
