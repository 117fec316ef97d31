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


//! Accounts and their read-only projections.
//!
//! An [`AccountRecord`] is the stored identity of a holder. Balance and history
//! are never stored: an [`AccountView`] is assembled from the transaction log
//! on every read, and each entry of its history is a [`TransactionView`] seen
//! from the viewing account's side.
//!
//! # Example
//!
//! ```
//! use bank_ledger::{AccountId, Direction, TransactionId, TransactionRecord, TransactionView};
//!
//! let tx = TransactionRecord {
//!     id: TransactionId(1),
//!     creditor_id: AccountId(2),
//!     debitor_id: AccountId(1),
//!     amount: 30,
//!     concept: "groceries".to_string(),
//!     date_created: 3,
//!     date_due: 3,
//!     payed: true,
//!     revoked: false,
//! };
//!
//! let view = TransactionView::project(&tx, AccountId(1), "Bob");
//! assert_eq!(view.amount, -30);
//! assert_eq!(view.direction, Direction::Outgoing);
//! assert_eq!(view.to_from(), "--> Bob [0002]");
//! ```

use crate::base::{AccountId, Amount, Tick, TransactionId};
use crate::transaction::{TransactionRecord, TransactionStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored account identity. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub holder: String,
    pub registration_date: Tick,
}

/// Entry of the public roster of account holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    pub id: AccountId,
    pub holder: String,
}

impl From<AccountRecord> for BookEntry {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            holder: record.holder,
        }
    }
}

/// Which way money moves relative to the viewing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Incoming => f.write_str("<--"),
            Direction::Outgoing => f.write_str("-->"),
        }
    }
}

/// A transaction as seen by one of its parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: TransactionId,
    pub date_created: Tick,
    pub date_due: Tick,
    pub concept: String,
    /// Positive when incoming, negated when outgoing.
    pub amount: Amount,
    pub direction: Direction,
    pub counterparty_id: AccountId,
    /// Holder name, followed by the padded id for real accounts.
    pub counterparty: String,
    pub status: TransactionStatus,
}

impl TransactionView {
    /// Projects `tx` from `viewer`'s side. `counterparty_holder` is the display
    /// name of the other party.
    pub fn project(tx: &TransactionRecord, viewer: AccountId, counterparty_holder: &str) -> Self {
        let (direction, counterparty_id, amount) = if tx.creditor_id == viewer {
            (Direction::Incoming, tx.debitor_id, tx.amount)
        } else {
            (Direction::Outgoing, tx.creditor_id, -tx.amount)
        };

        Self {
            id: tx.id,
            date_created: tx.date_created,
            date_due: tx.date_due,
            concept: tx.concept.clone(),
            amount,
            direction,
            counterparty_id,
            counterparty: counterparty_label(counterparty_id, counterparty_holder),
            status: tx.status(),
        }
    }

    /// The counterparty column, e.g. `<-- Alice [0001]` or `--> The Bank`.
    pub fn to_from(&self) -> String {
        format!("{} {}", self.direction, self.counterparty)
    }
}

fn counterparty_label(id: AccountId, holder: &str) -> String {
    if id.is_system() {
        holder.to_string()
    } else {
        format!("{holder} [{:04}]", id.0)
    }
}

/// Account identity together with its derived balance and live history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub id: AccountId,
    pub holder: String,
    pub registration_date: Tick,
    pub balance: Amount,
    /// Live transactions, newest first.
    pub transactions: Vec<TransactionView>,
}

impl AccountView {
    /// Transactions not yet settled.
    pub fn pending(&self) -> impl Iterator<Item = &TransactionView> {
        self.transactions
            .iter()
            .filter(|tx| tx.status == TransactionStatus::Pending)
    }
}
