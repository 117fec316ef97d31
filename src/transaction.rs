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


//! Transaction records.
//!
//! Transactions follow a state machine over two stored flags:
//! - [`Pending`] → [`Payed`] (via the settlement sweep, once the clock reaches `date_due`)
//! - [`Pending`] → [`Revoked`] (via revocation, while `date_due` is still ahead)
//!
//! Neither terminal state can be left.
//!
//! [`Pending`]: TransactionStatus::Pending
//! [`Payed`]: TransactionStatus::Payed
//! [`Revoked`]: TransactionStatus::Revoked

use crate::base::{AccountId, Amount, Tick, TransactionId};
use serde::{Deserialize, Serialize};

/// A transaction as stored in the ledger.
///
/// `amount` is always the non-negative magnitude; direction is given by the
/// creditor/debitor roles and only turned into a sign when a view is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    /// Receiving party.
    pub creditor_id: AccountId,
    /// Paying party.
    pub debitor_id: AccountId,
    pub amount: Amount,
    pub concept: String,
    pub date_created: Tick,
    pub date_due: Tick,
    pub payed: bool,
    pub revoked: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Payed,
    Revoked,
}

impl TransactionRecord {
    pub fn status(&self) -> TransactionStatus {
        if self.revoked {
            TransactionStatus::Revoked
        } else if self.payed {
            TransactionStatus::Payed
        } else {
            TransactionStatus::Pending
        }
    }

    /// Live transactions count towards balances once payed and appear in history.
    pub fn is_live(&self) -> bool {
        !self.revoked
    }

    pub fn involves(&self, account_id: AccountId) -> bool {
        self.creditor_id == account_id || self.debitor_id == account_id
    }

    /// Signed contribution of this transaction to `account_id`'s balance.
    pub fn contribution(&self, account_id: AccountId) -> Amount {
        if !self.payed || self.revoked {
            return 0;
        }
        if self.creditor_id == account_id {
            self.amount
        } else if self.debitor_id == account_id {
            -self.amount
        } else {
            0
        }
    }
}

/// A transaction about to be inserted; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub creditor_id: AccountId,
    pub debitor_id: AccountId,
    pub amount: Amount,
    pub concept: String,
    pub date_created: Tick,
    pub date_due: Tick,
    pub payed: bool,
}

impl NewTransaction {
    pub fn into_record(self, id: TransactionId) -> TransactionRecord {
        TransactionRecord {
            id,
            creditor_id: self.creditor_id,
            debitor_id: self.debitor_id,
            amount: self.amount,
            concept: self.concept,
            date_created: self.date_created,
            date_due: self.date_due,
            payed: self.payed,
            revoked: false,
        }
    }
}
