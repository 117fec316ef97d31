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


//! Core identifier and scalar types for accounts, transactions and the clock.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical date of the ledger.
///
/// The whole system shares a single integer clock that is only ever advanced
/// by an administrative action.
pub type Tick = u64;

/// Monetary amount in whole units. No fractional money exists in the ledger.
pub type Amount = i64;

/// Unique identifier for an account.
///
/// Negative identifiers denote synthetic system accounts such as the bank of
/// record. They may take part in transactions but are hidden from the public
/// roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl AccountId {
    /// Returns `true` for synthetic accounts that are never allocated to a holder.
    pub fn is_system(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the bank of record, the source of all issued money.
pub const BANK_ACCOUNT_ID: AccountId = AccountId(-1);

/// Unique identifier for a transaction, assigned by the store on insert.
///
/// Identifiers are monotonic, so ordering by id is ordering by admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
