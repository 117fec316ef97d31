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


//! Ledger engine.
//!
//! The [`Ledger`] validates and admits transfers, revokes pending ones and
//! assembles account views. It keeps no state of its own besides the cached
//! clock and a lock table: balances and histories are recomputed from the
//! store on every call.
//!
//! # Transfer admission
//!
//! Checks run in a fixed order and the first failure is reported:
//!
//! | # | Condition | Error |
//! |---|-----------|-------|
//! | 1 | `from == to` | [`LedgerError::SelfTransfer`] |
//! | 2 | `amount > balance(from)` | [`LedgerError::InsufficientFunds`] |
//! | 3 | `amount < 0` | [`LedgerError::NegativeAmount`] |
//! | 4 | `due < clock` | [`LedgerError::PastDueDate`] |
//! | 5 | `to` does not exist | [`LedgerError::RecipientNotFound`] |
//!
//! A transfer due exactly at the current tick is settled on admission; any
//! later due date leaves it pending until the settlement sweep.
//!
//! # Thread Safety
//!
//! Transfers debiting the same account are serialized by a per-account
//! [`Mutex`], so the balance check and the insert cannot interleave with
//! another transfer from that account. Transfers from different accounts run
//! concurrently. Revocation reads then writes without a lock; applying
//! `revoked` twice is harmless.
//!
//! The lock table keeps one entry per debitor id ever seen, unknown ids
//! included, and never evicts. It grows with the number of distinct debitors
//! over the lifetime of the [`Ledger`].

use crate::account::{AccountView, BookEntry, TransactionView};
use crate::base::{AccountId, Amount, Tick, TransactionId};
use crate::clock::{Clock, ClockSource};
use crate::error::{LedgerError, StoreError};
use crate::store::LedgerStore;
use crate::transaction::{NewTransaction, TransactionRecord};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Ledger engine over a [`LedgerStore`].
///
/// # Invariants
///
/// - Stored amounts are never negative; sign only appears in views.
/// - Only live, payed transactions contribute to a balance.
/// - A transaction leaves `Pending` at most once, to `Payed` or `Revoked`.
pub struct Ledger<S> {
    store: Arc<S>,
    clock: Clock,
    /// Serializes admission per debitor account.
    debitor_locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl<S: LedgerStore + 'static> Ledger<S> {
    /// Creates a ledger that reads its clock from the store.
    pub fn new(store: Arc<S>) -> Self {
        let source: Arc<dyn ClockSource> = store.clone();
        Self::with_clock(store, source)
    }
}

impl<S: LedgerStore> Ledger<S> {
    /// Creates a ledger with an explicit clock source.
    pub fn with_clock(store: Arc<S>, clock: Arc<dyn ClockSource>) -> Self {
        Self {
            store,
            clock: Clock::new(clock),
            debitor_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Current tick, freshly read from the clock source.
    pub fn today(&self) -> Result<Tick, LedgerError> {
        self.clock.current()
    }

    /// Loads an account with its derived balance and live history.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::AccountNotFound`] - No account with this id.
    /// - [`LedgerError::CounterpartyNotFound`] - A history entry references a missing account.
    /// - [`LedgerError::StoreUnavailable`] - The store failed.
    pub fn load(&self, account_id: AccountId) -> Result<AccountView, LedgerError> {
        let account = self
            .store
            .account(account_id)?
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let balance = self.balance(account_id)?;
        let transactions = self.transactions(account_id)?;

        Ok(AccountView {
            id: account.id,
            holder: account.holder,
            registration_date: account.registration_date,
            balance,
            transactions,
        })
    }

    /// Settled credits minus settled debits. An account without transactions,
    /// or an unknown id, has a balance of zero.
    ///
    /// A balance outside the `i64` range is reported as
    /// [`LedgerError::StoreUnavailable`], the same way SQLite reports an
    /// overflowing sum.
    pub fn balance(&self, account_id: AccountId) -> Result<Amount, LedgerError> {
        let credits = self.store.settled_credits(account_id)?.unwrap_or(0);
        let debits = self.store.settled_debits(account_id)?.unwrap_or(0);
        credits.checked_sub(debits).ok_or_else(|| {
            LedgerError::from(StoreError::new(format!(
                "integer overflow in balance of account {account_id}"
            )))
        })
    }

    /// Live transactions touching the account, newest first, projected from
    /// its side. Either every counterparty resolves or the call fails.
    pub fn transactions(&self, account_id: AccountId) -> Result<Vec<TransactionView>, LedgerError> {
        let records = self.store.live_transactions(account_id)?;
        let mut holders: HashMap<AccountId, String> = HashMap::new();
        let mut views = Vec::with_capacity(records.len());

        for tx in &records {
            let counterparty = if tx.creditor_id == account_id {
                tx.debitor_id
            } else {
                tx.creditor_id
            };

            let holder = match holders.entry(counterparty) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let account = self
                        .store
                        .account(counterparty)?
                        .ok_or(LedgerError::CounterpartyNotFound(counterparty))?;
                    entry.insert(account.holder)
                }
            };
            views.push(TransactionView::project(tx, account_id, holder));
        }

        Ok(views)
    }

    /// Display name of an account holder.
    pub fn holder(&self, account_id: AccountId) -> Result<String, LedgerError> {
        self.store
            .account(account_id)?
            .map(|account| account.holder)
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// Public roster of holders, ordered by id. System accounts are left out.
    pub fn book(&self) -> Result<Vec<BookEntry>, LedgerError> {
        Ok(self
            .store
            .accounts()?
            .into_iter()
            .filter(|account| !account.id.is_system())
            .map(BookEntry::from)
            .collect())
    }

    /// Any stored transaction, revoked ones included.
    pub fn transaction(&self, id: TransactionId) -> Result<TransactionRecord, LedgerError> {
        self.store
            .transaction(id)?
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// Admits a transfer of `amount` from `from` to `to`, due at `due`.
    ///
    /// See the [module documentation](self) for the order of checks.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SelfTransfer`]
    /// - [`LedgerError::InsufficientFunds`]
    /// - [`LedgerError::NegativeAmount`]
    /// - [`LedgerError::PastDueDate`]
    /// - [`LedgerError::RecipientNotFound`]
    /// - [`LedgerError::StoreUnavailable`] - Nothing was inserted.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
        due: Tick,
        concept: impl Into<String>,
    ) -> Result<TransactionId, LedgerError> {
        let concept = concept.into();
        self.admit(from, to, amount, due, concept)
            .inspect(|id| debug!(%id, %from, %to, amount, due, "transfer admitted"))
            .inspect_err(|err| log_rejection("transfer", err))
    }

    fn admit(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
        due: Tick,
        concept: String,
    ) -> Result<TransactionId, LedgerError> {
        if from == to {
            return Err(LedgerError::SelfTransfer);
        }

        // Held until the insert so a concurrent transfer cannot spend the same balance.
        let lock = self.debitor_lock(from);
        let _guard = lock.lock();

        let balance = self.balance(from)?;
        if amount > balance {
            return Err(LedgerError::InsufficientFunds {
                balance,
                requested: amount,
            });
        }

        if amount < 0 {
            return Err(LedgerError::NegativeAmount);
        }

        let clock = self.clock.current()?;
        if due < clock {
            return Err(LedgerError::PastDueDate { due, clock });
        }

        if self.store.account(to)?.is_none() {
            return Err(LedgerError::RecipientNotFound(to));
        }

        let id = self.store.insert_transaction(NewTransaction {
            creditor_id: to,
            debitor_id: from,
            amount,
            concept,
            date_created: clock,
            date_due: due,
            payed: due == clock,
        })?;

        Ok(id)
    }

    fn debitor_lock(&self, account_id: AccountId) -> Arc<Mutex<()>> {
        Arc::clone(self.debitor_locks.entry(account_id).or_default().value())
    }

    /// Revokes a pending transaction on behalf of `actor`.
    ///
    /// Allowed only if `actor` is the creditor or the debitor, the transaction
    /// is neither payed nor already revoked, and its due date is still ahead of
    /// the clock.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::TransactionNotFound`]
    /// - [`LedgerError::RevocationNotAllowed`] - The transaction is unchanged.
    /// - [`LedgerError::StoreUnavailable`]
    pub fn revoke(&self, actor: AccountId, transaction_id: TransactionId) -> Result<(), LedgerError> {
        self.revoke_pending(actor, transaction_id)
            .inspect(|_| debug!(id = %transaction_id, %actor, "transaction revoked"))
            .inspect_err(|err| log_rejection("revoke", err))
    }

    fn revoke_pending(
        &self,
        actor: AccountId,
        transaction_id: TransactionId,
    ) -> Result<(), LedgerError> {
        let tx = self.transaction(transaction_id)?;
        let clock = self.clock.current()?;

        let revocable =
            tx.involves(actor) && !tx.payed && !tx.revoked && tx.date_due > clock;
        if !revocable {
            return Err(LedgerError::RevocationNotAllowed(transaction_id));
        }

        self.store.set_revoked(transaction_id)?;
        Ok(())
    }
}

pub(crate) fn log_rejection(operation: &str, err: &LedgerError) {
    if err.is_recoverable() {
        warn!(operation, error = %err, "operation rejected");
    } else {
        error!(operation, error = %err, "operation failed");
    }
}

impl<S> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
