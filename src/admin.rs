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


//! Administrative operations.
//!
//! These stand in for the bank's back office: opening accounts, issuing money
//! from the bank of record, advancing the shared clock and sweeping due
//! transfers into settlement. The transfer and revocation paths never call
//! them.

use crate::base::{AccountId, Amount, BANK_ACCOUNT_ID, Tick, TransactionId};
use crate::engine::{Ledger, log_rejection};
use crate::error::LedgerError;
use crate::store::AdminStore;
use crate::transaction::NewTransaction;
use tracing::info;

impl<S: AdminStore> Ledger<S> {
    /// Opens a holder account registered at the current tick.
    pub fn open_account(&self, holder: &str) -> Result<AccountId, LedgerError> {
        let today = self.today()?;
        let id = self.store().create_account(holder, today)?;
        info!(%id, holder, registration_date = today, "account opened");
        Ok(id)
    }

    /// Creates a synthetic account such as the bank of record. Returns `false`
    /// if it already existed.
    pub fn open_system_account(&self, id: AccountId, holder: &str) -> Result<bool, LedgerError> {
        if !id.is_system() {
            let err = LedgerError::InvalidSystemAccount(id);
            log_rejection("open_system_account", &err);
            return Err(err);
        }
        let created = self.store().create_system_account(id, holder)?;
        if created {
            info!(%id, holder, "system account opened");
        }
        Ok(created)
    }

    /// Pays `amount` from the bank of record into `to`, settled immediately.
    ///
    /// The bank has no balance of its own, so no funds check applies.
    pub fn issue(
        &self,
        to: AccountId,
        amount: Amount,
        concept: impl Into<String>,
    ) -> Result<TransactionId, LedgerError> {
        let concept = concept.into();
        self.issue_from_bank(to, amount, concept)
            .inspect(|id| info!(%id, %to, amount, "money issued"))
            .inspect_err(|err| log_rejection("issue", err))
    }

    fn issue_from_bank(
        &self,
        to: AccountId,
        amount: Amount,
        concept: String,
    ) -> Result<TransactionId, LedgerError> {
        if to == BANK_ACCOUNT_ID {
            return Err(LedgerError::SelfTransfer);
        }
        if amount < 0 {
            return Err(LedgerError::NegativeAmount);
        }
        if self.store().account(BANK_ACCOUNT_ID)?.is_none() {
            return Err(LedgerError::AccountNotFound(BANK_ACCOUNT_ID));
        }
        if self.store().account(to)?.is_none() {
            return Err(LedgerError::RecipientNotFound(to));
        }

        let today = self.today()?;
        let id = self.store().insert_transaction(NewTransaction {
            creditor_id: to,
            debitor_id: BANK_ACCOUNT_ID,
            amount,
            concept,
            date_created: today,
            date_due: today,
            payed: true,
        })?;
        Ok(id)
    }

    /// Advances the store's clock by `ticks` and resynchronizes the ledger.
    pub fn advance_clock(&self, ticks: Tick) -> Result<Tick, LedgerError> {
        let tick = self.store().advance_clock(ticks)?;
        self.today()?;
        info!(tick, "clock advanced");
        Ok(tick)
    }

    /// Settles every live pending transaction whose due date has been reached.
    pub fn settle_due(&self) -> Result<usize, LedgerError> {
        let today = self.today()?;
        let settled = self.store().settle_due(today)?;
        info!(tick = today, settled, "settlement sweep finished");
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use crate::base::{AccountId, BANK_ACCOUNT_ID};
    use crate::error::LedgerError;
    use crate::store::MemoryStore;
    use crate::Ledger;
    use std::sync::Arc;

    fn ledger() -> Ledger<MemoryStore> {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        ledger.open_system_account(BANK_ACCOUNT_ID, "The Bank").unwrap();
        ledger
    }

    #[test]
    fn open_account_registers_at_current_tick() {
        let ledger = ledger();
        ledger.advance_clock(4).unwrap();
        let id = ledger.open_account("Alice").unwrap();
        let view = ledger.load(id).unwrap();
        assert_eq!(view.registration_date, 4);
        assert_eq!(view.balance, 0);
    }

    #[test]
    fn system_accounts_need_negative_ids() {
        let ledger = ledger();
        assert_eq!(
            ledger.open_system_account(AccountId(3), "Fake Bank"),
            Err(LedgerError::InvalidSystemAccount(AccountId(3)))
        );
        assert_eq!(ledger.open_system_account(BANK_ACCOUNT_ID, "The Bank"), Ok(false));
    }

    #[test]
    fn issue_credits_settled_money() {
        let ledger = ledger();
        let alice = ledger.open_account("Alice").unwrap();
        let id = ledger.issue(alice, 100, "opening grant").unwrap();
        assert!(ledger.transaction(id).unwrap().payed);
        assert_eq!(ledger.balance(alice).unwrap(), 100);
        assert_eq!(ledger.balance(BANK_ACCOUNT_ID).unwrap(), -100);
    }

    #[test]
    fn issue_validates_input() {
        let ledger = ledger();
        let alice = ledger.open_account("Alice").unwrap();
        assert_eq!(ledger.issue(alice, -1, ""), Err(LedgerError::NegativeAmount));
        assert_eq!(
            ledger.issue(AccountId(42), 1, ""),
            Err(LedgerError::RecipientNotFound(AccountId(42)))
        );
        assert_eq!(ledger.issue(BANK_ACCOUNT_ID, 1, ""), Err(LedgerError::SelfTransfer));
    }

    #[test]
    fn issue_requires_bank_account() {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        let alice = ledger.open_account("Alice").unwrap();
        assert_eq!(
            ledger.issue(alice, 1, ""),
            Err(LedgerError::AccountNotFound(BANK_ACCOUNT_ID))
        );
    }

    #[test]
    fn advance_clock_resynchronizes_cache() {
        let ledger = ledger();
        assert_eq!(ledger.advance_clock(2).unwrap(), 2);
        assert_eq!(ledger.clock().cached(), 2);
    }
}
