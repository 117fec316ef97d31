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


//! Property-based tests for the ledger engine.
//!
//! These tests verify invariants that should hold for any sequence of
//! transfers, revocations and clock movements.

use bank_ledger::{
    AccountId, Amount, BANK_ACCOUNT_ID, Ledger, LedgerError, MemoryStore, TransactionId,
};
use proptest::prelude::*;
use std::sync::Arc;

const HOLDERS: i64 = 3;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Transfer {
        from: i64,
        to: i64,
        amount: Amount,
        delay: u64,
    },
    Revoke {
        actor: i64,
        nth: usize,
    },
    Advance(u64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1..=HOLDERS, 1..=HOLDERS, -10i64..150, 0u64..4).prop_map(|(from, to, amount, delay)| {
            Op::Transfer { from, to, amount, delay }
        }),
        2 => (1..=HOLDERS, 0usize..32).prop_map(|(actor, nth)| Op::Revoke { actor, nth }),
        1 => (0u64..3).prop_map(Op::Advance),
    ]
}

/// Ledger with the bank and three holders, each funded with 100.
fn funded_ledger() -> (Ledger<MemoryStore>, Vec<TransactionId>) {
    let ledger = Ledger::new(Arc::new(MemoryStore::new()));
    ledger.open_system_account(BANK_ACCOUNT_ID, "The Bank").unwrap();
    let mut ids = Vec::new();
    for i in 0..HOLDERS {
        let id = ledger.open_account(&format!("Holder {i}")).unwrap();
        ids.push(ledger.issue(id, 100, "grant").unwrap());
    }
    (ledger, ids)
}

/// Applies `op`, recording admitted transaction ids.
fn apply(ledger: &Ledger<MemoryStore>, ids: &mut Vec<TransactionId>, op: &Op) {
    match *op {
        Op::Transfer {
            from,
            to,
            amount,
            delay,
        } => {
            let due = ledger.today().unwrap() + delay;
            if let Ok(id) = ledger.transfer(AccountId(from), AccountId(to), amount, due, "") {
                ids.push(id);
            }
        }
        Op::Revoke { actor, nth } => {
            if let Some(&id) = ids.get(nth % ids.len()) {
                let _ = ledger.revoke(AccountId(actor), id);
            }
        }
        Op::Advance(ticks) => {
            ledger.advance_clock(ticks).unwrap();
            ledger.settle_due().unwrap();
        }
    }
}

fn expected_balance(ledger: &Ledger<MemoryStore>, ids: &[TransactionId], account: AccountId) -> Amount {
    ids.iter()
        .map(|id| ledger.transaction(*id).unwrap().contribution(account))
        .sum()
}

// =============================================================================
// Balance Invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Balance equals payed, live credits minus payed, live debits.
    #[test]
    fn balance_matches_transaction_log(ops in prop::collection::vec(arb_op(), 0..40)) {
        let (ledger, mut ids) = funded_ledger();
        for op in &ops {
            apply(&ledger, &mut ids, op);
        }

        for account in (1..=HOLDERS).map(AccountId).chain([BANK_ACCOUNT_ID]) {
            prop_assert_eq!(
                ledger.balance(account).unwrap(),
                expected_balance(&ledger, &ids, account)
            );
        }
    }

    /// Money is only moved, never created: all balances sum to zero.
    #[test]
    fn balances_sum_to_zero(ops in prop::collection::vec(arb_op(), 0..40)) {
        let (ledger, mut ids) = funded_ledger();
        for op in &ops {
            apply(&ledger, &mut ids, op);
        }

        let total: Amount = (1..=HOLDERS)
            .map(AccountId)
            .chain([BANK_ACCOUNT_ID])
            .map(|account| ledger.balance(account).unwrap())
            .sum();
        prop_assert_eq!(total, 0);
    }

    /// Stored amounts stay non-negative and due dates never precede creation.
    #[test]
    fn stored_transactions_keep_invariants(ops in prop::collection::vec(arb_op(), 0..40)) {
        let (ledger, mut ids) = funded_ledger();
        for op in &ops {
            apply(&ledger, &mut ids, op);
        }

        for id in &ids {
            let tx = ledger.transaction(*id).unwrap();
            prop_assert!(tx.amount >= 0);
            prop_assert!(tx.date_due >= tx.date_created);
            prop_assert_ne!(tx.creditor_id, tx.debitor_id);
            prop_assert!(!(tx.payed && tx.revoked));
        }
    }

    /// Revoked transactions never show up in a history view.
    #[test]
    fn history_excludes_revoked(ops in prop::collection::vec(arb_op(), 0..40)) {
        let (ledger, mut ids) = funded_ledger();
        for op in &ops {
            apply(&ledger, &mut ids, op);
        }

        for account in (1..=HOLDERS).map(AccountId) {
            for view in ledger.transactions(account).unwrap() {
                prop_assert!(!ledger.transaction(view.id).unwrap().revoked);
            }
        }
    }
}

// =============================================================================
// Admission Invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Admission outcome follows the ordered checks exactly.
    #[test]
    fn transfer_outcome_follows_checks(
        from in 1..=HOLDERS,
        to in 0..=HOLDERS + 1,
        amount in -20i64..200,
        clock in 0u64..5,
        due in 0u64..8,
    ) {
        let (ledger, _) = funded_ledger();
        ledger.advance_clock(clock).unwrap();
        let result = ledger.transfer(AccountId(from), AccountId(to), amount, due, "");

        let expected = if from == to {
            Err(LedgerError::SelfTransfer)
        } else if amount > 100 {
            Err(LedgerError::InsufficientFunds { balance: 100, requested: amount })
        } else if amount < 0 {
            Err(LedgerError::NegativeAmount)
        } else if due < clock {
            Err(LedgerError::PastDueDate { due, clock })
        } else if !(1..=HOLDERS).contains(&to) {
            Err(LedgerError::RecipientNotFound(AccountId(to)))
        } else {
            Ok(())
        };

        match (result, expected) {
            (Ok(id), Ok(())) => {
                let tx = ledger.transaction(id).unwrap();
                prop_assert_eq!(tx.payed, due == clock);
                prop_assert_eq!(tx.date_created, clock);
            }
            (actual, expected) => prop_assert_eq!(actual.map(|_| ()), expected),
        }
    }

    /// Revocation succeeds iff the actor is a party, the transaction is
    /// unpayed and its due date is still ahead; failures change nothing.
    #[test]
    fn revocation_eligibility(
        actor in 1..=HOLDERS,
        delay in 0u64..4,
        elapsed in 0u64..5,
        sweep in any::<bool>(),
    ) {
        let (ledger, _) = funded_ledger();
        let id = ledger.transfer(AccountId(1), AccountId(2), 10, delay, "").unwrap();
        ledger.advance_clock(elapsed).unwrap();
        if sweep {
            ledger.settle_due().unwrap();
        }

        let before = ledger.transaction(id).unwrap();
        let eligible = (actor == 1 || actor == 2) && !before.payed && before.date_due > elapsed;
        let result = ledger.revoke(AccountId(actor), id);
        let after = ledger.transaction(id).unwrap();

        if eligible {
            prop_assert_eq!(result, Ok(()));
            prop_assert!(after.revoked);
        } else {
            prop_assert_eq!(result, Err(LedgerError::RevocationNotAllowed(id)));
            prop_assert_eq!(after, before);
        }
    }
}
