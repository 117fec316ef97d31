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


//! Account view integration tests.

use bank_ledger::{
    AccountId, AdminStore, BANK_ACCOUNT_ID, BookEntry, Direction, Ledger, LedgerError,
    LedgerStore, MemoryStore, NewTransaction, TransactionStatus,
};
use std::sync::Arc;

fn ledger() -> Ledger<MemoryStore> {
    let ledger = Ledger::new(Arc::new(MemoryStore::new()));
    ledger.open_system_account(BANK_ACCOUNT_ID, "The Bank").unwrap();
    ledger
}

#[test]
fn load_unknown_account_fails() {
    let ledger = ledger();
    assert_eq!(
        ledger.load(AccountId(12)),
        Err(LedgerError::AccountNotFound(AccountId(12)))
    );
}

#[test]
fn load_returns_identity_and_derived_state() {
    let ledger = ledger();
    ledger.advance_clock(2).unwrap();
    let alice = ledger.open_account("Alice").unwrap();
    let bob = ledger.open_account("Bob").unwrap();
    ledger.issue(alice, 50, "welcome").unwrap();
    ledger.transfer(alice, bob, 20, 2, "books").unwrap();

    let view = ledger.load(alice).unwrap();
    assert_eq!(view.id, alice);
    assert_eq!(view.holder, "Alice");
    assert_eq!(view.registration_date, 2);
    assert_eq!(view.balance, 30);
    assert_eq!(view.transactions.len(), 2);
}

#[test]
fn history_is_newest_first_with_signed_amounts() {
    let ledger = ledger();
    let alice = ledger.open_account("Alice").unwrap();
    let bob = ledger.open_account("Bob").unwrap();
    ledger.issue(alice, 50, "welcome").unwrap();
    ledger.transfer(alice, bob, 20, 0, "books").unwrap();
    ledger.transfer(alice, bob, 5, 3, "coffee").unwrap();

    let history = ledger.load(alice).unwrap().transactions;
    let concepts: Vec<_> = history.iter().map(|tx| tx.concept.as_str()).collect();
    assert_eq!(concepts, vec!["coffee", "books", "welcome"]);

    assert_eq!(history[0].amount, -5);
    assert_eq!(history[0].direction, Direction::Outgoing);
    assert_eq!(history[0].status, TransactionStatus::Pending);
    assert_eq!(history[0].to_from(), "--> Bob [0002]");
    assert_eq!(history[2].amount, 50);
    assert_eq!(history[2].direction, Direction::Incoming);
    assert_eq!(history[2].to_from(), "<-- The Bank");

    let bob_history = ledger.load(bob).unwrap().transactions;
    assert_eq!(bob_history[0].amount, 5);
    assert_eq!(bob_history[0].to_from(), "<-- Alice [0001]");
}

#[test]
fn views_never_store_negative_amounts() {
    let ledger = ledger();
    let alice = ledger.open_account("Alice").unwrap();
    let bob = ledger.open_account("Bob").unwrap();
    ledger.issue(alice, 50, "").unwrap();
    let id = ledger.transfer(alice, bob, 20, 0, "").unwrap();

    let _ = ledger.load(alice).unwrap();
    let _ = ledger.load(bob).unwrap();
    assert_eq!(ledger.transaction(id).unwrap().amount, 20);
}

#[test]
fn missing_counterparty_fails_whole_view() {
    let store = Arc::new(MemoryStore::new());
    let alice = store.create_account("Alice", 0).unwrap();
    // A sentinel id without an account row cannot be labelled.
    store
        .insert_transaction(NewTransaction {
            creditor_id: alice,
            debitor_id: AccountId(-7),
            amount: 10,
            concept: String::new(),
            date_created: 0,
            date_due: 0,
            payed: true,
        })
        .unwrap();
    let ledger = Ledger::new(store);

    assert_eq!(
        ledger.load(alice),
        Err(LedgerError::CounterpartyNotFound(AccountId(-7)))
    );
    assert_eq!(ledger.balance(alice).unwrap(), 10);
}

#[test]
fn book_lists_holders_without_system_accounts() {
    let ledger = ledger();
    ledger
        .open_system_account(AccountId(-2), "The Treasury")
        .unwrap();
    ledger.open_account("Alice").unwrap();
    ledger.open_account("Bob").unwrap();

    assert_eq!(
        ledger.book().unwrap(),
        vec![
            BookEntry {
                id: AccountId(1),
                holder: "Alice".to_string()
            },
            BookEntry {
                id: AccountId(2),
                holder: "Bob".to_string()
            },
        ]
    );
    assert_eq!(ledger.store().accounts().unwrap().len(), 4);
}

#[test]
fn holder_lookup() {
    let ledger = ledger();
    let alice = ledger.open_account("Alice").unwrap();
    assert_eq!(ledger.holder(alice).unwrap(), "Alice");
    assert_eq!(ledger.holder(BANK_ACCOUNT_ID).unwrap(), "The Bank");
    assert_eq!(
        ledger.holder(AccountId(9)),
        Err(LedgerError::AccountNotFound(AccountId(9)))
    );
}

#[test]
fn view_serializes_for_display() {
    let ledger = ledger();
    let alice = ledger.open_account("Alice").unwrap();
    ledger.issue(alice, 15, "welcome").unwrap();

    let json = serde_json::to_value(ledger.load(alice).unwrap()).unwrap();
    assert_eq!(json["id"], 1);
    assert_eq!(json["holder"], "Alice");
    assert_eq!(json["balance"], 15);
    assert_eq!(json["transactions"][0]["direction"], "incoming");
    assert_eq!(json["transactions"][0]["status"], "payed");
    assert_eq!(json["transactions"][0]["counterparty"], "The Bank");
    assert_eq!(json["transactions"][0]["counterparty_id"], -1);
}
