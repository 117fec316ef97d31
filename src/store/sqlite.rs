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


//! SQLite-backed ledger store.

use super::{AdminStore, LedgerStore};
use crate::account::AccountRecord;
use crate::base::{AccountId, Amount, Tick, TransactionId};
use crate::clock::ClockSource;
use crate::error::StoreError;
use crate::transaction::{NewTransaction, TransactionRecord};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use tracing::warn;

const TRANSACTION_COLUMNS: &str =
    "id, creditor, debitor, amount, concept, date_created, date_due, payed, revoked";

/// Ledger store over a single SQLite connection.
///
/// The connection is guarded by a mutex, so every statement runs to
/// completion before the next one starts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        if let Err(err) = conn.execute_batch("PRAGMA journal_mode=WAL;") {
            warn!(error = %err, "could not enable WAL, keeping the default journal mode");
        }
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(include_str!("../../migrations/001_ledger.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn sum(&self, sql: &str, account: AccountId) -> Result<Option<Amount>, StoreError> {
        let conn = self.conn.lock();
        let sum = conn.query_row(sql, params![account.0], |row| row.get::<_, Option<i64>>(0))?;
        Ok(sum)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<AccountRecord> {
    Ok(AccountRecord {
        id: AccountId(row.get(0)?),
        holder: row.get(1)?,
        registration_date: row.get(2)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<TransactionRecord> {
    Ok(TransactionRecord {
        id: TransactionId(row.get(0)?),
        creditor_id: AccountId(row.get(1)?),
        debitor_id: AccountId(row.get(2)?),
        amount: row.get(3)?,
        concept: row.get(4)?,
        date_created: row.get(5)?,
        date_due: row.get(6)?,
        payed: row.get(7)?,
        revoked: row.get(8)?,
    })
}

impl ClockSource for SqliteStore {
    fn read_tick(&self) -> Result<Tick, StoreError> {
        let conn = self.conn.lock();
        let tick = conn.query_row("SELECT clock FROM system WHERE id = 1", [], |row| row.get(0))?;
        Ok(tick)
    }
}

impl LedgerStore for SqliteStore {
    fn account(&self, id: AccountId) -> Result<Option<AccountRecord>, StoreError> {
        let conn = self.conn.lock();
        let account = conn
            .query_row(
                "SELECT id, holder, registration_date FROM accounts WHERE id = ?1",
                params![id.0],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    fn accounts(&self) -> Result<Vec<AccountRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT id, holder, registration_date FROM accounts ORDER BY id ASC")?;
        let accounts = stmt
            .query_map([], account_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    fn transaction(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError> {
        let conn = self.conn.lock();
        let tx = conn
            .query_row(
                &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
                params![id.0],
                transaction_from_row,
            )
            .optional()?;
        Ok(tx)
    }

    fn insert_transaction(&self, tx: NewTransaction) -> Result<TransactionId, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO transactions
             (creditor, debitor, amount, concept, date_created, date_due, payed, revoked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
            params![
                tx.creditor_id.0,
                tx.debitor_id.0,
                tx.amount,
                tx.concept,
                tx.date_created,
                tx.date_due,
                tx.payed,
            ],
        )?;
        let rowid = conn.last_insert_rowid();
        let id = u64::try_from(rowid)
            .map_err(|_| StoreError::new(format!("invalid transaction rowid {rowid}")))?;
        Ok(TransactionId(id))
    }

    fn set_revoked(&self, id: TransactionId) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE transactions SET revoked = 1 WHERE id = ?1",
            params![id.0],
        )?;
        Ok(())
    }

    fn settled_credits(&self, account: AccountId) -> Result<Option<Amount>, StoreError> {
        self.sum(
            "SELECT SUM(amount) FROM transactions WHERE creditor = ?1 AND payed = 1 AND revoked = 0",
            account,
        )
    }

    fn settled_debits(&self, account: AccountId) -> Result<Option<Amount>, StoreError> {
        self.sum(
            "SELECT SUM(amount) FROM transactions WHERE debitor = ?1 AND payed = 1 AND revoked = 0",
            account,
        )
    }

    fn live_transactions(&self, account: AccountId) -> Result<Vec<TransactionRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE (debitor = ?1 OR creditor = ?1) AND revoked = 0
             ORDER BY id DESC"
        ))?;
        let transactions = stmt
            .query_map(params![account.0], transaction_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(transactions)
    }
}

impl AdminStore for SqliteStore {
    fn create_account(
        &self,
        holder: &str,
        registration_date: Tick,
    ) -> Result<AccountId, StoreError> {
        let conn = self.conn.lock();
        let id: i64 = conn.query_row(
            "SELECT COALESCE(MAX(id), 0) + 1 FROM accounts WHERE id > 0",
            [],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO accounts (id, holder, registration_date) VALUES (?1, ?2, ?3)",
            params![id, holder, registration_date],
        )?;
        Ok(AccountId(id))
    }

    fn create_system_account(&self, id: AccountId, holder: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO accounts (id, holder, registration_date) VALUES (?1, ?2, 0)",
            params![id.0, holder],
        )?;
        Ok(inserted == 1)
    }

    fn advance_clock(&self, ticks: Tick) -> Result<Tick, StoreError> {
        let conn = self.conn.lock();
        let tick = conn.query_row(
            "UPDATE system SET clock = clock + ?1 WHERE id = 1 RETURNING clock",
            params![ticks],
            |row| row.get(0),
        )?;
        Ok(tick)
    }

    fn settle_due(&self, clock: Tick) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let settled = conn.execute(
            "UPDATE transactions SET payed = 1 WHERE payed = 0 AND revoked = 0 AND date_due <= ?1",
            params![clock],
        )?;
        Ok(settled)
    }
}
