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


//! Error types for ledger operations.
//!
//! Business-rule failures are expected and recoverable: they carry a
//! user-facing meaning and are surfaced verbatim, optionally localized via
//! [`LedgerError::user_message`]. Store failures abort the operation in
//! progress without any partial mutation.

use crate::base::{AccountId, Amount, Tick, TransactionId};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Failure of the underlying ledger store (transport or durability).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No account row matches the requested id
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// A transaction references an account that no longer resolves
    #[error("counterparty account {0} not found")]
    CounterpartyNotFound(AccountId),

    /// No transaction row matches the requested id
    #[error("transaction {0} not found")]
    TransactionNotFound(TransactionId),

    /// Transfer recipient does not exist
    #[error("recipient account {0} not found")]
    RecipientNotFound(AccountId),

    /// Creditor and debitor are the same account
    #[error("cannot transfer to the same account")]
    SelfTransfer,

    /// Amount exceeds the debitor's settled balance
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Amount, requested: Amount },

    /// Amount is below zero
    #[error("cannot transfer a negative amount")]
    NegativeAmount,

    /// Due date lies before the current clock tick
    #[error("cannot schedule a transfer in the past (due {due}, clock {clock})")]
    PastDueDate { due: Tick, clock: Tick },

    /// System accounts must use a negative id
    #[error("account id {0} is not a system account id")]
    InvalidSystemAccount(AccountId),

    /// Actor is not a party, or the transaction is settled, revoked or due
    #[error("transaction {0} cannot be revoked")]
    RevocationNotAllowed(TransactionId),

    /// The store could not serve the request
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Coarse classification of [`LedgerError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    InsufficientFunds,
    Unauthorized,
    StoreUnavailable,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound(_)
            | Self::CounterpartyNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::RecipientNotFound(_) => ErrorKind::NotFound,
            Self::SelfTransfer
            | Self::NegativeAmount
            | Self::PastDueDate { .. }
            | Self::InvalidSystemAccount(_) => ErrorKind::Validation,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::RevocationNotAllowed(_) => ErrorKind::Unauthorized,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }

    /// Everything except a store failure can be shown to the user and retried
    /// with different input.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::StoreUnavailable
    }

    /// Message suitable for display to the account holder.
    pub fn user_message(&self, lang: Lang) -> &'static str {
        match (lang, self) {
            (Lang::English, Self::AccountNotFound(_)) => "Account not found (you must register)",
            (Lang::Spanish, Self::AccountNotFound(_)) => {
                "Cuenta no encontrada (debe darse de alta)"
            }
            (Lang::English, Self::CounterpartyNotFound(_)) => {
                "One of the accounts in your history no longer exists. Please contact the Bank."
            }
            (Lang::Spanish, Self::CounterpartyNotFound(_)) => {
                "Una de las cuentas de su historial ya no existe. Contacte con el Banco."
            }
            (Lang::English, Self::TransactionNotFound(_)) => "Incorrect transaction identifier",
            (Lang::Spanish, Self::TransactionNotFound(_)) => {
                "Identificador de transacción erróneo"
            }
            (Lang::English, Self::RecipientNotFound(_)) => {
                "The account you are trying to transfer to does not exist"
            }
            (Lang::Spanish, Self::RecipientNotFound(_)) => {
                "La cuenta a la que está intentando ordenar la transferencia no existe"
            }
            (Lang::English, Self::SelfTransfer) => {
                "You cannot transfer money to your own account"
            }
            (Lang::Spanish, Self::SelfTransfer) => {
                "No se puede transferir dinero a su misma cuenta"
            }
            (Lang::English, Self::InsufficientFunds { .. }) => "You do not have sufficient funds",
            (Lang::Spanish, Self::InsufficientFunds { .. }) => {
                "No dispone de los fondos suficientes"
            }
            (Lang::English, Self::NegativeAmount) => {
                "It is not possible to transfer a negative amount"
            }
            (Lang::Spanish, Self::NegativeAmount) => {
                "No es posible transferir un importe negativo"
            }
            (Lang::English, Self::PastDueDate { .. }) => "Time travel is not possible...",
            (Lang::Spanish, Self::PastDueDate { .. }) => "No es posible viajar en el tiempo...",
            (Lang::English, Self::InvalidSystemAccount(_)) => {
                "System accounts must have a negative account number"
            }
            (Lang::Spanish, Self::InvalidSystemAccount(_)) => {
                "Las cuentas del sistema deben tener un número de cuenta negativo"
            }
            (Lang::English, Self::RevocationNotAllowed(_)) => {
                "The transaction does not meet the requirements to be revoked by you. \
                 Please contact the Bank to resolve the issue."
            }
            (Lang::Spanish, Self::RevocationNotAllowed(_)) => {
                "La transacción no cumple los requerimientos para ser revocada por usted. \
                 Contacte con el Banco para resolver el problema."
            }
            (Lang::English, Self::StoreUnavailable(_)) => {
                "The bank is temporarily unavailable. Please try again later."
            }
            (Lang::Spanish, Self::StoreUnavailable(_)) => {
                "El banco no está disponible temporalmente. Inténtelo más tarde."
            }
        }
    }
}

/// Language used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    English,
    Spanish,
}

impl Lang {
    pub fn code(&self) -> &'static str {
        match self {
            Lang::English => "en",
            Lang::Spanish => "es",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Lang::English),
            "es" => Ok(Lang::Spanish),
            other => Err(format!("unsupported language '{other}' (expected en or es)")),
        }
    }
}
