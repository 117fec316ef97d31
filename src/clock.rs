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


//! The shared logical clock.
//!
//! The authoritative tick lives outside the ledger core (in the store, or any
//! other [`ClockSource`]) and may be advanced by an administrative process
//! between operations. [`Clock::current`] therefore always re-reads it and
//! refreshes the cached copy before returning.

use crate::base::Tick;
use crate::error::{LedgerError, StoreError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Capability to read the authoritative clock tick.
pub trait ClockSource: Send + Sync {
    fn read_tick(&self) -> Result<Tick, StoreError>;
}

impl<T: ClockSource + ?Sized> ClockSource for Arc<T> {
    fn read_tick(&self) -> Result<Tick, StoreError> {
        (**self).read_tick()
    }
}

/// Cached view of a [`ClockSource`].
pub struct Clock {
    source: Arc<dyn ClockSource>,
    cached: AtomicU64,
}

impl Clock {
    pub fn new(source: Arc<dyn ClockSource>) -> Self {
        Self {
            source,
            cached: AtomicU64::new(0),
        }
    }

    /// Re-synchronizes with the source and returns the current tick.
    ///
    /// # Errors
    ///
    /// [`LedgerError::StoreUnavailable`] if the source cannot be read. Callers
    /// abort the operation in progress.
    pub fn current(&self) -> Result<Tick, LedgerError> {
        let tick = self.source.read_tick().inspect_err(|err| {
            tracing::error!(error = %err, "failed to read clock");
        })?;
        self.cached.store(tick, Ordering::Release);
        Ok(tick)
    }

    /// Last tick observed by [`Clock::current`], without touching the source.
    pub fn cached(&self) -> Tick {
        self.cached.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("cached", &self.cached())
            .finish_non_exhaustive()
    }
}

/// A clock that only moves when told to. Used for deterministic tests.
#[derive(Debug, Default)]
pub struct FixedClock {
    tick: AtomicU64,
}

impl FixedClock {
    pub fn new(tick: Tick) -> Self {
        Self {
            tick: AtomicU64::new(tick),
        }
    }

    pub fn set(&self, tick: Tick) {
        self.tick.store(tick, Ordering::Release);
    }
}

impl ClockSource for FixedClock {
    fn read_tick(&self) -> Result<Tick, StoreError> {
        Ok(self.tick.load(Ordering::Acquire))
    }
}
