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

//! Observable state slots.
//!
//! An [`Observable`] holds one value and fans every change out to any number
//! of subscribers over unbounded [`crossbeam`] channels. Writes are
//! last-write-wins: whichever `set` runs last is the value readers see.

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};

/// A value that publishes every change to its subscribers.
#[derive(Debug)]
pub struct Observable<T> {
    value: RwLock<T>,
    subscribers: Mutex<Vec<Sender<T>>>,
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Replaces the value and publishes it.
    pub fn set(&self, value: T) {
        // Hold the write lock while publishing so every subscriber sees
        // changes in the same order as `get`.
        let mut current = self.value.write();
        *current = value.clone();
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(value.clone()).is_ok());
    }

    /// Returns a receiver that yields the current value, then every change.
    ///
    /// The channel is unbounded and queues a full clone of every published
    /// value, so a receiver that is kept but never read grows without limit.
    /// Drain it with `try_iter().last()` to keep only the newest value, or
    /// drop it: a dropped receiver is unsubscribed on the next publish.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = channel::unbounded();
        let current = self.value.read();
        // Cannot fail: `rx` is alive.
        let _ = tx.send(current.clone());
        self.subscribers.lock().push(tx);
        rx
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Raises a busy flag for its lifetime.
///
/// Dropping the guard lowers the flag on every exit path, early returns and
/// `?` included.
pub(crate) struct BusyGuard<'a> {
    flag: &'a Observable<bool>,
}

impl<'a> BusyGuard<'a> {
    pub(crate) fn raise(flag: &'a Observable<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
