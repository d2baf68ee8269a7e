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

//! The logged-in user's ledger.
//!
//! [`LedgerSession`] keeps the owner's transactions and their
//! [`LedgerTotals`] on observable slots and republishes the totals after
//! every change to the list.
//!
//! # Operations
//!
//! - **Load**: queries the owner's entries, unless the same owner was loaded
//!   before and the list is non-empty (cached read). `force` bypasses the cache.
//! - **Add**: probes connectivity, writes the entry, then force-reloads.
//!   There is no optimistic insert.
//! - **Delete**: deletes by id, removes the entry locally at once, then
//!   force-reloads. The reload is the authoritative result.
//!
//! Nothing is retried. The busy flag is lowered on every exit path.

use crate::base::{TransactionId, UserId};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::ledger::{self, DailyTotals, LedgerTotals};
use crate::observable::{BusyGuard, Observable};
use crate::repository::TransactionRepository;
use crate::store::DocumentStore;
use crate::transaction::Transaction;
use chrono::NaiveDate;
use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct CacheState {
    /// Owner whose load completed last.
    last_loaded_owner: Option<UserId>,
    has_loaded_once: bool,
}

/// Holds one owner's ledger at a time.
///
/// Slots are last-write-wins: two overlapping loads for different owners
/// leave whichever resolved last on the slots.
pub struct LedgerSession<S> {
    transactions: TransactionRepository<S>,
    entries: Observable<Vec<Transaction>>,
    totals: Observable<LedgerTotals>,
    error: Observable<Option<SessionError>>,
    busy: Observable<bool>,
    cache: Mutex<CacheState>,
}

impl<S: DocumentStore> LedgerSession<S> {
    pub fn new(store: Arc<S>, config: &SessionConfig) -> Self {
        Self {
            transactions: TransactionRepository::new(store, config.transactions_collection.clone()),
            entries: Observable::new(Vec::new()),
            totals: Observable::new(LedgerTotals::default()),
            error: Observable::new(None),
            busy: Observable::new(false),
            cache: Mutex::new(CacheState::default()),
        }
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.entries.get()
    }

    pub fn totals(&self) -> LedgerTotals {
        self.totals.get()
    }

    pub fn error(&self) -> Option<SessionError> {
        self.error.get()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    pub fn last_loaded_owner(&self) -> Option<UserId> {
        self.cache.lock().last_loaded_owner.clone()
    }

    pub fn has_loaded_once(&self) -> bool {
        self.cache.lock().has_loaded_once
    }

    pub fn subscribe_transactions(&self) -> Receiver<Vec<Transaction>> {
        self.entries.subscribe()
    }

    pub fn subscribe_totals(&self) -> Receiver<LedgerTotals> {
        self.totals.subscribe()
    }

    pub fn subscribe_error(&self) -> Receiver<Option<SessionError>> {
        self.error.subscribe()
    }

    pub fn subscribe_busy(&self) -> Receiver<bool> {
        self.busy.subscribe()
    }

    /// The first `n` entries, as shown on the home screen.
    pub fn recent(&self, n: usize) -> Vec<Transaction> {
        ledger::recent(&self.entries.get(), n).to_vec()
    }

    /// Per-day credits and debits for the `days` days ending at `last_day`.
    pub fn daily_totals(&self, last_day: NaiveDate, days: u32) -> Vec<DailyTotals> {
        ledger::daily_totals(&self.entries.get(), last_day, days)
    }

    /// Loads `owner_id`'s entries.
    ///
    /// Returns without a store call when `force` is false, `owner_id` was
    /// the last owner loaded, and the current list is non-empty. An empty
    /// ledger is therefore always re-queried.
    ///
    /// # Errors
    ///
    /// [`SessionError::Remote`] if the query fails. The previous list and
    /// totals are kept.
    pub async fn load(&self, owner_id: &UserId, force: bool) -> Result<(), SessionError> {
        if !force && self.is_cached(owner_id) {
            debug!(owner = %owner_id, "ledger served from cache");
            return Ok(());
        }

        let _busy = BusyGuard::raise(&self.busy);
        self.error.set(None);
        self.reload(owner_id).await
    }

    /// Persists a new entry for `owner_id`, then reloads the ledger.
    ///
    /// # Errors
    ///
    /// - [`SessionError::MissingOwner`] - blank owner id.
    /// - [`SessionError::InvalidTransaction`] - blank title or non-positive amount.
    /// - [`SessionError::Connectivity`] - the probe failed; nothing was written.
    /// - [`SessionError::Remote`] - the write or the reload failed.
    pub async fn add(&self, transaction: Transaction, owner_id: &UserId) -> Result<(), SessionError> {
        if owner_id.is_blank() {
            return self.fail(SessionError::MissingOwner);
        }
        if transaction.title.trim().is_empty() || transaction.amount <= Decimal::ZERO {
            return self.fail(SessionError::InvalidTransaction);
        }

        let _busy = BusyGuard::raise(&self.busy);
        self.error.set(None);

        if let Err(e) = self.transactions.probe_connectivity().await {
            warn!(error = %e, "connectivity probe failed");
            return self.fail(SessionError::Connectivity);
        }

        let owned = Transaction {
            owner_id: owner_id.clone(),
            ..transaction
        };
        match self.transactions.add(&owned).await {
            Ok(id) => {
                info!(owner = %owner_id, transaction = %id, kind = %owned.kind, "transaction added");
                self.reload(owner_id).await
            }
            Err(e) => self.fail(SessionError::remote("Falha ao salvar transação", e)),
        }
    }

    /// Deletes an entry, drops it locally, then reloads the ledger.
    ///
    /// # Errors
    ///
    /// [`SessionError::Remote`] if the delete fails (the list is unchanged)
    /// or if the reload fails (the local removal stays).
    pub async fn delete(&self, transaction_id: &TransactionId, owner_id: &UserId) -> Result<(), SessionError> {
        let _busy = BusyGuard::raise(&self.busy);
        self.error.set(None);

        if let Err(e) = self.transactions.delete_by_id(transaction_id).await {
            return self.fail(SessionError::remote("Erro ao excluir transação", e));
        }
        info!(owner = %owner_id, transaction = %transaction_id, "transaction deleted");

        let remaining: Vec<Transaction> = self
            .entries
            .get()
            .into_iter()
            .filter(|tx| &tx.id != transaction_id)
            .collect();
        self.publish(remaining);

        self.reload(owner_id).await
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }

    /// Empties the ledger and forgets the cached owner, e.g. on logout.
    pub fn reset(&self) {
        *self.cache.lock() = CacheState::default();
        self.publish(Vec::new());
        self.error.set(None);
    }

    fn is_cached(&self, owner_id: &UserId) -> bool {
        let cache = self.cache.lock();
        cache.has_loaded_once
            && cache.last_loaded_owner.as_ref() == Some(owner_id)
            && !self.entries.get().is_empty()
    }

    /// Queries the store and replaces the list. Leaves the busy flag alone.
    async fn reload(&self, owner_id: &UserId) -> Result<(), SessionError> {
        match self.transactions.find_by_owner(owner_id).await {
            Ok(entries) => {
                debug!(owner = %owner_id, count = entries.len(), "ledger loaded");
                self.publish(entries);
                let mut cache = self.cache.lock();
                cache.last_loaded_owner = Some(owner_id.clone());
                cache.has_loaded_once = true;
                Ok(())
            }
            Err(e) => self.fail(SessionError::remote("Erro ao carregar transações", e)),
        }
    }

    /// Replaces the list and republishes totals computed from it.
    fn publish(&self, entries: Vec<Transaction>) {
        let totals = LedgerTotals::from_transactions(&entries);
        self.entries.set(entries);
        self.totals.set(totals);
    }

    fn fail(&self, error: SessionError) -> Result<(), SessionError> {
        self.error.set(Some(error.clone()));
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Operation};
    use futures::executor::block_on;
    use rust_decimal_macros::dec;

    fn session() -> (Arc<MemoryStore>, LedgerSession<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let session = LedgerSession::new(Arc::clone(&store), &SessionConfig::default());
        (store, session)
    }

    #[test]
    fn empty_ledger_is_never_served_from_cache() {
        let (store, session) = session();
        let owner = UserId::from("u1");
        block_on(session.load(&owner, false)).unwrap();
        block_on(session.load(&owner, false)).unwrap();
        assert_eq!(store.calls(Operation::Query), 2);
        assert!(session.has_loaded_once());
    }

    #[test]
    fn reset_forgets_cached_owner() {
        let (store, session) = session();
        let owner = UserId::from("u1");
        block_on(session.add(Transaction::credit("salary", dec!(10)), &owner)).unwrap();
        session.reset();

        assert!(session.transactions().is_empty());
        assert_eq!(session.totals(), LedgerTotals::default());
        assert_eq!(session.last_loaded_owner(), None);

        block_on(session.load(&owner, false)).unwrap();
        assert_eq!(store.calls(Operation::Query), 2);
        assert_eq!(session.transactions().len(), 1);
    }

    #[test]
    fn blank_owner_is_rejected_before_probe() {
        let (store, session) = session();
        let result = block_on(session.add(Transaction::credit("x", dec!(1)), &UserId::default()));
        assert_eq!(result, Err(SessionError::MissingOwner));
        assert_eq!(store.calls(Operation::DisableNetwork), 0);
    }
}
