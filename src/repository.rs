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

//! Typed access to the transaction and user collections.
//!
//! Repositories turn raw documents into domain records. Batch reads decode
//! every document on its own and drop the ones that fail, so one corrupt
//! entry shrinks the result instead of failing it. Each drop is logged.

use crate::base::{TransactionId, UserId};
use crate::error::StoreError;
use crate::store::{DocumentStore, RawDocument};
use crate::transaction::{Transaction, fields};
use crate::user::User;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decodes every document, keeping the ones that decode.
fn decode_all<T, E, F>(docs: &[RawDocument], collection: &str, decode: F) -> Vec<T>
where
    F: Fn(&RawDocument) -> Result<T, E>,
    E: std::fmt::Display,
{
    docs.iter()
        .filter_map(|raw| match decode(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection, document = %raw.id, error = %e, "dropping malformed document");
                None
            }
        })
        .collect()
}

/// Ledger entries, stored one document per transaction.
#[derive(Debug)]
pub struct TransactionRepository<S> {
    store: Arc<S>,
    collection: String,
}

impl<S: DocumentStore> TransactionRepository<S> {
    pub fn new(store: Arc<S>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Writes a new entry and returns the id the store assigned.
    pub async fn add(&self, transaction: &Transaction) -> Result<TransactionId, StoreError> {
        let id = self
            .store
            .add(&self.collection, transaction.to_document())
            .await?;
        debug!(collection = %self.collection, %id, "transaction stored");
        Ok(TransactionId::new(id))
    }

    /// All decodable entries owned by `owner_id`, in store order.
    pub async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Transaction>, StoreError> {
        let docs = self
            .store
            .query_eq(
                &self.collection,
                fields::OWNER_ID,
                &Value::from(owner_id.as_str()),
            )
            .await?;
        Ok(decode_all(&docs, &self.collection, Transaction::from_document))
    }

    pub async fn delete_by_id(&self, id: &TransactionId) -> Result<(), StoreError> {
        if id.is_blank() {
            return Err(StoreError::MissingId);
        }
        self.store.delete(&self.collection, id.as_str()).await
    }

    /// Health check: takes the store client offline and back online.
    ///
    /// Any failure in either step fails the probe. A failed re-enable is
    /// tried once more so the client is not left offline; if that also
    /// fails, every later call sees [`StoreError::Unavailable`] until the
    /// network is enabled again.
    pub async fn probe_connectivity(&self) -> Result<(), StoreError> {
        self.store.disable_network().await?;
        if let Err(e) = self.store.enable_network().await {
            match self.store.enable_network().await {
                Ok(()) => warn!(error = %e, "network re-enabled on second attempt"),
                Err(retry) => warn!(error = %retry, "store client left offline"),
            }
            return Err(e);
        }
        Ok(())
    }
}

/// User profiles.
///
/// Reads hydrate [`User::id`] from the document metadata.
#[derive(Debug)]
pub struct UserRepository<S> {
    store: Arc<S>,
    collection: String,
}

impl<S: DocumentStore> UserRepository<S> {
    pub fn new(store: Arc<S>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn add(&self, user: &User) -> Result<UserId, StoreError> {
        let id = self.store.add(&self.collection, user.to_document()).await?;
        Ok(UserId::new(id))
    }

    /// First user with this email. No match, or an undecodable match, is `None`.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let docs = self
            .store
            .query_eq(&self.collection, "email", &Value::from(email))
            .await?;
        let first = docs.first().map(std::slice::from_ref).unwrap_or_default();
        Ok(decode_all(first, &self.collection, User::from_document).pop())
    }

    /// Whether any document carries this email, decodable or not.
    pub async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let docs = self
            .store
            .query_eq(&self.collection, "email", &Value::from(email))
            .await?;
        Ok(!docs.is_empty())
    }

    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        if id.is_blank() {
            return Ok(None);
        }
        let doc = self.store.get(&self.collection, id.as_str()).await?;
        Ok(doc.and_then(|raw| decode_all(&[raw], &self.collection, User::from_document).pop()))
    }

    pub async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let docs = self.store.list(&self.collection).await?;
        Ok(decode_all(&docs, &self.collection, User::from_document))
    }

    /// Writes the profile fields of `user` onto the document `id`.
    ///
    /// This is a field merge, not a replace. A blank id fails without
    /// contacting the store.
    pub async fn update_by_id(&self, id: &UserId, user: &User) -> Result<(), StoreError> {
        if id.is_blank() {
            return Err(StoreError::MissingId);
        }
        self.store
            .update(&self.collection, id.as_str(), user.to_document())
            .await
    }

    pub async fn delete_by_id(&self, id: &UserId) -> Result<(), StoreError> {
        if id.is_blank() {
            return Err(StoreError::MissingId);
        }
        self.store.delete(&self.collection, id.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Operation};
    use futures::executor::block_on;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn doc(value: Value) -> crate::store::Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn malformed_transactions_are_dropped_from_owner_query() {
        let store = Arc::new(MemoryStore::new());
        store.insert_raw("tx", doc(json!({"ownerId": "u1", "title": "ok", "amount": 10})));
        store.insert_raw("tx", doc(json!({"ownerId": "u1", "title": 42})));
        store.insert_raw("tx", doc(json!({"ownerId": "u1", "amount": "12,50"})));
        store.insert_raw("tx", doc(json!({"ownerId": "u2", "title": "other"})));

        let repo = TransactionRepository::new(Arc::clone(&store), "tx");
        let found = block_on(repo.find_by_owner(&UserId::from("u1"))).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "ok");
        assert_eq!(found[0].amount, dec!(10));
    }

    #[test]
    fn added_transaction_is_queryable_by_owner() {
        let store = Arc::new(MemoryStore::new());
        let repo = TransactionRepository::new(Arc::clone(&store), "tx");
        let mut tx = Transaction::debit("rent", dec!(900));
        tx.owner_id = UserId::from("u1");

        let id = block_on(repo.add(&tx)).unwrap();
        let found = block_on(repo.find_by_owner(&UserId::from("u1"))).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
    }

    #[test]
    fn probe_toggles_network_and_leaves_it_online() {
        let store = Arc::new(MemoryStore::new());
        let repo = TransactionRepository::new(Arc::clone(&store), "tx");
        block_on(repo.probe_connectivity()).unwrap();
        assert!(store.is_online());
        assert_eq!(store.calls(Operation::DisableNetwork), 1);
        assert_eq!(store.calls(Operation::EnableNetwork), 1);
    }

    #[test]
    fn failed_reenable_is_retried_so_store_comes_back_online() {
        let store = Arc::new(MemoryStore::new());
        store.fail_once(Operation::EnableNetwork, StoreError::Unavailable);
        let repo = TransactionRepository::new(Arc::clone(&store), "tx");

        assert_eq!(block_on(repo.probe_connectivity()), Err(StoreError::Unavailable));
        assert!(store.is_online());
        assert_eq!(store.calls(Operation::EnableNetwork), 2);
        assert!(block_on(repo.find_by_owner(&UserId::from("u1"))).is_ok());
    }

    #[test]
    fn user_lookups_hydrate_ids() {
        let store = Arc::new(MemoryStore::new());
        let repo = UserRepository::new(Arc::clone(&store), "users");
        let id = block_on(repo.add(&User::new("Ana", "", "ana@example.com", "secret1"))).unwrap();

        let by_email = block_on(repo.find_by_email("ana@example.com")).unwrap().unwrap();
        let by_id = block_on(repo.find_by_id(&id)).unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert_eq!(by_id, by_email);
        assert_eq!(block_on(repo.list_all()).unwrap(), vec![by_id]);
        assert!(block_on(repo.find_by_email("bob@example.com")).unwrap().is_none());
    }

    #[test]
    fn undecodable_user_still_counts_as_existing_email() {
        let store = Arc::new(MemoryStore::new());
        store.insert_raw("users", doc(json!({"name": 12, "email": "ana@example.com"})));
        let repo = UserRepository::new(Arc::clone(&store), "users");

        assert!(block_on(repo.find_by_email("ana@example.com")).unwrap().is_none());
        assert!(block_on(repo.email_exists("ana@example.com")).unwrap());
        assert!(!block_on(repo.email_exists("bob@example.com")).unwrap());
    }

    #[test]
    fn blank_ids_fail_without_store_call() {
        let store = Arc::new(MemoryStore::new());
        let repo = UserRepository::new(Arc::clone(&store), "users");
        let user = User::default();

        assert_eq!(
            block_on(repo.update_by_id(&UserId::default(), &user)),
            Err(StoreError::MissingId)
        );
        assert_eq!(
            block_on(repo.delete_by_id(&UserId::default())),
            Err(StoreError::MissingId)
        );
        assert_eq!(store.calls(Operation::Update), 0);
        assert_eq!(store.calls(Operation::Delete), 0);
    }

    #[test]
    fn delete_removes_user() {
        let store = Arc::new(MemoryStore::new());
        let repo = UserRepository::new(Arc::clone(&store), "users");
        let id = block_on(repo.add(&User::new("Ana", "", "ana@example.com", "secret1"))).unwrap();
        block_on(repo.delete_by_id(&id)).unwrap();
        assert!(block_on(repo.find_by_id(&id)).unwrap().is_none());
    }
}
