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

//! In-process document store.
//!
//! Collections are [`DashMap`]s keyed by document id. Every document carries
//! a global sequence number so reads can be returned in insertion order
//! without a separate ordered log.
//!
//! Besides being a usable store, [`MemoryStore`] records how often each
//! [`Operation`] was invoked and can be told to fail specific operations,
//! which is how the sessions' failure paths are exercised.

use super::{Document, DocumentStore, Operation, RawDocument};
use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct StoredDocument {
    seq: u64,
    fields: Document,
}

/// Thread-safe in-memory [`DocumentStore`].
#[derive(Debug)]
pub struct MemoryStore {
    /// Collection name -> (document id -> document).
    collections: DashMap<String, DashMap<String, StoredDocument>>,
    /// Source of both insertion order and generated ids.
    next_seq: AtomicU64,
    online: AtomicBool,
    /// Injected failures, returned on every call until recovered.
    failures: DashMap<Operation, StoreError>,
    /// Injected failures consumed by the next call.
    one_shot: DashMap<Operation, StoreError>,
    calls: DashMap<Operation, usize>,
}

impl MemoryStore {
    /// Creates an empty, online store.
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            next_seq: AtomicU64::new(1),
            online: AtomicBool::new(true),
            failures: DashMap::new(),
            one_shot: DashMap::new(),
            calls: DashMap::new(),
        }
    }

    /// Makes every subsequent `operation` fail with `error`.
    pub fn fail_on(&self, operation: Operation, error: StoreError) {
        self.failures.insert(operation, error);
    }

    /// Makes only the next `operation` fail with `error`.
    pub fn fail_once(&self, operation: Operation, error: StoreError) {
        self.one_shot.insert(operation, error);
    }

    /// Removes an injected failure.
    pub fn recover(&self, operation: Operation) {
        self.failures.remove(&operation);
    }

    /// Number of times `operation` was invoked, failed calls included.
    pub fn calls(&self, operation: Operation) -> usize {
        self.calls.get(&operation).map(|count| *count).unwrap_or(0)
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Inserts a document bypassing the network, failure injection and call
    /// accounting. Used to seed fixtures, including malformed ones.
    pub fn insert_raw(&self, collection: &str, fields: Document) -> String {
        self.insert(collection, fields)
    }

    /// Reads a document body bypassing the network and call accounting.
    pub fn document(&self, collection: &str, id: &str) -> Option<Document> {
        let documents = self.collections.get(collection)?;
        documents.get(id).map(|doc| doc.fields.clone())
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|documents| documents.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn insert(&self, collection: &str, fields: Document) -> String {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = format!("doc{seq:06}");
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), StoredDocument { seq, fields });
        id
    }

    /// Accounts for a call and applies injected failures and network state.
    fn begin(&self, operation: Operation) -> Result<(), StoreError> {
        *self.calls.entry(operation).or_insert(0) += 1;

        if let Some((_, error)) = self.one_shot.remove(&operation) {
            return Err(error);
        }
        if let Some(error) = self.failures.get(&operation) {
            return Err(error.clone());
        }

        let toggles_network = matches!(
            operation,
            Operation::DisableNetwork | Operation::EnableNetwork
        );
        if !toggles_network && !self.is_online() {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }

    fn collect<F>(&self, collection: &str, mut keep: F) -> Vec<RawDocument>
    where
        F: FnMut(&Document) -> bool,
    {
        let Some(documents) = self.collections.get(collection) else {
            return Vec::new();
        };

        let mut matched: Vec<(u64, RawDocument)> = documents
            .iter()
            .filter(|entry| keep(&entry.value().fields))
            .map(|entry| {
                (
                    entry.value().seq,
                    RawDocument {
                        id: entry.key().clone(),
                        fields: entry.value().fields.clone(),
                    },
                )
            })
            .collect();
        matched.sort_by_key(|(seq, _)| *seq);
        matched.into_iter().map(|(_, doc)| doc).collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: &str, fields: Document) -> Result<String, StoreError> {
        self.begin(Operation::Add)?;
        Ok(self.insert(collection, fields))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<RawDocument>, StoreError> {
        self.begin(Operation::Get)?;
        Ok(self.document(collection, id).map(|fields| RawDocument {
            id: id.to_string(),
            fields,
        }))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<RawDocument>, StoreError> {
        self.begin(Operation::Query)?;
        Ok(self.collect(collection, |fields| fields.get(field) == Some(value)))
    }

    async fn list(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        self.begin(Operation::List)?;
        Ok(self.collect(collection, |_| true))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.begin(Operation::Update)?;
        if id.is_empty() {
            return Err(StoreError::MissingId);
        }

        let documents = self
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut stored = documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        stored.fields.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.begin(Operation::Delete)?;
        if id.is_empty() {
            return Err(StoreError::MissingId);
        }

        if let Some(documents) = self.collections.get(collection) {
            documents.remove(id);
        }
        Ok(())
    }

    async fn disable_network(&self) -> Result<(), StoreError> {
        self.begin(Operation::DisableNetwork)?;
        self.online.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn enable_network(&self) -> Result<(), StoreError> {
        self.begin(Operation::EnableNetwork)?;
        self.online.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        futures::executor::block_on(future)
    }

    #[test]
    fn add_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let a = block_on(store.add("c", doc(json!({"n": 1})))).unwrap();
        let b = block_on(store.add("c", doc(json!({"n": 2})))).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len("c"), 2);
        assert_eq!(store.calls(Operation::Add), 2);
    }

    #[test]
    fn query_returns_matches_in_insertion_order() {
        let store = MemoryStore::new();
        for n in 0..5 {
            let owner = if n % 2 == 0 { "u1" } else { "u2" };
            store.insert_raw("c", doc(json!({"owner": owner, "n": n})));
        }

        let found = block_on(store.query_eq("c", "owner", &json!("u1"))).unwrap();
        let ns: Vec<_> = found.iter().map(|d| d.fields["n"].clone()).collect();
        assert_eq!(ns, vec![json!(0), json!(2), json!(4)]);
    }

    #[test]
    fn update_merges_fields() {
        let store = MemoryStore::new();
        let id = store.insert_raw("c", doc(json!({"a": 1, "b": 2})));
        block_on(store.update("c", &id, doc(json!({"b": 3})))).unwrap();
        assert_eq!(store.document("c", &id).unwrap(), doc(json!({"a": 1, "b": 3})));
    }

    #[test]
    fn update_of_unknown_document_is_not_found() {
        let store = MemoryStore::new();
        let result = block_on(store.update("c", "nope", Document::new()));
        assert_eq!(result, Err(StoreError::NotFound("nope".to_string())));
    }

    #[test]
    fn injected_failure_persists_until_recovered() {
        let store = MemoryStore::new();
        store.fail_on(Operation::List, StoreError::PermissionDenied);
        assert_eq!(block_on(store.list("c")), Err(StoreError::PermissionDenied));
        assert_eq!(block_on(store.list("c")), Err(StoreError::PermissionDenied));

        store.recover(Operation::List);
        assert_eq!(block_on(store.list("c")), Ok(Vec::new()));
        assert_eq!(store.calls(Operation::List), 3);
    }

    #[test]
    fn one_shot_failure_hits_a_single_call() {
        let store = MemoryStore::new();
        store.fail_once(Operation::Get, StoreError::PermissionDenied);
        assert_eq!(block_on(store.get("c", "x")), Err(StoreError::PermissionDenied));
        assert_eq!(block_on(store.get("c", "x")), Ok(None));
    }

    #[test]
    fn offline_store_rejects_data_operations() {
        let store = MemoryStore::new();
        block_on(store.disable_network()).unwrap();
        assert!(!store.is_online());
        assert_eq!(block_on(store.list("c")), Err(StoreError::Unavailable));

        block_on(store.enable_network()).unwrap();
        assert!(block_on(store.list("c")).is_ok());
    }
}
