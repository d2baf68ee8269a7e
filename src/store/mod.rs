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

//! Document store abstraction.
//!
//! The store is an external collaborator: named collections of untyped JSON
//! documents keyed by opaque, store-assigned ids. It offers equality queries
//! and add/get/update/delete, nothing more. There are no multi-document
//! transactions and reads may be stale.
//!
//! The store id is metadata and is *not* part of the document body; callers
//! that need it read [`RawDocument::id`].

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// Untyped document body.
pub type Document = Map<String, Value>;

/// A document as returned by the store: the body plus its id.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub fields: Document,
}

/// Store operations, used for fault injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Get,
    Query,
    List,
    Update,
    Delete,
    DisableNetwork,
    EnableNetwork,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Get => "get",
            Self::Query => "query",
            Self::List => "list",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::DisableNetwork => "disable_network",
            Self::EnableNetwork => "enable_network",
        };
        f.write_str(name)
    }
}

/// Remote document database.
///
/// Every method is a suspension point. Implementations must not hold locks
/// across calls; overlapping calls are allowed and unordered.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores a new document and returns the id the store assigned to it.
    async fn add(&self, collection: &str, fields: Document) -> Result<String, StoreError>;

    /// Fetches one document by id. A missing document is `Ok(None)`.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<RawDocument>, StoreError>;

    /// Returns every document whose `field` equals `value`, in insertion order.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<RawDocument>, StoreError>;

    /// Returns every document of the collection, in insertion order.
    async fn list(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError>;

    /// Merges `fields` into an existing document.
    ///
    /// Fields not named in `fields` keep their stored value.
    async fn update(&self, collection: &str, id: &str, fields: Document)
    -> Result<(), StoreError>;

    /// Removes a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Takes the store client offline.
    async fn disable_network(&self) -> Result<(), StoreError>;

    /// Brings the store client back online.
    async fn enable_network(&self) -> Result<(), StoreError>;
}
