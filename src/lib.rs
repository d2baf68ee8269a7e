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

//! # CaesarCoin
//!
//! This library is the core of a personal ledger app: users register and log
//! in, then record credits and debits against a running balance. State lives
//! in a remote document store; this crate holds the sessions that sit
//! between the UI and that store.
//!
//! ## Core Components
//!
//! - [`AccountSession`]: login, registration, profile updates
//! - [`LedgerSession`]: the logged-in user's transactions and totals
//! - [`LedgerTotals`]: credit/debit/balance aggregation
//! - [`DocumentStore`]: the store contract, with [`MemoryStore`] in-process
//! - [`SessionError`]: user-facing errors published by the sessions
//!
//! ## Example
//!
//! ```
//! use caesarcoin::{LedgerSession, MemoryStore, SessionConfig, Transaction, UserId};
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! # futures::executor::block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! let ledger = LedgerSession::new(store, &SessionConfig::default());
//! let owner = UserId::from("u1");
//!
//! ledger.add(Transaction::credit("salary", dec!(100)), &owner).await.unwrap();
//! ledger.add(Transaction::debit("groceries", dec!(40)), &owner).await.unwrap();
//!
//! assert_eq!(ledger.totals().balance, dec!(60));
//! # });
//! ```
//!
//! ## Concurrency
//!
//! Session operations are `async` and take `&self`; a session is shared
//! behind an [`Arc`](std::sync::Arc). Overlapping calls are not serialized:
//! state slots are last-write-wins.

pub mod account_session;
mod base;
pub mod config;
pub mod error;
pub mod ledger;
pub mod ledger_session;
mod observable;
mod repository;
pub mod store;
mod transaction;
mod user;

pub use account_session::{AccountSession, AuthState};
pub use base::{TransactionId, UserId};
pub use config::SessionConfig;
pub use error::{DecodeError, ErrorKind, SessionError, StoreError};
pub use ledger::{DailyTotals, LedgerTotals};
pub use ledger_session::LedgerSession;
pub use observable::Observable;
pub use repository::{TransactionRepository, UserRepository};
pub use store::{Document, DocumentStore, MemoryStore, Operation, RawDocument};
pub use transaction::{Transaction, TransactionKind};
pub use user::{ProfileUpdate, User};
