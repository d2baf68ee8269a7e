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

//! Authentication state.
//!
//! Implemented State Machine
//!
//! ```text
//!  Anonymous ──login/register──► Loading ──match──► Authenticated
//!      ▲                            │                    │
//!      │                            └──failure──► ErrorPresented
//!      └───────────────logout────────────────────────────┘
//! ```
//!
//! Validation failures go straight to `ErrorPresented` without a store call.
//! Every failure is published on the error slot *and* returned.
//!
//! # Example
//!
//! ```
//! use caesarcoin::{AccountSession, AuthState, MemoryStore, SessionConfig, User};
//! use std::sync::Arc;
//!
//! # futures::executor::block_on(async {
//! let session = AccountSession::new(Arc::new(MemoryStore::new()), SessionConfig::default());
//! session
//!     .register(User::new("Ana", "ana", "ana@example.com", "secret1"))
//!     .await
//!     .unwrap();
//! assert_eq!(session.state(), AuthState::Authenticated);
//! # });
//! ```

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::observable::{BusyGuard, Observable};
use crate::repository::UserRepository;
use crate::store::DocumentStore;
use crate::user::{ProfileUpdate, User};
use crossbeam::channel::Receiver;
use std::sync::Arc;
use tracing::{info, warn};

/// Observable state of an [`AccountSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    /// A store call is in flight.
    Loading,
    Authenticated,
    /// Anonymous, with an error waiting to be shown.
    ErrorPresented,
}

/// Holds the authenticated user of one app session.
///
/// Slots are last-write-wins: overlapping calls are not serialized, and the
/// call that resolves last determines what observers see.
pub struct AccountSession<S> {
    users: UserRepository<S>,
    config: SessionConfig,
    current_user: Observable<Option<User>>,
    error: Observable<Option<SessionError>>,
    busy: Observable<bool>,
}

impl<S: DocumentStore> AccountSession<S> {
    pub fn new(store: Arc<S>, config: SessionConfig) -> Self {
        Self {
            users: UserRepository::new(store, config.users_collection.clone()),
            config,
            current_user: Observable::new(None),
            error: Observable::new(None),
            busy: Observable::new(false),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_user.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.get().is_some()
    }

    pub fn error(&self) -> Option<SessionError> {
        self.error.get()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    pub fn state(&self) -> AuthState {
        if self.busy.get() {
            AuthState::Loading
        } else if self.current_user.get().is_some() {
            AuthState::Authenticated
        } else if self.error.get().is_some() {
            AuthState::ErrorPresented
        } else {
            AuthState::Anonymous
        }
    }

    pub fn subscribe_user(&self) -> Receiver<Option<User>> {
        self.current_user.subscribe()
    }

    pub fn subscribe_error(&self) -> Receiver<Option<SessionError>> {
        self.error.subscribe()
    }

    pub fn subscribe_busy(&self) -> Receiver<bool> {
        self.busy.subscribe()
    }

    /// Authenticates by email and clear-text password.
    ///
    /// # Errors
    ///
    /// - [`SessionError::MissingCredentials`] - blank email or password; no store call.
    /// - [`SessionError::InvalidCredentials`] - unknown email or wrong password.
    /// - [`SessionError::Remote`] - the lookup failed.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        if email.trim().is_empty() || password.trim().is_empty() {
            return self.fail(SessionError::MissingCredentials);
        }

        let _busy = BusyGuard::raise(&self.busy);
        self.error.set(None);

        match self.users.find_by_email(email).await {
            Ok(Some(user)) if user.password == password => {
                info!(user = %user.id, "login succeeded");
                self.authenticate(user);
                Ok(())
            }
            Ok(_) => {
                info!("login rejected");
                self.fail(SessionError::InvalidCredentials)
            }
            Err(e) => self.fail(SessionError::remote("Erro ao fazer login", e)),
        }
    }

    /// Registers a new user and authenticates as them.
    ///
    /// Unless [`SessionConfig::adopt_assigned_user_id`] is set, the
    /// authenticated record is the one passed in, so its id stays blank
    /// until the next login.
    ///
    /// # Errors
    ///
    /// - [`SessionError::MissingRegistrationFields`] - blank name, email or password.
    /// - [`SessionError::PasswordTooShort`] - password under the configured minimum.
    /// - [`SessionError::EmailTaken`] - another user already has this email.
    /// - [`SessionError::Remote`] - the lookup or the write failed.
    pub async fn register(&self, user: User) -> Result<(), SessionError> {
        if user.name.trim().is_empty()
            || user.email.trim().is_empty()
            || user.password.trim().is_empty()
        {
            return self.fail(SessionError::MissingRegistrationFields);
        }
        if user.password.chars().count() < self.config.min_password_len {
            return self.fail(SessionError::PasswordTooShort {
                min: self.config.min_password_len,
            });
        }

        let _busy = BusyGuard::raise(&self.busy);
        self.error.set(None);

        // Any stored document with this email blocks registration, even one
        // that login could not decode.
        match self.users.email_exists(&user.email).await {
            Ok(true) => return self.fail(SessionError::EmailTaken),
            Ok(false) => {}
            Err(e) => return self.fail(SessionError::remote("Erro ao cadastrar", e)),
        }

        match self.users.add(&user).await {
            Ok(assigned) => {
                info!(user = %assigned, "user registered");
                let mut user = user;
                if self.config.adopt_assigned_user_id {
                    user.id = assigned;
                }
                self.authenticate(user);
                Ok(())
            }
            Err(e) => self.fail(SessionError::remote("Erro ao cadastrar usuário", e)),
        }
    }

    /// Replaces the profile fields of the authenticated user.
    ///
    /// Does nothing when nobody is logged in. The user id never changes.
    ///
    /// # Errors
    ///
    /// - [`SessionError::MissingProfileFields`] - blank name or email.
    /// - [`SessionError::Remote`] - the update failed; the current user is kept.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), SessionError> {
        let Some(current) = self.current_user.get() else {
            return Ok(());
        };
        if update.name.trim().is_empty() || update.email.trim().is_empty() {
            return self.fail(SessionError::MissingProfileFields);
        }

        let _busy = BusyGuard::raise(&self.busy);
        self.error.set(None);

        let updated = current.updated_with(&update);
        match self.users.update_by_id(&current.id, &updated).await {
            Ok(()) => {
                info!(user = %updated.id, "profile updated");
                self.current_user.set(Some(updated));
                Ok(())
            }
            Err(e) => self.fail(SessionError::remote("Erro ao atualizar perfil", e)),
        }
    }

    /// Forgets the authenticated user and any pending error.
    pub fn logout(&self) {
        self.current_user.set(None);
        self.error.set(None);
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }

    fn authenticate(&self, user: User) {
        if user.id.is_blank() {
            warn!("authenticated user has no store id; profile updates will fail");
        }
        self.current_user.set(Some(user));
    }

    fn fail(&self, error: SessionError) -> Result<(), SessionError> {
        self.error.set(Some(error.clone()));
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use futures::executor::block_on;

    fn session() -> AccountSession<MemoryStore> {
        AccountSession::new(Arc::new(MemoryStore::new()), SessionConfig::default())
    }

    #[test]
    fn initial_state_is_anonymous() {
        let session = session();
        assert_eq!(session.state(), AuthState::Anonymous);
        assert!(session.current_user().is_none());
        assert!(!session.is_busy());
    }

    #[test]
    fn validation_failure_presents_error() {
        let session = session();
        let result = block_on(session.login("", "secret"));
        assert_eq!(result, Err(SessionError::MissingCredentials));
        assert_eq!(session.state(), AuthState::ErrorPresented);

        session.clear_error();
        assert_eq!(session.state(), AuthState::Anonymous);
    }

    #[test]
    fn busy_flag_is_raised_during_login_and_lowered_after() {
        let session = session();
        let busy = session.subscribe_busy();
        let _ = block_on(session.login("ana@example.com", "secret1"));

        let seen: Vec<bool> = busy.try_iter().collect();
        assert_eq!(seen, vec![false, true, false]);
    }

    #[test]
    fn password_length_counts_characters() {
        let session = session();
        // Six characters, more than six bytes.
        let user = User::new("Ana", "", "ana@example.com", "çãoçãõ");
        assert!(block_on(session.register(user)).is_ok());
    }

    #[test]
    fn minimum_password_length_is_configurable() {
        let config = SessionConfig {
            min_password_len: 10,
            ..SessionConfig::default()
        };
        let session = AccountSession::new(Arc::new(MemoryStore::new()), config);
        let result = block_on(session.register(User::new("Ana", "", "a@b.c", "123456789")));
        assert_eq!(result, Err(SessionError::PasswordTooShort { min: 10 }));
    }
}
