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

//! Error types for sessions, the document store and document decoding.
//!
//! [`SessionError`] messages are user-facing and are shown as-is by the UI,
//! which is why they keep the app's Portuguese wording.

use thiserror::Error;

/// Coarse classification of a [`SessionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input detected locally; the store was never contacted.
    Validation,
    /// Credentials did not match a stored user.
    Auth,
    /// Business rule violated, detected by a read before the write.
    Conflict,
    /// The pre-write health probe failed.
    Connectivity,
    /// The store call itself failed.
    Remote,
}

/// Errors published by the account and ledger sessions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Login attempted with a blank email or password
    #[error("Email e senha são obrigatórios")]
    MissingCredentials,

    /// Registration attempted with a blank name, email or password
    #[error("Todos os campos são obrigatórios")]
    MissingRegistrationFields,

    /// Registration password shorter than the configured minimum
    #[error("A senha deve ter pelo menos {min} caracteres")]
    PasswordTooShort { min: usize },

    /// Profile update with a blank name or email
    #[error("Nome e email são obrigatórios")]
    MissingProfileFields,

    /// Transaction with a blank title or a non-positive amount
    #[error("Título e valor positivo são obrigatórios")]
    InvalidTransaction,

    /// Ledger operation without an owner
    #[error("Usuário não identificado")]
    MissingOwner,

    /// No user with this email, or the password does not match
    #[error("Email ou senha incorretos")]
    InvalidCredentials,

    /// Another user already registered this email
    #[error("Este email já está cadastrado")]
    EmailTaken,

    /// The connectivity probe failed before a write
    #[error("Problema de conexão com o servidor")]
    Connectivity,

    /// A store call failed
    #[error("{action}: {source}")]
    Remote {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

impl SessionError {
    pub(crate) fn remote(action: &'static str, source: StoreError) -> Self {
        Self::Remote { action, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredentials
            | Self::MissingRegistrationFields
            | Self::PasswordTooShort { .. }
            | Self::MissingProfileFields
            | Self::InvalidTransaction
            | Self::MissingOwner => ErrorKind::Validation,
            Self::InvalidCredentials => ErrorKind::Auth,
            Self::EmailTaken => ErrorKind::Conflict,
            Self::Connectivity => ErrorKind::Connectivity,
            Self::Remote { .. } => ErrorKind::Remote,
        }
    }
}

/// Failures reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The network layer is disabled or unreachable
    #[error("network unavailable")]
    Unavailable,

    /// The caller lacks permission for the collection
    #[error("permission denied")]
    PermissionDenied,

    /// No document with this id
    #[error("document not found: {0}")]
    NotFound(String),

    /// Update or delete addressed with an empty id
    #[error("document id is empty")]
    MissingId,

    /// Any other backend failure
    #[error("{0}")]
    Backend(String),
}

/// Reasons a raw document cannot be turned into a domain record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Field present with a JSON type the record cannot hold
    #[error("field `{field}` has the wrong type (expected {expected})")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// Field has the right type but an unparsable value
    #[error("field `{field}` has an invalid value: {value}")]
    InvalidValue { field: &'static str, value: String },

    /// Amounts are stored as magnitudes and may not be negative
    #[error("negative amount: {0}")]
    NegativeAmount(String),

    /// Body could not be mapped onto the record at all
    #[error("malformed document: {0}")]
    Malformed(String),
}
